//! Input validation for account requests.
//!
//! Each validator returns `Err(message)` for the first problem it finds.
//! Handlers collect them with `ValidationErrorBuilder` so a client sees every
//! bad field at once.

use lazy_static::lazy_static;
use regex::Regex;

use super::error::ValidationErrorBuilder;
use crate::db::{ProfileFields, Role};

lazy_static! {
    /// Same shape the registration form checks: something@something.tld
    static ref EMAIL_REGEX: Regex = Regex::new(r"^\S+@\S+\.\S+$").unwrap();

    /// Digits, spaces, dashes and an optional leading plus
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9][0-9 \-]*$").unwrap();
}

pub fn validate_full_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Full name is required".to_string());
    }
    if name.chars().count() > 150 {
        return Err("Full name is too long (max 150 characters)".to_string());
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.trim().is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }
    if !EMAIL_REGEX.is_match(email.trim()) {
        return Err("Invalid email address".to_string());
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), String> {
    let phone = phone.trim();
    if phone.is_empty() {
        return Err("Phone number is required".to_string());
    }
    if phone.len() > 20 {
        return Err("Phone number is too long (max 20 characters)".to_string());
    }
    if !PHONE_REGEX.is_match(phone) {
        return Err(
            "Phone number may only contain digits, spaces, dashes and a leading +".to_string(),
        );
    }
    Ok(())
}

pub fn validate_password(password: &str, min_length: usize) -> Result<(), String> {
    if password.chars().count() < min_length {
        return Err(format!(
            "Password must be at least {} characters long",
            min_length
        ));
    }
    if password.len() > 128 {
        return Err("Password is too long (max 128 characters)".to_string());
    }
    Ok(())
}

/// Parse a role and reject roles that cannot be created through this path
pub fn validate_registrable_role(role: &str) -> Result<Role, String> {
    let parsed: Role = role
        .parse()
        .map_err(|_| "Invalid role. Must be one of: buyer, farmer, cooperative".to_string())?;
    if !parsed.self_registrable() {
        return Err("Admin accounts cannot be self-registered".to_string());
    }
    Ok(parsed)
}

/// Optional free-text column; `None` leaves the stored value alone
pub fn validate_profile_text(value: Option<&str>, max_chars: usize) -> Result<(), String> {
    match value {
        Some(value) if value.chars().count() > max_chars => {
            Err(format!("Too long (max {} characters)", max_chars))
        }
        _ => Ok(()),
    }
}

/// Check every profile column, short names at 255 characters and prose at 2000
pub fn check_profile_fields(errors: &mut ValidationErrorBuilder, fields: &ProfileFields) {
    errors
        .check("location", validate_profile_text(fields.location.as_deref(), 255))
        .check("farm_name", validate_profile_text(fields.farm_name.as_deref(), 255))
        .check("farm_type", validate_profile_text(fields.farm_type.as_deref(), 255))
        .check(
            "cooperative_name",
            validate_profile_text(fields.cooperative_name.as_deref(), 255),
        )
        .check("bio", validate_profile_text(fields.bio.as_deref(), 2000))
        .check(
            "description",
            validate_profile_text(fields.description.as_deref(), 2000),
        );
}

/// Photo URLs point at the upload service: a site-relative path or http(s)
pub fn validate_photo_url(url: &str) -> Result<(), String> {
    if url.len() > 2048 {
        return Err("Photo URL is too long (max 2048 characters)".to_string());
    }
    if url.chars().any(char::is_whitespace) {
        return Err("Photo URL may not contain whitespace".to_string());
    }
    let accepted = (url.starts_with('/') && !url.starts_with("//"))
        || url.starts_with("http://")
        || url.starts_with("https://");
    if !accepted {
        return Err("Photo URL must be a /path or an http(s) URL".to_string());
    }
    Ok(())
}

/// Emails are stored trimmed and lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("jane@test.rw").is_ok());
        assert!(validate_email("first.last+tag@farm.co.rw").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("jane").is_err());
        assert!(validate_email("jane@test").is_err());
        assert!(validate_email("jane doe@test.rw").is_err());
    }

    #[test]
    fn test_validate_password_minimum() {
        assert!(validate_password("secret1", 6).is_ok());
        assert!(validate_password("secret", 6).is_ok());
        assert!(validate_password("short", 6).is_err());
        assert!(validate_password("", 6).is_err());
        assert!(validate_password(&"x".repeat(129), 6).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("0788000000").is_ok());
        assert!(validate_phone("+250 788 000 000").is_ok());
        assert!(validate_phone("").is_err());
        assert!(validate_phone("call me").is_err());
        assert!(validate_phone("123456789012345678901").is_err());
    }

    #[test]
    fn test_validate_full_name() {
        assert!(validate_full_name("Jane Doe").is_ok());
        assert!(validate_full_name("   ").is_err());
        assert!(validate_full_name(&"a".repeat(151)).is_err());
    }

    #[test]
    fn test_validate_registrable_role() {
        assert_eq!(validate_registrable_role("farmer").unwrap(), Role::Farmer);
        assert_eq!(validate_registrable_role("Buyer").unwrap(), Role::Buyer);
        assert_eq!(validate_registrable_role("cooperative").unwrap(), Role::Cooperative);
        assert!(validate_registrable_role("admin").is_err());
        assert!(validate_registrable_role("").is_err());
        assert!(validate_registrable_role("guest").is_err());
    }

    #[test]
    fn test_profile_fields_limits() {
        let mut errors = ValidationErrorBuilder::new();
        check_profile_fields(
            &mut errors,
            &ProfileFields {
                farm_name: Some("Green Hills".to_string()),
                bio: Some("b".repeat(2000)),
                ..ProfileFields::default()
            },
        );
        assert!(errors.is_empty());

        let mut errors = ValidationErrorBuilder::new();
        check_profile_fields(
            &mut errors,
            &ProfileFields {
                location: Some("l".repeat(256)),
                description: Some("d".repeat(2001)),
                ..ProfileFields::default()
            },
        );
        let err = errors.build().unwrap();
        let details = err.details().unwrap();
        assert!(details.contains_key("location"));
        assert!(details.contains_key("description"));
        assert!(!details.contains_key("bio"));
    }

    #[test]
    fn test_validate_photo_url() {
        assert!(validate_photo_url("/uploads/profiles/jane.jpg").is_ok());
        assert!(validate_photo_url("https://cdn.farmerjoin.rw/p/1.png").is_ok());
        assert!(validate_photo_url("javascript:alert(1)").is_err());
        assert!(validate_photo_url("//evil.example/x.png").is_err());
        assert!(validate_photo_url("/uploads/my photo.jpg").is_err());
        assert!(validate_photo_url(&format!("/{}", "x".repeat(2048))).is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane@Test.RW "), "jane@test.rw");
    }
}
