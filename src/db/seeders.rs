//! Bootstrap data.
//!
//! The only built-in record is the first admin account. Admins cannot register
//! themselves, so this is the one path that creates them without another admin.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::accounts;
use super::models::{NewAccount, ProfileFields, Role};
use crate::auth::password::hash_password_blocking;
use crate::config::AuthConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Created { user_id: i64 },
    /// The email is taken; `role` is whatever that account already has
    AlreadyExists { user_id: i64, role: Role },
}

/// Admin passwords follow the same minimum as every other account
pub fn check_admin_password(password: &str, min_length: usize) -> Result<()> {
    if password.chars().count() < min_length {
        anyhow::bail!(
            "Admin password must be at least {} characters long",
            min_length
        );
    }
    Ok(())
}

/// Seed the admin named by `auth.admin_email` / `auth.admin_password`.
/// Returns `None` when the config names no bootstrap admin.
pub async fn seed_configured_admin(
    pool: &SqlitePool,
    auth: &AuthConfig,
) -> Result<Option<SeedOutcome>> {
    let (Some(email), Some(password)) = (&auth.admin_email, &auth.admin_password) else {
        return Ok(None);
    };
    check_admin_password(password, auth.min_password_length)
        .context("Invalid auth.admin_password")?;

    seed_admin(pool, email, &auth.admin_name, password)
        .await
        .map(Some)
}

/// Create the admin account unless an account with this email exists.
///
/// An existing account is left untouched, whatever its role, so re-running the
/// seeder never resets a password.
pub async fn seed_admin(
    pool: &SqlitePool,
    email: &str,
    full_name: &str,
    password: &str,
) -> Result<SeedOutcome> {
    let email = email.trim().to_lowercase();

    if let Some(existing) = accounts::find_by_email(pool, &email).await? {
        if existing.role == Role::Admin {
            info!(user_id = existing.user_id, "Admin seed skipped, account exists");
        } else {
            warn!(
                user_id = existing.user_id,
                role = %existing.role,
                "Admin seed skipped: {} belongs to a non-admin account, no admin was created",
                email
            );
        }
        return Ok(SeedOutcome::AlreadyExists {
            user_id: existing.user_id,
            role: existing.role,
        });
    }

    let password_hash = hash_password_blocking(password.to_string()).await?;
    let account = accounts::create_account_with_profile(
        pool,
        &NewAccount {
            full_name: full_name.trim().to_string(),
            email,
            phone: String::new(),
            password_hash,
            role: Role::Admin,
            profile: ProfileFields::default(),
        },
    )
    .await
    .context("Failed to create admin account")?;

    info!(user_id = account.user_id, "Created admin account");
    Ok(SeedOutcome::Created {
        user_id: account.user_id,
    })
}
