//! Credential endpoints: register, login, forgot-password and account upkeep.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use std::sync::Arc;
use tracing::{info, warn};

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    normalize_email, validate_email, validate_full_name, validate_password, validate_phone,
    validate_registrable_role,
};
use crate::auth::guard::ensure_self_or_admin;
use crate::auth::password::{
    generate_temporary_password, hash_password_blocking, verify_password_blocking,
};
use crate::auth::{AuthError, AuthUser, Identity};
use crate::db::{
    accounts, is_unique_violation, Account, AccountDetail, AccountResponse,
    ChangePasswordRequest, ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest,
    LoginResponse, MessageResponse, NewAccount, ProfileFields, RegisterRequest,
    UpdateAccountRequest,
};
use crate::notifications::CredentialReason;
use crate::AppState;

/// Issue a token and the public projection for an account
pub(crate) fn session_for(state: &AppState, account: Account) -> Result<LoginResponse, ApiError> {
    let token = state
        .tokens
        .issue(Identity {
            user_id: account.user_id,
            role: account.role,
        })
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    Ok(LoginResponse {
        token,
        user: AccountResponse::from(account),
    })
}

pub(crate) fn parse_user_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(user_id)| user_id)
        .map_err(|_| ApiError::bad_request("Invalid user id"))
}

/// Create a buyer, farmer or cooperative account together with its profile.
/// Registration does not log the user in.
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;

    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("full_name", validate_full_name(&request.full_name))
        .check("email", validate_email(&request.email))
        .check("phone", validate_phone(&request.phone))
        .check(
            "password",
            validate_password(&request.password, state.config.auth.min_password_length),
        );
    let role = validate_registrable_role(&request.role);
    if let Err(message) = &role {
        errors.add("role", message.clone());
    }
    errors.finish()?;
    let role = role.map_err(ApiError::bad_request)?;

    let email = normalize_email(&request.email);
    if accounts::email_exists(&state.db, &email).await? {
        return Err(AuthError::AlreadyExists.into());
    }

    let password_hash = hash_password_blocking(request.password).await?;
    let new_account = NewAccount {
        full_name: request.full_name.trim().to_string(),
        email,
        phone: request.phone.trim().to_string(),
        password_hash,
        role,
        profile: ProfileFields::default(),
    };

    let account = match accounts::create_account_with_profile(&state.db, &new_account).await {
        Ok(account) => account,
        // Lost a race with a concurrent registration for the same email
        Err(e) if is_unique_violation(&e) => return Err(AuthError::AlreadyExists.into()),
        Err(e) => return Err(e.into()),
    };

    info!(user_id = account.user_id, role = %account.role, "User registered");
    Ok(Json(MessageResponse::new("User registered successfully")))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;

    let mut errors = ValidationErrorBuilder::new();
    if request.email.trim().is_empty() {
        errors.add("email", "Email is required");
    }
    if request.password.is_empty() {
        errors.add("password", "Password is required");
    }
    errors.finish()?;

    let account = accounts::find_by_email(&state.db, &normalize_email(&request.email))
        .await?
        .ok_or(AuthError::NotFound)?;

    let valid = verify_password_blocking(request.password, account.password_hash.clone()).await?;
    if !valid {
        info!(user_id = account.user_id, "Login rejected: wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    info!(user_id = account.user_id, role = %account.role, "User logged in");
    Ok(Json(session_for(&state, account)?))
}

/// Replace the password of an account with a generated one.
///
/// The new password goes out through the credential notifier. It is only put
/// in the response body when `auth.expose_temporary_password` is set.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ForgotPasswordRequest>, JsonRejection>,
) -> Result<Json<ForgotPasswordResponse>, ApiError> {
    let Json(request) = payload?;

    if request.email.trim().is_empty() {
        return Err(ApiError::validation_field("email", "Email is required"));
    }

    let account = accounts::find_by_email(&state.db, &normalize_email(&request.email))
        .await?
        .ok_or(AuthError::NotFound)?;

    let expose = state.config.auth.expose_temporary_password;
    let deliver = state.notifier.is_enabled();
    if !expose && !deliver {
        warn!("Password reset requested but no delivery channel is configured");
        return Err(ApiError::service_unavailable(
            "Password reset is currently unavailable",
        ));
    }

    let temporary_password = generate_temporary_password();
    let password_hash = hash_password_blocking(temporary_password.clone()).await?;

    // Deliver before storing so a failed send never locks the user out
    if deliver {
        if let Err(e) = state
            .notifier
            .send_temporary_password(
                &account.email,
                &account.full_name,
                &temporary_password,
                CredentialReason::PasswordReset,
            )
            .await
        {
            warn!(user_id = account.user_id, error = %e, "Failed to deliver temporary password");
            if !expose {
                return Err(ApiError::service_unavailable(
                    "Could not send the temporary password, try again later",
                ));
            }
        }
    }

    if !accounts::update_password_hash(&state.db, account.user_id, &password_hash).await? {
        return Err(AuthError::NotFound.into());
    }

    info!(user_id = account.user_id, "Password reset");

    let response = if expose {
        ForgotPasswordResponse {
            message: "Temporary password generated successfully".to_string(),
            email: account.email,
            temporary_password: Some(temporary_password),
            full_name: Some(account.full_name),
        }
    } else {
        ForgotPasswordResponse {
            message: "A temporary password has been sent to your email".to_string(),
            email: account.email,
            temporary_password: None,
            full_name: None,
        }
    };
    Ok(Json(response))
}

/// Update contact details. Owners may edit themselves, admins anyone.
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user_id = parse_user_id(path)?;
    ensure_self_or_admin(&user, user_id)?;
    let Json(request) = payload?;

    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("full_name", validate_full_name(&request.full_name))
        .check("email", validate_email(&request.email))
        .check("phone", validate_phone(&request.phone));
    errors.finish()?;

    if accounts::find_by_id(&state.db, user_id).await?.is_none() {
        return Err(AuthError::NotFound.into());
    }

    let email = normalize_email(&request.email);
    if let Some(holder) = accounts::find_by_email(&state.db, &email).await? {
        if holder.user_id != user_id {
            return Err(AuthError::AlreadyExists.into());
        }
    }

    let updated = match accounts::update_contact(
        &state.db,
        user_id,
        request.full_name.trim(),
        &email,
        request.phone.trim(),
    )
    .await
    {
        Ok(updated) => updated,
        Err(e) if is_unique_violation(&e) => return Err(AuthError::AlreadyExists.into()),
        Err(e) => return Err(e.into()),
    };
    if !updated {
        return Err(AuthError::NotFound.into());
    }

    info!(user_id, updated_by = user.user_id, "User updated");
    Ok(Json(MessageResponse::new("User updated successfully")))
}

/// Admin only; the route carries the role guard
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user_id = parse_user_id(path)?;

    if !accounts::delete_account(&state.db, user_id).await? {
        return Err(AuthError::NotFound.into());
    }

    info!(user_id, deleted_by = user.user_id, "User deleted");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<AccountDetail>, ApiError> {
    let account = accounts::find_by_id(&state.db, user.user_id)
        .await?
        .ok_or(AuthError::NotFound)?;
    Ok(Json(AccountDetail::from(account)))
}

/// Fresh token with the role as currently stored
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<LoginResponse>, ApiError> {
    let account = accounts::find_by_id(&state.db, user.user_id)
        .await?
        .ok_or_else(|| AuthError::Unauthorized("Account no longer exists".to_string()))?;

    if account.role != user.role {
        info!(
            user_id = account.user_id,
            old_role = %user.role,
            new_role = %account.role,
            "Role changed since token was issued"
        );
    }
    Ok(Json(session_for(&state, account)?))
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;

    let mut errors = ValidationErrorBuilder::new();
    if request.current_password.is_empty() {
        errors.add("current_password", "Current password is required");
    }
    errors.check(
        "new_password",
        validate_password(&request.new_password, state.config.auth.min_password_length),
    );
    errors.finish()?;

    let account = accounts::find_by_id(&state.db, user.user_id)
        .await?
        .ok_or(AuthError::NotFound)?;

    if !verify_password_blocking(request.current_password, account.password_hash).await? {
        return Err(AuthError::InvalidCredentials.into());
    }

    let password_hash = hash_password_blocking(request.new_password).await?;
    if !accounts::update_password_hash(&state.db, user.user_id, &password_hash).await? {
        return Err(AuthError::NotFound.into());
    }

    info!(user_id = user.user_id, "Password changed");
    Ok(Json(MessageResponse::new("Password changed successfully")))
}
