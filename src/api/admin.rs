//! Admin account management. Every route here sits behind the admin role guard.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    check_profile_fields, normalize_email, validate_email, validate_full_name, validate_phone,
    validate_registrable_role,
};
use crate::auth::password::{generate_temporary_password, hash_password_blocking};
use crate::auth::{AuthError, AuthUser};
use crate::db::{
    accounts, is_unique_violation, AccountDetail, AccountResponse, CreateAccountRequest,
    CreateAccountResponse, NewAccount, Role,
};
use crate::notifications::CredentialReason;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<String>,
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<AccountDetail>>, ApiError> {
    let role = match query.role.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<Role>()
                .map_err(|_| ApiError::validation_field("role", format!("Unknown role: {}", raw)))?,
        ),
    };

    let accounts = accounts::list_accounts(&state.db, role).await?;
    Ok(Json(accounts.into_iter().map(AccountDetail::from).collect()))
}

/// Create a non-admin account on someone's behalf with a generated password
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    admin: AuthUser,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateAccountResponse>), ApiError> {
    let Json(request) = payload?;

    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("full_name", validate_full_name(&request.full_name))
        .check("email", validate_email(&request.email))
        .check("phone", validate_phone(&request.phone));
    let profile = request.profile.normalized();
    check_profile_fields(&mut errors, &profile);
    let role = validate_registrable_role(&request.role);
    if let Err(message) = &role {
        errors.add("role", message.clone());
    }
    errors.finish()?;
    let role = role.map_err(ApiError::bad_request)?;

    let expose = state.config.auth.expose_temporary_password;
    let deliver = state.notifier.is_enabled();
    if !expose && !deliver {
        return Err(ApiError::service_unavailable(
            "No delivery channel is configured for the generated password",
        ));
    }

    let email = normalize_email(&request.email);
    if accounts::email_exists(&state.db, &email).await? {
        return Err(AuthError::AlreadyExists.into());
    }

    let temporary_password = generate_temporary_password();
    let password_hash = hash_password_blocking(temporary_password.clone()).await?;
    let new_account = NewAccount {
        full_name: request.full_name.trim().to_string(),
        email,
        phone: request.phone.trim().to_string(),
        password_hash,
        role,
        profile,
    };

    let account = match accounts::create_account_with_profile(&state.db, &new_account).await {
        Ok(account) => account,
        Err(e) if is_unique_violation(&e) => return Err(AuthError::AlreadyExists.into()),
        Err(e) => return Err(e.into()),
    };

    info!(
        user_id = account.user_id,
        role = %account.role,
        created_by = admin.user_id,
        "Account created by admin"
    );

    let mut message = format!("{} account created successfully", account.role);
    if deliver {
        if let Err(e) = state
            .notifier
            .send_temporary_password(
                &account.email,
                &account.full_name,
                &temporary_password,
                CredentialReason::AccountCreated,
            )
            .await
        {
            warn!(user_id = account.user_id, error = %e, "Failed to deliver account password");
            if !expose {
                message = format!(
                    "{} account created, but the password email could not be sent. \
                     Use forgot-password to issue a new one.",
                    account.role
                );
            }
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(CreateAccountResponse {
            message,
            user: AccountResponse::from(account),
            password: expose.then_some(temporary_password),
        }),
    ))
}
