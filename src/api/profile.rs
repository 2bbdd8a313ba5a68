//! Role profiles and the account photo.
//!
//! Buyers, farmers and cooperatives edit their own profile row; admins can edit
//! anyone's through `/admin/accounts/:user_id/profile`. Updates are partial:
//! omitted or blank fields keep their stored value.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use super::auth::parse_user_id;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{check_profile_fields, validate_photo_url};
use crate::auth::{AuthError, AuthUser};
use crate::db::{
    accounts, AccountDetail, MessageResponse, Profile, ProfileFields, UpdatePhotoRequest,
};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: AccountDetail,
    pub profile: Profile,
}

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let account = accounts::find_by_id(&state.db, user.user_id)
        .await?
        .ok_or(AuthError::NotFound)?;
    let profile = accounts::load_profile(&state.db, account.role, account.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;

    Ok(Json(ProfileResponse {
        user: AccountDetail::from(account),
        profile,
    }))
}

pub async fn update_own_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<ProfileFields>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(fields) = payload?;
    apply_profile_update(&state, user.user_id, fields, user.user_id).await
}

/// Admin only; the route carries the role guard
pub async fn update_account_profile(
    State(state): State<Arc<AppState>>,
    admin: AuthUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ProfileFields>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user_id = parse_user_id(path)?;
    let Json(fields) = payload?;
    apply_profile_update(&state, user_id, fields, admin.user_id).await
}

async fn apply_profile_update(
    state: &AppState,
    user_id: i64,
    fields: ProfileFields,
    updated_by: i64,
) -> Result<Json<MessageResponse>, ApiError> {
    let fields = fields.normalized();
    let mut errors = ValidationErrorBuilder::new();
    check_profile_fields(&mut errors, &fields);
    errors.finish()?;

    let account = accounts::find_by_id(&state.db, user_id)
        .await?
        .ok_or(AuthError::NotFound)?;
    if account.role.profile_table().is_none() {
        return Err(ApiError::bad_request(format!(
            "{} accounts have no profile",
            account.role
        )));
    }

    if fields.is_empty() {
        return Ok(Json(MessageResponse::new("No changes to update")));
    }

    if !accounts::update_profile(&state.db, account.role, user_id, &fields).await? {
        return Err(ApiError::not_found("Profile not found"));
    }

    info!(user_id, role = %account.role, updated_by, "Profile updated");
    Ok(Json(MessageResponse::new("Profile updated successfully")))
}

/// Store the URL the upload service returned for the caller's photo
pub async fn update_photo(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<UpdatePhotoRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;
    let photo = request
        .photo
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty());

    if let Some(url) = photo {
        validate_photo_url(url)
            .map_err(|message| ApiError::validation_field("photo", message))?;
    }

    if !accounts::update_photo(&state.db, user.user_id, photo).await? {
        return Err(AuthError::NotFound.into());
    }

    info!(user_id = user.user_id, cleared = photo.is_none(), "Photo updated");
    Ok(Json(MessageResponse::new("Photo updated successfully")))
}
