//! Per-role landing data. Each route is guarded to exactly one role.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use super::error::ApiError;
use crate::auth::{AuthError, AuthUser};
use crate::db::{accounts, AccountDetail, Profile, RoleCounts};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user: AccountDetail,
    pub profile: Option<Profile>,
}

#[derive(Debug, Serialize)]
pub struct AdminDashboardResponse {
    pub user: AccountDetail,
    pub counts: RoleCounts,
}

async fn member_dashboard(
    state: &AppState,
    user: AuthUser,
) -> Result<Json<DashboardResponse>, ApiError> {
    let account = accounts::find_by_id(&state.db, user.user_id)
        .await?
        .ok_or(AuthError::NotFound)?;
    let profile = accounts::load_profile(&state.db, account.role, account.user_id).await?;

    Ok(Json(DashboardResponse {
        user: AccountDetail::from(account),
        profile,
    }))
}

pub async fn buyer_dashboard(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<DashboardResponse>, ApiError> {
    member_dashboard(&state, user).await
}

pub async fn farmer_dashboard(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<DashboardResponse>, ApiError> {
    member_dashboard(&state, user).await
}

pub async fn cooperative_dashboard(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<DashboardResponse>, ApiError> {
    member_dashboard(&state, user).await
}

pub async fn admin_dashboard(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<AdminDashboardResponse>, ApiError> {
    let account = accounts::find_by_id(&state.db, user.user_id)
        .await?
        .ok_or(AuthError::NotFound)?;
    let counts = accounts::count_by_role(&state.db).await?;

    Ok(Json(AdminDashboardResponse {
        user: AccountDetail::from(account),
        counts,
    }))
}
