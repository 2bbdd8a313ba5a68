//! Per-route role guard.
//!
//! Roles form no hierarchy. Each route states which roles it accepts and the
//! guard compares that list with the identity the gate attached.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use super::gate::AuthUser;
use super::AuthError;
use crate::api::error::ApiError;
use crate::db::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleRequirement {
    AnyAuthenticated,
    OneOf(&'static [Role]),
}

impl RoleRequirement {
    pub const ADMIN: RoleRequirement = RoleRequirement::OneOf(&[Role::Admin]);
    pub const BUYER: RoleRequirement = RoleRequirement::OneOf(&[Role::Buyer]);
    pub const FARMER: RoleRequirement = RoleRequirement::OneOf(&[Role::Farmer]);
    pub const COOPERATIVE: RoleRequirement = RoleRequirement::OneOf(&[Role::Cooperative]);
    /// Roles that own a profile row
    pub const MEMBER: RoleRequirement =
        RoleRequirement::OneOf(&[Role::Buyer, Role::Farmer, Role::Cooperative]);

    pub fn allows(&self, role: Role) -> bool {
        match self {
            RoleRequirement::AnyAuthenticated => true,
            RoleRequirement::OneOf(roles) => roles.contains(&role),
        }
    }

    pub fn check(&self, role: Role) -> Result<(), AuthError> {
        if self.allows(role) {
            return Ok(());
        }
        let accepted = match self {
            RoleRequirement::AnyAuthenticated => String::new(),
            RoleRequirement::OneOf(roles) => roles
                .iter()
                .map(Role::as_str)
                .collect::<Vec<_>>()
                .join(" or "),
        };
        Err(AuthError::Forbidden(format!("{} access required", accepted)))
    }
}

/// Middleware enforcing a route's role requirement; runs behind `require_auth`
pub async fn require_role(
    State(requirement): State<RoleRequirement>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .copied()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if let Err(e) = requirement.check(user.role) {
        tracing::debug!(
            user_id = user.user_id,
            role = %user.role,
            path = %request.uri().path(),
            "Role guard rejected request"
        );
        return Err(e.into());
    }

    Ok(next.run(request).await)
}

/// Account endpoints accept the owner themselves or an admin
pub fn ensure_self_or_admin(user: &AuthUser, target_user_id: i64) -> Result<(), AuthError> {
    if user.user_id == target_user_id || user.role == Role::Admin {
        Ok(())
    } else {
        Err(AuthError::Forbidden(
            "You can only modify your own account".to_string(),
        ))
    }
}
