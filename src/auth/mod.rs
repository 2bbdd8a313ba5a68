//! Authentication and role authorization.
//!
//! - [`password`]: Argon2 hashing and temporary password generation
//! - [`token`]: stateless signed session tokens
//! - [`gate`]: middleware that turns a bearer token into an [`AuthUser`]
//! - [`guard`]: per-route role requirements

pub mod gate;
pub mod guard;
pub mod password;
pub mod token;

pub use gate::{require_auth, AuthUser};
pub use guard::{require_role, RoleRequirement};
pub use token::{Identity, TokenCodec, TokenError};

use thiserror::Error;

/// Failures of the credential and authorization flow
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("An account with this email already exists")]
    AlreadyExists,
    #[error("User not found")]
    NotFound,
    #[error("Wrong password")]
    InvalidCredentials,
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Internal(String),
}
