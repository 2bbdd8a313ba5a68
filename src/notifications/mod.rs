//! Out-of-band delivery of generated credentials.
//!
//! Temporary passwords (password resets, admin-created accounts) reach the
//! user through a separate channel instead of the HTTP response.

pub mod email;

use anyhow::Result;
use async_trait::async_trait;

pub use email::SmtpNotifier;

/// Why a credential is being sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialReason {
    PasswordReset,
    AccountCreated,
}

#[async_trait]
pub trait CredentialNotifier: Send + Sync {
    /// Whether a delivery channel is configured
    fn is_enabled(&self) -> bool;

    async fn send_temporary_password(
        &self,
        to_email: &str,
        full_name: &str,
        temporary_password: &str,
        reason: CredentialReason,
    ) -> Result<()>;
}
