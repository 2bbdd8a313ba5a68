pub mod api;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod db;
pub mod notifications;

pub use db::DbPool;

use config::Config;
use std::sync::Arc;

use crate::api::rate_limit::RateLimiter;
use crate::auth::TokenCodec;
use crate::notifications::{CredentialNotifier, SmtpNotifier};

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub tokens: TokenCodec,
    pub notifier: Arc<dyn CredentialNotifier>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: Config, db: DbPool) -> Self {
        let tokens = TokenCodec::new(
            &config.auth.resolve_jwt_secret(),
            chrono::Duration::hours(config.auth.token_ttl_hours),
        );
        let notifier: Arc<dyn CredentialNotifier> =
            Arc::new(SmtpNotifier::new(config.email.clone()));
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
        Self {
            config,
            db,
            tokens,
            notifier,
            rate_limiter,
        }
    }

    /// Replace the credential delivery channel
    pub fn with_notifier(mut self, notifier: Arc<dyn CredentialNotifier>) -> Self {
        self.notifier = notifier;
        self
    }
}
