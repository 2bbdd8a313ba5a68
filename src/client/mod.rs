//! Client-side session handling used by the CLI.

pub mod cache;
pub mod route_guard;

pub use cache::{CachedSession, SessionCache};
pub use route_guard::{guard, landing_path, open_page, GuardDecision, PageAccess};
