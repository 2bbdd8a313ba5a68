pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod error;
pub mod profile;
pub mod rate_limit;
pub mod validation;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::{require_auth, require_role, RoleRequirement};
use crate::config::ServerConfig;
use crate::AppState;
use error::ApiError;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Credential routes (public, strict rate tier)
    let credential_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_auth,
        ));

    // Account routes for any signed-in user; deletion is admin only
    let account_routes = Router::new()
        .route("/me", get(auth::me))
        .route("/refresh", post(auth::refresh))
        .route("/change-password", post(auth::change_password))
        .route(
            "/:user_id",
            put(auth::update_account).merge(delete(auth::delete_account).route_layer(
                middleware::from_fn_with_state(RoleRequirement::ADMIN, require_role),
            )),
        );

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/accounts", post(admin::create_account))
        .route("/accounts/:user_id/profile", put(profile::update_account_profile))
        .route_layer(middleware::from_fn_with_state(
            RoleRequirement::ADMIN,
            require_role,
        ));

    let dashboard_routes = Router::new()
        .route(
            "/buyer",
            get(dashboard::buyer_dashboard).route_layer(middleware::from_fn_with_state(
                RoleRequirement::BUYER,
                require_role,
            )),
        )
        .route(
            "/farmer",
            get(dashboard::farmer_dashboard).route_layer(middleware::from_fn_with_state(
                RoleRequirement::FARMER,
                require_role,
            )),
        )
        .route(
            "/cooperative",
            get(dashboard::cooperative_dashboard).route_layer(middleware::from_fn_with_state(
                RoleRequirement::COOPERATIVE,
                require_role,
            )),
        )
        .route(
            "/admin",
            get(dashboard::admin_dashboard).route_layer(middleware::from_fn_with_state(
                RoleRequirement::ADMIN,
                require_role,
            )),
        );

    // Own profile for roles that have one; the photo belongs to every account
    let profile_routes = Router::new()
        .route(
            "/profile",
            get(profile::get_profile)
                .put(profile::update_own_profile)
                .route_layer(middleware::from_fn_with_state(
                    RoleRequirement::MEMBER,
                    require_role,
                )),
        )
        .route("/profile/photo", put(profile::update_photo));

    // The gate wraps the role guards above, so it always runs first
    let protected_routes = Router::new()
        .merge(profile_routes)
        .nest("/auth", account_routes)
        .nest("/admin", admin_routes)
        .nest("/dashboard", dashboard_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_api,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/auth", credential_routes)
        .merge(protected_routes)
        .fallback(not_found)
        .layer(timeout_layer(Duration::from_secs(
            state.config.server.request_timeout_secs,
        )))
        .layer(cors_layer(&state.config.server))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Requests running past `timeout` are answered with 408
fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    if config.cors_origins.is_empty() || config.cors_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn not_found() -> ApiError {
    ApiError::not_found("API endpoint not found")
}
