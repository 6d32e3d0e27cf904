//! Web routing and orchestration layer for Refuge.
//!
//! The binary builds an [`AppState`], passes it to [`router`], and layers
//! CORS/tracing on top. Keeping assembly here lets the integration tests
//! drive the exact router the server runs.

pub mod auth;
pub mod error;
pub mod middleware;
pub mod reports;
pub mod storage;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use refuge_db::Database;

use crate::storage::Storage;

/// Whole-request cap. The 5 MB per-image cap is enforced in validation.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub storage: Storage,
    pub jwt_secret: String,
    /// When set, the extended intake fields are required on submission.
    pub extended_fields: bool,
}

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/reports", post(reports::submit_report))
        .route("/api/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/reports", get(reports::list_reports))
        .route("/api/reports/{id}", delete(reports::delete_report))
        .route("/api/auth/change-password", put(auth::change_password))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_director,
        ))
        .with_state(state.clone());

    let uploads = ServeDir::new(state.storage.dir());

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .route("/", get(health))
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

/// Liveness check (no auth).
pub async fn health() -> &'static str {
    "API Running..."
}
