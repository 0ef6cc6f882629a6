// ============================
// carelink-backend-lib/src/router.rs
// ============================
//! HTTP router.
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::session;
use crate::AppState;

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/session",
            post(session::sign_in)
                .get(session::session_status)
                .delete(session::sign_out),
        )
        .route("/register", post(session::register))
        .route("/whoami/{role}", get(session::whoami))
        .route("/health", get(session::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
