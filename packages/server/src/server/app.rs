//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::routes::{
    downline_handler, health_handler, join_handler, login_handler, profile_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    pub deps: Arc<ServerDeps>,
}

/// Build the Axum application router
///
/// The store handle inside `deps` is shared by every request; the router
/// itself holds no other state.
pub fn build_app(deps: ServerDeps) -> Router {
    let app_state = AxumAppState {
        deps: Arc::new(deps),
    };

    // CORS configuration - allow any origin
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        // Tree operations
        .route("/join", post(join_handler))
        .route("/login", post(login_handler))
        .route("/profile/:code", get(profile_handler))
        .route("/downline/:side/:code", get(downline_handler))
        // Health check
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
