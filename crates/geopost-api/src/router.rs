use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::handlers;
use crate::state::AppState;

/// Create the API router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    create_router_with_limit(state, DEFAULT_MAX_UPLOAD_BYTES)
}

/// Create the router, capping request bodies at `max_upload_bytes`
pub fn create_router_with_limit(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    let protected = Router::new()
        .route("/post", post(handlers::create_post))
        .route("/search", get(handlers::search_posts))
        .route("/ingestions/{id}", get(handlers::get_ingestion))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(protected)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
