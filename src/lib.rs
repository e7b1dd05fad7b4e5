pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod identity;
pub mod metrics;
pub mod proxy;
pub mod rate_limit;
pub mod state;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use state::AppState;

// Gateway router: its own health and metrics endpoints, everything else
// falls through to the proxy. Browser clients talk to the gateway only,
// so CORS is handled here and never at the upstreams.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .fallback(handlers::proxy_handler)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
