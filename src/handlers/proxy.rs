use axum::extract::{ConnectInfo, Request, State};
use axum::response::Response;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::error::GatewayError;
use crate::metrics::{RATE_LIMITED_TOTAL, REQUEST_LATENCY, REQUEST_TOTAL, UPSTREAM_ERRORS_TOTAL};
use crate::proxy;
use crate::state::AppState;

// Catch-all handler: rate limit check, prefix match, then hand off to the
// proxy. Mounted as the router fallback so every method and path lands here.
pub async fn proxy_handler(
    State(state): State<Arc<AppState>>,
    req: Request,
) -> Result<Response, GatewayError> {
    REQUEST_TOTAL.inc();
    let start_time = Instant::now();

    let client_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0);
    let identity = state.classifier.classify(req.headers(), client_addr);

    if !state.limiter.check(&identity).await {
        RATE_LIMITED_TOTAL.inc();
        return Err(GatewayError::RateLimitExceeded);
    }

    let path = req.uri().path().to_string();
    let Some(route) = state.routes.resolve(&path) else {
        return Err(GatewayError::NoRouteMatched(path));
    };

    let result = proxy::forward(&state.client, route, req, state.proxy_timeout).await;

    if let Err(GatewayError::UpstreamUnavailable(_) | GatewayError::UpstreamTimeout(_)) = &result {
        UPSTREAM_ERRORS_TOTAL.inc();
    }

    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());

    result
}
