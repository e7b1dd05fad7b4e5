use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::time::Duration;
use thiserror::Error;

// User-visible gateway errors. Counter-store failures never show up here -
// the limiter fails open and only logs them.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Rate limit exceeded. Try again later.")]
    RateLimitExceeded,

    #[error("No route matches {0}")]
    NoRouteMatched(String),

    #[error("Upstream request failed: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream timed out after {0:?}")]
    UpstreamTimeout(Duration),

    #[error("Failed to read request body: {0}")]
    ReadBody(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match self {
            GatewayError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::NoRouteMatched(_) => StatusCode::NOT_FOUND,
            GatewayError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::ReadBody(_) => StatusCode::BAD_REQUEST,
        };

        Response::builder()
            .status(status)
            .body(Body::from(self.to_string()))
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_maps_to_429() {
        let resp = GatewayError::RateLimitExceeded.into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn no_route_maps_to_404() {
        let resp = GatewayError::NoRouteMatched("/nope".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn upstream_failure_maps_to_502() {
        let resp = GatewayError::UpstreamUnavailable("connection refused".to_string())
            .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn upstream_timeout_maps_to_504() {
        let resp = GatewayError::UpstreamTimeout(Duration::from_secs(5)).into_response();
        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn error_display_includes_context() {
        assert!(
            GatewayError::NoRouteMatched("/api/v2/unknown".to_string())
                .to_string()
                .contains("/api/v2/unknown")
        );
        assert!(
            GatewayError::UpstreamUnavailable("boom".to_string())
                .to_string()
                .contains("boom")
        );
    }
}
