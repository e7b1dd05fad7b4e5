use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderMap, Response, header};
use std::time::Duration;

use crate::error::GatewayError;

// One upstream service behind the gateway
#[derive(Debug, Clone)]
pub struct Route {
    pub name: String,
    pub prefix: String,
    pub upstream: String,
}

// Static prefix -> upstream table. Built once at startup, never mutated.
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    // Create from comma-separated "prefix=upstream" pairs. Order is kept -
    // the first prefix the path starts with wins.
    pub fn parse(routes_str: &str) -> Self {
        let routes: Vec<Route> = routes_str
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|entry| {
                let (prefix, upstream) = entry.split_once('=').unwrap_or_else(|| {
                    panic!("Invalid route entry {entry:?}, expected prefix=upstream")
                });
                Route {
                    name: service_name(prefix),
                    prefix: prefix.to_string(),
                    upstream: upstream.trim_end_matches('/').to_string(),
                }
            })
            .collect();

        if routes.is_empty() {
            panic!("At least one route required");
        }

        Self { routes }
    }

    pub fn resolve(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|r| path.starts_with(&r.prefix))
    }

    // All routes, in configuration order (for the health aggregator)
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

// Short service name for health reports, e.g. "/api/v1/books" -> "books"
fn service_name(prefix: &str) -> String {
    prefix
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(prefix)
        .to_string()
}

// Upstream target: matched prefix stripped, remainder appended to the
// upstream base, query carried over unchanged.
pub fn target_url(route: &Route, path: &str, query: Option<&str>) -> String {
    let rest = &path[route.prefix.len()..];
    match query {
        Some(q) => format!("{}{}?{}", route.upstream, rest, q),
        None => format!("{}{}", route.upstream, rest),
    }
}

// Everything is forwarded except Host - the outbound client sets its own
// from the target URL, and leaking ours confuses upstream virtual hosting.
pub fn forwarded_headers(mut headers: HeaderMap) -> HeaderMap {
    headers.remove(header::HOST);
    headers
}

// Forward a matched request to its upstream and relay the response
// untouched. Timeouts map to 504, everything else reqwest reports to 502.
pub async fn forward(
    client: &reqwest::Client,
    route: &Route,
    req: Request,
    timeout: Duration,
) -> Result<Response<Body>, GatewayError> {
    let (parts, body) = req.into_parts();

    let target = target_url(route, parts.uri.path(), parts.uri.query());

    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|e| GatewayError::ReadBody(e.to_string()))?;

    tracing::debug!(service = %route.name, target = %target, "Proxying request");

    let result = client
        .request(parts.method, &target)
        .headers(forwarded_headers(parts.headers))
        .body(body_bytes)
        .timeout(timeout)
        .send()
        .await;

    let upstream_resp = match result {
        Ok(resp) => resp,
        Err(e) if e.is_timeout() => return Err(GatewayError::UpstreamTimeout(timeout)),
        Err(e) => return Err(GatewayError::UpstreamUnavailable(e.to_string())),
    };

    let status = upstream_resp.status();
    let resp_headers = upstream_resp.headers().clone();
    let resp_body = match upstream_resp.bytes().await {
        Ok(bytes) => bytes,
        Err(e) if e.is_timeout() => return Err(GatewayError::UpstreamTimeout(timeout)),
        Err(e) => return Err(GatewayError::UpstreamUnavailable(e.to_string())),
    };

    let mut response = Response::builder().status(status);
    if let Some(headers) = response.headers_mut() {
        *headers = resp_headers;
    }

    Ok(response.body(Body::from(resp_body)).unwrap())
}
