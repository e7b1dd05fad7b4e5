use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::proxy::Route;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Unhealthy,
}

// Composite health across all configured upstreams
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub services: BTreeMap<String, ServiceStatus>,
    pub timestamp: String,
}

// Probe every upstream's /health concurrently, so the whole check costs the
// slowest single probe rather than the sum. A failed probe only downgrades
// its own service.
pub async fn check_services(
    client: &reqwest::Client,
    routes: &[Route],
    timeout: Duration,
) -> HealthReport {
    let handles: Vec<_> = routes
        .iter()
        .map(|route| {
            let client = client.clone();
            let url = format!("{}/health", origin(&route.upstream));
            let name = route.name.clone();
            (
                name,
                tokio::spawn(async move { probe(&client, &url, timeout).await }),
            )
        })
        .collect();

    let mut services = BTreeMap::new();
    for (name, handle) in handles {
        let status = handle.await.unwrap_or(ServiceStatus::Unhealthy);
        services.insert(name, status);
    }

    HealthReport {
        status: overall(&services),
        services,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

async fn probe(client: &reqwest::Client, url: &str, timeout: Duration) -> ServiceStatus {
    match client.get(url).timeout(timeout).send().await {
        Ok(res) if res.status().is_success() => ServiceStatus::Healthy,
        Ok(res) => {
            tracing::debug!(url = %url, status = %res.status(), "Health probe returned non-success");
            ServiceStatus::Unhealthy
        }
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "Health probe failed");
            ServiceStatus::Unhealthy
        }
    }
}

fn overall(services: &BTreeMap<String, ServiceStatus>) -> &'static str {
    if services.values().all(|s| *s == ServiceStatus::Healthy) {
        "healthy"
    } else {
        "degraded"
    }
}

// Health endpoints live at the service root, not under the proxied prefix:
// http://books:8002/api/v1/books -> http://books:8002/health
fn origin(upstream: &str) -> String {
    match reqwest::Url::parse(upstream) {
        Ok(url) => url.origin().ascii_serialization(),
        Err(_) => upstream.trim_end_matches('/').to_string(),
    }
}
