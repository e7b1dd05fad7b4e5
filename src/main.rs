use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bookstore_gateway::config::Args;
use bookstore_gateway::identity::IdentityClassifier;
use bookstore_gateway::proxy::RouteTable;
use bookstore_gateway::rate_limit::{
    CounterStore, MemoryCounterStore, RateLimitPolicy, RateLimiter, RedisCounterStore,
};
use bookstore_gateway::router;
use bookstore_gateway::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let routes = RouteTable::parse(&args.routes);
    for route in routes.routes() {
        tracing::info!(
            service = %route.name,
            prefix = %route.prefix,
            upstream = %route.upstream,
            "Route configured"
        );
    }

    let store_timeout = Duration::from_secs(args.store_timeout);
    let store: Arc<dyn CounterStore> = match &args.redis_url {
        Some(url) => {
            let store = RedisCounterStore::connect(url, store_timeout)
                .await
                .expect("Failed to connect to Redis");
            tracing::info!("Rate limit counters in Redis");
            Arc::new(store)
        }
        None => {
            tracing::info!("Rate limit counters in process memory");
            Arc::new(MemoryCounterStore::new())
        }
    };

    let policy = RateLimitPolicy::new(
        args.rate_limit_anon,
        args.rate_limit,
        args.rate_limit_admin,
        Duration::from_secs(args.rate_window),
    );

    let state = Arc::new(AppState {
        client: reqwest::Client::new(),
        routes,
        limiter: RateLimiter::new(store, policy),
        classifier: IdentityClassifier::new(&args.jwt_secret),
        proxy_timeout: Duration::from_secs(args.upstream_timeout),
        health_timeout: Duration::from_secs(args.health_timeout),
    });

    let app = router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();

    tracing::info!(
        "Gateway running on http://localhost:{}, rate limits {}/{}/{} requests per {} seconds",
        args.port,
        args.rate_limit_anon,
        args.rate_limit,
        args.rate_limit_admin,
        args.rate_window
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
