use clap::Parser;

// CLI argument structure. Every flag can also come from the environment,
// matching how the services pick up settings in compose files.
#[derive(Parser, Debug, Clone)]
#[command(name = "bookstore-gateway")]
#[command(about = "Routing and rate limiting gateway for the bookstore services")]
pub struct Args {
    // Port to run the gateway on
    #[arg(short, long, env = "GATEWAY_PORT", default_value_t = 8000)]
    pub port: u16,

    // Route table (comma-separated, matched in the order given)
    // Example: "/api/v1/books=http://books:8002/api/v1/books"
    #[arg(
        long,
        env = "GATEWAY_ROUTES",
        default_value = "/api/v1/auth=http://auth:8001/api/v1/auth,\
                         /api/v1/books=http://books:8002/api/v1/books,\
                         /api/v1/orders=http://orders:8003/api/v1/orders,\
                         /api/v1/reviews=http://reviews:8004/api/v1/reviews"
    )]
    pub routes: String,

    // Redis URL for the rate limit counters. When unset the gateway keeps
    // counters in process (fine for a single instance).
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    // Secret used to decode access tokens when classifying requesters
    #[arg(long, env = "JWT_SECRET_KEY", default_value = "supersecretkey")]
    pub jwt_secret: String,

    // Rate limit max requests per window, per tier
    #[arg(long, env = "RATE_LIMIT_ANON", default_value_t = 20)]
    pub rate_limit_anon: u32,

    #[arg(long, env = "RATE_LIMIT", default_value_t = 100)]
    pub rate_limit: u32,

    #[arg(long, env = "RATE_LIMIT_ADMIN", default_value_t = 500)]
    pub rate_limit_admin: u32,

    // Rate limit window in seconds
    #[arg(long, env = "RATE_WINDOW", default_value_t = 60)]
    pub rate_window: u64,

    // Per-request deadline for proxied upstream calls, in seconds
    #[arg(long, env = "UPSTREAM_TIMEOUT", default_value_t = 5)]
    pub upstream_timeout: u64,

    // Deadline for each health probe, in seconds
    #[arg(long, env = "HEALTH_TIMEOUT", default_value_t = 2)]
    pub health_timeout: u64,

    // Deadline for counter store calls, in seconds. On expiry the limiter
    // fails open rather than holding the request.
    #[arg(long, env = "STORE_TIMEOUT", default_value_t = 1)]
    pub store_timeout: u64,
}
