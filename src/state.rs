use std::time::Duration;

use crate::identity::IdentityClassifier;
use crate::proxy::RouteTable;
use crate::rate_limit::RateLimiter;

// App's shared state. Everything is constructed once in main and handed to
// the handlers - no module-level clients or connections.
pub struct AppState {
    pub client: reqwest::Client,
    pub routes: RouteTable,
    pub limiter: RateLimiter,
    pub classifier: IdentityClassifier,
    pub proxy_timeout: Duration,   // per-request deadline for proxied calls
    pub health_timeout: Duration,  // deadline for each health probe
}
