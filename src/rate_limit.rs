use async_trait::async_trait;
use dashmap::DashMap;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::identity::{Identity, Tier};
use crate::metrics::STORE_FAILURES_TOTAL;

// Lua keeps INCR + first-increment EXPIRE a single atomic step, so two
// concurrent requests from one identity can't both see a stale count or
// leave the key without a TTL.
const INCR_WINDOW_SCRIPT: &str = r"
    local count = redis.call('INCR', KEYS[1])
    if count == 1 then
        redis.call('EXPIRE', KEYS[1], ARGV[1])
    end
    return count
";

#[derive(Debug, Error)]
pub enum CounterStoreError {
    #[error("Counter store backend error: {0}")]
    Backend(String),

    #[error("Counter store call timed out after {0:?}")]
    Timeout(Duration),
}

// Fixed-window counter backend. Injected into the limiter at startup so
// deployments pick Redis or in-process and tests can substitute doubles.
#[async_trait]
pub trait CounterStore: Send + Sync {
    // Atomically bump the counter for `key`. The window's TTL starts at the
    // first increment. Returns the post-increment count.
    async fn incr_window(&self, key: &str, window: Duration) -> Result<i64, CounterStoreError>;

    // Current count for `key` while its window is live, None once expired.
    async fn get(&self, key: &str) -> Result<Option<i64>, CounterStoreError>;
}

// Redis-backed counters, shared across gateway instances
pub struct RedisCounterStore {
    conn: redis::aio::ConnectionManager,
    script: redis::Script,
    timeout: Duration,
}

impl RedisCounterStore {
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self {
            conn,
            script: redis::Script::new(INCR_WINDOW_SCRIPT),
            timeout,
        })
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn incr_window(&self, key: &str, window: Duration) -> Result<i64, CounterStoreError> {
        let mut conn = self.conn.clone();
        let call = async move {
            let count: i64 = self
                .script
                .key(key)
                .arg(window.as_secs())
                .invoke_async(&mut conn)
                .await?;
            Ok::<_, redis::RedisError>(count)
        };

        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| CounterStoreError::Timeout(self.timeout))?
            .map_err(|e| CounterStoreError::Backend(e.to_string()))
    }

    async fn get(&self, key: &str) -> Result<Option<i64>, CounterStoreError> {
        let mut conn = self.conn.clone();
        let call = async move { conn.get::<_, Option<i64>>(key).await };

        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| CounterStoreError::Timeout(self.timeout))?
            .map_err(|e| CounterStoreError::Backend(e.to_string()))
    }
}

struct WindowEntry {
    count: i64,
    window_start: Instant,
    window: Duration,
}

// In-process counters for single-instance deployments and tests. Same
// fixed-window semantics as the Redis backend: the window starts at the
// first request and the count resets once it lapses.
#[derive(Default)]
pub struct MemoryCounterStore {
    counters: DashMap<String, WindowEntry>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn incr_window(&self, key: &str, window: Duration) -> Result<i64, CounterStoreError> {
        let mut entry = self
            .counters
            .entry(key.to_string())
            .or_insert(WindowEntry {
                count: 0,
                window_start: Instant::now(),
                window,
            });

        if entry.window_start.elapsed() >= entry.window {
            entry.count = 0;
            entry.window_start = Instant::now();
            entry.window = window;
        }

        entry.count += 1;
        Ok(entry.count)
    }

    async fn get(&self, key: &str) -> Result<Option<i64>, CounterStoreError> {
        Ok(self
            .counters
            .get(key)
            .filter(|e| e.window_start.elapsed() < e.window)
            .map(|e| e.count))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierLimit {
    pub max_requests: u32,
    pub window: Duration,
}

// Explicit per-tier ceilings. Defaults mirror the platform policy of
// 20/100/500 requests per minute.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    unauthenticated: TierLimit,
    authenticated: TierLimit,
    admin: TierLimit,
}

impl RateLimitPolicy {
    pub fn new(unauthenticated: u32, authenticated: u32, admin: u32, window: Duration) -> Self {
        Self {
            unauthenticated: TierLimit {
                max_requests: unauthenticated,
                window,
            },
            authenticated: TierLimit {
                max_requests: authenticated,
                window,
            },
            admin: TierLimit {
                max_requests: admin,
                window,
            },
        }
    }

    // Single ceiling for everyone, tiers collapsed
    pub fn flat(max_requests: u32, window: Duration) -> Self {
        Self::new(max_requests, max_requests, max_requests, window)
    }

    pub fn limit_for(&self, tier: Tier) -> TierLimit {
        match tier {
            Tier::Unauthenticated => self.unauthenticated,
            Tier::Authenticated => self.authenticated,
            Tier::Admin => self.admin,
        }
    }
}

// Decides allow/deny for one identity. Store trouble fails OPEN: a broken
// counter store must not become a full outage, so the request goes through
// and the failure is logged and counted.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, policy: RateLimitPolicy) -> Self {
        Self { store, policy }
    }

    // true = allowed
    pub async fn check(&self, identity: &Identity) -> bool {
        let limit = self.policy.limit_for(identity.tier);
        let key = format!("rate:{}", identity.key);

        match self.store.incr_window(&key, limit.window).await {
            Ok(count) if count > limit.max_requests as i64 => {
                tracing::debug!(
                    key = %key,
                    count = count,
                    limit = limit.max_requests,
                    "Rate limit exceeded"
                );
                false
            }
            Ok(_) => true,
            Err(e) => {
                STORE_FAILURES_TOTAL.inc();
                tracing::warn!(key = %key, error = %e, "Counter store unavailable, allowing request");
                true
            }
        }
    }
}
