//! Per-client request rate limiting.
//!
//! The limiter sits behind the [`RateLimiter`] trait so the in-process
//! [`SlidingWindowLimiter`] can be replaced by a shared store when the service
//! runs as several replicas.

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use tokio::{
    sync::Mutex,
    time::{self, Instant},
};
use tracing::debug;

/// Admission decision for one request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Record a request from `key`. Returns `false` if it exceeds the budget.
    async fn record(&self, key: &str) -> bool;
}

/// In-memory sliding-window limiter keyed by client identifier.
///
/// Each key keeps the instants of its admitted requests inside the current
/// window. Rejected requests are not recorded.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    max_requests: u32,
    window: Duration,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    /// Create a limiter admitting `max_requests` per `window`. `0` admits everything.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Drop expired instants and forget keys with no recent requests.
    pub async fn prune(&self) {
        let now = Instant::now();
        let mut hits = self.hits.lock().await;
        let before = hits.len();
        hits.retain(|_, times| {
            evict_expired(times, now, self.window);
            !times.is_empty()
        });
        debug!(removed = before - hits.len(), tracked = hits.len(), "rate limiter pruned");
    }

    /// Number of client keys currently tracked.
    pub async fn tracked_keys(&self) -> usize {
        self.hits.lock().await.len()
    }
}

#[async_trait]
impl RateLimiter for SlidingWindowLimiter {
    async fn record(&self, key: &str) -> bool {
        if self.max_requests == 0 {
            return true;
        }
        let now = Instant::now();
        let mut hits = self.hits.lock().await;
        let times = hits.entry(key.to_owned()).or_default();
        evict_expired(times, now, self.window);
        if times.len() >= self.max_requests as usize {
            return false;
        }
        times.push_back(now);
        true
    }
}

fn evict_expired(times: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while times
        .front()
        .is_some_and(|t| now.duration_since(*t) >= window)
    {
        times.pop_front();
    }
}

/// Spawn a background task that prunes `limiter` every `interval`.
pub fn prune_task(
    limiter: Arc<SlidingWindowLimiter>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        // First tick fires immediately; nothing to prune yet.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            limiter.prune().await;
        }
    })
}
