//! Shared application state injected into every Axum handler.

use std::{sync::Arc, time::Duration};

use crypto::TokenPolicy;

use super::rate_limit::{RateLimiter, SlidingWindowLimiter};
use crate::config::Config;

/// Application state shared across all request handlers.
///
/// All fields are cheaply cloneable (`Arc`-wrapped or `Copy`) so that Axum can
/// clone the state for each request without copying expensive data. The state
/// holds no keys or tokens; every request is self-contained.
#[derive(Clone)]
pub struct AppState {
    /// Per-client admission control for the POST routes.
    pub rate_limiter: Arc<dyn RateLimiter>,
    /// Age policy applied to every decryption.
    pub token_policy: TokenPolicy,
    /// Origins allowed by CORS and the origin check. Empty means any.
    pub allowed_origins: Arc<Vec<String>>,
    /// Whether the origin check rejects unlisted origins.
    pub enforce_origin: bool,
    /// Whether the rate limiter keys on `X-Forwarded-For`.
    pub trust_forwarded_for: bool,
}

impl AppState {
    /// Create a new [`AppState`] with an explicit rate limiter.
    pub fn new(rate_limiter: Arc<dyn RateLimiter>, token_policy: TokenPolicy) -> Self {
        Self {
            rate_limiter,
            token_policy,
            allowed_origins: Arc::new(Vec::new()),
            enforce_origin: false,
            trust_forwarded_for: false,
        }
    }

    /// Build state from validated configuration around `rate_limiter`.
    pub fn from_config(cfg: &Config, rate_limiter: Arc<dyn RateLimiter>) -> Self {
        let token_policy = TokenPolicy {
            max_age: cfg.max_token_age(),
        };
        Self {
            allowed_origins: Arc::new(cfg.allowed_origins.clone()),
            enforce_origin: cfg.enforce_origin,
            trust_forwarded_for: cfg.trust_forwarded_for,
            ..Self::new(rate_limiter, token_policy)
        }
    }

    /// Restrict origins; enforcement applies to the POST routes.
    pub fn with_allowed_origins(mut self, origins: Vec<String>, enforce: bool) -> Self {
        self.allowed_origins = Arc::new(origins);
        self.enforce_origin = enforce;
        self
    }
}

impl Default for AppState {
    /// Creates a default [`AppState`] with a 20-per-minute limiter, suitable for tests.
    fn default() -> Self {
        Self::new(
            Arc::new(SlidingWindowLimiter::new(20, Duration::from_secs(60))),
            TokenPolicy::default(),
        )
    }
}
