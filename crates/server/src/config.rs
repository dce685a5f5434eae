//! Configuration loading and validation for the HTTP service.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any variable is invalid.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// TCP port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Tracing log level (e.g. `"info"`, `"debug"`). `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// OTLP endpoint for span export. Logs only when unset.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Origins allowed by CORS and, when enforced, by the origin check.
    /// Empty means any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Reject POST requests whose `Origin`/`Referer` is not allow-listed.
    #[serde(default)]
    pub enforce_origin: bool,

    /// Requests admitted per client per window. `0` disables rate limiting.
    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,

    /// Length of the rate-limit window in seconds.
    #[serde(default = "default_rate_limit_window")]
    pub rate_limit_window_secs: u64,

    /// Key rate limits on the first `X-Forwarded-For` entry instead of the peer address.
    #[serde(default)]
    pub trust_forwarded_for: bool,

    /// Reject tokens older than this many seconds. Unset accepts any age.
    #[serde(default)]
    pub max_token_age_secs: Option<u64>,
}

fn default_listen_port() -> u16 {
    8000
}
fn default_log_level() -> String {
    "info".into()
}
fn default_rate_limit_max_requests() -> u32 {
    20
}
fn default_rate_limit_window() -> u64 {
    60
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// `ALLOWED_ORIGINS` is parsed as a comma-separated list.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("allowed_origins"),
            )
            .build()
            .context("failed to build configuration from environment")?;

        let mut c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.normalise();
        c.validate()?;
        Ok(c)
    }

    /// Rate-limit window as a [`Duration`].
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    /// Token age ceiling as a [`Duration`], if configured.
    pub fn max_token_age(&self) -> Option<Duration> {
        self.max_token_age_secs.map(Duration::from_secs)
    }

    /// Trim whitespace and trailing slashes from origins and drop empty entries.
    fn normalise(&mut self) {
        self.allowed_origins = self
            .allowed_origins
            .iter()
            .map(|o| o.trim().trim_end_matches('/').to_owned())
            .filter(|o| !o.is_empty())
            .collect();
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.listen_port == 0 {
            anyhow::bail!("LISTEN_PORT must be > 0");
        }
        if self.rate_limit_window_secs == 0 {
            anyhow::bail!("RATE_LIMIT_WINDOW_SECS must be > 0");
        }
        if self.max_token_age_secs == Some(0) {
            anyhow::bail!("MAX_TOKEN_AGE_SECS must be > 0 when set");
        }
        if self.enforce_origin && self.allowed_origins.is_empty() {
            anyhow::bail!("ENFORCE_ORIGIN requires a non-empty ALLOWED_ORIGINS");
        }
        if let Some(endpoint) = &self.otel_exporter_otlp_endpoint {
            if endpoint.trim().is_empty() {
                anyhow::bail!("OTEL_EXPORTER_OTLP_ENDPOINT must not be empty when set");
            }
        }
        Ok(())
    }
}
