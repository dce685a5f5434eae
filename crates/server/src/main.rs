//! `fernet-svc`: binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the tracing pipeline (JSON logs, optional OTLP export).
//! 3. Build the rate limiter and spawn its pruning task.
//! 4. Build the Axum router and serve until Ctrl-C / SIGTERM.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use tracing::info;

use server::{
    config::Config,
    server::{middleware, rate_limit},
    telemetry, AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_port = cfg.listen_port,
        rate_limit_max_requests = cfg.rate_limit_max_requests,
        rate_limit_window_secs = cfg.rate_limit_window_secs,
        allowed_origins = cfg.allowed_origins.len(),
        enforce_origin = cfg.enforce_origin,
        max_token_age_secs = cfg.max_token_age_secs,
        "fernet-svc starting"
    );

    // -----------------------------------------------------------------------
    // 3. Rate limiter
    // -----------------------------------------------------------------------
    let limiter = Arc::new(rate_limit::SlidingWindowLimiter::new(
        cfg.rate_limit_max_requests,
        cfg.rate_limit_window(),
    ));
    let _prune = rate_limit::prune_task(limiter.clone(), middleware::RATE_LIMIT_PRUNE_INTERVAL);

    // -----------------------------------------------------------------------
    // 4. HTTP server
    // -----------------------------------------------------------------------
    let state = AppState::from_config(&cfg, limiter);
    let router = server::router::build(state);

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("shut down cleanly");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown signal received");
}
