//! `fernet-svc` HTTP service: a thin axum shell around the `crypto` engine.

pub mod config;
pub mod server;
pub mod telemetry;

pub use config::Config;
pub use server::{router, state::AppState};
