//! Axum HTTP server, routing, and middleware.
//!
//! # Responsibilities
//! - Define the Axum router with all routes and shared middleware.
//! - Translate between the JSON protocol and the `crypto` engine.
//! - Apply boundary policy: CORS, origin allow-listing, rate limiting.

pub mod handlers;
pub mod middleware;
pub mod rate_limit;
pub mod router;
pub mod state;
