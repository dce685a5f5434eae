//! Axum middleware layers applied to the router.
//!
//! Includes CORS, request IDs, origin allow-listing, and per-client rate limiting.
//! Tracing, timeout, and compression layers come straight from `tower-http`.

use std::{net::SocketAddr, time::Duration};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use common::ServiceError;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestId, RequestId},
};
use tracing::warn;

use super::{handlers::ApiError, state::AppState};

/// Default per-request timeout applied to all routes.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How often idle rate-limit entries are pruned.
pub const RATE_LIMIT_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Build the CORS layer: any origin when `allowed` is empty, else exactly the list.
pub fn cors_layer(allowed: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);
    if allowed.is_empty() {
        return base.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = allowed
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    base.allow_origin(AllowOrigin::list(origins))
}

/// Generates a UUID v4 `x-request-id` for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&uuid::Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Reject requests whose `Origin` or `Referer` is not allow-listed.
///
/// A no-op unless origin enforcement is enabled.
pub async fn check_origin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if !state.enforce_origin {
        return next.run(req).await;
    }
    let headers = req.headers();
    let origin = header_str(headers, header::ORIGIN);
    let referer = header_str(headers, header::REFERER);
    if origin_allowed(&state.allowed_origins, origin, referer) {
        return next.run(req).await;
    }
    warn!(origin, referer, "request origin not allowed");
    ApiError(ServiceError::Forbidden("origin not allowed".into())).into_response()
}

/// Count the request against the caller's budget; `429` once it is spent.
pub async fn enforce_rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let key = client_key(&req, state.trust_forwarded_for);
    if state.rate_limiter.record(&key).await {
        return next.run(req).await;
    }
    warn!(client = %key, path = %req.uri().path(), "rate limit exceeded");
    ApiError(ServiceError::RateLimited).into_response()
}

/// `true` if `origin` equals an allowed origin or `referer` lies under one.
pub fn origin_allowed(allowed: &[String], origin: Option<&str>, referer: Option<&str>) -> bool {
    if let Some(origin) = origin {
        let origin = origin.trim_end_matches('/');
        if allowed.iter().any(|a| a == origin) {
            return true;
        }
    }
    if let Some(referer) = referer {
        return allowed.iter().any(|a| {
            referer == a.as_str()
                || referer
                    .strip_prefix(a.as_str())
                    .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?'))
        });
    }
    false
}

/// Identify the client for rate limiting.
///
/// Uses the first `X-Forwarded-For` entry when trusted, then the peer address.
fn client_key(req: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = header_str(req.headers(), "x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_owned();
        }
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".into())
}

fn header_str<K: header::AsHeaderName>(headers: &HeaderMap, name: K) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
