//! Axum router construction.

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
///
/// The POST routes pass the origin check first, then the rate limiter, so
/// rejected origins do not spend a client's budget.
pub fn build(state: AppState) -> Router {
    let api = Router::new()
        .route("/generate-key", post(handlers::generate_key))
        .route("/encrypt", post(handlers::encrypt))
        .route("/decrypt", post(handlers::decrypt))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::enforce_rate_limit,
        ))
        .route_layer(from_fn_with_state(state.clone(), middleware::check_origin));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(api)
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(middleware::REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        .layer(middleware::cors_layer(&state.allowed_origins))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(middleware::UuidRequestId))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use crypto::TokenPolicy;
    use tower::ServiceExt;

    use crate::server::rate_limit::MockRateLimiter;

    fn post_empty(uri: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let app = build(AppState::default());
        let req = Request::builder()
            .uri("/unknown")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn health_route_exists() {
        let app = build(AppState::default());
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let app = build(AppState::default());
        let resp = app.oneshot(post_empty("/generate-key")).await.unwrap();
        assert_eq!(resp.status(), 200);
        assert!(resp.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn rate_limiter_rejection_returns_429() {
        let mut limiter = MockRateLimiter::new();
        limiter.expect_record().times(1).returning(|_| false);
        let state = AppState::new(Arc::new(limiter), TokenPolicy::default());
        let resp = build(state)
            .oneshot(post_empty("/generate-key"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn status_routes_skip_rate_limiter() {
        let mut limiter = MockRateLimiter::new();
        limiter.expect_record().never();
        let app = build(AppState::new(Arc::new(limiter), TokenPolicy::default()));
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn enforced_origin_rejects_unlisted_caller() {
        let mut limiter = MockRateLimiter::new();
        limiter.expect_record().never();
        let state = AppState::new(Arc::new(limiter), TokenPolicy::default())
            .with_allowed_origins(vec!["https://example.github.io".into()], true);
        let req = Request::builder()
            .method(Method::POST)
            .uri("/generate-key")
            .header(header::ORIGIN, "https://evil.example")
            .body(Body::empty())
            .unwrap();
        let resp = build(state).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn enforced_origin_admits_listed_caller() {
        let state = AppState::default()
            .with_allowed_origins(vec!["https://example.github.io".into()], true);
        let req = Request::builder()
            .method(Method::POST)
            .uri("/generate-key")
            .header(header::ORIGIN, "https://example.github.io")
            .body(Body::empty())
            .unwrap();
        let resp = build(state).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://example.github.io"
        );
    }

    #[tokio::test]
    async fn cors_preflight_is_answered() {
        let app = build(AppState::default());
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/encrypt")
            .header(header::ORIGIN, "https://anywhere.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
