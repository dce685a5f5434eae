//! Axum request handlers for all service endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{
    protocol::{
        DecryptRequest, DecryptResponse, EncryptRequest, EncryptResponse, ErrorResponse,
        HealthResponse, KeyResponse, StatusResponse, STATUS_MESSAGE,
    },
    ServiceError,
};
use crypto::CryptoError;
use tracing::{debug, error, info};

use super::state::AppState;

/// A [`ServiceError`] rendered as a JSON error body with its HTTP status.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl From<CryptoError> for ApiError {
    fn from(err: CryptoError) -> Self {
        if let CryptoError::Entropy(reason) = &err {
            error!(%reason, "random source failure");
        }
        Self(err.into())
    }
}

/// `GET /`: status text for the frontend's liveness probe.
pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        message: STATUS_MESSAGE.into(),
    })
}

/// `GET /health`: liveness check. The service has no dependencies, so this is
/// always `200 OK` while the process is serving.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// `POST /generate-key`: return a fresh random key.
pub async fn generate_key() -> Result<Json<KeyResponse>, ApiError> {
    let key = crypto::generate_key()?;
    debug!("key generated");
    Ok(Json(KeyResponse {
        key: key.to_base64(),
    }))
}

/// `POST /encrypt`: encrypt `message`, generating a key when none is supplied.
pub async fn encrypt(
    payload: Result<Json<EncryptRequest>, JsonRejection>,
) -> Result<Json<EncryptResponse>, ApiError> {
    let Json(req) = payload.map_err(bad_body)?;
    let generated_key = req.supplied_key().is_none();

    let sealed = crypto::encrypt(req.message.as_bytes(), req.supplied_key()).map_err(|e| {
        debug!(error = %e, "encryption rejected");
        ApiError::from(e)
    })?;

    info!(bytes = req.message.len(), generated_key, "message encrypted");
    Ok(Json(EncryptResponse {
        encrypted_message: sealed.token,
        key: sealed.key,
    }))
}

/// `POST /decrypt`: verify and decrypt `encrypted_message` under `key`.
///
/// Malformed tokens, tag mismatches, expired tokens, and non-UTF-8 plaintext
/// all produce the same `400` body.
pub async fn decrypt(
    State(state): State<AppState>,
    payload: Result<Json<DecryptRequest>, JsonRejection>,
) -> Result<Json<DecryptResponse>, ApiError> {
    let Json(req) = payload.map_err(bad_body)?;

    let plaintext = crypto::decrypt(&req.encrypted_message, &req.key, state.token_policy)
        .map_err(|e| {
            debug!(error = %e, "decryption rejected");
            ApiError::from(e)
        })?;
    let decrypted_message = String::from_utf8(plaintext).map_err(|_| {
        debug!("decrypted plaintext is not UTF-8");
        ServiceError::DecryptionFailed
    })?;

    info!(bytes = decrypted_message.len(), "message decrypted");
    Ok(Json(DecryptResponse { decrypted_message }))
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

fn bad_body(rejection: JsonRejection) -> ApiError {
    ApiError(ServiceError::BadRequest(rejection.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
        routing::{get, post},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_router() -> Router {
        Router::new()
            .route("/", get(root))
            .route("/generate-key", post(generate_key))
            .route("/encrypt", post(encrypt))
            .route("/decrypt", post(decrypt))
            .with_state(AppState::default())
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn root_reports_running() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let resp = test_router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"message": "Fernet Encryptor API is running"}));
    }

    #[tokio::test]
    async fn encrypt_then_decrypt() {
        let (status, sealed) =
            post_json(test_router(), "/encrypt", json!({"message": "Hello, Decryption!"})).await;
        assert_eq!(status, StatusCode::OK);

        let (status, opened) = post_json(
            test_router(),
            "/decrypt",
            json!({"encrypted_message": sealed["encrypted_message"], "key": sealed["key"]}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(opened["decrypted_message"], "Hello, Decryption!");
    }

    #[tokio::test]
    async fn encrypt_rejects_invalid_key() {
        let (status, body) = post_json(
            test_router(),
            "/encrypt",
            json!({"message": "Hello, World!", "key": "invalid-key"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_key_format");
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .contains("Invalid encryption key format"));
    }

    #[tokio::test]
    async fn encrypt_missing_message_is_bad_request() {
        let (status, body) = post_json(test_router(), "/encrypt", json!({"key": null})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "bad_request");
    }

    #[tokio::test]
    async fn decrypt_missing_field_is_bad_request() {
        let (status, _) =
            post_json(test_router(), "/decrypt", json!({"encrypted_message": "abc"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn decrypt_garbage_token_is_generic_failure() {
        let key = crypto::generate_key().unwrap().to_base64();
        let (status, body) = post_json(
            test_router(),
            "/decrypt",
            json!({"encrypted_message": "invalid-encrypted-message", "key": key}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "decryption_failed");
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .contains("Failed to decrypt message"));
    }

    #[tokio::test]
    async fn decrypt_non_utf8_plaintext_is_generic_failure() {
        let sealed = crypto::encrypt(&[0xff, 0xfe, 0xfd], None).unwrap();
        let (status, body) = post_json(
            test_router(),
            "/decrypt",
            json!({"encrypted_message": sealed.token, "key": sealed.key}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "decryption_failed");
    }

    #[test]
    fn api_error_maps_status() {
        let resp = ApiError(ServiceError::RateLimited).into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        let resp = ApiError::from(CryptoError::Entropy("x".into())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
