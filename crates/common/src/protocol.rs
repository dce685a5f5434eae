//! Request and response bodies of the public JSON API.

use serde::{Deserialize, Serialize};

/// Text returned by `GET /`.
pub const STATUS_MESSAGE: &str = "Fernet Encryptor API is running";

// ---------------------------------------------------------------------------
// Key generation
// ---------------------------------------------------------------------------

/// Response body for `POST /generate-key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyResponse {
    /// URL-safe base64 of 32 random bytes.
    pub key: String,
}

// ---------------------------------------------------------------------------
// Encrypt endpoint
// ---------------------------------------------------------------------------

/// Request body for `POST /encrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptRequest {
    /// UTF-8 text to encrypt. May be empty.
    pub message: String,
    /// Key to encrypt under. A new key is generated when absent or empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl EncryptRequest {
    /// The caller's key, treating an empty string as absent.
    pub fn supplied_key(&self) -> Option<&str> {
        self.key.as_deref().filter(|k| !k.is_empty())
    }
}

/// Successful response body for `POST /encrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptResponse {
    /// Token text.
    pub encrypted_message: String,
    /// The key the token was sealed with; the caller must keep it.
    pub key: String,
}

// ---------------------------------------------------------------------------
// Decrypt endpoint
// ---------------------------------------------------------------------------

/// Request body for `POST /decrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptRequest {
    pub encrypted_message: String,
    pub key: String,
}

/// Successful response body for `POST /decrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptResponse {
    pub decrypted_message: String,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"decryption_failed"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub detail: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and detail message.
    pub fn new(code: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            detail: detail.into(),
        }
    }
}

impl From<&crate::ServiceError> for ErrorResponse {
    fn from(err: &crate::ServiceError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Status and health
// ---------------------------------------------------------------------------

/// Response body for `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub message: String,
}

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process serves requests.
    pub status: String,
    /// Crate version of the running binary.
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServiceError;
    use serde_json::json;

    #[test]
    fn encrypt_request_key_is_optional() {
        let req: EncryptRequest = serde_json::from_value(json!({"message": "hi"})).unwrap();
        assert!(req.key.is_none());
        assert_eq!(req.supplied_key(), None);
    }

    #[test]
    fn empty_key_counts_as_absent() {
        let req: EncryptRequest =
            serde_json::from_value(json!({"message": "hi", "key": ""})).unwrap();
        assert_eq!(req.supplied_key(), None);
    }

    #[test]
    fn encrypt_request_requires_message() {
        assert!(serde_json::from_value::<EncryptRequest>(json!({"key": "abc"})).is_err());
    }

    #[test]
    fn decrypt_request_requires_both_fields() {
        assert!(serde_json::from_value::<DecryptRequest>(json!({"key": "abc"})).is_err());
        assert!(
            serde_json::from_value::<DecryptRequest>(json!({"encrypted_message": "abc"})).is_err()
        );
    }

    #[test]
    fn error_response_from_service_error() {
        let e = ErrorResponse::from(&ServiceError::DecryptionFailed);
        assert_eq!(e.code, "decryption_failed");
        assert!(e.detail.contains("Failed to decrypt message"));
    }

    #[test]
    fn error_response_serialises_detail_field() {
        let value = serde_json::to_value(ErrorResponse::new("bad_request", "nope")).unwrap();
        assert_eq!(value, json!({"code": "bad_request", "detail": "nope"}));
    }
}
