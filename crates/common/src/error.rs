//! Common error types shared across crates.

use crypto::CryptoError;
use thiserror::Error;

/// Message returned for every decryption failure, whatever its cause.
pub const DECRYPTION_FAILED_MESSAGE: &str =
    "Failed to decrypt message. Check your key and encrypted message.";

/// Message returned when a caller-supplied key cannot be parsed.
pub const INVALID_KEY_MESSAGE: &str = "Invalid encryption key format";

/// Top-level service error type.
///
/// Variants map to HTTP status codes returned to callers:
/// - [`ServiceError::BadRequest`], [`ServiceError::InvalidKeyFormat`],
///   [`ServiceError::DecryptionFailed`] → 400
/// - [`ServiceError::Forbidden`] → 403
/// - [`ServiceError::RateLimited`] → 429
/// - [`ServiceError::Internal`] → 500
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request body was missing, not JSON, or lacked a required field.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The supplied key is not a valid 32-byte URL-safe base64 key.
    #[error("{}", INVALID_KEY_MESSAGE)]
    InvalidKeyFormat,

    /// The token is malformed, was tampered with, or does not match the key.
    /// The causes are deliberately indistinguishable to the caller.
    #[error("{}", DECRYPTION_FAILED_MESSAGE)]
    DecryptionFailed,

    /// The request origin is not on the allow-list.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The client exceeded its request budget for the current window.
    #[error("rate limit exceeded, try again later")]
    RateLimited,

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_)
            | ServiceError::InvalidKeyFormat
            | ServiceError::DecryptionFailed => 400,
            ServiceError::Forbidden(_) => 403,
            ServiceError::RateLimited => 429,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Short machine-readable code placed in the error body.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::InvalidKeyFormat => "invalid_key_format",
            ServiceError::DecryptionFailed => "decryption_failed",
            ServiceError::Forbidden(_) => "forbidden",
            ServiceError::RateLimited => "rate_limited",
            ServiceError::Internal(_) => "internal_error",
        }
    }
}

impl From<CryptoError> for ServiceError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidKeyFormat => ServiceError::InvalidKeyFormat,
            CryptoError::MalformedToken | CryptoError::DecryptionFailed => {
                ServiceError::DecryptionFailed
            }
            CryptoError::Entropy(msg) => ServiceError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_codes() {
        assert_eq!(ServiceError::BadRequest("x".into()).http_status(), 400);
        assert_eq!(ServiceError::InvalidKeyFormat.http_status(), 400);
        assert_eq!(ServiceError::DecryptionFailed.http_status(), 400);
        assert_eq!(ServiceError::Forbidden("x".into()).http_status(), 403);
        assert_eq!(ServiceError::RateLimited.http_status(), 429);
        assert_eq!(ServiceError::Internal("x".into()).http_status(), 500);
    }

    #[test]
    fn display_includes_message() {
        let e = ServiceError::BadRequest("missing field `message`".into());
        assert!(e.to_string().contains("missing field `message`"));
        assert_eq!(
            ServiceError::InvalidKeyFormat.to_string(),
            "Invalid encryption key format"
        );
    }

    #[test]
    fn token_failures_are_indistinguishable() {
        let malformed = ServiceError::from(CryptoError::MalformedToken);
        let mismatch = ServiceError::from(CryptoError::DecryptionFailed);
        assert_eq!(malformed.to_string(), mismatch.to_string());
        assert_eq!(malformed.code(), mismatch.code());
    }

    #[test]
    fn entropy_failure_is_internal() {
        let e = ServiceError::from(CryptoError::Entropy("getrandom".into()));
        assert_eq!(e.http_status(), 500);
    }
}
