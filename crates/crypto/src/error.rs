//! Errors produced by the token codec and cipher engine.

use thiserror::Error;

/// Errors produced by the crypto layer.
///
/// [`CryptoError::MalformedToken`] and [`CryptoError::DecryptionFailed`] are kept
/// apart here for diagnostics, but callers facing untrusted clients should
/// report them identically so the response does not reveal which check failed.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The key is not URL-safe base64 or does not decode to exactly 32 bytes.
    #[error("invalid key format")]
    InvalidKeyFormat,

    /// The token is not URL-safe base64, is too short, or carries an unknown version.
    #[error("malformed token")]
    MalformedToken,

    /// Tag mismatch, bad padding, or a token outside the accepted age window.
    #[error("decryption failed")]
    DecryptionFailed,

    /// The OS random source could not produce bytes.
    #[error("entropy source unavailable: {0}")]
    Entropy(String),
}
