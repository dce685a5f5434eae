//! [`Key`]: the 32-byte symmetric key split into signing and encryption halves.

use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use rand::{rngs::OsRng, TryRngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::CryptoError;

/// Byte length of a full key.
pub const KEY_LEN: usize = 32;

/// Byte length of each key half.
pub const HALF_KEY_LEN: usize = KEY_LEN / 2;

/// Symmetric key: bytes `0..16` sign (HMAC-SHA256), bytes `16..32` encrypt (AES-128-CBC).
///
/// The external form is URL-safe base64 with padding, 44 characters long.
/// Key material is zeroed when the value is dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Key {
    signing: [u8; HALF_KEY_LEN],
    encryption: [u8; HALF_KEY_LEN],
}

impl Key {
    /// Build a key from exactly [`KEY_LEN`] raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyFormat`] for any other length.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != KEY_LEN {
            return Err(CryptoError::InvalidKeyFormat);
        }
        let mut signing = [0u8; HALF_KEY_LEN];
        let mut encryption = [0u8; HALF_KEY_LEN];
        signing.copy_from_slice(&bytes[..HALF_KEY_LEN]);
        encryption.copy_from_slice(&bytes[HALF_KEY_LEN..]);
        Ok(Self {
            signing,
            encryption,
        })
    }

    /// Parse the URL-safe base64 form of a key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyFormat`] if `text` is not valid base64 or
    /// does not decode to [`KEY_LEN`] bytes.
    pub fn from_base64(text: &str) -> Result<Self, CryptoError> {
        let mut raw = URL_SAFE
            .decode(text.trim())
            .map_err(|_| CryptoError::InvalidKeyFormat)?;
        let key = Self::from_bytes(&raw);
        raw.zeroize();
        key
    }

    /// Draw a fresh key from the OS CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Entropy`] if the random source fails.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut raw = [0u8; KEY_LEN];
        fill_random(&mut raw)?;
        let key = Self::from_bytes(&raw);
        raw.zeroize();
        key
    }

    /// Encode the key as URL-safe base64 with padding.
    pub fn to_base64(&self) -> String {
        let mut raw = [0u8; KEY_LEN];
        raw[..HALF_KEY_LEN].copy_from_slice(&self.signing);
        raw[HALF_KEY_LEN..].copy_from_slice(&self.encryption);
        let text = URL_SAFE.encode(raw);
        raw.zeroize();
        text
    }

    /// HMAC-SHA256 key half.
    pub fn signing_key(&self) -> &[u8; HALF_KEY_LEN] {
        &self.signing
    }

    /// AES-128 key half.
    pub fn encryption_key(&self) -> &[u8; HALF_KEY_LEN] {
        &self.encryption
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.write_str("Key([REDACTED])")
    }
}

/// Parse and validate a caller-supplied key.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidKeyFormat`] on bad base64 or wrong length.
pub fn validate_key(text: &str) -> Result<Key, CryptoError> {
    Key::from_base64(text)
}

/// Generate a new random key.
///
/// # Errors
///
/// Returns [`CryptoError::Entropy`] if the OS random source fails.
pub fn generate_key() -> Result<Key, CryptoError> {
    Key::generate()
}

/// Fill `buf` from the OS CSPRNG.
pub(crate) fn fill_random(buf: &mut [u8]) -> Result<(), CryptoError> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| CryptoError::Entropy(e.to_string()))
}
