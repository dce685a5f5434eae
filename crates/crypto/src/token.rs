//! Token codec: lossless conversion between token fields and URL-safe base64 text.
//!
//! # Layout
//!
//! ```text
//! version (1) ‖ timestamp (8, BE) ‖ nonce (16) ‖ ciphertext (n × 16) ‖ tag (32)
//! ```
//!
//! The codec checks structure only. Tag verification and decryption belong to
//! [`crate::cipher`].

use base64::{engine::general_purpose::URL_SAFE, Engine as _};

use crate::CryptoError;

/// Version marker carried by every token.
pub const VERSION: u8 = 0x80;

/// Byte length of the big-endian timestamp field.
pub const TIMESTAMP_LEN: usize = 8;

/// Byte length of the CBC nonce (IV).
pub const NONCE_LEN: usize = 16;

/// Byte length of the HMAC-SHA256 tag.
pub const TAG_LEN: usize = 32;

/// Fixed bytes around the ciphertext: version + timestamp + nonce + tag.
pub const OVERHEAD_LEN: usize = 1 + TIMESTAMP_LEN + NONCE_LEN + TAG_LEN;

/// A decoded (not yet verified) token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    timestamp: u64,
    nonce: [u8; NONCE_LEN],
    ciphertext: Vec<u8>,
    tag: [u8; TAG_LEN],
}

impl Token {
    /// Assemble a token from its fields. The version is always [`VERSION`].
    pub fn new(
        timestamp: u64,
        nonce: [u8; NONCE_LEN],
        ciphertext: Vec<u8>,
        tag: [u8; TAG_LEN],
    ) -> Self {
        Self {
            timestamp,
            nonce,
            ciphertext,
            tag,
        }
    }

    /// Version marker of this token.
    pub fn version(&self) -> u8 {
        VERSION
    }

    /// Seconds since the Unix epoch at encryption time.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn tag(&self) -> &[u8; TAG_LEN] {
        &self.tag
    }

    /// The bytes covered by the tag: version ‖ timestamp ‖ nonce ‖ ciphertext.
    pub fn signed_bytes(&self) -> Vec<u8> {
        signed_bytes(self.timestamp, &self.nonce, &self.ciphertext)
    }

    /// Encode to URL-safe base64 (padded).
    pub fn encode(&self) -> String {
        let mut raw = self.signed_bytes();
        raw.extend_from_slice(&self.tag);
        URL_SAFE.encode(raw)
    }

    /// Decode URL-safe base64 text into a [`Token`].
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MalformedToken`] if the text is not valid base64,
    /// is shorter than [`OVERHEAD_LEN`] bytes, or carries an unknown version.
    pub fn decode(text: &str) -> Result<Self, CryptoError> {
        let raw = URL_SAFE
            .decode(text.trim())
            .map_err(|_| CryptoError::MalformedToken)?;
        if raw.len() < OVERHEAD_LEN || raw[0] != VERSION {
            return Err(CryptoError::MalformedToken);
        }

        let (header, rest) = raw.split_at(1 + TIMESTAMP_LEN);
        let mut ts = [0u8; TIMESTAMP_LEN];
        ts.copy_from_slice(&header[1..]);

        let (nonce_bytes, rest) = rest.split_at(NONCE_LEN);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(nonce_bytes);

        let (ciphertext, tag_bytes) = rest.split_at(rest.len() - TAG_LEN);
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(tag_bytes);

        Ok(Self {
            timestamp: u64::from_be_bytes(ts),
            nonce,
            ciphertext: ciphertext.to_vec(),
            tag,
        })
    }
}

/// Build the HMAC input for the given fields.
pub(crate) fn signed_bytes(timestamp: u64, nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(1 + TIMESTAMP_LEN + NONCE_LEN + ciphertext.len() + TAG_LEN);
    buf.push(VERSION);
    buf.extend_from_slice(&timestamp.to_be_bytes());
    buf.extend_from_slice(nonce);
    buf.extend_from_slice(ciphertext);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Token {
        let nonce: [u8; NONCE_LEN] = core::array::from_fn(|i| i as u8);
        Token::new(499_162_800, nonce, vec![0xAB; 32], [0xCD; TAG_LEN])
    }

    #[test]
    fn encode_decode_preserves_fields() {
        let token = sample();
        let text = token.encode();
        assert!(text.starts_with("gAAAAA"), "version byte 0x80 encodes as 'g', got {text}");
        assert_eq!(Token::decode(&text).unwrap(), token);
    }

    #[test]
    fn header_layout_is_big_endian() {
        let raw = URL_SAFE.decode(sample().encode()).unwrap();
        assert_eq!(raw[0], VERSION);
        assert_eq!(&raw[1..9], &499_162_800u64.to_be_bytes());
        assert_eq!(&raw[9..25], sample().nonce());
        assert_eq!(raw.len(), OVERHEAD_LEN + 32);
    }

    #[test]
    fn empty_ciphertext_is_structurally_valid() {
        let token = Token::new(1, [0; NONCE_LEN], Vec::new(), [0; TAG_LEN]);
        let decoded = Token::decode(&token.encode()).unwrap();
        assert!(decoded.ciphertext().is_empty());
    }

    #[test]
    fn rejects_bad_base64() {
        assert!(matches!(
            Token::decode("invalid-encrypted-message"),
            Err(CryptoError::MalformedToken)
        ));
        assert!(Token::decode("!!!!").is_err());
    }

    #[test]
    fn rejects_short_input() {
        let mut raw = vec![VERSION];
        raw.extend_from_slice(&[0u8; OVERHEAD_LEN - 2]);
        assert!(Token::decode(&URL_SAFE.encode(&raw)).is_err());
        assert!(Token::decode("").is_err());
    }

    #[test]
    fn rejects_unknown_version() {
        let mut raw = URL_SAFE.decode(sample().encode()).unwrap();
        raw[0] = 0x81;
        assert!(matches!(
            Token::decode(&URL_SAFE.encode(&raw)),
            Err(CryptoError::MalformedToken)
        ));
    }
}
