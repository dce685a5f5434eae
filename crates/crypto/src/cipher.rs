//! Authenticated encryption with AES-128-CBC + HMAC-SHA256 (the Fernet scheme).
//!
//! Encryption pads the plaintext with PKCS7, encrypts under the encryption half
//! of the key with a fresh random nonce as IV, and signs
//! `version ‖ timestamp ‖ nonce ‖ ciphertext` with the signing half.
//!
//! Decryption verifies the tag in constant time **before** touching the
//! ciphertext. Every failure after key validation and token decoding is
//! reported as [`CryptoError::DecryptionFailed`], whether the key was wrong,
//! the token was altered, or the token fell outside the age window.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::key::{fill_random, generate_key, validate_key, Key};
use crate::token::{self, Token, NONCE_LEN, TAG_LEN};
use crate::CryptoError;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type HmacSha256 = Hmac<Sha256>;

/// Tokens stamped further than this into the future are rejected under a ttl.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(60);

/// Age policy applied on decryption.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenPolicy {
    /// Maximum token age. `None` accepts tokens of any age.
    pub max_age: Option<Duration>,
}

impl TokenPolicy {
    /// Policy rejecting tokens older than `max_age`.
    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            max_age: Some(max_age),
        }
    }
}

/// Output of [`encrypt`]: the token text and the text of the key that sealed it.
#[derive(Clone)]
pub struct Sealed {
    pub token: String,
    pub key: String,
}

/// A cipher bound to one [`Key`].
#[derive(Debug, Clone)]
pub struct Cipher {
    key: Key,
}

impl Cipher {
    pub fn new(key: Key) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Encrypt `plaintext`, stamping the token with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Entropy`] if no nonce can be drawn.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, CryptoError> {
        self.encrypt_at_time(plaintext, unix_now())
    }

    /// Encrypt `plaintext` with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Entropy`] if no nonce can be drawn.
    pub fn encrypt_at_time(&self, plaintext: &[u8], timestamp: u64) -> Result<String, CryptoError> {
        let mut nonce = [0u8; NONCE_LEN];
        fill_random(&mut nonce)?;
        Ok(self.seal(plaintext, timestamp, nonce)?.encode())
    }

    /// Decrypt a token of any age.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MalformedToken`] if the token cannot be decoded and
    /// [`CryptoError::DecryptionFailed`] if it does not verify under this key.
    pub fn decrypt(&self, token_text: &str) -> Result<Vec<u8>, CryptoError> {
        let token = Token::decode(token_text)?;
        self.open(&token)
    }

    /// Decrypt a token, rejecting it if older than `ttl`.
    ///
    /// # Errors
    ///
    /// As [`Cipher::decrypt`]; an expired or far-future token is
    /// [`CryptoError::DecryptionFailed`].
    pub fn decrypt_with_ttl(&self, token_text: &str, ttl: Duration) -> Result<Vec<u8>, CryptoError> {
        self.decrypt_at_time(token_text, ttl, unix_now())
    }

    /// Decrypt a token against an explicit `now` (seconds since the epoch).
    ///
    /// # Errors
    ///
    /// As [`Cipher::decrypt_with_ttl`].
    pub fn decrypt_at_time(
        &self,
        token_text: &str,
        ttl: Duration,
        now: u64,
    ) -> Result<Vec<u8>, CryptoError> {
        let token = Token::decode(token_text)?;
        self.verify(&token)?;
        check_age(token.timestamp(), ttl, now)?;
        self.decrypt_verified(&token)
    }

    /// Return the timestamp of an authentic token without decrypting it.
    ///
    /// # Errors
    ///
    /// As [`Cipher::decrypt`].
    pub fn extract_timestamp(&self, token_text: &str) -> Result<u64, CryptoError> {
        let token = Token::decode(token_text)?;
        self.verify(&token)?;
        Ok(token.timestamp())
    }

    /// Build a token with a caller-chosen nonce.
    pub(crate) fn seal(
        &self,
        plaintext: &[u8],
        timestamp: u64,
        nonce: [u8; NONCE_LEN],
    ) -> Result<Token, CryptoError> {
        let enc_key = *self.key.encryption_key();
        let ciphertext = Aes128CbcEnc::new(&enc_key.into(), &nonce.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let mut mac = self.mac()?;
        mac.update(&token::signed_bytes(timestamp, &nonce, &ciphertext));
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&mac.finalize().into_bytes());

        Ok(Token::new(timestamp, nonce, ciphertext, tag))
    }

    fn open(&self, token: &Token) -> Result<Vec<u8>, CryptoError> {
        self.verify(token)?;
        self.decrypt_verified(token)
    }

    fn verify(&self, token: &Token) -> Result<(), CryptoError> {
        let mut mac = self.mac()?;
        mac.update(&token.signed_bytes());
        // `verify_slice` compares in constant time.
        mac.verify_slice(token.tag())
            .map_err(|_| CryptoError::DecryptionFailed)
    }

    fn decrypt_verified(&self, token: &Token) -> Result<Vec<u8>, CryptoError> {
        let enc_key = *self.key.encryption_key();
        let nonce = *token.nonce();
        Aes128CbcDec::new(&enc_key.into(), &nonce.into())
            .decrypt_padded_vec_mut::<Pkcs7>(token.ciphertext())
            .map_err(|_| CryptoError::DecryptionFailed)
    }

    fn mac(&self) -> Result<HmacSha256, CryptoError> {
        // HMAC accepts keys of any length; this cannot fail for a 16-byte key.
        <HmacSha256 as Mac>::new_from_slice(self.key.signing_key())
            .map_err(|_| CryptoError::InvalidKeyFormat)
    }
}

/// Encrypt `plaintext` under `key`, generating a key when none is supplied.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidKeyFormat`] for a malformed supplied key and
/// [`CryptoError::Entropy`] if the random source fails.
pub fn encrypt(plaintext: &[u8], key: Option<&str>) -> Result<Sealed, CryptoError> {
    let key = match key {
        Some(text) => validate_key(text)?,
        None => generate_key()?,
    };
    let cipher = Cipher::new(key);
    let token = cipher.encrypt(plaintext)?;
    Ok(Sealed {
        token,
        key: cipher.key().to_base64(),
    })
}

/// Decrypt `token_text` with `key_text`, applying `policy`.
///
/// # Errors
///
/// - [`CryptoError::InvalidKeyFormat`] if the key is malformed.
/// - [`CryptoError::MalformedToken`] if the token cannot be decoded.
/// - [`CryptoError::DecryptionFailed`] on tag mismatch, bad padding, or age violation.
pub fn decrypt(token_text: &str, key_text: &str, policy: TokenPolicy) -> Result<Vec<u8>, CryptoError> {
    let cipher = Cipher::new(validate_key(key_text)?);
    match policy.max_age {
        Some(ttl) => cipher.decrypt_with_ttl(token_text, ttl),
        None => cipher.decrypt(token_text),
    }
}

fn check_age(timestamp: u64, ttl: Duration, now: u64) -> Result<(), CryptoError> {
    if timestamp.saturating_add(ttl.as_secs()) < now {
        return Err(CryptoError::DecryptionFailed);
    }
    if now.saturating_add(MAX_CLOCK_SKEW.as_secs()) < timestamp {
        return Err(CryptoError::DecryptionFailed);
    }
    Ok(())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
