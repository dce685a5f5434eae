//! Fernet-format authenticated symmetric encryption.
//!
//! This crate is free of HTTP concerns. It provides:
//! - [`token`]: the self-describing token codec.
//! - [`key`]: the 32-byte key and its URL-safe base64 form.
//! - [`cipher`]: AES-128-CBC + HMAC-SHA256 encryption and verification.
//!
//! # Token format
//!
//! ```text
//! base64url( 0x80 ‖ timestamp_be64 ‖ nonce[16] ‖ AES-128-CBC(plaintext) ‖ HMAC-SHA256[32] )
//! ```

pub mod cipher;
pub mod error;
pub mod key;
pub mod token;

pub use cipher::{decrypt, encrypt, Cipher, Sealed, TokenPolicy};
pub use error::CryptoError;
pub use key::{generate_key, validate_key, Key, KEY_LEN};
pub use token::Token;
