//! AES-256-GCM envelope encryption for `SecureString` values.
//!
//! Ciphertext layout is `nonce (12 bytes) || ciphertext || tag (16 bytes)`,
//! with no associated data. Every call draws a fresh nonce from `OsRng`.

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use subtle::ConstantTimeEq;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Key length in bytes.
pub const KEY_LEN: usize = 32;

/// Nonce length for AES-256-GCM (96 bits).
const NONCE_LEN: usize = 12;

/// Minimum ciphertext length: nonce + tag.
const MIN_CIPHERTEXT_LEN: usize = NONCE_LEN + 16;

/// Encryption and key-handling failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Key material is not valid base64.
    #[error("key material is not valid base64")]
    InvalidKeyEncoding,

    /// Key material has the wrong length.
    #[error("key material must be {KEY_LEN} bytes, got {actual}")]
    InvalidKeyLength {
        /// Decoded length.
        actual: usize,
    },

    /// Ciphertext is not valid base64.
    #[error("ciphertext is not valid base64")]
    InvalidCiphertextEncoding,

    /// Ciphertext is shorter than nonce + tag.
    #[error("ciphertext too short: expected at least {expected} bytes, got {actual}")]
    CiphertextTooShort {
        /// Minimum length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// The AEAD seal failed.
    #[error("encryption failed")]
    Encryption,

    /// Authentication failed, or the plaintext is not UTF-8.
    #[error("decryption failed")]
    Decryption,
}

/// A 256-bit AES key, zeroized on drop and never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    /// Wrap raw key bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Generate a key from the OS CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(OsRng);
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&key);
        Self(bytes)
    }

    /// Decode base64 key material (standard alphabet, padded).
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let decoded = Zeroizing::new(
            STANDARD
                .decode(encoded.trim())
                .map_err(|_| CryptoError::InvalidKeyEncoding)?,
        );
        let bytes: [u8; KEY_LEN] = decoded
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                actual: decoded.len(),
            })?;
        Ok(Self(bytes))
    }

    /// Encode the material as base64 for persistence.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Constant-time comparison of two keys.
    #[must_use]
    pub fn same_material(&self, other: &Self) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Seal `plaintext` and return `nonce || ciphertext || tag`.
pub fn encrypt(key: &EncryptionKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.0));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let sealed = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| CryptoError::Encryption)?;

    let mut combined = Vec::with_capacity(NONCE_LEN + sealed.len());
    combined.extend_from_slice(&nonce);
    combined.extend_from_slice(&sealed);
    Ok(combined)
}

/// Open data produced by [`encrypt`].
pub fn decrypt(key: &EncryptionKey, combined: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if combined.len() < MIN_CIPHERTEXT_LEN {
        return Err(CryptoError::CiphertextTooShort {
            expected: MIN_CIPHERTEXT_LEN,
            actual: combined.len(),
        });
    }

    let (nonce, sealed) = combined.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.0));
    cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| CryptoError::Decryption)
}

/// Encrypt a string value into the base64 form stored in parameter records.
pub fn seal_string(key: &EncryptionKey, plaintext: &str) -> Result<String, CryptoError> {
    Ok(STANDARD.encode(encrypt(key, plaintext.as_bytes())?))
}

/// Reverse [`seal_string`].
pub fn open_string(key: &EncryptionKey, sealed: &str) -> Result<String, CryptoError> {
    let combined = STANDARD
        .decode(sealed)
        .map_err(|_| CryptoError::InvalidCiphertextEncoding)?;
    let plaintext = decrypt(key, &combined)?;
    String::from_utf8(plaintext).map_err(|_| CryptoError::Decryption)
}
