//! Error types for the cipher.

use thiserror::Error;

/// Errors that can occur while sealing or opening an asset.
///
/// Opening has exactly one failure mode. A wrong fragment, a wrong nonce,
/// malformed hex and a tampered ciphertext are indistinguishable to the
/// caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// Authentication failed or the key material was malformed.
    #[error("invalid key or corrupted asset")]
    InvalidKeyOrCorrupt,

    /// Encryption itself failed (e.g. plaintext exceeds GCM limits).
    #[error("encryption error: {0}")]
    EncryptionError(String),

    /// Envelope serialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),
}

/// Result type for cipher operations.
pub type Result<T> = std::result::Result<T, CipherError>;
