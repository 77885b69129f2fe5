//! Error types for the switch service.

use deadswitch_cipher::CipherError;
use deadswitch_core::{AssetRef, CoreError, Identity};
use deadswitch_notify::NotifyError;
use deadswitch_store::StoreError;
use thiserror::Error;

/// Errors that can occur during switch operations.
#[derive(Debug, Error)]
pub enum SwitchError {
    /// Invalid input.
    #[error("invalid input: {0}")]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Encryption-side failure other than a bad key or ciphertext.
    #[error("cipher error: {0}")]
    Cipher(CipherError),

    /// A vault already exists for this subject.
    #[error("vault already exists for {0}")]
    Duplicate(Identity),

    /// No vault exists for this subject.
    #[error("no vault for {0}")]
    NotFound(Identity),

    /// The referenced ciphertext is missing.
    #[error("asset not found: {0}")]
    AssetNotFound(AssetRef),

    /// Check-in refused: the vault has been released.
    #[error("vault for {0} has already been released")]
    AlreadyReleased(Identity),

    /// Recovery refused: the vault is still alive.
    #[error("vault for {0} has not been released")]
    NotReleased(Identity),

    /// Decryption failed. Deliberately carries no detail.
    #[error("invalid key or corrupt ciphertext")]
    InvalidKeyOrCorrupt,

    /// A release notice could not be delivered.
    #[error("notification failed: {0}")]
    NotificationFailed(#[from] NotifyError),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// A background task failed to join.
    #[error("task error: {0}")]
    Task(String),
}

impl From<CipherError> for SwitchError {
    fn from(e: CipherError) -> Self {
        match e {
            CipherError::InvalidKeyOrCorrupt => SwitchError::InvalidKeyOrCorrupt,
            other => SwitchError::Cipher(other),
        }
    }
}

/// Result type for switch operations.
pub type Result<T> = std::result::Result<T, SwitchError>;
