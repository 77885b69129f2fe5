//! Storage failures.

use thiserror::Error;

use deadswitch_core::AssetRef;

/// Failures from a vault or blob backend.
///
/// Contract outcomes (duplicate subject, rejected check-in, lost race) are
/// not errors; they come back as values from the trait methods.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite rejected a statement.
    #[error("sqlite: {0}")]
    Database(#[from] rusqlite::Error),

    /// A row could not be turned back into a record.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A stored blob no longer hashes to its reference.
    #[error("blob {0} does not match its content hash")]
    Tampered(AssetRef),

    /// The nonce is already bound to another vault.
    #[error("nonce already in use by another vault")]
    NonceReuse,

    /// The record changed underneath a read-modify-write.
    #[error("concurrent modification of vault {0}")]
    Conflict(String),

    /// The on-disk schema cannot be brought up to date.
    #[error("schema migration failed: {0}")]
    Migration(String),

    /// A lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,

    /// A blocking task failed to complete.
    #[error("background task failed: {0}")]
    Task(String),

    /// Blob file access failed.
    #[error("blob i/o: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand used across the store crate.
pub type Result<T> = std::result::Result<T, StoreError>;
