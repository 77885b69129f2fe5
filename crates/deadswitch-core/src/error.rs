//! Error types for the deadswitch core.

use thiserror::Error;

use crate::record::VaultState;

/// Errors raised while constructing or validating core values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("invalid key fragment: expected {expected} hex characters")]
    InvalidFragment { expected: usize },

    #[error("invalid nonce: expected {expected} hex characters")]
    InvalidNonce { expected: usize },

    #[error("invalid asset reference: {0}")]
    InvalidAssetRef(String),

    #[error("liveness interval must be positive")]
    InvalidInterval,

    #[error("invalid vault record: {0}")]
    InvalidRecord(String),
}

/// A liveness transition that the current state does not permit.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// Check-in against a released vault under a policy that forbids it.
    #[error("vault is already released")]
    AlreadyReleased,

    /// Expiry requested for a vault that is not alive.
    #[error("vault is not alive (state: {0})")]
    NotAlive(VaultState),

    /// Expiry requested before the liveness interval elapsed.
    #[error("vault has not expired: {remaining_ms} ms remaining")]
    NotExpired { remaining_ms: u64 },
}
