//! Error types for notification delivery.

use thiserror::Error;

/// Errors a sink can report.
///
/// None of these are fatal to the caller; the reaper logs them and moves on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The message could not be delivered.
    #[error("delivery to {recipient} failed: {reason}")]
    Delivery { recipient: String, reason: String },

    /// Internal state was poisoned by a panicking writer.
    #[error("sink lock poisoned")]
    Poisoned,
}

/// Result type for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
