//! # Deadswitch Core
//!
//! Pure primitives for the deadswitch: vault records, the liveness state
//! machine, and the clock abstraction the reaper evaluates against.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`VaultRecord`] - The custody record held for one subject
//! - [`VaultState`] - `Alive` or `Released` (terminal for the reaper)
//! - [`KeyFragment`] - One half of the 256-bit asset key, as hex
//! - [`NonceHex`] - The 96-bit AEAD nonce, as hex
//! - [`AssetRef`] - Content address of the stored ciphertext
//! - [`Clock`] - Replaceable wall clock (Unix milliseconds)
//!
//! ## Liveness
//!
//! A vault is alive while `now - last_live_signal <= liveness_interval`.
//! Once that is exceeded the reaper may release it, exactly once. See
//! [`liveness`] for the transition rules.

pub mod clock;
pub mod error;
pub mod liveness;
pub mod record;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, TransitionError};
pub use liveness::{
    apply_check_in, apply_expiry, check_in_decision, evaluate, CheckInDecision, CheckInPolicy,
    Evaluation, Transition,
};
pub use record::{VaultDraft, VaultRecord, VaultState};
pub use types::{AssetRef, Identity, KeyFragment, LivenessInterval, NonceHex};
