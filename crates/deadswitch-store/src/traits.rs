//! Store traits: the abstract interfaces for vault and ciphertext persistence.
//!
//! The switch and the reaper only ever talk to these traits. Backends must
//! honor the per-record atomicity described on each method; the reaper and
//! request handlers share no lock of their own.

use async_trait::async_trait;
use bytes::Bytes;

use deadswitch_core::{AssetRef, CheckInPolicy, Identity, Transition, VaultRecord};

use crate::error::Result;

/// Result of creating a vault record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateResult {
    /// The record was stored.
    Created,
    /// A record for this subject already exists; it was left untouched.
    Duplicate,
}

/// Result of a check-in against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LivenessUpdate {
    /// The check-in was applied. Carries the record as stored afterwards.
    Applied {
        transition: Transition,
        record: VaultRecord,
    },
    /// The vault is released and the policy forbids reviving it.
    Rejected,
    /// No vault exists for the subject.
    NotFound,
}

/// Async interface for vault record persistence.
///
/// # Design Notes
///
/// - **Uniqueness**: at most one record per subject; `create` never
///   overwrites.
/// - **Monotonic signal**: `update_liveness` never moves
///   `last_live_signal` backwards.
/// - **Compare-and-set expiry**: `transition_to_released` applies only if
///   the record is still alive *and* still at the version the caller
///   evaluated. Any check-in that lands in between makes it a no-op, even
///   one that left the signal unchanged.
#[async_trait]
pub trait VaultStore: Send + Sync {
    /// Insert a new record.
    async fn create(&self, record: &VaultRecord) -> Result<CreateResult>;

    /// Get the record for a subject.
    async fn get(&self, subject: &Identity) -> Result<Option<VaultRecord>>;

    /// All records currently in the `Alive` state.
    async fn list_alive(&self) -> Result<Vec<VaultRecord>>;

    /// Apply a check-in at `at` under `policy`, atomically.
    async fn update_liveness(
        &self,
        subject: &Identity,
        at: i64,
        policy: CheckInPolicy,
    ) -> Result<LivenessUpdate>;

    /// Atomically move `Alive -> Released` if the record is still at
    /// `observed_version`. `at` is recorded as the modification time.
    ///
    /// Returns `true` only if this call performed the transition.
    async fn transition_to_released(
        &self,
        subject: &Identity,
        observed_version: u64,
        at: i64,
    ) -> Result<bool>;

    /// Remove a record. Returns `false` if there was none.
    async fn delete(&self, subject: &Identity) -> Result<bool>;

    /// Whether any stored record points at `asset`.
    async fn asset_in_use(&self, asset: &AssetRef) -> Result<bool>;
}

/// Async interface for ciphertext blobs.
///
/// Blobs are content-addressed: `put` derives the reference from the bytes.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a ciphertext and return its reference. Idempotent.
    async fn put(&self, ciphertext: Bytes) -> Result<AssetRef>;

    /// Fetch a ciphertext.
    async fn get(&self, asset: &AssetRef) -> Result<Option<Bytes>>;

    /// Remove a ciphertext. Returns `false` if it was not present.
    async fn delete(&self, asset: &AssetRef) -> Result<bool>;
}
