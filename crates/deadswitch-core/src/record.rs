//! Vault record: the custody state held for one subject.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::types::{AssetRef, Identity, KeyFragment, LivenessInterval, NonceHex};

/// Liveness state of a vault.
///
/// `Released` is terminal for the reaper: nothing it does moves a record
/// back to `Alive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaultState {
    Alive,
    Released,
}

impl VaultState {
    /// Stable string form, used by storage backends.
    pub const fn as_str(&self) -> &'static str {
        match self {
            VaultState::Alive => "alive",
            VaultState::Released => "released",
        }
    }

    pub fn is_alive(&self) -> bool {
        matches!(self, VaultState::Alive)
    }

    pub fn is_released(&self) -> bool {
        matches!(self, VaultState::Released)
    }
}

impl fmt::Display for VaultState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VaultState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alive" => Ok(VaultState::Alive),
            "released" => Ok(VaultState::Released),
            other => Err(CoreError::InvalidRecord(format!(
                "unknown vault state: {}",
                other
            ))),
        }
    }
}

/// Everything the caller supplies to create a vault.
///
/// The trustee's fragment is deliberately absent: it never reaches the
/// server side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultDraft {
    pub subject: Identity,
    pub beneficiary: Identity,
    pub server_fragment: KeyFragment,
    pub nonce: NonceHex,
    pub asset_ref: AssetRef,
    pub asset_name: String,
    pub liveness_interval: LivenessInterval,
}

/// The persisted custody record for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultRecord {
    /// Unique key. Immutable.
    pub subject: Identity,

    /// Notified on release. Immutable.
    pub beneficiary: Identity,

    /// High-order half of the asset key. Immutable.
    pub server_fragment: KeyFragment,

    /// AEAD nonce used for the asset. Immutable.
    pub nonce: NonceHex,

    /// Where the ciphertext lives. Immutable.
    pub asset_ref: AssetRef,

    /// Original file name, surfaced at recovery. Immutable.
    pub asset_name: String,

    /// Last check-in (Unix ms). Never decreases.
    pub last_live_signal: i64,

    /// Allowed silence before release. Immutable.
    pub liveness_interval: LivenessInterval,

    pub state: VaultState,

    /// Bumped on every mutation.
    pub version: u64,

    /// When the vault was created (Unix ms).
    pub created_at: i64,
}

impl VaultRecord {
    /// Build a fresh `Alive` record from a draft.
    pub fn create(draft: VaultDraft, now: i64) -> Result<Self, CoreError> {
        if draft.asset_name.trim().is_empty() {
            return Err(CoreError::InvalidRecord("asset name is empty".into()));
        }

        Ok(Self {
            subject: draft.subject,
            beneficiary: draft.beneficiary,
            server_fragment: draft.server_fragment,
            nonce: draft.nonce,
            asset_ref: draft.asset_ref,
            asset_name: draft.asset_name,
            last_live_signal: now,
            liveness_interval: draft.liveness_interval,
            state: VaultState::Alive,
            version: 1,
            created_at: now,
        })
    }

    /// Milliseconds since the last check-in, saturating at zero if the
    /// clock reads earlier than the signal.
    pub fn elapsed(&self, now: i64) -> u64 {
        u64::try_from(now.saturating_sub(self.last_live_signal)).unwrap_or(0)
    }

    /// The instant after which the vault counts as expired.
    pub fn deadline(&self) -> i64 {
        let interval = i64::try_from(self.liveness_interval.as_millis()).unwrap_or(i64::MAX);
        self.last_live_signal.saturating_add(interval)
    }

    /// True when the silence strictly exceeds the interval.
    pub fn is_overdue(&self, now: i64) -> bool {
        self.elapsed(now) > self.liveness_interval.as_millis()
    }
}
