//! The Switch: request-side API for vaults.
//!
//! Depositors create vaults and check in; beneficiaries read recovery
//! metadata and recover. Expiry is not here: only the [`crate::Reaper`]
//! releases vaults.

use std::sync::Arc;

use bytes::Bytes;

use deadswitch_cipher::open;
use deadswitch_core::{
    AssetRef, Clock, Identity, KeyFragment, LivenessInterval, NonceHex, Transition, VaultDraft,
    VaultRecord, VaultState,
};
use deadswitch_store::{BlobStore, CreateResult, LivenessUpdate, StoreError, VaultStore};

use crate::config::SwitchConfig;
use crate::error::{Result, SwitchError};

/// A request to create a vault.
///
/// Carries only what the server may hold: no trustee fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVault {
    pub subject: Identity,
    pub beneficiary: Identity,
    pub server_fragment: KeyFragment,
    pub nonce: NonceHex,
    pub asset_name: String,
    /// Falls back to the configured default when absent.
    pub liveness_interval: Option<LivenessInterval>,
}

impl NewVault {
    pub fn new(
        subject: Identity,
        beneficiary: Identity,
        server_fragment: KeyFragment,
        nonce: NonceHex,
        asset_name: impl Into<String>,
    ) -> Self {
        Self {
            subject,
            beneficiary,
            server_fragment,
            nonce,
            asset_name: asset_name.into(),
            liveness_interval: None,
        }
    }

    pub fn with_interval(mut self, interval: LivenessInterval) -> Self {
        self.liveness_interval = Some(interval);
        self
    }
}

/// What a beneficiary needs, besides their own fragment, to recover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryMetadata {
    pub server_fragment: KeyFragment,
    pub nonce: NonceHex,
    pub asset_ref: AssetRef,
    pub asset_name: String,
    pub state: VaultState,
}

/// A decrypted asset.
#[derive(Clone, PartialEq, Eq)]
pub struct RecoveredAsset {
    /// The name the asset was deposited under.
    pub name: String,
    pub plaintext: Vec<u8>,
}

impl std::fmt::Debug for RecoveredAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveredAsset")
            .field("name", &self.name)
            .field("len", &self.plaintext.len())
            .finish()
    }
}

/// Result of a successful check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckIn {
    pub transition: Transition,
    pub record: VaultRecord,
}

/// The request-side service.
pub struct Switch<S: VaultStore, B: BlobStore> {
    vaults: Arc<S>,
    blobs: Arc<B>,
    clock: Arc<dyn Clock>,
    config: SwitchConfig,
}

impl<S: VaultStore, B: BlobStore> Switch<S, B> {
    /// Create a switch over shared stores.
    ///
    /// The same `vaults` handle is normally given to a [`crate::Reaper`].
    pub fn new(vaults: Arc<S>, blobs: Arc<B>, clock: Arc<dyn Clock>, config: SwitchConfig) -> Self {
        Self {
            vaults,
            blobs,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &SwitchConfig {
        &self.config
    }

    pub fn vaults(&self) -> &Arc<S> {
        &self.vaults
    }

    pub fn blobs(&self) -> &Arc<B> {
        &self.blobs
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Depositor Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a vault for an already-stored ciphertext.
    pub async fn create_vault(
        &self,
        request: NewVault,
        asset_ref: AssetRef,
    ) -> Result<VaultRecord> {
        let record = self.build_record(request, asset_ref)?;

        match self.vaults.create(&record).await? {
            CreateResult::Created => {
                tracing::info!(
                    subject = %record.subject,
                    beneficiary = %record.beneficiary,
                    interval_ms = record.liveness_interval.as_millis(),
                    "vault created"
                );
                Ok(record)
            }
            CreateResult::Duplicate => Err(SwitchError::Duplicate(record.subject)),
        }
    }

    /// Store a ciphertext and create its vault.
    ///
    /// The record is validated before anything is written. If the create
    /// fails, the blob written here is removed again unless some stored
    /// vault already points at the same ciphertext.
    pub async fn upload(&self, request: NewVault, ciphertext: Bytes) -> Result<VaultRecord> {
        let asset_ref = AssetRef::for_content(&ciphertext);
        let record = self.build_record(request, asset_ref)?;

        if self.vaults.get(&record.subject).await?.is_some() {
            return Err(SwitchError::Duplicate(record.subject));
        }

        self.blobs.put(ciphertext).await?;

        match self.vaults.create(&record).await {
            Ok(CreateResult::Created) => {
                tracing::info!(
                    subject = %record.subject,
                    beneficiary = %record.beneficiary,
                    asset = %record.asset_ref,
                    "vault uploaded"
                );
                Ok(record)
            }
            Ok(CreateResult::Duplicate) => {
                self.discard_orphan(&record).await;
                Err(SwitchError::Duplicate(record.subject))
            }
            Err(e) => {
                self.discard_orphan(&record).await;
                Err(e.into())
            }
        }
    }

    /// Refresh the liveness signal for a subject.
    pub async fn check_in(&self, subject: &Identity) -> Result<CheckIn> {
        let now = self.clock.now_millis();

        match self
            .vaults
            .update_liveness(subject, now, self.config.check_in_policy)
            .await?
        {
            LivenessUpdate::Applied { transition, record } => {
                if transition == Transition::Resurrected {
                    tracing::warn!(
                        subject = %subject,
                        "released vault returned to alive by check-in"
                    );
                } else {
                    tracing::debug!(
                        subject = %subject,
                        at = now,
                        deadline = record.deadline(),
                        "check-in"
                    );
                }
                Ok(CheckIn { transition, record })
            }
            LivenessUpdate::Rejected => Err(SwitchError::AlreadyReleased(subject.clone())),
            LivenessUpdate::NotFound => Err(SwitchError::NotFound(subject.clone())),
        }
    }

    /// Remove a vault and its ciphertext.
    ///
    /// The ciphertext stays if another vault still points at it.
    pub async fn delete_vault(&self, subject: &Identity) -> Result<()> {
        let record = self
            .vaults
            .get(subject)
            .await?
            .ok_or_else(|| SwitchError::NotFound(subject.clone()))?;

        if !self.vaults.delete(subject).await? {
            return Err(SwitchError::NotFound(subject.clone()));
        }

        if let Err(e) = self.release_blob(&record.asset_ref).await {
            tracing::warn!(
                subject = %subject,
                asset = %record.asset_ref,
                error = %e,
                "vault deleted but ciphertext removal failed"
            );
            return Err(e.into());
        }

        tracing::info!(subject = %subject, "vault deleted");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Beneficiary Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Everything needed to recover, except the trustee fragment.
    ///
    /// Not gated on state; callers see `state` and decide.
    pub async fn recovery_metadata(&self, subject: &Identity) -> Result<RecoveryMetadata> {
        let record = self
            .vaults
            .get(subject)
            .await?
            .ok_or_else(|| SwitchError::NotFound(subject.clone()))?;

        Ok(RecoveryMetadata {
            server_fragment: record.server_fragment,
            nonce: record.nonce,
            asset_ref: record.asset_ref,
            asset_name: record.asset_name,
            state: record.state,
        })
    }

    /// Fetch a stored ciphertext.
    pub async fn fetch_ciphertext(&self, asset_ref: &AssetRef) -> Result<Bytes> {
        self.blobs
            .get(asset_ref)
            .await?
            .ok_or_else(|| SwitchError::AssetNotFound(asset_ref.clone()))
    }

    /// Metadata, ciphertext and decryption in one step.
    ///
    /// Only released vaults can be recovered. A ciphertext that fails its
    /// integrity check is reported the same way as a wrong fragment.
    pub async fn recover(
        &self,
        subject: &Identity,
        trustee_fragment: &KeyFragment,
    ) -> Result<RecoveredAsset> {
        let meta = self.recovery_metadata(subject).await?;
        if !meta.state.is_released() {
            return Err(SwitchError::NotReleased(subject.clone()));
        }

        let ciphertext = match self.fetch_ciphertext(&meta.asset_ref).await {
            Ok(ciphertext) => ciphertext,
            Err(SwitchError::Store(StoreError::Tampered(_))) => {
                tracing::warn!(subject = %subject, "recovery failed authentication");
                return Err(SwitchError::InvalidKeyOrCorrupt);
            }
            Err(e) => return Err(e),
        };
        let plaintext = open(&ciphertext, &meta.nonce, &meta.server_fragment, trustee_fragment)
            .map_err(|e| {
                tracing::warn!(subject = %subject, "recovery failed authentication");
                SwitchError::from(e)
            })?;

        tracing::info!(subject = %subject, asset = %meta.asset_ref, "asset recovered");
        Ok(RecoveredAsset {
            name: meta.asset_name,
            plaintext,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal Helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn build_record(&self, request: NewVault, asset_ref: AssetRef) -> Result<VaultRecord> {
        let draft = VaultDraft {
            subject: request.subject,
            beneficiary: request.beneficiary,
            server_fragment: request.server_fragment,
            nonce: request.nonce,
            asset_ref,
            asset_name: request.asset_name,
            liveness_interval: request
                .liveness_interval
                .unwrap_or(self.config.default_liveness_interval),
        };
        Ok(VaultRecord::create(draft, self.clock.now_millis())?)
    }

    /// Delete a blob unless a stored vault still points at it.
    ///
    /// Returns whether the blob was removed.
    async fn release_blob(&self, asset: &AssetRef) -> std::result::Result<bool, StoreError> {
        if self.vaults.asset_in_use(asset).await? {
            tracing::debug!(asset = %asset, "ciphertext still referenced, kept");
            return Ok(false);
        }
        self.blobs.delete(asset).await
    }

    /// Remove a blob written for a record that never got stored.
    async fn discard_orphan(&self, record: &VaultRecord) {
        if let Err(e) = self.release_blob(&record.asset_ref).await {
            tracing::warn!(
                asset = %record.asset_ref,
                error = %e,
                "failed to remove orphaned ciphertext"
            );
        }
    }
}
