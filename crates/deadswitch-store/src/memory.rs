//! In-memory implementations of the store traits.
//!
//! Same semantics as SQLite, no persistence. Every operation holds the
//! write lock for its whole read-modify-write, which gives the per-record
//! atomicity the traits require.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;

use deadswitch_core::{
    apply_check_in, AssetRef, CheckInPolicy, Identity, NonceHex, TransitionError, VaultRecord,
    VaultState,
};

use crate::error::{Result, StoreError};
use crate::traits::{BlobStore, CreateResult, LivenessUpdate, VaultStore};

/// In-memory vault store.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Records indexed by subject.
    vaults: HashMap<Identity, VaultRecord>,

    /// Nonces bound to live records.
    nonces: HashSet<NonceHex>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VaultStore for MemoryStore {
    async fn create(&self, record: &VaultRecord) -> Result<CreateResult> {
        let mut inner = self.write()?;

        if inner.vaults.contains_key(&record.subject) {
            return Ok(CreateResult::Duplicate);
        }
        if inner.nonces.contains(&record.nonce) {
            return Err(StoreError::NonceReuse);
        }

        inner.nonces.insert(record.nonce);
        inner.vaults.insert(record.subject.clone(), record.clone());
        Ok(CreateResult::Created)
    }

    async fn get(&self, subject: &Identity) -> Result<Option<VaultRecord>> {
        Ok(self.read()?.vaults.get(subject).cloned())
    }

    async fn list_alive(&self) -> Result<Vec<VaultRecord>> {
        let inner = self.read()?;
        let mut alive: Vec<VaultRecord> = inner
            .vaults
            .values()
            .filter(|r| r.state == VaultState::Alive)
            .cloned()
            .collect();
        alive.sort_by(|a, b| a.subject.cmp(&b.subject));
        Ok(alive)
    }

    async fn update_liveness(
        &self,
        subject: &Identity,
        at: i64,
        policy: CheckInPolicy,
    ) -> Result<LivenessUpdate> {
        let mut inner = self.write()?;

        let Some(record) = inner.vaults.get_mut(subject) else {
            return Ok(LivenessUpdate::NotFound);
        };

        match apply_check_in(record, at, policy) {
            Ok(transition) => Ok(LivenessUpdate::Applied {
                transition,
                record: record.clone(),
            }),
            Err(TransitionError::AlreadyReleased) => Ok(LivenessUpdate::Rejected),
            Err(e) => Err(StoreError::InvalidData(e.to_string())),
        }
    }

    async fn transition_to_released(
        &self,
        subject: &Identity,
        observed_version: u64,
        _at: i64,
    ) -> Result<bool> {
        let mut inner = self.write()?;

        match inner.vaults.get_mut(subject) {
            Some(record)
                if record.state == VaultState::Alive && record.version == observed_version =>
            {
                record.state = VaultState::Released;
                record.version += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, subject: &Identity) -> Result<bool> {
        let mut inner = self.write()?;
        match inner.vaults.remove(subject) {
            Some(record) => {
                inner.nonces.remove(&record.nonce);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn asset_in_use(&self, asset: &AssetRef) -> Result<bool> {
        Ok(self.read()?.vaults.values().any(|r| r.asset_ref == *asset))
    }
}

/// In-memory ciphertext store.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<AssetRef, Bytes>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, ciphertext: Bytes) -> Result<AssetRef> {
        let asset = AssetRef::for_content(&ciphertext);
        self.blobs
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .entry(asset.clone())
            .or_insert(ciphertext);
        Ok(asset)
    }

    async fn get(&self, asset: &AssetRef) -> Result<Option<Bytes>> {
        let blobs = self.blobs.read().map_err(|_| StoreError::Poisoned)?;
        Ok(blobs.get(asset).cloned())
    }

    async fn delete(&self, asset: &AssetRef) -> Result<bool> {
        let mut blobs = self.blobs.write().map_err(|_| StoreError::Poisoned)?;
        Ok(blobs.remove(asset).is_some())
    }
}
