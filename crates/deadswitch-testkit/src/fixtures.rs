//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a switch and a reaper sharing
//! in-memory stores, a recording sink, and a clock that only moves when the
//! test says so.

use std::sync::Arc;

use bytes::Bytes;

use deadswitch::{NewVault, Reaper, Result, Switch, SwitchConfig, TickReport};
use deadswitch_cipher::seal;
use deadswitch_core::{
    AssetRef, CheckInPolicy, Clock, Identity, KeyFragment, LivenessInterval, ManualClock,
};
use deadswitch_notify::MemorySink;
use deadswitch_store::{MemoryBlobStore, MemoryStore};

/// Everything a depositor walks away with after an upload.
#[derive(Debug, Clone)]
pub struct Deposit {
    pub subject: Identity,
    pub beneficiary: Identity,
    pub asset_ref: AssetRef,
    /// The half of the key the server never sees.
    pub trustee_fragment: KeyFragment,
}

/// A switch, a reaper and their collaborators, wired together.
pub struct TestFixture {
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub sink: Arc<MemorySink>,
    pub switch: Switch<MemoryStore, MemoryBlobStore>,
    pub reaper: Reaper<MemoryStore>,
}

impl TestFixture {
    /// Default config, clock at zero.
    pub fn new() -> Self {
        Self::with_config(SwitchConfig::default())
    }

    pub fn with_policy(policy: CheckInPolicy) -> Self {
        Self::with_config(SwitchConfig {
            check_in_policy: policy,
            ..SwitchConfig::default()
        })
    }

    pub fn with_config(config: SwitchConfig) -> Self {
        let clock = Arc::new(ManualClock::new(0));
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let sink = Arc::new(MemorySink::new());

        let reaper = Reaper::new(
            store.clone(),
            sink.clone(),
            clock.clone(),
            config.reaper_config(),
        );
        let switch = Switch::new(store.clone(), blobs.clone(), clock.clone(), config);

        Self {
            clock,
            store,
            blobs,
            sink,
            switch,
            reaper,
        }
    }

    /// Current fixture time in ms.
    pub fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    pub fn set_time(&self, now: i64) {
        self.clock.set(now);
    }

    pub fn advance(&self, ms: i64) -> i64 {
        self.clock.advance(ms)
    }

    /// Seal `plaintext` and upload it for `subject`, beneficiary
    /// `heir-of-<subject>`.
    pub async fn deposit(
        &self,
        subject: &str,
        plaintext: &[u8],
        interval_ms: u64,
    ) -> Result<Deposit> {
        self.deposit_for(subject, &format!("heir-of-{}", subject), plaintext, interval_ms)
            .await
    }

    pub async fn deposit_for(
        &self,
        subject: &str,
        beneficiary: &str,
        plaintext: &[u8],
        interval_ms: u64,
    ) -> Result<Deposit> {
        let subject = Identity::new(subject)?;
        let beneficiary = Identity::new(beneficiary)?;
        let (bundle, trustee_fragment) = seal(plaintext)?.split_for_upload();

        let request = NewVault::new(
            subject.clone(),
            beneficiary.clone(),
            bundle.server_fragment,
            bundle.nonce,
            "asset.bin",
        )
        .with_interval(LivenessInterval::from_millis(interval_ms)?);

        let record = self
            .switch
            .upload(request, Bytes::from(bundle.ciphertext))
            .await?;

        Ok(Deposit {
            subject,
            beneficiary,
            asset_ref: record.asset_ref,
            trustee_fragment,
        })
    }

    /// Run one reaper pass at the current fixture time.
    pub async fn tick(&self) -> Result<TickReport> {
        self.reaper.tick().await
    }

    /// Jump to `now` and tick.
    pub async fn tick_at(&self, now: i64) -> Result<TickReport> {
        self.set_time(now);
        self.tick().await
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// `count` distinct subject names.
pub fn subjects(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("subject-{}@vault.test", i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use deadswitch_core::VaultState;
    use deadswitch_store::VaultStore;

    #[tokio::test]
    async fn test_fixture_deposit_and_release() {
        let fixture = TestFixture::new();
        let deposit = fixture.deposit("owner@vault.com", b"hello", 1_000).await.unwrap();

        assert_eq!(deposit.beneficiary.as_str(), "heir-of-owner@vault.com");
        assert_eq!(fixture.blobs.len(), 1);

        let report = fixture.tick_at(1_001).await.unwrap();
        assert_eq!(report.released, 1);

        let record = fixture.store.get(&deposit.subject).await.unwrap().unwrap();
        assert_eq!(record.state, VaultState::Released);
        assert_eq!(fixture.sink.count_for(&deposit.beneficiary), 1);
    }

    #[tokio::test]
    async fn test_fixture_clock() {
        let fixture = TestFixture::new();
        assert_eq!(fixture.now(), 0);
        assert_eq!(fixture.advance(250), 250);
        fixture.set_time(10);
        assert_eq!(fixture.now(), 10);
    }

    #[test]
    fn test_subjects_are_distinct() {
        let names = subjects(5);
        let unique: std::collections::HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), 5);
    }
}
