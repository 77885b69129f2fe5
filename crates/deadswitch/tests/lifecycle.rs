//! End-to-end lifecycle tests: deposit, check-in, expiry, notification,
//! recovery. Time is driven by the fixture's manual clock.

use std::sync::Arc;

use anyhow::Result;
use proptest::prelude::*;

use deadswitch::core::{CheckInPolicy, Identity, Transition, VaultState};
use deadswitch::notify::MemorySink;
use deadswitch::store::VaultStore;
use deadswitch::{Reaper, SwitchConfig, SwitchError};
use deadswitch_testkit::generators::{check_in_policy, timeline, Step};
use deadswitch_testkit::{subjects, verify_all_vectors, TestFixture};

#[tokio::test]
async fn expiry_fires_after_interval_and_not_before() -> Result<()> {
    let fixture = TestFixture::new();
    let deposit = fixture.deposit("owner@vault.com", b"letters", 30_000).await?;

    let early = fixture.tick_at(29_000).await?;
    assert_eq!(early.released, 0);
    assert!(fixture.sink.delivered().is_empty());

    let late = fixture.tick_at(31_000).await?;
    assert_eq!(late.released, 1);
    assert_eq!(fixture.sink.count_for(&deposit.beneficiary), 1);

    let meta = fixture.switch.recovery_metadata(&deposit.subject).await?;
    assert_eq!(meta.state, VaultState::Released);
    Ok(())
}

#[tokio::test]
async fn check_in_postpones_expiry() -> Result<()> {
    let fixture = TestFixture::new();
    let deposit = fixture.deposit("owner@vault.com", b"letters", 30_000).await?;

    fixture.set_time(20_000);
    fixture.switch.check_in(&deposit.subject).await?;

    let report = fixture.tick_at(31_000).await?;
    assert_eq!(report.scanned, 1);
    assert_eq!(report.released, 0);

    let record = fixture.store.get(&deposit.subject).await?.expect("record");
    assert_eq!(record.elapsed(31_000), 11_000);
    assert_eq!(record.state, VaultState::Alive);

    // The new deadline is 20_000 + 30_000.
    assert_eq!(fixture.tick_at(50_000).await?.released, 0);
    assert_eq!(fixture.tick_at(50_001).await?.released, 1);
    Ok(())
}

#[tokio::test]
async fn full_flow_seal_to_recover() -> Result<()> {
    let fixture = TestFixture::new();
    let plaintext = b"account numbers and passwords".to_vec();
    let deposit = fixture.deposit("owner@vault.com", &plaintext, 30_000).await?;

    // Beneficiary tries early.
    let early = fixture
        .switch
        .recover(&deposit.subject, &deposit.trustee_fragment)
        .await;
    assert!(matches!(early, Err(SwitchError::NotReleased(_))));

    fixture.tick_at(45_000).await?;

    let notice = &fixture.sink.delivered()[0];
    assert_eq!(notice.subject, deposit.subject);
    assert!(notice.body.contains("http://localhost:5173/unlock"));

    let recovered = fixture
        .switch
        .recover(&deposit.subject, &deposit.trustee_fragment)
        .await?;
    assert_eq!(recovered.name, "asset.bin");
    assert_eq!(recovered.plaintext, plaintext);

    // Step by step, the way a client would do it.
    let meta = fixture.switch.recovery_metadata(&deposit.subject).await?;
    let ciphertext = fixture.switch.fetch_ciphertext(&meta.asset_ref).await?;
    let opened = deadswitch::cipher::open(
        &ciphertext,
        &meta.nonce,
        &meta.server_fragment,
        &deposit.trustee_fragment,
    )?;
    assert_eq!(opened, plaintext);
    Ok(())
}

#[tokio::test]
async fn server_side_material_alone_cannot_decrypt() -> Result<()> {
    let fixture = TestFixture::new();
    let deposit = fixture.deposit("owner@vault.com", b"secret", 1_000).await?;
    fixture.tick_at(2_000).await?;

    let meta = fixture.switch.recovery_metadata(&deposit.subject).await?;
    // The best the server can do is guess the other half.
    let guess = meta.server_fragment.clone();
    let err = fixture
        .switch
        .recover(&deposit.subject, &guess)
        .await
        .unwrap_err();
    assert!(matches!(err, SwitchError::InvalidKeyOrCorrupt));
    Ok(())
}

#[tokio::test]
async fn duplicate_subject_is_rejected() -> Result<()> {
    let fixture = TestFixture::new();
    fixture.deposit("owner@vault.com", b"first", 30_000).await?;

    let err = fixture
        .deposit_for("owner@vault.com", "someone@else.com", b"second", 5_000)
        .await
        .unwrap_err();
    assert!(matches!(err, SwitchError::Duplicate(_)));

    let record = fixture
        .store
        .get(&Identity::new("owner@vault.com")?)
        .await?
        .expect("record");
    assert_eq!(record.beneficiary.as_str(), "heir-of-owner@vault.com");
    assert_eq!(record.liveness_interval.as_millis(), 30_000);
    assert_eq!(fixture.blobs.len(), 1);
    Ok(())
}

#[tokio::test]
async fn released_vault_rejects_check_in_by_default() -> Result<()> {
    let fixture = TestFixture::new();
    let deposit = fixture.deposit("owner@vault.com", b"secret", 1_000).await?;
    fixture.tick_at(5_000).await?;

    let err = fixture.switch.check_in(&deposit.subject).await.unwrap_err();
    assert!(matches!(err, SwitchError::AlreadyReleased(_)));

    let meta = fixture.switch.recovery_metadata(&deposit.subject).await?;
    assert_eq!(meta.state, VaultState::Released);
    Ok(())
}

#[tokio::test]
async fn resurrect_policy_revives_and_can_fire_again() -> Result<()> {
    let fixture = TestFixture::with_policy(CheckInPolicy::Resurrect);
    let deposit = fixture.deposit("owner@vault.com", b"secret", 1_000).await?;
    fixture.tick_at(5_000).await?;

    fixture.set_time(6_000);
    let checked = fixture.switch.check_in(&deposit.subject).await?;
    assert_eq!(checked.transition, Transition::Resurrected);
    assert_eq!(checked.record.state, VaultState::Alive);
    assert_eq!(checked.record.last_live_signal, 6_000);

    fixture.tick_at(8_000).await?;
    assert_eq!(fixture.sink.count_for(&deposit.beneficiary), 2);
    Ok(())
}

#[tokio::test]
async fn notification_failure_does_not_undo_release() -> Result<()> {
    let fixture = TestFixture::new();
    let deposit = fixture.deposit("owner@vault.com", b"secret", 1_000).await?;
    fixture.sink.set_failing(true);

    let report = fixture.tick_at(5_000).await?;
    assert_eq!(report.released, 1);
    assert_eq!(report.notify_failures, 1);

    let meta = fixture.switch.recovery_metadata(&deposit.subject).await?;
    assert_eq!(meta.state, VaultState::Released);

    // Recovery still works without the notice.
    let recovered = fixture
        .switch
        .recover(&deposit.subject, &deposit.trustee_fragment)
        .await?;
    assert_eq!(recovered.plaintext, b"secret");
    Ok(())
}

#[tokio::test]
async fn one_tick_handles_many_vaults() -> Result<()> {
    let fixture = TestFixture::new();
    let names = subjects(6);
    for (i, name) in names.iter().enumerate() {
        // Even-indexed subjects have short intervals.
        let interval = if i % 2 == 0 { 1_000 } else { 60_000 };
        fixture.deposit(name, name.as_bytes(), interval).await?;
    }

    let report = fixture.tick_at(10_000).await?;
    assert_eq!(report.scanned, 6);
    assert_eq!(report.released, 3);
    assert_eq!(report.notified, 3);
    assert_eq!(fixture.store.list_alive().await?.len(), 3);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_ticks_release_once() -> Result<()> {
    let fixture = TestFixture::new();
    let names = subjects(8);
    for name in &names {
        fixture.deposit(name, b"payload", 1_000).await?;
    }
    fixture.set_time(2_000);

    let config = SwitchConfig::default().reaper_config();
    let mut handles = Vec::new();
    for _ in 0..4 {
        let reaper = Reaper::new(
            fixture.store.clone(),
            fixture.sink.clone(),
            fixture.clock.clone(),
            config.clone(),
        );
        handles.push(tokio::spawn(async move { reaper.tick().await }));
    }

    let mut released = 0;
    for handle in handles {
        released += handle.await??.released;
    }

    assert_eq!(released, names.len());
    assert_eq!(fixture.sink.delivered().len(), names.len());
    Ok(())
}

#[tokio::test]
async fn stale_observation_loses_to_check_in() -> Result<()> {
    let fixture = TestFixture::new();
    let deposit = fixture.deposit("owner@vault.com", b"secret", 1_000).await?;

    // A reaper read the record while it was still at version 1 ...
    let observed = fixture.store.list_alive().await?.remove(0);

    // ... then the subject checked in before it could act.
    fixture.set_time(1_500);
    fixture.switch.check_in(&deposit.subject).await?;

    let applied = fixture
        .store
        .transition_to_released(&deposit.subject, observed.version, 1_500)
        .await?;
    assert!(!applied);

    let meta = fixture.switch.recovery_metadata(&deposit.subject).await?;
    assert_eq!(meta.state, VaultState::Alive);
    Ok(())
}

#[tokio::test]
async fn accepted_check_in_from_lagging_clock_blocks_expiry() -> Result<()> {
    let fixture = TestFixture::new();
    fixture.set_time(10_000);
    let deposit = fixture.deposit("owner@vault.com", b"secret", 1_000).await?;

    // The reaper sees an overdue vault at 20_000.
    fixture.set_time(20_000);
    let observed = fixture.store.list_alive().await?.remove(0);
    assert_eq!(observed.version, 1);

    // A check-in arrives on a node whose clock reads 9_000.
    fixture.set_time(9_000);
    let checked = fixture.switch.check_in(&deposit.subject).await?;
    assert_eq!(checked.transition, Transition::CheckedIn);
    assert_eq!(checked.record.last_live_signal, observed.last_live_signal);
    assert_eq!(checked.record.version, 2);

    let applied = fixture
        .store
        .transition_to_released(&deposit.subject, observed.version, 20_000)
        .await?;
    assert!(!applied);

    let meta = fixture.switch.recovery_metadata(&deposit.subject).await?;
    assert_eq!(meta.state, VaultState::Alive);
    assert!(fixture.sink.delivered().is_empty());
    Ok(())
}

#[tokio::test]
async fn deleted_vault_never_fires() -> Result<()> {
    let fixture = TestFixture::new();
    let deposit = fixture.deposit("owner@vault.com", b"secret", 1_000).await?;

    fixture.switch.delete_vault(&deposit.subject).await?;
    assert!(fixture.blobs.is_empty());

    let report = fixture.tick_at(10_000).await?;
    assert_eq!(report.scanned, 0);
    assert!(fixture.sink.delivered().is_empty());

    // The subject is free to deposit again.
    fixture.deposit("owner@vault.com", b"again", 1_000).await?;
    Ok(())
}

#[tokio::test]
async fn custom_notice_settings_are_used() -> Result<()> {
    let config = SwitchConfig::from_json(
        r#"{"retrieval_link": "https://vault.example/unlock", "notice_subject": "Vault released"}"#,
    )?;
    let fixture = TestFixture::with_config(config);
    fixture.deposit("owner@vault.com", b"secret", 1_000).await?;
    fixture.tick_at(2_000).await?;

    let notice = &fixture.sink.delivered()[0];
    assert_eq!(notice.title, "Vault released");
    assert_eq!(
        notice.body,
        "URGENT: owner@vault.com is gone. Access vault here: https://vault.example/unlock"
    );
    Ok(())
}

#[tokio::test]
async fn shared_sink_sees_every_reaper() -> Result<()> {
    let sink = Arc::new(MemorySink::new());
    let fixture = TestFixture::new();
    fixture.deposit("owner@vault.com", b"secret", 1_000).await?;
    fixture.set_time(2_000);

    let reaper = Reaper::new(
        fixture.store.clone(),
        sink.clone(),
        fixture.clock.clone(),
        SwitchConfig::default().reaper_config(),
    );
    reaper.tick().await?;

    assert_eq!(sink.delivered().len(), 1);
    assert!(fixture.sink.delivered().is_empty());
    Ok(())
}

#[test]
fn cipher_known_answer_vectors() {
    if let Err(failures) = verify_all_vectors() {
        panic!("vector failures: {:?}", failures);
    }
}

fn run_timeline(policy: CheckInPolicy, steps: &[Step]) -> std::result::Result<(), TestCaseError> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| TestCaseError::fail(e.to_string()))?;

    rt.block_on(async {
        let fixture = TestFixture::with_policy(policy);
        let deposit = fixture
            .deposit("owner@vault.com", b"secret", 30_000)
            .await
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let mut seen_released = false;
        let mut last_signal = 0;

        for step in steps {
            match *step {
                Step::Advance(ms) => {
                    fixture.advance(i64::from(ms));
                }
                Step::CheckIn => {
                    let _ = fixture.switch.check_in(&deposit.subject).await;
                }
                Step::Tick => {
                    fixture
                        .tick()
                        .await
                        .map_err(|e| TestCaseError::fail(e.to_string()))?;
                }
            }

            let record = fixture
                .store
                .get(&deposit.subject)
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?
                .ok_or_else(|| TestCaseError::fail("record vanished"))?;

            prop_assert!(record.last_live_signal >= last_signal);
            last_signal = record.last_live_signal;

            if policy == CheckInPolicy::RejectAfterRelease {
                if seen_released {
                    prop_assert_eq!(record.state, VaultState::Released);
                }
                prop_assert!(fixture.sink.delivered().len() <= 1);
            }
            seen_released |= record.state.is_released();

            // A released vault has produced a notice.
            let notices = fixture.sink.delivered().len();
            if record.state.is_released() {
                prop_assert!(notices >= 1);
            }
        }
        Ok::<(), TestCaseError>(())
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn released_is_terminal_under_reject_policy(steps in timeline(40)) {
        run_timeline(CheckInPolicy::RejectAfterRelease, &steps)?;
    }

    #[test]
    fn signal_is_monotonic_under_any_policy(
        policy in check_in_policy(),
        steps in timeline(40),
    ) {
        run_timeline(policy, &steps)?;
    }
}
