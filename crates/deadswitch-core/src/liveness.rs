//! Liveness state machine.
//!
//! Two transitions exist:
//!
//! - **Check-in** refreshes `last_live_signal`. What it does to a vault
//!   that is already released depends on the [`CheckInPolicy`].
//! - **Expiry** moves `Alive -> Released` once
//!   `now - last_live_signal > liveness_interval`. Only the reaper drives it.
//!
//! Everything here is pure. Storage backends apply these rules under their
//! own atomicity guarantees.

use serde::{Deserialize, Serialize};

use crate::error::TransitionError;
use crate::record::{VaultRecord, VaultState};

/// What a check-in does to a vault that has already been released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInPolicy {
    /// Released is final. The check-in fails and the record is untouched.
    #[default]
    RejectAfterRelease,

    /// The check-in returns the vault to `Alive`, even if the beneficiary
    /// has already been notified.
    Resurrect,
}

/// Outcome of evaluating a record against the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// Still inside the interval.
    Alive { elapsed_ms: u64, remaining_ms: u64 },
    /// Interval exceeded; the reaper should release.
    Expired { elapsed_ms: u64 },
    /// Already released; nothing to do.
    Released,
}

impl Evaluation {
    pub fn is_expired(&self) -> bool {
        matches!(self, Evaluation::Expired { .. })
    }
}

/// The transition a check-in maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInDecision {
    /// `Alive -> Alive`, refresh the signal.
    Refresh,
    /// `Released -> Alive` under [`CheckInPolicy::Resurrect`].
    Resurrect,
    /// Refused under [`CheckInPolicy::RejectAfterRelease`].
    Reject,
}

/// A transition that was applied to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    CheckedIn,
    Resurrected,
    Released,
}

/// Evaluate a record at `now`.
pub fn evaluate(record: &VaultRecord, now: i64) -> Evaluation {
    if record.state.is_released() {
        return Evaluation::Released;
    }

    let elapsed_ms = record.elapsed(now);
    let interval = record.liveness_interval.as_millis();
    if elapsed_ms > interval {
        Evaluation::Expired { elapsed_ms }
    } else {
        Evaluation::Alive {
            elapsed_ms,
            remaining_ms: interval - elapsed_ms,
        }
    }
}

/// Decide what a check-in does in the given state.
pub fn check_in_decision(state: VaultState, policy: CheckInPolicy) -> CheckInDecision {
    match (state, policy) {
        (VaultState::Alive, _) => CheckInDecision::Refresh,
        (VaultState::Released, CheckInPolicy::Resurrect) => CheckInDecision::Resurrect,
        (VaultState::Released, CheckInPolicy::RejectAfterRelease) => CheckInDecision::Reject,
    }
}

/// Apply a check-in to a record in place.
///
/// The signal only moves forward: a check-in stamped earlier than the
/// current signal leaves it where it is.
pub fn apply_check_in(
    record: &mut VaultRecord,
    now: i64,
    policy: CheckInPolicy,
) -> Result<Transition, TransitionError> {
    let transition = match check_in_decision(record.state, policy) {
        CheckInDecision::Refresh => Transition::CheckedIn,
        CheckInDecision::Resurrect => Transition::Resurrected,
        CheckInDecision::Reject => return Err(TransitionError::AlreadyReleased),
    };

    record.last_live_signal = record.last_live_signal.max(now);
    record.state = VaultState::Alive;
    record.version += 1;
    Ok(transition)
}

/// Apply expiry to a record in place.
///
/// Fails unless the record is alive and overdue at `now`.
pub fn apply_expiry(record: &mut VaultRecord, now: i64) -> Result<Transition, TransitionError> {
    match evaluate(record, now) {
        Evaluation::Released => Err(TransitionError::NotAlive(record.state)),
        Evaluation::Alive { remaining_ms, .. } => Err(TransitionError::NotExpired { remaining_ms }),
        Evaluation::Expired { .. } => {
            record.state = VaultState::Released;
            record.version += 1;
            Ok(Transition::Released)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::VaultDraft;
    use crate::types::{AssetRef, Identity, KeyFragment, LivenessInterval, NonceHex};
    use proptest::prelude::*;

    fn record_at(created: i64, interval_ms: u64) -> VaultRecord {
        let draft = VaultDraft {
            subject: Identity::new("owner@vault.com").unwrap(),
            beneficiary: Identity::new("heir@vault.com").unwrap(),
            server_fragment: KeyFragment::from_bytes(&[1u8; 16]),
            nonce: NonceHex::from_bytes([2u8; 12]),
            asset_ref: AssetRef::for_content(b"blob"),
            asset_name: "will.pdf".into(),
            liveness_interval: LivenessInterval::from_millis(interval_ms).unwrap(),
        };
        VaultRecord::create(draft, created).unwrap()
    }

    #[test]
    fn test_no_checkin_expires_after_interval() {
        let record = record_at(0, 30_000);
        assert!(evaluate(&record, 31_000).is_expired());
        assert_eq!(
            evaluate(&record, 29_000),
            Evaluation::Alive {
                elapsed_ms: 29_000,
                remaining_ms: 1_000
            }
        );
    }

    #[test]
    fn test_checkin_pushes_deadline() {
        let mut record = record_at(0, 30_000);
        apply_check_in(&mut record, 20_000, CheckInPolicy::default()).unwrap();

        assert_eq!(
            evaluate(&record, 31_000),
            Evaluation::Alive {
                elapsed_ms: 11_000,
                remaining_ms: 19_000
            }
        );
    }

    #[test]
    fn test_expiry_only_when_overdue() {
        let mut record = record_at(0, 30_000);
        assert_eq!(
            apply_expiry(&mut record, 30_000),
            Err(TransitionError::NotExpired { remaining_ms: 0 })
        );
        assert_eq!(apply_expiry(&mut record, 30_001), Ok(Transition::Released));
        assert_eq!(record.state, VaultState::Released);
        assert_eq!(
            apply_expiry(&mut record, 40_000),
            Err(TransitionError::NotAlive(VaultState::Released))
        );
    }

    #[test]
    fn test_reject_policy_keeps_released() {
        let mut record = record_at(0, 1_000);
        apply_expiry(&mut record, 5_000).unwrap();
        let version = record.version;

        let result = apply_check_in(&mut record, 6_000, CheckInPolicy::RejectAfterRelease);
        assert_eq!(result, Err(TransitionError::AlreadyReleased));
        assert_eq!(record.state, VaultState::Released);
        assert_eq!(record.last_live_signal, 0);
        assert_eq!(record.version, version);
    }

    #[test]
    fn test_resurrect_policy_revives() {
        let mut record = record_at(0, 1_000);
        apply_expiry(&mut record, 5_000).unwrap();

        let result = apply_check_in(&mut record, 6_000, CheckInPolicy::Resurrect);
        assert_eq!(result, Ok(Transition::Resurrected));
        assert_eq!(record.state, VaultState::Alive);
        assert_eq!(record.last_live_signal, 6_000);
    }

    #[test]
    fn test_decision_table() {
        use CheckInDecision as D;
        use CheckInPolicy as P;
        use VaultState as S;

        let table = [
            (S::Alive, P::RejectAfterRelease, D::Refresh),
            (S::Alive, P::Resurrect, D::Refresh),
            (S::Released, P::RejectAfterRelease, D::Reject),
            (S::Released, P::Resurrect, D::Resurrect),
        ];
        for (state, policy, expected) in table {
            assert_eq!(check_in_decision(state, policy), expected);
        }
    }

    proptest! {
        #[test]
        fn test_signal_never_decreases(
            created in 0i64..1_000_000,
            stamps in prop::collection::vec(0i64..2_000_000, 1..20),
        ) {
            let mut record = record_at(created, 10_000);
            let mut last = record.last_live_signal;
            for stamp in stamps {
                apply_check_in(&mut record, stamp, CheckInPolicy::RejectAfterRelease).unwrap();
                prop_assert!(record.last_live_signal >= last);
                last = record.last_live_signal;
            }
        }

        #[test]
        fn test_released_is_final_under_reject(
            interval in 1u64..100_000,
            later in prop::collection::vec(0i64..1_000_000, 1..10),
        ) {
            let mut record = record_at(0, interval);
            apply_expiry(&mut record, interval as i64 + 1).unwrap();
            for now in later {
                let _ = apply_check_in(&mut record, now, CheckInPolicy::RejectAfterRelease);
                let _ = apply_expiry(&mut record, now);
                prop_assert_eq!(record.state, VaultState::Released);
            }
        }
    }
}
