//! Proptest generators for property-based testing.

use proptest::prelude::*;

use deadswitch_core::{
    AssetRef, CheckInPolicy, Identity, KeyFragment, LivenessInterval, NonceHex, VaultDraft,
};

/// Generate a valid identity.
pub fn identity() -> impl Strategy<Value = Identity> {
    "[a-z][a-z0-9.]{0,15}@[a-z]{1,8}\\.(com|org|test)"
        .prop_filter_map("blank identity", |s| Identity::new(s).ok())
}

/// Generate a key fragment.
pub fn key_fragment() -> impl Strategy<Value = KeyFragment> {
    any::<[u8; 16]>().prop_map(|b| KeyFragment::from_bytes(&b))
}

/// Generate a nonce.
pub fn nonce() -> impl Strategy<Value = NonceHex> {
    any::<[u8; 12]>().prop_map(NonceHex::from_bytes)
}

/// Generate a liveness interval between 1 ms and one year.
pub fn liveness_interval() -> impl Strategy<Value = LivenessInterval> {
    (1u64..=31_536_000_000u64).prop_filter_map("zero interval", |ms| {
        LivenessInterval::from_millis(ms).ok()
    })
}

/// Generate a reasonable timestamp.
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..=1_700_000_000_000i64
}

pub fn check_in_policy() -> impl Strategy<Value = CheckInPolicy> {
    prop_oneof![
        Just(CheckInPolicy::RejectAfterRelease),
        Just(CheckInPolicy::Resurrect),
    ]
}

/// Generate plaintext bytes of specified max length.
pub fn plaintext(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a display name.
pub fn asset_name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,24}\\.(pdf|zip|txt|bin)".prop_map(String::from)
}

/// Generate a complete, valid vault draft.
pub fn vault_draft() -> impl Strategy<Value = VaultDraft> {
    (
        identity(),
        identity(),
        key_fragment(),
        nonce(),
        plaintext(64),
        asset_name(),
        liveness_interval(),
    )
        .prop_map(
            |(subject, beneficiary, server_fragment, nonce, content, asset_name, interval)| {
                VaultDraft {
                    subject,
                    beneficiary,
                    server_fragment,
                    nonce,
                    asset_ref: AssetRef::for_content(&content),
                    asset_name,
                    liveness_interval: interval,
                }
            },
        )
}

/// One step of a simulated timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Move the clock forward.
    Advance(u32),
    /// The subject checks in.
    CheckIn,
    /// The reaper runs.
    Tick,
}

/// Generate a timeline of up to `max_len` steps.
pub fn timeline(max_len: usize) -> impl Strategy<Value = Vec<Step>> {
    let step = prop_oneof![
        3 => (0u32..=60_000u32).prop_map(Step::Advance),
        2 => Just(Step::CheckIn),
        2 => Just(Step::Tick),
    ];
    prop::collection::vec(step, 0..=max_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deadswitch_core::VaultRecord;

    proptest! {
        #[test]
        fn test_generated_drafts_are_valid(draft in vault_draft(), now in timestamp()) {
            let record = VaultRecord::create(draft, now).unwrap();
            prop_assert!(record.state.is_alive());
            prop_assert_eq!(record.last_live_signal, now);
        }

        #[test]
        fn test_identity_roundtrips_through_json(id in identity()) {
            let json = serde_json::to_string(&id).unwrap();
            let back: Identity = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, id);
        }
    }
}
