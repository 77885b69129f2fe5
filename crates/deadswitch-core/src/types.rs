//! Strong type definitions for vault records.
//!
//! Every field with a format constraint is a newtype that can only be
//! constructed through validation, so a `VaultRecord` is valid by
//! construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CoreError;

/// Hex length of one key fragment (128 bits).
pub const FRAGMENT_HEX_LEN: usize = 32;

/// Hex length of an AEAD nonce (96 bits).
pub const NONCE_HEX_LEN: usize = 24;

/// Hex length of an asset reference (Blake3, 256 bits).
pub const ASSET_REF_HEX_LEN: usize = 64;

fn is_hex_of_len(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// An opaque, already-authenticated party identifier (subject or beneficiary).
///
/// Compared case-sensitively, exactly as received.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Parse an identity. Empty or whitespace-only values are rejected.
    pub fn new(value: impl Into<String>) -> Result<Self, CoreError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(CoreError::InvalidIdentity("identity is empty".into()));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Identity {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Identity> for String {
    fn from(id: Identity) -> Self {
        id.0
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One half of a 256-bit key, as 32 hex characters.
///
/// The server holds the high-order half, the trustee the low-order half.
/// The value is wiped on drop and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyFragment(String);

impl KeyFragment {
    /// Parse a fragment. Must be exactly 32 hex characters.
    pub fn parse(value: impl Into<String>) -> Result<Self, CoreError> {
        let value = value.into();
        if !is_hex_of_len(&value, FRAGMENT_HEX_LEN) {
            return Err(CoreError::InvalidFragment {
                expected: FRAGMENT_HEX_LEN,
            });
        }
        Ok(Self(value))
    }

    /// Encode 16 raw bytes as a fragment.
    pub fn from_bytes(bytes: &[u8; 16]) -> Self {
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for KeyFragment {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<KeyFragment> for String {
    fn from(fragment: KeyFragment) -> Self {
        fragment.0.clone()
    }
}

impl fmt::Debug for KeyFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyFragment(<redacted>)")
    }
}

/// A 96-bit AEAD nonce, carried as 24 hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonceHex([u8; 12]);

impl NonceHex {
    /// Parse a nonce. Must be exactly 24 hex characters.
    pub fn parse(value: impl AsRef<str>) -> Result<Self, CoreError> {
        let invalid = CoreError::InvalidNonce {
            expected: NONCE_HEX_LEN,
        };
        let value = value.as_ref();
        if value.len() != NONCE_HEX_LEN {
            return Err(invalid);
        }
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(value, &mut bytes).map_err(|_| invalid)?;
        Ok(Self(bytes))
    }

    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl TryFrom<String> for NonceHex {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<NonceHex> for String {
    fn from(nonce: NonceHex) -> Self {
        nonce.to_hex()
    }
}

impl fmt::Debug for NonceHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({})", self.to_hex())
    }
}

impl fmt::Display for NonceHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Locator for a stored ciphertext blob.
///
/// Computed as the lowercase hex Blake3 digest of the ciphertext, so a
/// reference is always 64 characters from `[0-9a-f]` and safe to use as a
/// file name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetRef(String);

impl AssetRef {
    /// Derive the reference for a ciphertext.
    pub fn for_content(ciphertext: &[u8]) -> Self {
        Self(blake3::hash(ciphertext).to_hex().to_string())
    }

    /// Parse a reference received from a caller.
    pub fn parse(value: impl Into<String>) -> Result<Self, CoreError> {
        let value = value.into();
        let lower_hex = value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if value.len() != ASSET_REF_HEX_LEN || !lower_hex {
            return Err(CoreError::InvalidAssetRef(format!(
                "expected {} lowercase hex characters",
                ASSET_REF_HEX_LEN
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AssetRef {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<AssetRef> for String {
    fn from(asset: AssetRef) -> Self {
        asset.0
    }
}

impl fmt::Debug for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetRef({})", &self.0[..16])
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How long a vault may go without a check-in before it is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct LivenessInterval(u64);

impl LivenessInterval {
    /// The interval used when a vault is created without one (30 s).
    pub const DEFAULT: Self = Self(30_000);

    /// Create from milliseconds. Zero is rejected.
    pub fn from_millis(ms: u64) -> Result<Self, CoreError> {
        if ms == 0 {
            return Err(CoreError::InvalidInterval);
        }
        Ok(Self(ms))
    }

    pub const fn as_millis(&self) -> u64 {
        self.0
    }
}

impl Default for LivenessInterval {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u64> for LivenessInterval {
    type Error = CoreError;

    fn try_from(ms: u64) -> Result<Self, Self::Error> {
        Self::from_millis(ms)
    }
}

impl From<LivenessInterval> for u64 {
    fn from(interval: LivenessInterval) -> Self {
        interval.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_rejects_empty() {
        assert!(Identity::new("").is_err());
        assert!(Identity::new("   ").is_err());
        assert_eq!(Identity::new("a@b.c").unwrap().as_str(), "a@b.c");
    }

    #[test]
    fn test_identity_is_case_sensitive() {
        let lower = Identity::new("owner@vault.com").unwrap();
        let upper = Identity::new("Owner@vault.com").unwrap();
        assert_ne!(lower, upper);
    }

    #[test]
    fn test_fragment_length_and_charset() {
        assert!(KeyFragment::parse("00112233445566778899aabbccddeeff").is_ok());
        assert!(KeyFragment::parse("00112233445566778899AABBCCDDEEFF").is_ok());
        assert!(KeyFragment::parse("00112233445566778899aabbccddeef").is_err());
        assert!(KeyFragment::parse("00112233445566778899aabbccddeeff00").is_err());
        assert!(KeyFragment::parse("g0112233445566778899aabbccddeeff").is_err());
    }

    #[test]
    fn test_fragment_debug_is_redacted() {
        let fragment = KeyFragment::from_bytes(&[0xab; 16]);
        let debug = format!("{:?}", fragment);
        assert!(!debug.contains("abab"));
    }

    #[test]
    fn test_nonce_bytes_roundtrip() {
        let nonce = NonceHex::from_bytes([7u8; 12]);
        assert_eq!(nonce.to_hex().len(), NONCE_HEX_LEN);
        assert_eq!(NonceHex::parse(nonce.to_hex()).unwrap(), nonce);
        assert!(NonceHex::parse("0011").is_err());
        assert!(NonceHex::parse("zz0102030405060708090a0b").is_err());
    }

    #[test]
    fn test_asset_ref_content_addressed() {
        let a = AssetRef::for_content(b"ciphertext");
        let b = AssetRef::for_content(b"ciphertext");
        let c = AssetRef::for_content(b"other");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(AssetRef::parse(a.as_str()).unwrap(), a);
    }

    #[test]
    fn test_asset_ref_rejects_path_like_input() {
        assert!(AssetRef::parse("../../etc/passwd").is_err());
        assert!(AssetRef::parse("A".repeat(64)).is_err());
    }

    #[test]
    fn test_interval_must_be_positive() {
        assert_eq!(
            LivenessInterval::from_millis(0),
            Err(CoreError::InvalidInterval)
        );
        assert_eq!(LivenessInterval::default().as_millis(), 30_000);
    }

    #[test]
    fn test_serde_validates_on_deserialize() {
        let bad: Result<KeyFragment, _> = serde_json::from_str("\"zz\"");
        assert!(bad.is_err());
        let bad: Result<LivenessInterval, _> = serde_json::from_str("0");
        assert!(bad.is_err());
    }
}
