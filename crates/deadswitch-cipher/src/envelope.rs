//! Sealed asset envelopes.
//!
//! `SealedAsset` is what the depositor holds right after sealing. It is
//! split into an [`UploadBundle`] for the server and the trustee fragment,
//! which must only ever go to the beneficiary.

use serde::{Deserialize, Serialize};

use deadswitch_core::{KeyFragment, NonceHex};

use crate::error::{CipherError, Result};

/// Output of [`crate::seal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedAsset {
    /// AES-256-GCM ciphertext with the tag appended.
    pub ciphertext: Vec<u8>,

    /// Nonce the asset was sealed under.
    pub nonce: NonceHex,

    /// High-order key half, held by the server.
    pub server_fragment: KeyFragment,

    /// Low-order key half, held by the trustee only.
    pub trustee_fragment: KeyFragment,
}

impl SealedAsset {
    /// Separate what the server may see from what it must not.
    pub fn split_for_upload(self) -> (UploadBundle, KeyFragment) {
        let SealedAsset {
            ciphertext,
            nonce,
            server_fragment,
            trustee_fragment,
        } = self;

        (
            UploadBundle {
                ciphertext,
                nonce,
                server_fragment,
            },
            trustee_fragment,
        )
    }
}

/// The part of a sealed asset that is sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadBundle {
    #[serde(with = "serde_bytes")]
    pub ciphertext: Vec<u8>,
    pub nonce: NonceHex,
    pub server_fragment: KeyFragment,
}

impl UploadBundle {
    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| CipherError::SerializationError(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| CipherError::SerializationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seal::{open, seal};

    #[test]
    fn test_split_keeps_trustee_out_of_bundle() {
        let sealed = seal(b"asset").unwrap();
        let trustee = sealed.trustee_fragment.clone();
        let (bundle, kept) = sealed.split_for_upload();

        assert_eq!(kept, trustee);
        let bytes = bundle.to_bytes().unwrap();
        let needle = trustee.as_str().as_bytes();
        assert!(!bytes.windows(needle.len()).any(|w| w == needle));
    }

    #[test]
    fn test_bundle_serialization() {
        let sealed = seal(b"asset").unwrap();
        let (bundle, trustee) = sealed.split_for_upload();

        let recovered = UploadBundle::from_bytes(&bundle.to_bytes().unwrap()).unwrap();
        assert_eq!(recovered, bundle);

        let plaintext = open(
            &recovered.ciphertext,
            &recovered.nonce,
            &recovered.server_fragment,
            &trustee,
        )
        .unwrap();
        assert_eq!(plaintext, b"asset");
    }

    #[test]
    fn test_bundle_rejects_garbage() {
        assert!(matches!(
            UploadBundle::from_bytes(&[0xff, 0x00, 0x13]),
            Err(CipherError::SerializationError(_))
        ));
    }
}
