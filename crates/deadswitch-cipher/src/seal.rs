//! Seal and open: the split-key cipher.

use deadswitch_core::{KeyFragment, NonceHex};

use crate::crypto::{generate_nonce, AssetKey};
use crate::envelope::SealedAsset;
use crate::error::{CipherError, Result};

/// Encrypt `plaintext` under a fresh key and nonce and split the key.
///
/// The key never leaves this function whole; callers get two fragments.
pub fn seal(plaintext: &[u8]) -> Result<SealedAsset> {
    let key = AssetKey::generate();
    let nonce = generate_nonce();
    let ciphertext = key.encrypt(plaintext, &nonce)?;
    let (server_fragment, trustee_fragment) = key.split();

    Ok(SealedAsset {
        ciphertext,
        nonce,
        server_fragment,
        trustee_fragment,
    })
}

/// Recover a plaintext from both fragments.
///
/// Fails closed: no output unless the GCM tag verifies.
pub fn open(
    ciphertext: &[u8],
    nonce: &NonceHex,
    server_fragment: &KeyFragment,
    trustee_fragment: &KeyFragment,
) -> Result<Vec<u8>> {
    let key = AssetKey::join(server_fragment.as_str(), trustee_fragment.as_str())?;
    key.decrypt(ciphertext, nonce)
}

/// Like [`open`], but with untrusted hex strings for every key input.
///
/// Malformed input is reported as `InvalidKeyOrCorrupt`, same as a tag
/// mismatch.
pub fn open_hex(
    ciphertext: &[u8],
    nonce: &str,
    server_fragment: &str,
    trustee_fragment: &str,
) -> Result<Vec<u8>> {
    let nonce = NonceHex::parse(nonce).map_err(|_| CipherError::InvalidKeyOrCorrupt)?;
    let key = AssetKey::join(server_fragment, trustee_fragment)?;
    key.decrypt(ciphertext, &nonce)
}
