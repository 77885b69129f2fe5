//! Key material and the AES-256-GCM primitive.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use deadswitch_core::types::FRAGMENT_HEX_LEN;
use deadswitch_core::{KeyFragment, NonceHex};

use crate::error::{CipherError, Result};

/// Key length in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Nonce length in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// A 256-bit AES key. Wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AssetKey([u8; KEY_LEN]);

impl AssetKey {
    /// Generate a new key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Split the hex encoding at its midpoint.
    ///
    /// Returns `(server, trustee)`: the server gets the high-order half.
    pub fn split(&self) -> (KeyFragment, KeyFragment) {
        let mut high = [0u8; KEY_LEN / 2];
        let mut low = [0u8; KEY_LEN / 2];
        high.copy_from_slice(&self.0[..KEY_LEN / 2]);
        low.copy_from_slice(&self.0[KEY_LEN / 2..]);

        let fragments = (KeyFragment::from_bytes(&high), KeyFragment::from_bytes(&low));
        high.zeroize();
        low.zeroize();
        fragments
    }

    /// Rebuild a key from `server || trustee` hex fragments.
    pub fn join(server: &str, trustee: &str) -> Result<Self> {
        if server.len() != FRAGMENT_HEX_LEN || trustee.len() != FRAGMENT_HEX_LEN {
            return Err(CipherError::InvalidKeyOrCorrupt);
        }

        let mut joined = Zeroizing::new(String::with_capacity(FRAGMENT_HEX_LEN * 2));
        joined.push_str(server);
        joined.push_str(trustee);

        let mut bytes = [0u8; KEY_LEN];
        hex::decode_to_slice(joined.as_str(), &mut bytes)
            .map_err(|_| CipherError::InvalidKeyOrCorrupt)?;
        Ok(Self(bytes))
    }

    /// Encrypt with AES-256-GCM. The 16-byte tag is appended.
    pub fn encrypt(&self, plaintext: &[u8], nonce: &NonceHex) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new_from_slice(&self.0)
            .map_err(|e| CipherError::EncryptionError(e.to_string()))?;

        cipher
            .encrypt(Nonce::from_slice(nonce.as_bytes()), plaintext)
            .map_err(|e| CipherError::EncryptionError(e.to_string()))
    }

    /// Decrypt and authenticate. Any failure is `InvalidKeyOrCorrupt`.
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &NonceHex) -> Result<Vec<u8>> {
        let cipher =
            Aes256Gcm::new_from_slice(&self.0).map_err(|_| CipherError::InvalidKeyOrCorrupt)?;

        cipher
            .decrypt(Nonce::from_slice(nonce.as_bytes()), ciphertext)
            .map_err(|_| CipherError::InvalidKeyOrCorrupt)
    }
}

impl std::fmt::Debug for AssetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AssetKey(<redacted>)")
    }
}

/// Generate a fresh nonce from the OS CSPRNG, independent of any key.
pub fn generate_nonce() -> NonceHex {
    let mut bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut bytes);
    NonceHex::from_bytes(bytes)
}
