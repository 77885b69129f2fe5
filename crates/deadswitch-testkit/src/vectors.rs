//! Known-answer vectors for the split-key cipher.
//!
//! These pin the wire contract: fragments are joined server-first, hex
//! decoded, and used as an AES-256-GCM key with the tag appended to the
//! ciphertext. The values come from the GCM reference test cases for
//! AES-256 with an all-zero key and IV.

use serde::{Deserialize, Serialize};

use deadswitch_cipher::open_hex;

/// A single known-answer vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CipherVector {
    pub name: String,
    pub description: String,

    // Inputs, all hex
    pub server_fragment: String,
    pub trustee_fragment: String,
    pub nonce: String,
    pub ciphertext: String,

    // Expected output, hex
    pub plaintext: String,
}

const ZERO_FRAGMENT: &str = "00000000000000000000000000000000";
const ZERO_NONCE: &str = "000000000000000000000000";

/// All known-answer vectors.
pub fn all_vectors() -> Vec<CipherVector> {
    vec![
        CipherVector {
            name: "empty_plaintext".into(),
            description: "AES-256-GCM, zero key and nonce, empty plaintext: tag only".into(),
            server_fragment: ZERO_FRAGMENT.into(),
            trustee_fragment: ZERO_FRAGMENT.into(),
            nonce: ZERO_NONCE.into(),
            ciphertext: "530f8afbc74536b9a963b4f1c4cb738b".into(),
            plaintext: String::new(),
        },
        CipherVector {
            name: "one_zero_block".into(),
            description: "AES-256-GCM, zero key and nonce, one zero block".into(),
            server_fragment: ZERO_FRAGMENT.into(),
            trustee_fragment: ZERO_FRAGMENT.into(),
            nonce: ZERO_NONCE.into(),
            ciphertext: "cea7403d4d606b6e074ec5d3baf39d18d0d1c8a799996bf0265b98b5d48ab919"
                .into(),
            plaintext: "00000000000000000000000000000000".into(),
        },
    ]
}

/// Open a vector and compare against its expected plaintext.
pub fn verify_vector(vector: &CipherVector) -> Result<(), String> {
    let ciphertext = hex::decode(&vector.ciphertext).map_err(|e| e.to_string())?;
    let expected = hex::decode(&vector.plaintext).map_err(|e| e.to_string())?;

    let plaintext = open_hex(
        &ciphertext,
        &vector.nonce,
        &vector.server_fragment,
        &vector.trustee_fragment,
    )
    .map_err(|e| format!("{}: {}", vector.name, e))?;

    if plaintext != expected {
        return Err(format!("{}: plaintext mismatch", vector.name));
    }
    Ok(())
}

/// Verify every vector, collecting failures.
pub fn verify_all_vectors() -> Result<(), Vec<String>> {
    let failures: Vec<String> = all_vectors()
        .iter()
        .filter_map(|v| verify_vector(v).err())
        .collect();
    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}
