//! # Deadswitch Cipher
//!
//! Split-key authenticated encryption for deposited assets.
//!
//! ## Encryption Model
//!
//! 1. A fresh 256-bit key and a fresh 96-bit nonce are drawn from the OS RNG.
//! 2. The asset is sealed with AES-256-GCM; the tag is appended to the
//!    ciphertext.
//! 3. The key is hex-encoded (64 characters) and split at the midpoint:
//!    the first 32 characters go to the server, the last 32 to the trustee.
//!
//! Neither half says anything about the other, so the server alone can
//! never decrypt. Recovery concatenates `server || trustee`, decodes, and
//! lets the GCM tag decide: any wrong fragment, nonce or ciphertext byte is
//! reported as the same [`CipherError::InvalidKeyOrCorrupt`].
//!
//! ## Usage
//!
//! ```rust
//! use deadswitch_cipher::{open, seal};
//!
//! let sealed = seal(b"last will").unwrap();
//! let (bundle, trustee_fragment) = sealed.split_for_upload();
//!
//! // The bundle goes to the server; the trustee fragment goes to the
//! // beneficiary out of band.
//! let plaintext = open(
//!     &bundle.ciphertext,
//!     &bundle.nonce,
//!     &bundle.server_fragment,
//!     &trustee_fragment,
//! )
//! .unwrap();
//! assert_eq!(plaintext, b"last will");
//! ```

pub mod crypto;
pub mod envelope;
pub mod error;
pub mod seal;

pub use crypto::{AssetKey, KEY_LEN, NONCE_LEN};
pub use envelope::{SealedAsset, UploadBundle};
pub use error::{CipherError, Result};
pub use seal::{open, open_hex, seal};
