//! # Deadswitch
//!
//! A dead man's switch with split-key custody.
//!
//! ## Overview
//!
//! A subject seals an asset on their own machine and deposits the
//! ciphertext with half of the key. The other half goes to a beneficiary.
//! As long as the subject keeps checking in, nothing happens. When they
//! stop for longer than their liveness interval, the reaper releases the
//! vault exactly once and notifies the beneficiary, who can then combine
//! both halves and recover the asset.
//!
//! ## Key Concepts
//!
//! - **Split key**: the server holds the high-order half of an AES-256-GCM
//!   key and can never decrypt alone.
//! - **Check-in**: refreshes the liveness signal. Never moves it backwards.
//! - **Release**: `alive -> released`, driven only by the reaper, applied
//!   with a compare-and-set so a racing check-in wins.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use deadswitch::{NewVault, Reaper, Switch, SwitchConfig};
//! use deadswitch::cipher::seal;
//! use deadswitch::core::{Identity, SystemClock};
//! use deadswitch::notify::TracingSink;
//! use deadswitch::store::{FsBlobStore, SqliteStore};
//!
//! async fn example() -> deadswitch::Result<()> {
//!     let config = SwitchConfig::default();
//!     let vaults = Arc::new(SqliteStore::open("vaults.db")?);
//!     let blobs = Arc::new(FsBlobStore::open("blobs").await?);
//!     let clock = Arc::new(SystemClock);
//!
//!     let switch = Switch::new(vaults.clone(), blobs, clock.clone(), config.clone());
//!     let reaper = Reaper::new(vaults, Arc::new(TracingSink), clock, config.reaper_config())
//!         .spawn();
//!
//!     // Client side: seal, keep the trustee fragment away from the server.
//!     let (bundle, _trustee_fragment) = seal(b"my will")?.split_for_upload();
//!
//!     let subject = Identity::new("owner@example.com")?;
//!     let request = NewVault::new(
//!         subject.clone(),
//!         Identity::new("heir@example.com")?,
//!         bundle.server_fragment,
//!         bundle.nonce,
//!         "will.txt",
//!     );
//!     switch.upload(request, bundle.ciphertext.into()).await?;
//!     switch.check_in(&subject).await?;
//!
//!     reaper.shutdown().await
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `deadswitch::core` - Records, identifiers, the liveness state machine
//! - `deadswitch::cipher` - Split-key sealing and opening
//! - `deadswitch::store` - Vault and ciphertext storage
//! - `deadswitch::notify` - Release notices and sinks

pub mod config;
pub mod error;
pub mod reaper;
pub mod switch;

// Re-export component crates
pub use deadswitch_cipher as cipher;
pub use deadswitch_core as core;
pub use deadswitch_notify as notify;
pub use deadswitch_store as store;

// Re-export main types for convenience
pub use config::{ReaperConfig, SwitchConfig};
pub use error::{Result, SwitchError};
pub use reaper::{Reaper, ReaperHandle, TickReport};
pub use switch::{CheckIn, NewVault, RecoveredAsset, RecoveryMetadata, Switch};

// Re-export commonly used core types
pub use deadswitch_core::{
    AssetRef, CheckInPolicy, Clock, Identity, KeyFragment, LivenessInterval, NonceHex,
    VaultRecord, VaultState,
};
