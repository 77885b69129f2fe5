//! # Deadswitch Store
//!
//! Storage abstraction for vault records and encrypted assets. Provides
//! trait-based interfaces with SQLite, filesystem and in-memory
//! implementations.
//!
//! ## Key Types
//!
//! - [`VaultStore`] - The async trait for vault record operations
//! - [`BlobStore`] - The async trait for ciphertext storage
//! - [`SqliteStore`] - SQLite-based persistent vault storage
//! - [`FsBlobStore`] - One-file-per-blob ciphertext storage
//! - [`MemoryStore`], [`MemoryBlobStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use deadswitch_store::{SqliteStore, VaultStore};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("vaults.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let alive = store.list_alive().await.unwrap();
//!     println!("{} vaults armed", alive.len());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **One record per subject**: `create` reports `Duplicate` instead of overwriting
//! - **Nonce uniqueness**: a nonce bound to one record is refused for another
//! - **Guarded expiry**: `transition_to_released` is a compare-and-set on the
//!   record version, so a racing check-in always wins
//! - **Content addressing**: blobs are keyed by the Blake3 hash of the ciphertext

pub mod blob;
pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use blob::FsBlobStore;
pub use error::{Result, StoreError};
pub use memory::{MemoryBlobStore, MemoryStore};
pub use sqlite::SqliteStore;
pub use traits::{BlobStore, CreateResult, LivenessUpdate, VaultStore};
