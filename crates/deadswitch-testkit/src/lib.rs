//! # Deadswitch Testkit
//!
//! Testing utilities for deadswitch.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a switch and reaper over in-memory stores with a manual clock
//! - **Generators**: Proptest strategies for property-based testing
//! - **Vectors**: Known-answer vectors pinning the split-key cipher
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use deadswitch_testkit::TestFixture;
//!
//! async fn example() {
//!     let fixture = TestFixture::new();
//!     let deposit = fixture.deposit("owner@example.com", b"secret", 30_000).await.unwrap();
//!
//!     let report = fixture.tick_at(31_000).await.unwrap();
//!     assert_eq!(report.released, 1);
//!     assert_eq!(fixture.sink.count_for(&deposit.beneficiary), 1);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use deadswitch_testkit::generators::{timeline, Step};
//!
//! proptest! {
//!     #[test]
//!     fn released_stays_released(steps in timeline(32)) {
//!         // drive a TestFixture through `steps`
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{subjects, Deposit, TestFixture};
pub use generators::{timeline, vault_draft, Step};
pub use vectors::{all_vectors, verify_all_vectors, CipherVector};
