//! # Deadswitch Notify
//!
//! Release notices and the sinks that deliver them.
//!
//! When the reaper releases a vault it renders a [`ReleaseNotice`] for the
//! beneficiary and hands it to a [`NotificationSink`]. Delivery is
//! best-effort: a failed delivery is logged, and the vault stays released.
//!
//! ## Sinks
//!
//! - [`TracingSink`] - writes notices to the `tracing` log
//! - [`MemorySink`] - records notices in memory, with a failure switch for tests

pub mod error;
pub mod notice;
pub mod sink;

pub use error::{NotifyError, Result};
pub use notice::{NoticeTemplate, ReleaseNotice, DEFAULT_RETRIEVAL_LINK, DEFAULT_TITLE};
pub use sink::{MemorySink, NotificationSink, TracingSink};
