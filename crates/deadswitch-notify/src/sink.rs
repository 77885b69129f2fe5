//! Sink abstraction for release notices.
//!
//! A sink hands a notice to whatever delivers it: mail, a webhook, a log.
//! Delivery is best-effort; callers treat an error as "not delivered" and
//! never roll anything back because of it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use deadswitch_core::Identity;

use crate::error::{NotifyError, Result};
use crate::notice::ReleaseNotice;

/// Delivers release notices.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Attempt to deliver one notice.
    async fn notify(&self, notice: &ReleaseNotice) -> Result<()>;
}

#[async_trait]
impl<T: NotificationSink + ?Sized> NotificationSink for Arc<T> {
    async fn notify(&self, notice: &ReleaseNotice) -> Result<()> {
        (**self).notify(notice).await
    }
}

/// Sink that writes each notice to the `tracing` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

#[async_trait]
impl NotificationSink for TracingSink {
    async fn notify(&self, notice: &ReleaseNotice) -> Result<()> {
        tracing::info!(
            recipient = %notice.recipient,
            subject = %notice.subject,
            title = %notice.title,
            link = %notice.retrieval_link,
            "release notice"
        );
        Ok(())
    }
}

/// In-memory sink that records every delivered notice.
///
/// Can be switched into a failing mode to exercise error paths.
#[derive(Debug, Default)]
pub struct MemorySink {
    delivered: Mutex<Vec<ReleaseNotice>>,
    failing: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent deliveries fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of delivered notices, in delivery order.
    pub fn delivered(&self) -> Vec<ReleaseNotice> {
        self.delivered
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }

    /// Number of notices delivered to `recipient`.
    pub fn count_for(&self, recipient: &Identity) -> usize {
        self.delivered()
            .iter()
            .filter(|n| &n.recipient == recipient)
            .count()
    }
}

#[async_trait]
impl NotificationSink for MemorySink {
    async fn notify(&self, notice: &ReleaseNotice) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Delivery {
                recipient: notice.recipient.to_string(),
                reason: "sink unavailable".into(),
            });
        }
        self.delivered
            .lock()
            .map_err(|_| NotifyError::Poisoned)?
            .push(notice.clone());
        Ok(())
    }
}
