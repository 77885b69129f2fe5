//! The message sent to a beneficiary when a vault is released.

use serde::{Deserialize, Serialize};

use deadswitch_core::Identity;

/// Default notice title.
pub const DEFAULT_TITLE: &str = "Dead Man's Switch Triggered";

/// Default locator the beneficiary follows to unlock the vault.
pub const DEFAULT_RETRIEVAL_LINK: &str = "http://localhost:5173/unlock";

/// A release notification addressed to one beneficiary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseNotice {
    /// Who receives the notice.
    pub recipient: Identity,
    /// The subject whose vault was released.
    pub subject: Identity,
    pub title: String,
    pub body: String,
    /// Stable reference the beneficiary uses to start recovery.
    pub retrieval_link: String,
}

/// Renders [`ReleaseNotice`]s with a fixed title and link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeTemplate {
    pub title: String,
    pub retrieval_link: String,
}

impl NoticeTemplate {
    pub fn new(title: impl Into<String>, retrieval_link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            retrieval_link: retrieval_link.into(),
        }
    }

    /// Build the notice for a released vault.
    pub fn render(&self, subject: &Identity, beneficiary: &Identity) -> ReleaseNotice {
        ReleaseNotice {
            recipient: beneficiary.clone(),
            subject: subject.clone(),
            title: self.title.clone(),
            body: format!(
                "URGENT: {} is gone. Access vault here: {}",
                subject, self.retrieval_link
            ),
            retrieval_link: self.retrieval_link.clone(),
        }
    }
}

impl Default for NoticeTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE, DEFAULT_RETRIEVAL_LINK)
    }
}
