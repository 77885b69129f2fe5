//! Service configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use deadswitch_core::{CheckInPolicy, LivenessInterval};
use deadswitch_notify::{NoticeTemplate, DEFAULT_RETRIEVAL_LINK, DEFAULT_TITLE};

use crate::error::{Result, SwitchError};

/// Configuration for the switch and its reaper.
///
/// Every field has a default, so `{}` is a valid JSON config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchConfig {
    /// Reaper tick cadence in milliseconds.
    pub reaper_period_ms: u64,
    /// Interval applied when a create request does not carry one.
    pub default_liveness_interval: LivenessInterval,
    /// What a check-in does to a released vault.
    pub check_in_policy: CheckInPolicy,
    /// Locator embedded in release notices.
    pub retrieval_link: String,
    /// Title of release notices.
    pub notice_subject: String,
}

impl SwitchConfig {
    /// Parse a JSON config, filling in defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SwitchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.reaper_period_ms == 0 {
            return Err(SwitchError::Config("reaper_period_ms must be positive".into()));
        }
        if self.retrieval_link.trim().is_empty() {
            return Err(SwitchError::Config("retrieval_link must not be empty".into()));
        }
        Ok(())
    }

    pub fn reaper_period(&self) -> Duration {
        Duration::from_millis(self.reaper_period_ms)
    }

    pub fn notice_template(&self) -> NoticeTemplate {
        NoticeTemplate::new(self.notice_subject.clone(), self.retrieval_link.clone())
    }

    /// The part of this config the reaper needs.
    pub fn reaper_config(&self) -> ReaperConfig {
        ReaperConfig {
            period: self.reaper_period(),
            template: self.notice_template(),
        }
    }
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            reaper_period_ms: 10_000,
            default_liveness_interval: LivenessInterval::DEFAULT,
            check_in_policy: CheckInPolicy::RejectAfterRelease,
            retrieval_link: DEFAULT_RETRIEVAL_LINK.to_string(),
            notice_subject: DEFAULT_TITLE.to_string(),
        }
    }
}

/// Configuration for the reaper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaperConfig {
    /// Tick cadence.
    pub period: Duration,
    /// How release notices are rendered.
    pub template: NoticeTemplate,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        SwitchConfig::default().reaper_config()
    }
}
