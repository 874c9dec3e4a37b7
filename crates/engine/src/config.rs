//! Tunables injected into the [`Engine`](crate::Engine) at build time.

use serde::Deserialize;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// First budget alert (percentage) when the caller provides none.
    pub default_alert_threshold_1: i32,
    /// Second budget alert (percentage) when the caller provides none.
    pub default_alert_threshold_2: i32,
    /// Look-ahead window for upcoming goal deadlines when the caller provides none.
    pub upcoming_deadline_days: i64,
    pub max_upcoming_deadline_days: i64,
    pub default_page_size: u64,
    pub max_page_size: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_alert_threshold_1: 80,
            default_alert_threshold_2: 95,
            upcoming_deadline_days: 30,
            max_upcoming_deadline_days: 365,
            default_page_size: 100,
            max_page_size: 100,
        }
    }
}

impl EngineConfig {
    /// Reject settings that would let the engine create invalid budgets.
    pub fn validate(&self) -> ResultEngine<()> {
        crate::budgets::validate_thresholds(
            self.default_alert_threshold_1,
            self.default_alert_threshold_2,
        )?;
        if self.upcoming_deadline_days < 1
            || self.upcoming_deadline_days > self.max_upcoming_deadline_days
        {
            return Err(EngineError::InvalidArgument(
                "upcoming_deadline_days must be within 1..=max_upcoming_deadline_days"
                    .to_string(),
            ));
        }
        if self.max_page_size == 0 || self.default_page_size == 0 {
            return Err(EngineError::InvalidArgument(
                "page sizes must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Clamp a caller page size to the configured bounds.
    pub(crate) fn page_size(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size)
    }
}
