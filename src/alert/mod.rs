//! Alert policy: turns a change percentage into an alert decision.

use chrono::Utc;

use crate::config::defaults::DEFAULT_CHANGE_THRESHOLD_PERCENT;
use crate::types::DetectorEvent;

/// Threshold-based alert decision. Stateless.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertPolicy {
    /// Change percentage that must be strictly exceeded to alert
    pub threshold: f64,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CHANGE_THRESHOLD_PERCENT,
        }
    }
}

impl AlertPolicy {
    pub const fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Alert iff `change_percent > threshold`. Equality does not alert.
    pub fn evaluate(change_percent: f64, threshold: f64) -> bool {
        change_percent > threshold
    }

    pub fn should_alert(&self, change_percent: f64) -> bool {
        Self::evaluate(change_percent, self.threshold)
    }

    /// The alert event for `change_percent`, or `None` when within tolerance.
    pub fn check(&self, change_percent: f64) -> Option<DetectorEvent> {
        self.should_alert(change_percent).then(|| DetectorEvent::Alert {
            change_percent,
            threshold: self.threshold,
            detected_at: Utc::now(),
        })
    }
}
