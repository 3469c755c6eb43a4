use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Comparison Result
// ============================================================================

/// Outcome of comparing a new spectrum against the retained baseline.
///
/// `change_percent` is present exactly when `compared` is true.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChangeReport {
    /// Whether a similarity comparison actually took place
    pub compared: bool,
    /// `100 × (1 − cosine similarity)`, in `[0, 100]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<f64>,
}

impl ChangeReport {
    /// No comparison: first spectrum of the session, or the size guard tripped.
    pub const fn not_compared() -> Self {
        Self {
            compared: false,
            change_percent: None,
        }
    }

    pub const fn compared(change_percent: f64) -> Self {
        Self {
            compared: true,
            change_percent: Some(change_percent),
        }
    }
}

// ============================================================================
// Detector Output Events
// ============================================================================

/// Everything the detector reports for one batch, in emission order.
///
/// Serialized with an `event` tag, e.g.
/// `{"event":"change","compared":true,"change_percent":3.2}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DetectorEvent {
    /// Diagnostic: how many samples arrived in the batch
    SamplesSeen { samples_seen: usize },

    /// The batch was too small to form a window and was skipped
    InsufficientSamples { required: usize, available: usize },

    /// A spectrum was computed and checked against the baseline
    Change(ChangeReport),

    /// Comparison skipped: a spectrum had zero (or non-finite) energy
    DegenerateSpectrum { reason: String },

    /// Comparison skipped: spectra of different lengths inside the size guard
    LengthMismatch { baseline_len: usize, new_len: usize },

    /// Change exceeded the configured threshold
    Alert {
        change_percent: f64,
        threshold: f64,
        detected_at: DateTime<Utc>,
    },
}

impl DetectorEvent {
    pub const fn is_alert(&self) -> bool {
        matches!(self, Self::Alert { .. })
    }
}

impl fmt::Display for DetectorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SamplesSeen { samples_seen } => write!(f, "samples seen: {samples_seen}"),
            Self::InsufficientSamples {
                required,
                available,
            } => write!(
                f,
                "insufficient samples: need {required}, have {available} (batch skipped)"
            ),
            Self::Change(report) => match report.change_percent {
                Some(pct) if report.compared => write!(f, "spectrum change: {pct:.2}%"),
                _ => write!(f, "spectrum stored as baseline (not compared)"),
            },
            Self::DegenerateSpectrum { reason } => {
                write!(f, "comparison skipped: degenerate spectrum ({reason})")
            }
            Self::LengthMismatch {
                baseline_len,
                new_len,
            } => write!(
                f,
                "comparison skipped: spectrum length {new_len} vs baseline {baseline_len}"
            ),
            Self::Alert {
                change_percent,
                threshold,
                detected_at,
            } => write!(
                f,
                "ALERT: spectrum changed by {change_percent:.2}% (threshold {threshold:.2}%) at {}",
                detected_at.to_rfc3339()
            ),
        }
    }
}
