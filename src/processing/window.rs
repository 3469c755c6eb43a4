//! Window extraction: unordered batch -> fixed-length, time-ordered amplitudes.

use serde::{Deserialize, Serialize};

use super::ProcessingError;
use crate::types::Sample;

/// How a window is chosen when a batch holds more samples than needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSelection {
    /// Keep the first `N` samples in delivery order, then sort them by time.
    ///
    /// When a batch overflows, the window is an arbitrary subset rather than
    /// the earliest or latest `N` readings.
    #[default]
    CapThenSort,
    /// Sort the whole batch by time and keep the most recent `N` samples.
    LatestSorted,
}

/// Fixed-length amplitude sequence, ascending by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    amplitudes: Vec<f64>,
}

impl Window {
    pub fn len(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amplitudes.is_empty()
    }

    pub fn amplitudes(&self) -> &[f64] {
        &self.amplitudes
    }
}

/// Extract a window of exactly `required` amplitudes from `batch`.
///
/// Returns [`ProcessingError::InsufficientSamples`] when the batch is too
/// small; the caller must then skip the batch entirely.
pub fn extract_window(
    batch: &[Sample],
    required: usize,
    selection: WindowSelection,
) -> Result<Window, ProcessingError> {
    if required == 0 {
        return Err(ProcessingError::InvalidWindowSize(required));
    }
    if batch.len() < required {
        return Err(ProcessingError::InsufficientSamples {
            required,
            available: batch.len(),
        });
    }

    let selected: Vec<Sample> = match selection {
        WindowSelection::CapThenSort => {
            let mut capped: Vec<Sample> = batch.iter().take(required).copied().collect();
            sort_by_time(&mut capped);
            capped
        }
        WindowSelection::LatestSorted => {
            let mut all = batch.to_vec();
            sort_by_time(&mut all);
            all.split_off(all.len() - required)
        }
    };
    let amplitudes: Vec<f64> = selected.iter().map(|s| s.amplitude).collect();

    tracing::trace!(
        required,
        batch_len = batch.len(),
        ?selection,
        "Window extracted"
    );

    Ok(Window { amplitudes })
}

/// Stable sort: equal timestamps keep delivery order.
fn sort_by_time(samples: &mut [Sample]) {
    samples.sort_by(|a, b| a.t.total_cmp(&b.t));
}

// ============================================================================
// Tests
// ============================================================================
