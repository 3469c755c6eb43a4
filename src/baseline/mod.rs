//! Baseline Tracking - Spectral Change Detection
//!
//! Keeps the most recently accepted spectrum and measures how far each new
//! spectrum has moved away from it.
//!
//! ## State Machine
//!
//! - **NoBaseline** (initial): the first spectrum is stored, nothing compared
//! - **HasBaseline**: each new spectrum is compared against the stored one,
//!   then replaces it, whatever the outcome of the comparison
//!
//! The baseline is never persisted. A restarted process (or a fresh
//! [`BaselineTracker`]) starts again at NoBaseline.
//!
//! ## Usage
//!
//! ```ignore
//! let mut tracker = BaselineTracker::new();
//!
//! let first = tracker.compare(spectrum_a)?;   // compared = false
//! let second = tracker.compare(spectrum_b)?;  // compared = true, change_percent = Some(..)
//! ```

use thiserror::Error;
use tracing::{debug, warn};

use crate::processing::Spectrum;
use crate::types::ChangeReport;

// ============================================================================
// Configuration Constants
// ============================================================================

/// A spectrum keeping no more than this fraction of its signal energy has
/// no direction.
///
/// Real-part spectra of phase-shifted signals cancel to floating-point
/// noise, many orders below the signal energy. Relative to the signal, so
/// the amplitude unit never matters.
pub const DEGENERATE_ENERGY_RATIO: f64 = 1e-20;

/// New spectra at least this many times longer than the baseline are not compared.
pub const MAX_LENGTH_RATIO: usize = 2;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BaselineError {
    #[error("Degenerate spectrum: norm {norm:e} (baseline energy {baseline_energy:e}, new energy {new_energy:e})")]
    DegenerateSpectrum {
        norm: f64,
        baseline_energy: f64,
        new_energy: f64,
    },

    #[error("Spectrum length mismatch: baseline has {baseline_len} bins, new spectrum has {new_len}")]
    LengthMismatch { baseline_len: usize, new_len: usize },
}

// ============================================================================
// Similarity
// ============================================================================

/// Absolute cosine similarity `|a·b| / sqrt((a·a)(b·b))`, in `[0, 1]`.
///
/// Fails with [`BaselineError::LengthMismatch`] for spectra of different
/// lengths and [`BaselineError::DegenerateSpectrum`] when either vector has
/// zero or non-finite norm, or has cancelled to noise against its
/// [`Spectrum::signal_energy`].
pub fn cosine_similarity(a: &Spectrum, b: &Spectrum) -> Result<f64, BaselineError> {
    if a.len() != b.len() {
        return Err(BaselineError::LengthMismatch {
            baseline_len: b.len(),
            new_len: a.len(),
        });
    }

    let dot = a.dot(b).abs();
    let new_energy = a.energy();
    let baseline_energy = b.energy();
    let norm = new_energy.sqrt() * baseline_energy.sqrt();

    if !norm.is_finite() || !dot.is_finite() || is_degenerate(a) || is_degenerate(b) {
        return Err(BaselineError::DegenerateSpectrum {
            norm,
            baseline_energy,
            new_energy,
        });
    }

    // Rounding can push the ratio a hair past 1.0
    Ok((dot / norm).clamp(0.0, 1.0))
}

fn is_degenerate(spectrum: &Spectrum) -> bool {
    // Written as a negated `>` so that zero and NaN are both degenerate
    !(spectrum.energy() > DEGENERATE_ENERGY_RATIO * spectrum.signal_energy())
}

/// Change percentage for a given similarity: `100 − similarity × 100`.
pub fn change_percent(similarity: f64) -> f64 {
    (100.0 - similarity * 100.0).clamp(0.0, 100.0)
}

// ============================================================================
// Baseline Tracker
// ============================================================================

/// Owns the retained baseline spectrum.
///
/// Exclusively owned by the batch handler; comparisons are serialized by
/// `&mut self`.
#[derive(Debug, Clone, Default)]
pub struct BaselineTracker {
    baseline: Option<Spectrum>,
}

impl BaselineTracker {
    /// Create a tracker in the NoBaseline state
    pub const fn new() -> Self {
        Self { baseline: None }
    }

    pub const fn has_baseline(&self) -> bool {
        self.baseline.is_some()
    }

    pub const fn baseline(&self) -> Option<&Spectrum> {
        self.baseline.as_ref()
    }

    /// Drop the baseline, returning to NoBaseline.
    pub fn reset(&mut self) {
        debug!("Baseline reset");
        self.baseline = None;
    }

    /// Compare `new` against the baseline and make it the new baseline.
    ///
    /// The baseline is replaced with `new` on every path, including errors,
    /// so one bad batch never blocks later comparisons.
    pub fn compare(&mut self, new: Spectrum) -> Result<ChangeReport, BaselineError> {
        let result = match self.baseline.as_ref() {
            None => {
                debug!(bins = new.len(), "First spectrum stored as baseline");
                Ok(ChangeReport::not_compared())
            }
            Some(baseline) if exceeds_length_ratio(&new, baseline) => {
                // One-directional: a much shorter new spectrum is not caught here
                warn!(
                    new_len = new.len(),
                    baseline_len = baseline.len(),
                    "Spectrum size changed by {}x or more, comparison skipped",
                    MAX_LENGTH_RATIO
                );
                Ok(ChangeReport::not_compared())
            }
            Some(baseline) => cosine_similarity(&new, baseline).map(|similarity| {
                let pct = change_percent(similarity);
                debug!(similarity, change_percent = pct, "Spectrum compared");
                ChangeReport::compared(pct)
            }),
        };

        self.baseline = Some(new);
        result
    }
}

/// `len(new) / len(baseline) >= 2`, using integer division.
fn exceeds_length_ratio(new: &Spectrum, baseline: &Spectrum) -> bool {
    if baseline.is_empty() {
        return true;
    }
    new.len() / baseline.len() >= MAX_LENGTH_RATIO
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn spectrum(values: &[f64]) -> Spectrum {
        Spectrum::new(values.to_vec())
    }

    #[test]
    fn test_self_similarity_is_one() {
        let v = spectrum(&[0.3, -1.2, 4.5, 0.0, 2.2]);
        let sim = cosine_similarity(&v, &v).unwrap();
        assert!((sim - 1.0).abs() < 1e-12);
        assert!(change_percent(sim) < 1e-9);
    }

    #[test]
    fn test_opposite_vectors_are_fully_similar() {
        // Absolute value: a sign flip is not a change
        let a = spectrum(&[1.0, 2.0, 3.0]);
        let b = spectrum(&[-1.0, -2.0, -3.0]);
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_orthogonal_vectors() {
        let a = spectrum(&[1.0, 0.0]);
        let b = spectrum(&[0.0, 3.0]);
        assert_eq!(cosine_similarity(&a, &b).unwrap(), 0.0);
        assert_eq!(change_percent(0.0), 100.0);
    }

    #[test]
    fn test_scale_invariance() {
        let a = spectrum(&[1.0, 2.0, -0.5]);
        let b = spectrum(&[10.0, 20.0, -5.0]);
        assert!((cosine_similarity(&a, &b).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_tiny_amplitudes_are_not_degenerate() {
        let v = spectrum(&[1e-7, 2e-7, -3e-7]);
        let sim = cosine_similarity(&v, &v).unwrap();
        assert!((sim - 1.0).abs() < 1e-12);

        let w = spectrum(&[1e-150, 0.0, 1e-150]);
        assert!((cosine_similarity(&w, &w).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cancelled_real_part_is_degenerate() {
        // Rounding residue of a spectrum whose energy sat in the imaginary part
        let noise = Spectrum::with_signal_energy(vec![1e-16, -2e-16, 0.0, 1e-16], 8.0);
        let other = spectrum(&[0.0, 2.0, 0.0, 2.0]);
        assert!(matches!(
            cosine_similarity(&noise, &other),
            Err(BaselineError::DegenerateSpectrum { .. })
        ));
    }

    #[test]
    fn test_zero_vector_is_degenerate() {
        let a = spectrum(&[0.0, 0.0, 0.0]);
        let b = spectrum(&[1.0, 2.0, 3.0]);
        let err = cosine_similarity(&a, &b).unwrap_err();
        assert!(matches!(err, BaselineError::DegenerateSpectrum { .. }));
    }

    #[test]
    fn test_nan_is_degenerate() {
        let a = spectrum(&[f64::NAN, 1.0]);
        let b = spectrum(&[1.0, 1.0]);
        assert!(matches!(
            cosine_similarity(&a, &b),
            Err(BaselineError::DegenerateSpectrum { .. })
        ));
    }

    #[test]
    fn test_first_spectrum_is_not_compared() {
        let mut tracker = BaselineTracker::new();
        assert!(!tracker.has_baseline());

        let report = tracker.compare(spectrum(&[1.0, 2.0])).unwrap();
        assert_eq!(report, ChangeReport::not_compared());
        assert!(tracker.has_baseline());
    }

    #[test]
    fn test_second_spectrum_is_compared_and_replaces_baseline() {
        let mut tracker = BaselineTracker::new();
        tracker.compare(spectrum(&[1.0, 0.0])).unwrap();

        let report = tracker.compare(spectrum(&[1.0, 1.0])).unwrap();
        assert!(report.compared);
        let pct = report.change_percent.unwrap();
        // cos(45°) = 0.7071 -> 29.29% change
        assert!((pct - 29.289_321_881).abs() < 1e-6);
        assert_eq!(tracker.baseline(), Some(&spectrum(&[1.0, 1.0])));
    }

    #[test]
    fn test_change_percent_within_bounds() {
        let mut tracker = BaselineTracker::new();
        let inputs = [
            vec![1.0, 2.0, 3.0, 4.0],
            vec![4.0, 3.0, 2.0, 1.0],
            vec![-1.0, 0.5, 0.0, 9.0],
            vec![0.0, 0.0, 0.0, 1e-3],
            vec![1e6, -1e6, 1e6, -1e6],
        ];
        for values in inputs {
            if let Ok(report) = tracker.compare(Spectrum::new(values)) {
                if let Some(pct) = report.change_percent {
                    assert!((0.0..=100.0).contains(&pct), "out of range: {pct}");
                }
            }
        }
    }

    #[test]
    fn test_degenerate_still_replaces_baseline() {
        let mut tracker = BaselineTracker::new();
        tracker.compare(spectrum(&[1.0, 2.0])).unwrap();

        let err = tracker.compare(spectrum(&[0.0, 0.0])).unwrap_err();
        assert!(matches!(err, BaselineError::DegenerateSpectrum { .. }));
        assert_eq!(tracker.baseline(), Some(&spectrum(&[0.0, 0.0])));

        // Zero baseline: next comparison is degenerate too, then recovers
        assert!(tracker.compare(spectrum(&[3.0, 1.0])).is_err());
        let report = tracker.compare(spectrum(&[3.0, 1.0])).unwrap();
        assert!(report.compared);
        assert!(report.change_percent.unwrap() < 1e-9);
    }

    #[test]
    fn test_length_ratio_guard_skips_larger_spectrum() {
        let mut tracker = BaselineTracker::new();
        tracker.compare(spectrum(&[1.0, 1.0])).unwrap();

        let report = tracker.compare(spectrum(&[1.0, 1.0, 1.0, 1.0])).unwrap();
        assert_eq!(report, ChangeReport::not_compared());
        assert_eq!(tracker.baseline().map(Spectrum::len), Some(4));
    }

    #[test]
    fn test_length_ratio_guard_is_one_directional() {
        let mut tracker = BaselineTracker::new();
        tracker.compare(spectrum(&[1.0, 1.0, 1.0, 1.0])).unwrap();

        // 2 / 4 == 0 under integer division: the guard lets it through,
        // and the similarity check then rejects the mismatch.
        let err = tracker.compare(spectrum(&[1.0, 1.0])).unwrap_err();
        assert_eq!(
            err,
            BaselineError::LengthMismatch {
                baseline_len: 4,
                new_len: 2
            }
        );
        assert_eq!(tracker.baseline().map(Spectrum::len), Some(2));
    }

    #[test]
    fn test_reset_returns_to_no_baseline() {
        let mut tracker = BaselineTracker::new();
        tracker.compare(spectrum(&[1.0, 2.0])).unwrap();
        tracker.compare(spectrum(&[1.0, 2.0])).unwrap();

        tracker.reset();
        assert!(!tracker.has_baseline());
        let report = tracker.compare(spectrum(&[5.0, 5.0])).unwrap();
        assert!(!report.compared);
    }
}
