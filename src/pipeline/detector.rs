//! Per-batch spectral change detection.
//!
//! [`SpectralDetector`] is the immutable part (window size, planned
//! transform, alert policy). [`DetectorState`] is the mutable part (the
//! baseline) and is threaded through each call, so a sequence of batches
//! can be processed as a fold:
//!
//! ```ignore
//! let (state, events) = batches
//!     .iter()
//!     .fold((DetectorState::default(), Vec::new()), |(state, mut all), batch| {
//!         let (state, events) = detector.handle_batch(state, batch);
//!         all.extend(events);
//!         (state, all)
//!     });
//! ```

use tracing::{debug, warn};

use crate::alert::AlertPolicy;
use crate::baseline::{BaselineError, BaselineTracker};
use crate::config::DetectorConfig;
use crate::processing::{
    extract_window, ProcessingError, SpectrumTransform, WindowSelection,
};
use crate::types::{ChangeReport, DetectorEvent, Sample};

/// Mutable detector state: the retained baseline.
///
/// A fresh (default) state starts at NoBaseline.
#[derive(Debug, Clone, Default)]
pub struct DetectorState {
    tracker: BaselineTracker,
}

impl DetectorState {
    pub const fn tracker(&self) -> &BaselineTracker {
        &self.tracker
    }

    pub const fn has_baseline(&self) -> bool {
        self.tracker.has_baseline()
    }

    /// Forget the baseline; the next spectrum is stored without comparison.
    pub fn reset(&mut self) {
        self.tracker.reset();
    }
}

/// Window -> spectrum -> baseline comparison -> alert, for one batch at a time.
#[derive(Debug)]
pub struct SpectralDetector {
    window_size: usize,
    selection: WindowSelection,
    transform: SpectrumTransform,
    policy: AlertPolicy,
}

impl SpectralDetector {
    pub fn new(
        window_size: usize,
        selection: WindowSelection,
        transform: SpectrumTransform,
        policy: AlertPolicy,
    ) -> Result<Self, ProcessingError> {
        if window_size == 0 {
            return Err(ProcessingError::InvalidWindowSize(window_size));
        }
        if transform.size() != window_size {
            return Err(ProcessingError::WindowSizeMismatch {
                expected: transform.size(),
                actual: window_size,
            });
        }
        Ok(Self {
            window_size,
            selection,
            transform,
            policy,
        })
    }

    /// Build a detector from the `[detector]` config section.
    pub fn from_config(config: &DetectorConfig) -> Result<Self, ProcessingError> {
        let transform = SpectrumTransform::new(config.window_size, config.spectrum_component)?;
        Self::new(
            config.window_size,
            config.window_selection,
            transform,
            AlertPolicy::new(config.change_threshold_percent),
        )
    }

    pub const fn window_size(&self) -> usize {
        self.window_size
    }

    pub const fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    /// Process one batch and return the updated state plus the events it produced.
    ///
    /// Event order: `SamplesSeen` first, then either `InsufficientSamples`
    /// (batch skipped, baseline untouched) or `Change` followed by an
    /// optional `DegenerateSpectrum` / `LengthMismatch` / `Alert`.
    pub fn handle_batch(
        &self,
        mut state: DetectorState,
        batch: &[Sample],
    ) -> (DetectorState, Vec<DetectorEvent>) {
        let mut events = vec![DetectorEvent::SamplesSeen {
            samples_seen: batch.len(),
        }];
        debug!(samples = batch.len(), "Batch received");

        let window = match extract_window(batch, self.window_size, self.selection) {
            Ok(w) => w,
            Err(ProcessingError::InsufficientSamples {
                required,
                available,
            }) => {
                warn!(required, available, "Not enough samples for a window, batch skipped");
                events.push(DetectorEvent::InsufficientSamples {
                    required,
                    available,
                });
                return (state, events);
            }
            Err(e) => {
                warn!(error = %e, "Window extraction failed, batch skipped");
                return (state, events);
            }
        };

        let spectrum = match self.transform.transform(window.amplitudes()) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "Spectrum transform failed, batch skipped");
                return (state, events);
            }
        };

        match state.tracker.compare(spectrum) {
            Ok(report) => {
                events.push(DetectorEvent::Change(report));
                if let Some(pct) = report.change_percent {
                    if let Some(alert) = self.policy.check(pct) {
                        warn!(
                            change_percent = pct,
                            threshold = self.policy.threshold,
                            "Spectral change above threshold"
                        );
                        events.push(alert);
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Comparison skipped, baseline replaced");
                events.push(DetectorEvent::Change(ChangeReport::not_compared()));
                events.push(match e {
                    BaselineError::DegenerateSpectrum { .. } => DetectorEvent::DegenerateSpectrum {
                        reason: e.to_string(),
                    },
                    BaselineError::LengthMismatch {
                        baseline_len,
                        new_len,
                    } => DetectorEvent::LengthMismatch {
                        baseline_len,
                        new_len,
                    },
                });
            }
        }

        (state, events)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::SpectrumComponent;
    use crate::types::batch_from_amplitudes;

    fn detector(size: usize, component: SpectrumComponent) -> SpectralDetector {
        SpectralDetector::from_config(&DetectorConfig {
            window_size: size,
            spectrum_component: component,
            ..DetectorConfig::default()
        })
        .unwrap()
    }

    fn change_of(events: &[DetectorEvent]) -> Option<ChangeReport> {
        events.iter().find_map(|e| match e {
            DetectorEvent::Change(r) => Some(*r),
            _ => None,
        })
    }

    #[test]
    fn test_sine_then_same_then_dc_magnitude() {
        let det = detector(4, SpectrumComponent::Magnitude);
        let sine = batch_from_amplitudes(&[0.0, 1.0, 0.0, -1.0]);
        let dc = batch_from_amplitudes(&[1.0, 1.0, 1.0, 1.0]);

        let (state, a) = det.handle_batch(DetectorState::default(), &sine);
        assert_eq!(a[0], DetectorEvent::SamplesSeen { samples_seen: 4 });
        assert_eq!(change_of(&a), Some(ChangeReport::not_compared()));
        assert!(state.has_baseline());

        let (state, b) = det.handle_batch(state, &sine);
        let report = change_of(&b).unwrap();
        assert!(report.compared);
        assert!(report.change_percent.unwrap() < 1e-9);
        assert!(!b.iter().any(DetectorEvent::is_alert));

        let (_, c) = det.handle_batch(state, &dc);
        let report = change_of(&c).unwrap();
        assert!(report.compared);
        assert!((report.change_percent.unwrap() - 100.0).abs() < 1e-9);
        assert!(c.iter().any(DetectorEvent::is_alert));
    }

    #[test]
    fn test_real_component_sine_is_degenerate() {
        let det = detector(4, SpectrumComponent::Real);
        let sine = batch_from_amplitudes(&[0.0, 1.0, 0.0, -1.0]);

        let (state, _) = det.handle_batch(DetectorState::default(), &sine);
        let (_, events) = det.handle_batch(state, &sine);
        assert!(events
            .iter()
            .any(|e| matches!(e, DetectorEvent::DegenerateSpectrum { .. })));
        assert_eq!(change_of(&events), Some(ChangeReport::not_compared()));
    }

    #[test]
    fn test_real_component_cosine_then_dc_alerts() {
        let det = detector(4, SpectrumComponent::Real);
        let cosine = batch_from_amplitudes(&[1.0, 0.0, -1.0, 0.0]);
        let dc = batch_from_amplitudes(&[1.0, 1.0, 1.0, 1.0]);

        let (state, _) = det.handle_batch(DetectorState::default(), &cosine);
        let (state, same) = det.handle_batch(state, &cosine);
        assert!(change_of(&same).unwrap().change_percent.unwrap() < 1e-9);

        let (_, changed) = det.handle_batch(state, &dc);
        assert!(changed.iter().any(DetectorEvent::is_alert));
    }

    #[test]
    fn test_insufficient_samples_leaves_baseline_untouched() {
        let det = detector(4, SpectrumComponent::Magnitude);
        let full = batch_from_amplitudes(&[0.0, 1.0, 0.0, -1.0]);
        let short = batch_from_amplitudes(&[5.0, 5.0]);

        let (state, _) = det.handle_batch(DetectorState::default(), &full);
        let before = state.tracker().baseline().cloned();

        let (state, events) = det.handle_batch(state, &short);
        assert_eq!(
            events,
            vec![
                DetectorEvent::SamplesSeen { samples_seen: 2 },
                DetectorEvent::InsufficientSamples {
                    required: 4,
                    available: 2
                },
            ]
        );
        assert_eq!(state.tracker().baseline().cloned(), before);

        // The next full batch still compares against the original baseline
        let (_, events) = det.handle_batch(state, &full);
        assert!(change_of(&events).unwrap().compared);
    }

    #[test]
    fn test_insufficient_on_fresh_state_keeps_no_baseline() {
        let det = detector(4, SpectrumComponent::Magnitude);
        let (state, _) = det.handle_batch(DetectorState::default(), &[]);
        assert!(!state.has_baseline());
    }

    #[test]
    fn test_tiny_amplitude_cosine_is_compared() {
        let det = detector(4, SpectrumComponent::Real);
        let cosine = batch_from_amplitudes(&[1e-7, 0.0, -1e-7, 0.0]);

        let (state, _) = det.handle_batch(DetectorState::default(), &cosine);
        let (_, events) = det.handle_batch(state, &cosine);
        let report = change_of(&events).unwrap();
        assert!(report.compared);
        assert!(report.change_percent.unwrap() < 1e-9);
        assert!(!events
            .iter()
            .any(|e| matches!(e, DetectorEvent::DegenerateSpectrum { .. })));
    }

    #[test]
    fn test_change_equal_to_threshold_does_not_alert() {
        // Orthogonal magnitude spectra give exactly 100% change
        let det = SpectralDetector::from_config(&DetectorConfig {
            window_size: 4,
            change_threshold_percent: 100.0,
            spectrum_component: SpectrumComponent::Magnitude,
            ..DetectorConfig::default()
        })
        .unwrap();
        let sine = batch_from_amplitudes(&[0.0, 1.0, 0.0, -1.0]);
        let dc = batch_from_amplitudes(&[1.0, 1.0, 1.0, 1.0]);

        let (state, _) = det.handle_batch(DetectorState::default(), &sine);
        let (_, events) = det.handle_batch(state, &dc);
        assert_eq!(change_of(&events).unwrap().change_percent, Some(100.0));
        assert!(!events.iter().any(DetectorEvent::is_alert));
    }

    #[test]
    fn test_reset_returns_to_first_spectrum_behaviour() {
        let det = detector(4, SpectrumComponent::Magnitude);
        let sine = batch_from_amplitudes(&[0.0, 1.0, 0.0, -1.0]);

        let (mut state, _) = det.handle_batch(DetectorState::default(), &sine);
        state.reset();
        let (_, events) = det.handle_batch(state, &sine);
        assert_eq!(change_of(&events), Some(ChangeReport::not_compared()));
    }

    #[test]
    fn test_mismatched_transform_rejected() {
        let transform = SpectrumTransform::new(8, SpectrumComponent::Real).unwrap();
        let err = SpectralDetector::new(
            4,
            WindowSelection::CapThenSort,
            transform,
            AlertPolicy::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ProcessingError::WindowSizeMismatch {
                expected: 8,
                actual: 4
            }
        );
    }
}
