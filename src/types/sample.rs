use serde::{Deserialize, Serialize};

// ============================================================================
// Stream Input
// ============================================================================

/// A single reading from the sensor stream.
///
/// Wire format is `{"t": <float>, "amplitude": <float>}`. `t` is an opaque,
/// monotonic-ish timestamp (seconds in the simulator); only its ordering
/// matters to the detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Timestamp of the reading
    pub t: f64,
    /// Measured amplitude (e.g. acceleration in g)
    pub amplitude: f64,
}

impl Sample {
    pub const fn new(t: f64, amplitude: f64) -> Self {
        Self { t, amplitude }
    }
}

/// One micro-batch of samples, in the order the source delivered them.
///
/// No ordering by `t` is implied; window extraction sorts.
pub type SampleBatch = Vec<Sample>;

/// Build a batch from an amplitude sequence, stamping `t = 0, 1, 2, ...`.
///
/// Convenience for tests and synthetic sources.
pub fn batch_from_amplitudes(amplitudes: &[f64]) -> SampleBatch {
    amplitudes
        .iter()
        .enumerate()
        .map(|(i, &a)| Sample::new(i as f64, a))
        .collect()
}
