//! FFT computation using rustfft
//!
//! Turns a time-ordered window into the real-valued spectrum used for
//! baseline comparison.
//!
//! # Normalization
//!
//! The forward transform is the unnormalized DFT
//!
//! ```text
//! X[k] = Σ_{n=0}^{N-1} x[n] · e^(-2πi·kn/N)
//! ```
//!
//! with no `1/N` (or `1/√N`) factor, and exactly `N` output bins for an
//! `N`-point window (no zero-padding, no one-sided folding). Cosine
//! similarity is scale-invariant, so the convention does not affect change
//! percentages; it only fixes the absolute values reported in a [`Spectrum`].
//!
//! # Example
//!
//! ```ignore
//! use spectral_sentinel::processing::{SpectrumComponent, SpectrumTransform};
//!
//! let transform = SpectrumTransform::new(600, SpectrumComponent::Real)?;
//! let spectrum = transform.transform(window.amplitudes())?;
//! ```

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ProcessingError, Spectrum};

/// Which real quantity to keep from each complex DFT coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectrumComponent {
    /// Real part `Re(X[k])`; the imaginary (phase) part is discarded.
    #[default]
    Real,
    /// Modulus `|X[k]|`, insensitive to the phase of the window.
    Magnitude,
}

// ============================================================================
// Spectrum Transform (pre-planned for repeated use)
// ============================================================================

/// Forward DFT planned once for a fixed window size.
///
/// Every batch of a session uses the same window size, so the plan is built
/// at startup and reused for each window.
pub struct SpectrumTransform {
    fft: Arc<dyn Fft<f64>>,
    size: usize,
    component: SpectrumComponent,
}

impl std::fmt::Debug for SpectrumTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumTransform")
            .field("size", &self.size)
            .field("component", &self.component)
            .finish_non_exhaustive()
    }
}

impl SpectrumTransform {
    /// Plan a transform for windows of exactly `size` points.
    pub fn new(size: usize, component: SpectrumComponent) -> Result<Self, ProcessingError> {
        if size == 0 {
            return Err(ProcessingError::InvalidWindowSize(size));
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);

        Ok(Self {
            fft,
            size,
            component,
        })
    }

    /// Compute the spectrum of a real-valued window.
    ///
    /// # Returns
    /// `size` real values, one per DFT bin, in bin order `k = 0..size`
    pub fn transform(&self, window: &[f64]) -> Result<Spectrum, ProcessingError> {
        if window.len() != self.size {
            return Err(ProcessingError::WindowSizeMismatch {
                expected: self.size,
                actual: window.len(),
            });
        }

        let mut buffer: Vec<Complex<f64>> =
            window.iter().map(|&x| Complex::new(x, 0.0)).collect();
        // Parseval: Σ|X[k]|² = N·Σx[n]²
        let signal_energy = self.size as f64 * window.iter().map(|x| x * x).sum::<f64>();

        // Compute FFT in-place
        self.fft.process(&mut buffer);

        let values: Vec<f64> = match self.component {
            SpectrumComponent::Real => buffer.iter().map(|c| c.re).collect(),
            SpectrumComponent::Magnitude => buffer.iter().map(|c| c.norm()).collect(),
        };

        Ok(Spectrum::with_signal_energy(values, signal_energy))
    }

    /// Get the planned window size
    pub const fn size(&self) -> usize {
        self.size
    }

    pub const fn component(&self) -> SpectrumComponent {
        self.component
    }
}

// ============================================================================
// Tests
// ============================================================================
