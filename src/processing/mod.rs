//! Signal processing module - window extraction and FFT computation

mod fft;
mod window;

pub use fft::*;
pub use window::*;

use thiserror::Error;

/// Errors in signal processing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessingError {
    #[error("Insufficient samples: need {required}, have {available}")]
    InsufficientSamples { required: usize, available: usize },

    #[error("Window size mismatch: transform planned for {expected}, got {actual}")]
    WindowSizeMismatch { expected: usize, actual: usize },

    #[error("Invalid window size: {0}")]
    InvalidWindowSize(usize),
}

/// Frequency-domain representation of one window.
///
/// One real value per DFT bin, `N` bins for an `N`-point window. Which
/// component of the complex coefficient is kept is decided by
/// [`SpectrumComponent`].
///
/// `signal_energy` is the energy of the full complex transform,
/// `Σ|X[k]|² = N·Σx[n]²` (Parseval). Keeping only the real part can lose
/// almost all of it; degeneracy is judged against this reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    values: Vec<f64>,
    signal_energy: f64,
}

impl Spectrum {
    /// A spectrum whose values carry all of the signal energy.
    pub fn new(values: Vec<f64>) -> Self {
        let signal_energy = values.iter().map(|v| v * v).sum();
        Self {
            values,
            signal_energy,
        }
    }

    pub const fn with_signal_energy(values: Vec<f64>, signal_energy: f64) -> Self {
        Self {
            values,
            signal_energy,
        }
    }

    /// Energy of the complex transform this spectrum was taken from.
    pub const fn signal_energy(&self) -> f64 {
        self.signal_energy
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.values
    }

    /// Dot product over the common length of both spectra.
    pub fn dot(&self, other: &Self) -> f64 {
        self.values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a * b)
            .sum()
    }

    /// Squared L2 norm (`self · self`).
    pub fn energy(&self) -> f64 {
        self.dot(self)
    }
}

impl From<Vec<f64>> for Spectrum {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}
