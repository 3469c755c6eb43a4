//! Spectral Sentinel: real-time spectral change detection for vibration signals
//!
//! Timestamped amplitude samples arrive in batches. Each batch is cut into a
//! fixed-size, time-ordered window, transformed into its frequency spectrum,
//! and compared with the spectrum of the previous batch. A change larger than
//! the configured tolerance raises an alert.
//!
//! ## Architecture
//!
//! - **Processing**: window extraction and the forward DFT
//! - **Baseline**: retained spectrum and cosine-similarity change measure
//! - **Alert**: strict threshold policy
//! - **Pipeline**: batch sources, per-batch detector, event sinks

pub mod alert;
pub mod baseline;
pub mod config;
pub mod pipeline;
pub mod processing;
pub mod sensors;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, DetectorConfig, SentinelConfig};

// Re-export commonly used types
pub use types::{ChangeReport, DetectorEvent, Sample, SampleBatch};

// Re-export core components
pub use alert::AlertPolicy;
pub use baseline::{BaselineError, BaselineTracker};
pub use pipeline::{DetectorState, PipelineStats, ProcessingLoop, SpectralDetector};
pub use processing::{
    extract_window, ProcessingError, Spectrum, SpectrumComponent, SpectrumTransform, Window,
    WindowSelection,
};
