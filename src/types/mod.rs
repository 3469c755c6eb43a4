//! Shared data structures for the spectral change detection pipeline
//!
//! - `Sample`: one timestamped amplitude reading as delivered by the stream
//! - `SampleBatch`: a bounded micro-batch of samples, in delivery order
//! - `DetectorEvent` / `ChangeReport`: per-batch outputs of the detector

mod events;
mod sample;

pub use events::*;
pub use sample::*;
