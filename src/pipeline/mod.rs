//! Processing Pipeline Module
//!
//! ```text
//! BatchSource ──► SpectralDetector::handle_batch ──► EventSink
//!  (stdin,          window → spectrum → baseline       (text, json)
//!   replay)         comparison → alert policy
//! ```
//!
//! One [`ProcessingLoop`] task drives the stages strictly in batch arrival
//! order and owns the detector state.

pub mod detector;
pub mod processing_loop;
pub mod sink;
pub mod source;

pub use detector::{DetectorState, SpectralDetector};
pub use processing_loop::{PipelineStats, ProcessingLoop};
pub use sink::{EventSink, JsonSink, MemorySink, TextSink};
pub use source::{BatchEvent, BatchSource, JsonLinesSource, ReplaySource, StdinSource};
