//! Batch processing loop shared across all input modes.
//!
//! Pulls batches from a [`BatchSource`], runs each through the
//! [`SpectralDetector`], and hands the resulting events to an [`EventSink`].
//! The loop task exclusively owns the [`DetectorState`].

use std::fmt;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::detector::{DetectorState, SpectralDetector};
use super::sink::EventSink;
use super::source::{BatchEvent, BatchSource};
use crate::types::DetectorEvent;

/// Log a progress line every this many batches.
const PROGRESS_LOG_INTERVAL: u64 = 10;

// ============================================================================
// Statistics
// ============================================================================

/// Counters accumulated over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub batches_received: u64,
    /// Batches too small to form a window
    pub batches_skipped: u64,
    pub spectra_computed: u64,
    pub comparisons: u64,
    pub alerts: u64,
    /// Degenerate spectra and length mismatches
    pub comparison_errors: u64,
}

impl PipelineStats {
    /// Account for one batch and the events it produced.
    pub fn record_batch(&mut self, events: &[DetectorEvent]) {
        self.batches_received += 1;
        for event in events {
            match event {
                DetectorEvent::SamplesSeen { .. } => {}
                DetectorEvent::InsufficientSamples { .. } => self.batches_skipped += 1,
                DetectorEvent::Change(report) => {
                    self.spectra_computed += 1;
                    if report.compared {
                        self.comparisons += 1;
                    }
                }
                DetectorEvent::DegenerateSpectrum { .. } | DetectorEvent::LengthMismatch { .. } => {
                    self.comparison_errors += 1;
                }
                DetectorEvent::Alert { .. } => self.alerts += 1,
            }
        }
    }
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pipeline: {} batches ({} skipped), {} spectra, {} comparisons ({} errors), {} alerts",
            self.batches_received,
            self.batches_skipped,
            self.spectra_computed,
            self.comparisons,
            self.comparison_errors,
            self.alerts
        )
    }
}

// ============================================================================
// Processing Loop
// ============================================================================

/// Owns the detector and its state for the lifetime of one run.
pub struct ProcessingLoop {
    detector: SpectralDetector,
    state: DetectorState,
    cancel_token: CancellationToken,
}

impl ProcessingLoop {
    pub fn new(detector: SpectralDetector, cancel_token: CancellationToken) -> Self {
        Self {
            detector,
            state: DetectorState::default(),
            cancel_token,
        }
    }

    /// Run until the source is exhausted, the sink fails, or cancellation.
    ///
    /// Cancellation is only observed while waiting for the next batch; a batch
    /// that has been received is always fully processed. Returns final
    /// pipeline statistics.
    pub async fn run<S, K>(mut self, source: &mut S, sink: &mut K) -> PipelineStats
    where
        S: BatchSource,
        K: EventSink,
    {
        let mut stats = PipelineStats::default();

        info!(
            source = source.source_name(),
            window_size = self.detector.window_size(),
            threshold = self.detector.policy().threshold,
            "📊 Processing sample batches from {}...",
            source.source_name()
        );
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        loop {
            let event = tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => {
                    info!("[ProcessingLoop] Shutdown signal received");
                    break;
                }
                result = source.next_batch() => {
                    match result {
                        Ok(ev) => ev,
                        Err(e) => {
                            warn!("[ProcessingLoop] Source error: {}", e);
                            break;
                        }
                    }
                }
            };

            let batch = match event {
                BatchEvent::Batch(b) => b,
                BatchEvent::Eof => {
                    info!(
                        "[ProcessingLoop] Source reached end ({} batches processed)",
                        stats.batches_received
                    );
                    break;
                }
            };

            let (state, events) = self.detector.handle_batch(self.state, &batch);
            self.state = state;
            stats.record_batch(&events);

            if let Err(e) = emit_all(sink, &events) {
                warn!("[ProcessingLoop] Sink error, stopping: {}", e);
                break;
            }

            if stats.batches_received % PROGRESS_LOG_INTERVAL == 0 {
                info!(
                    "📈 Progress: {} batches | Comparisons: {} | Alerts: {}",
                    stats.batches_received, stats.comparisons, stats.alerts
                );
            }
        }

        log_final_stats(&stats);
        stats
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn emit_all<K: EventSink>(sink: &mut K, events: &[DetectorEvent]) -> std::io::Result<()> {
    for event in events {
        sink.emit(event)?;
    }
    sink.flush()
}

fn log_final_stats(stats: &PipelineStats) {
    info!("");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("📊 FINAL STATISTICS");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("   Batches Received:     {}", stats.batches_received);
    info!("   Batches Skipped:      {}", stats.batches_skipped);
    info!("   Spectra Computed:     {}", stats.spectra_computed);
    info!("   Comparisons:          {}", stats.comparisons);
    info!("   Comparison Errors:    {}", stats.comparison_errors);
    info!("   Alerts Raised:        {}", stats.alerts);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

// ============================================================================
// Tests
// ============================================================================
