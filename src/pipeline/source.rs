//! Batch source abstraction for sample ingestion.
//!
//! Provides a unified trait for reading sample batches from different sources:
//! JSON lines on stdin (or any async reader), and pre-loaded samples replayed
//! from a CSV file or the synthetic scenario.

use std::collections::VecDeque;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::config::defaults::STDIN_LINE_BUFFER_CAPACITY;
use crate::types::{Sample, SampleBatch};

/// Events produced by a batch source.
#[derive(Debug)]
pub enum BatchEvent {
    /// A batch of samples, in delivery order.
    Batch(SampleBatch),
    /// Source reached end of data.
    Eof,
}

/// Trait abstracting where sample batches come from.
///
/// Implementations handle format parsing, batching and pacing internally.
/// The processing loop calls [`next_batch`](BatchSource::next_batch) in a
/// `select!` with cancellation, so implementations must be cancel safe.
#[async_trait]
pub trait BatchSource: Send + 'static {
    /// Read the next batch from the source.
    ///
    /// Returns `BatchEvent::Eof` when no more data is available.
    /// Returns `Err` on unrecoverable I/O errors.
    async fn next_batch(&mut self) -> Result<BatchEvent>;

    /// Human-readable name for logging (e.g. "stdin", "CSV").
    fn source_name(&self) -> &str;
}

// ============================================================================
// Replay Source (CSV file / synthetic scenario)
// ============================================================================

/// Replays pre-built batches with an optional inter-batch delay.
pub struct ReplaySource {
    batches: std::vec::IntoIter<SampleBatch>,
    delay: Duration,
    name: String,
    yielded_first: bool,
}

impl ReplaySource {
    pub fn new(batches: Vec<SampleBatch>, delay: Duration, name: impl Into<String>) -> Self {
        Self {
            batches: batches.into_iter(),
            delay,
            name: name.into(),
            yielded_first: false,
        }
    }

    /// Chunk a flat sample list into batches of `batch_size` (the last one may be short).
    pub fn from_samples(
        samples: &[Sample],
        batch_size: usize,
        delay: Duration,
        name: impl Into<String>,
    ) -> Self {
        let batches = samples
            .chunks(batch_size.max(1))
            .map(<[Sample]>::to_vec)
            .collect();
        Self::new(batches, delay, name)
    }

    /// Batches not yet yielded.
    pub fn remaining(&self) -> usize {
        self.batches.len()
    }
}

#[async_trait]
impl BatchSource for ReplaySource {
    async fn next_batch(&mut self) -> Result<BatchEvent> {
        // No delay before the first batch
        if self.yielded_first && !self.delay.is_zero() && self.batches.len() > 0 {
            tokio::time::sleep(self.delay).await;
        }
        match self.batches.next() {
            Some(batch) => {
                self.yielded_first = true;
                Ok(BatchEvent::Batch(batch))
            }
            None => Ok(BatchEvent::Eof),
        }
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// JSON Lines Source (stdin)
// ============================================================================

/// Reads JSON-formatted samples line by line.
///
/// - A line holding a JSON array of samples is delivered as one batch.
/// - A line holding a single sample is buffered; buffered samples are
///   flushed as one batch on every trigger tick and at EOF.
/// - Malformed lines are dropped with a warning. A malformed array line
///   drops the whole batch.
///
/// Used with the simulation harness:
/// `simulation | spectral-sentinel --stdin`
pub struct JsonLinesSource<R> {
    lines: Lines<R>,
    trigger: Interval,
    pending: SampleBatch,
    ready: VecDeque<SampleBatch>,
    eof: bool,
    name: String,
}

/// Line-oriented source reading the process's stdin.
pub type StdinSource = JsonLinesSource<BufReader<Stdin>>;

impl JsonLinesSource<BufReader<Stdin>> {
    pub fn stdin(trigger_interval: Duration) -> Self {
        let reader = BufReader::with_capacity(STDIN_LINE_BUFFER_CAPACITY, tokio::io::stdin());
        Self::new(reader, trigger_interval, "stdin")
    }
}

impl<R> JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    /// Must be called from within a Tokio runtime; the trigger timer is armed here.
    pub fn new(reader: R, trigger_interval: Duration, name: impl Into<String>) -> Self {
        // First tick one period from now, not immediately
        let start = tokio::time::Instant::now() + trigger_interval;
        let mut trigger = tokio::time::interval_at(start, trigger_interval);
        trigger.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            lines: reader.lines(),
            trigger,
            pending: Vec::new(),
            ready: VecDeque::new(),
            eof: false,
            name: name.into(),
        }
    }

    /// Samples buffered from single-record lines and not yet flushed.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn flush_pending(&mut self) {
        if !self.pending.is_empty() {
            debug!(samples = self.pending.len(), "Flushing buffered samples");
            self.ready.push_back(std::mem::take(&mut self.pending));
        }
    }

    fn accept_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        if line.starts_with('[') {
            match serde_json::from_str::<SampleBatch>(line) {
                Ok(batch) => {
                    // Keep arrival order: earlier single records go out first
                    self.flush_pending();
                    self.ready.push_back(batch);
                }
                Err(e) => {
                    warn!("[{}] Dropping malformed batch: {}", self.name, e);
                }
            }
            return;
        }

        match serde_json::from_str::<Sample>(line) {
            Ok(sample) => self.pending.push(sample),
            Err(e) => {
                warn!("[{}] Failed to parse sample: {}", self.name, e);
            }
        }
    }
}

enum Step {
    Line(std::io::Result<Option<String>>),
    Tick,
}

#[async_trait]
impl<R> BatchSource for JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async fn next_batch(&mut self) -> Result<BatchEvent> {
        loop {
            if let Some(batch) = self.ready.pop_front() {
                return Ok(BatchEvent::Batch(batch));
            }
            if self.eof {
                return Ok(BatchEvent::Eof);
            }

            // Both futures are cancel safe: a partially read line stays buffered
            let step = tokio::select! {
                line = self.lines.next_line() => Step::Line(line),
                _ = self.trigger.tick() => Step::Tick,
            };

            match step {
                Step::Line(line) => match line? {
                    Some(line) => self.accept_line(&line),
                    None => {
                        self.eof = true;
                        self.flush_pending();
                    }
                },
                Step::Tick => self.flush_pending(),
            }
        }
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const LONG: Duration = Duration::from_secs(3600);

    fn source(input: &'static str) -> JsonLinesSource<BufReader<&'static [u8]>> {
        JsonLinesSource::new(BufReader::new(input.as_bytes()), LONG, "test")
    }

    async fn collect<S: BatchSource>(src: &mut S) -> Vec<SampleBatch> {
        let mut out = Vec::new();
        while let BatchEvent::Batch(b) = src.next_batch().await.unwrap() {
            out.push(b);
        }
        out
    }

    #[tokio::test]
    async fn test_array_line_is_one_batch() {
        let mut src = source(
            "[{\"t\":0,\"amplitude\":1.0},{\"t\":1,\"amplitude\":2.0}]\n\
             [{\"t\":2,\"amplitude\":3.0}]\n",
        );
        let batches = collect(&mut src).await;
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[1], vec![Sample::new(2.0, 3.0)]);
    }

    #[tokio::test]
    async fn test_single_records_flushed_at_eof() {
        let mut src = source(
            "{\"t\":0,\"amplitude\":1.0}\n\
             {\"t\":1,\"amplitude\":2.0}\n\
             \n\
             {\"t\":2,\"amplitude\":3.0}\n",
        );
        let batches = collect(&mut src).await;
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 3);
    }

    #[tokio::test]
    async fn test_malformed_array_drops_whole_batch() {
        let mut src = source(
            "[{\"t\":0,\"amplitude\":1.0},{\"t\":1}]\n\
             [{\"t\":5,\"amplitude\":5.0}]\n",
        );
        let batches = collect(&mut src).await;
        assert_eq!(batches, vec![vec![Sample::new(5.0, 5.0)]]);
    }

    #[tokio::test]
    async fn test_malformed_single_line_is_skipped() {
        let mut src = source(
            "{\"t\":0,\"amplitude\":1.0}\n\
             not json\n\
             {\"t\":1,\"amplitude\":\"loud\"}\n\
             {\"t\":2,\"amplitude\":3.0}\n",
        );
        let batches = collect(&mut src).await;
        assert_eq!(
            batches,
            vec![vec![Sample::new(0.0, 1.0), Sample::new(2.0, 3.0)]]
        );
    }

    #[tokio::test]
    async fn test_pending_records_precede_following_array() {
        let mut src = source(
            "{\"t\":0,\"amplitude\":1.0}\n\
             [{\"t\":1,\"amplitude\":2.0}]\n",
        );
        let batches = collect(&mut src).await;
        assert_eq!(
            batches,
            vec![vec![Sample::new(0.0, 1.0)], vec![Sample::new(1.0, 2.0)]]
        );
    }

    #[tokio::test]
    async fn test_trigger_tick_flushes_pending() {
        let (client, server) = tokio::io::duplex(1024);
        let mut src =
            JsonLinesSource::new(BufReader::new(server), Duration::from_millis(100), "duplex");

        let mut client = client;
        tokio::io::AsyncWriteExt::write_all(
            &mut client,
            b"{\"t\":0,\"amplitude\":1.0}\n{\"t\":1,\"amplitude\":2.0}\n",
        )
        .await
        .unwrap();

        // Writer stays open: only the timer can release the buffered samples
        match src.next_batch().await.unwrap() {
            BatchEvent::Batch(b) => assert_eq!(b.len(), 2),
            BatchEvent::Eof => panic!("unexpected EOF"),
        }
        assert_eq!(src.pending_len(), 0);

        drop(client);
        assert!(matches!(src.next_batch().await.unwrap(), BatchEvent::Eof));
    }

    #[tokio::test]
    async fn test_empty_input_is_eof() {
        let mut src = source("");
        assert!(matches!(src.next_batch().await.unwrap(), BatchEvent::Eof));
    }

    #[tokio::test]
    async fn test_replay_chunks_samples() {
        let samples: Vec<Sample> = (0..10).map(|i| Sample::new(f64::from(i), 0.0)).collect();
        let mut src = ReplaySource::from_samples(&samples, 4, Duration::ZERO, "replay");
        assert_eq!(src.remaining(), 3);
        let batches = collect(&mut src).await;
        assert_eq!(
            batches.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![4, 4, 2]
        );
        assert_eq!(src.source_name(), "replay");
    }
}
