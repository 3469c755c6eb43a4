//! System-wide default constants.
//!
//! Centralises magic numbers that were previously scattered across the codebase.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Detector
// ============================================================================

/// Samples per analysis window (and DFT bins per spectrum).
pub const DEFAULT_WINDOW_SIZE: usize = 600;

/// Spectrum change (percent) that must be exceeded to raise an alert.
pub const DEFAULT_CHANGE_THRESHOLD_PERCENT: f64 = 8.0;

// ============================================================================
// Stream
// ============================================================================

/// Micro-batch trigger interval for line-by-line stdin input (milliseconds).
pub const DEFAULT_TRIGGER_INTERVAL_MS: u64 = 5_000;

/// Samples per batch when replaying a file or synthetic scenario.
pub const DEFAULT_REPLAY_BATCH_SIZE: usize = 600;

/// Base delay between replayed batches at 1x speed (milliseconds).
pub const DEFAULT_REPLAY_DELAY_MS: u64 = 1_000;

/// Initial capacity of the stdin line buffer (bytes).
pub const STDIN_LINE_BUFFER_CAPACITY: usize = 2_048;

// ============================================================================
// Config Discovery
// ============================================================================

/// Environment variable holding an explicit config path.
pub const CONFIG_ENV_VAR: &str = "SENTINEL_CONFIG";

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "sentinel.toml";

// ============================================================================
// Synthetic Scenario
// ============================================================================

/// Sample rate of the built-in synthetic signal (Hz).
pub const SYNTHETIC_SAMPLE_RATE_HZ: f64 = 600.0;

/// Shaft rotation frequency of the synthetic machine (Hz).
pub const SYNTHETIC_SHAFT_HZ: f64 = 25.0;

/// Outer-race defect frequency injected during the fault phase (Hz).
pub const SYNTHETIC_FAULT_HZ: f64 = 87.0;

/// Batches per phase of the synthetic scenario.
pub const SYNTHETIC_BATCHES_PER_PHASE: usize = 6;

/// Seed for the synthetic scenario noise, so runs are reproducible.
pub const SYNTHETIC_SEED: u64 = 0x5EED;
