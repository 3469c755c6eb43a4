//! Sample ingestion from CSV files and the synthetic vibration scenario

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::TAU;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::config::defaults::{SYNTHETIC_FAULT_HZ, SYNTHETIC_SAMPLE_RATE_HZ, SYNTHETIC_SHAFT_HZ};
use crate::types::Sample;

/// Standard deviation of the additive sensor noise (amplitude units)
const NOISE_STD_DEV: f64 = 0.05;

/// Read vibration samples from a CSV file
///
/// Expected CSV format (header optional):
/// t,amplitude
///
/// `t` is either seconds as a number or an RFC 3339 timestamp.
/// Malformed lines are logged and skipped.
pub fn read_csv_samples(path: &Path) -> std::io::Result<Vec<Sample>> {
    let file = File::open(path)?;
    let samples = read_samples(BufReader::new(file));
    tracing::info!(count = samples.len(), path = %path.display(), "Loaded samples from CSV");
    Ok(samples)
}

/// Parse `t,amplitude` lines from any buffered reader.
pub fn read_samples<R: BufRead>(reader: R) -> Vec<Sample> {
    let mut samples = Vec::new();

    for (idx, line_result) in reader.lines().enumerate() {
        let line_num = idx + 1;
        let line = match line_result {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!(line = line_num, error = %e, "Error reading CSV line");
                continue;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        // Skip header line
        if line_num == 1 && trimmed.starts_with(|c: char| c.is_ascii_alphabetic()) {
            continue;
        }

        match parse_csv_line(trimmed) {
            Ok(sample) => samples.push(sample),
            Err(e) => {
                tracing::warn!(line = line_num, error = %e, "Error parsing CSV line");
            }
        }
    }

    samples
}

/// Parse a single `t,amplitude` line
fn parse_csv_line(line: &str) -> Result<Sample, String> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < 2 {
        return Err(format!("Expected 2 fields, got {}", fields.len()));
    }

    let t = parse_timestamp(fields[0])?;
    let amplitude = parse_f64(fields[1], "amplitude")?;
    if !amplitude.is_finite() {
        return Err(format!("Non-finite amplitude '{}'", fields[1].trim()));
    }
    Ok(Sample::new(t, amplitude))
}

/// Seconds as a float, or an RFC 3339 timestamp converted to epoch seconds
fn parse_timestamp(s: &str) -> Result<f64, String> {
    let s = s.trim();

    if let Ok(secs) = s.parse::<f64>() {
        if secs.is_finite() {
            return Ok(secs);
        }
        return Err(format!("Non-finite timestamp '{s}'"));
    }

    DateTime::parse_from_rfc3339(s)
        .map(|dt| {
            let dt = dt.with_timezone(&Utc);
            dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) * 1e-9
        })
        .map_err(|e| format!("Cannot parse timestamp '{s}': {e}"))
}

/// Parse a string to f64 with field name for error messages
fn parse_f64(s: &str, field: &str) -> Result<f64, String> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| format!("Cannot parse {} as f64: '{}'", field, s.trim()))
}

// ============================================================================
// Synthetic Vibration Scenario
// ============================================================================

/// Machine condition for each segment of the synthetic scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioPhase {
    /// Shaft tone and its second harmonic only
    Healthy,
    /// Outer-race defect tone and harmonic on top of the healthy signal
    BearingFault,
    /// Back to the healthy signature
    Recovery,
}

impl ScenarioPhase {
    pub const ALL: [Self; 3] = [Self::Healthy, Self::BearingFault, Self::Recovery];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Healthy => "HEALTHY",
            Self::BearingFault => "BEARING FAULT",
            Self::Recovery => "RECOVERY",
        }
    }

    /// Phase for a position in `[0, 1)` through the scenario, split in thirds.
    pub fn from_progress(progress: f64) -> Self {
        if progress < 1.0 / 3.0 {
            Self::Healthy
        } else if progress < 2.0 / 3.0 {
            Self::BearingFault
        } else {
            Self::Recovery
        }
    }
}

/// Noise-free vibration amplitude at time `t` (seconds).
///
/// Cosines with fixed phase offsets, so the tones show up in the real part
/// of the spectrum as well as in its magnitude.
pub fn vibration_amplitude(t: f64, phase: ScenarioPhase) -> f64 {
    let shaft = (TAU * SYNTHETIC_SHAFT_HZ * t + 0.4).cos()
        + 0.3 * (TAU * 2.0 * SYNTHETIC_SHAFT_HZ * t + 0.4).cos();
    match phase {
        ScenarioPhase::Healthy | ScenarioPhase::Recovery => shaft,
        ScenarioPhase::BearingFault => {
            shaft
                + 0.8 * (TAU * SYNTHETIC_FAULT_HZ * t + 0.3).cos()
                + 0.4 * (TAU * 2.0 * SYNTHETIC_FAULT_HZ * t + 0.3).cos()
        }
    }
}

/// Generate the synthetic fault scenario: healthy → bearing fault → recovery.
///
/// Each phase spans `batches_per_phase * batch_size` samples taken at
/// `SYNTHETIC_SAMPLE_RATE_HZ`, with seeded Gaussian noise so runs are
/// reproducible. Chunking the result into `batch_size` batches gives whole
/// batches per phase.
pub fn generate_fault_scenario(batch_size: usize, batches_per_phase: usize, seed: u64) -> Vec<Sample> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, NOISE_STD_DEV).ok();
    let per_phase = batch_size * batches_per_phase;
    let mut samples = Vec::with_capacity(per_phase * ScenarioPhase::ALL.len());

    for phase in ScenarioPhase::ALL {
        tracing::debug!(phase = phase.name(), samples = per_phase, "Generating scenario phase");
        for _ in 0..per_phase {
            let t = samples.len() as f64 / SYNTHETIC_SAMPLE_RATE_HZ;
            let jitter = noise.map_or(0.0, |n| n.sample(&mut rng));
            samples.push(Sample::new(t, vibration_amplitude(t, phase) + jitter));
        }
    }

    samples
}
