//! Spectral Sentinel - real-time vibration spectrum change detector
//!
//! # Usage
//!
//! ```bash
//! # Run the built-in synthetic fault scenario
//! cargo run --release
//!
//! # Run with simulation input from stdin
//! ./simulation --speed 10 | ./spectral-sentinel --stdin
//!
//! # Replay a recorded t,amplitude CSV file as fast as possible
//! ./spectral-sentinel --csv recording.csv --speed 0 --json
//! ```
//!
//! # Environment Variables
//!
//! - `SENTINEL_CONFIG`: Path to a TOML config file
//! - `RUST_LOG`: Logging level (default: info)

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use spectral_sentinel::config::{defaults, OutputFormat, SentinelConfig};
use spectral_sentinel::pipeline::{
    BatchSource, EventSink, JsonSink, ProcessingLoop, ReplaySource, SpectralDetector, StdinSource,
    TextSink,
};
use spectral_sentinel::sensors;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "spectral-sentinel")]
#[command(about = "Real-time spectral change detection for vibration signals")]
#[command(version)]
struct CliArgs {
    /// Read samples from stdin as JSON lines instead of synthetic data
    /// Use with simulator: ./simulation | ./spectral-sentinel --stdin
    #[arg(long, conflicts_with = "csv")]
    stdin: bool,

    /// Path to CSV file with t,amplitude samples
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Speed multiplier for replay (1 = realtime, 10 = 10x faster, 0 = no delay)
    #[arg(long, default_value = "1")]
    speed: u64,

    /// Path to TOML config file (overrides SENTINEL_CONFIG and ./sentinel.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Samples per analysis window
    #[arg(long, value_name = "N")]
    window_size: Option<usize>,

    /// Change percentage that must be exceeded to alert
    #[arg(long, value_name = "PERCENT")]
    threshold: Option<f64>,

    /// Write detector events as JSON lines
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Also print per-batch sample counts
    #[arg(short, long)]
    verbose: bool,
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Initialize logging; stdout carries events, logs go to stderr
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if args.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(io::stderr)
            .init();
    }

    let config = load_config(&args)?;
    let detector = SpectralDetector::from_config(&config.detector)
        .context("Failed to build spectral detector")?;

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Spectral Sentinel");
    info!("  Vibration Spectrum Change Detection");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!(
        "Window: {} samples | Threshold: {:.2}% | Selection: {:?} | Component: {:?}",
        config.detector.window_size,
        config.detector.change_threshold_percent,
        config.detector.window_selection,
        config.detector.spectrum_component
    );
    info!("");

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let pipeline = ProcessingLoop::new(detector, cancel_token);

    if args.stdin {
        // --- Stdin mode ---
        info!(
            "📥 Input: stdin (JSON samples, {}ms micro-batch trigger)",
            config.stream.trigger_interval_ms
        );
        let mut source =
            StdinSource::stdin(Duration::from_millis(config.stream.trigger_interval_ms));
        run_with_sink(pipeline, &mut source, &config, args.json, args.verbose).await;
    } else {
        // --- CSV / synthetic mode ---
        let samples = load_samples(args.csv.as_deref(), &config)?;
        let delay = replay_delay(config.stream.replay_delay_ms, args.speed);
        info!(
            "⏱️  Speed: {}x ({}ms delay between batches)",
            if args.speed == 0 {
                "max".to_string()
            } else {
                args.speed.to_string()
            },
            delay.as_millis()
        );
        let name = if args.csv.is_some() { "CSV" } else { "synthetic" };
        let mut source =
            ReplaySource::from_samples(&samples, config.stream.replay_batch_size, delay, name);
        info!(
            "📊 {} samples queued in {} batches",
            samples.len(),
            source.remaining()
        );
        run_with_sink(pipeline, &mut source, &config, args.json, args.verbose).await;
    }

    info!("");
    info!("✓ Spectral Sentinel shutdown complete");
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// `--config` errors are fatal; the implicit search falls back to defaults.
fn load_config(args: &CliArgs) -> Result<SentinelConfig> {
    let base = match &args.config {
        Some(path) => {
            let config = SentinelConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            info!(path = %path.display(), "Loaded config from --config");
            config
        }
        None => SentinelConfig::load(),
    };
    base.with_overrides(args.window_size, args.threshold)
        .context("Invalid command-line override")
}

fn load_samples(
    csv: Option<&std::path::Path>,
    config: &SentinelConfig,
) -> Result<Vec<spectral_sentinel::Sample>> {
    match csv {
        Some(path) => {
            info!("📥 Input: CSV file {}", path.display());
            sensors::read_csv_samples(path)
                .with_context(|| format!("Failed to read CSV {}", path.display()))
        }
        None => {
            info!("📥 Input: synthetic bearing fault scenario");
            Ok(sensors::generate_fault_scenario(
                config.stream.replay_batch_size,
                defaults::SYNTHETIC_BATCHES_PER_PHASE,
                defaults::SYNTHETIC_SEED,
            ))
        }
    }
}

/// Base delay divided by the speed factor; speed 0 disables pacing.
fn replay_delay(base_ms: u64, speed: u64) -> Duration {
    if speed == 0 {
        Duration::ZERO
    } else {
        Duration::from_millis(base_ms / speed)
    }
}

async fn run_with_sink<S: BatchSource>(
    pipeline: ProcessingLoop,
    source: &mut S,
    config: &SentinelConfig,
    json_flag: bool,
    verbose: bool,
) {
    let format = if json_flag {
        OutputFormat::Json
    } else {
        config.output.format
    };
    let stats = match format {
        OutputFormat::Json => run_pipeline(pipeline, source, JsonSink::new(io::stdout())).await,
        OutputFormat::Text => {
            run_pipeline(pipeline, source, TextSink::new(io::stdout(), verbose)).await
        }
    };
    info!("{}", stats);
}

async fn run_pipeline<S: BatchSource, K: EventSink>(
    pipeline: ProcessingLoop,
    source: &mut S,
    mut sink: K,
) -> spectral_sentinel::PipelineStats {
    pipeline.run(source, &mut sink).await
}
