//! Vibration Signal Simulation
//!
//! Generates a rotating-machine vibration signal for testing Spectral Sentinel.
//! The run is split into three equal phases:
//! - Healthy shaft vibration
//! - Outer-race bearing fault (extra defect tone and harmonic)
//! - Recovery (healthy signature again)
//!
//! # Usage
//! ```bash
//! ./simulation --seconds 60 --speed 10 | ./spectral-sentinel --stdin
//! ```

use clap::{Parser, ValueEnum};
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use std::io::{self, Write};
use std::time::{Duration, Instant};

use spectral_sentinel::sensors::{vibration_amplitude, ScenarioPhase};
use spectral_sentinel::Sample;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One JSON sample object per line
    Json,
    /// One JSON array per line, one second of samples each
    Batches,
    /// t,amplitude rows with a header
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "vibration-simulation")]
#[command(about = "Vibration signal simulation for Spectral Sentinel testing")]
#[command(version = "1.0")]
struct Args {
    /// Simulated duration in seconds
    #[arg(long, default_value = "60", value_parser = clap::value_parser!(u32).range(3..=86_400))]
    seconds: u32,

    /// Time compression factor (1 = real-time, 0 = as fast as possible)
    #[arg(short, long, default_value = "1")]
    speed: u32,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Suppress mission log (only output samples)
    #[arg(short, long)]
    quiet: bool,

    /// Samples per simulated second
    #[arg(long, default_value = "600", value_parser = clap::value_parser!(u32).range(1..=100_000))]
    sample_rate: u32,

    /// Standard deviation of additive sensor noise
    #[arg(long, default_value = "0.05")]
    noise: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,
}

// ============================================================================
// Logging Utilities
// ============================================================================

fn format_time(seconds: f64) -> String {
    let hours = (seconds / 3600.0) as u32;
    let minutes = ((seconds % 3600.0) / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

fn log_mission(time: f64, message: &str, quiet: bool) {
    if !quiet {
        eprintln!("[{}] {}", format_time(time), message);
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut rng = match args.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let noise = Normal::new(0.0, args.noise)?;

    let rate = f64::from(args.sample_rate);
    let total_seconds = f64::from(args.seconds);
    let second_real = if args.speed == 0 {
        Duration::ZERO
    } else {
        Duration::from_secs_f64(1.0 / f64::from(args.speed))
    };

    // Mission briefing
    log_mission(0.0, &"=".repeat(70), args.quiet);
    log_mission(0.0, "VIBRATION SIMULATION v1.0", args.quiet);
    log_mission(0.0, "Spectral Sentinel Test Data Generator", args.quiet);
    log_mission(0.0, &"=".repeat(70), args.quiet);
    log_mission(0.0, &format!("  Duration: {} s ({} samples)", args.seconds, u64::from(args.seconds) * u64::from(args.sample_rate)), args.quiet);
    log_mission(0.0, &format!("  Sample rate: {} Hz", args.sample_rate), args.quiet);
    log_mission(0.0, &format!("  Speed: {}x", args.speed), args.quiet);
    log_mission(0.0, &format!("  Noise sigma: {}", args.noise), args.quiet);
    if let Some(seed) = args.seed {
        log_mission(0.0, &format!("  Random seed: {}", seed), args.quiet);
    }
    log_mission(0.0, "", args.quiet);
    log_mission(0.0, "SCENARIO PHASES:", args.quiet);
    log_mission(0.0, "  0-33%:   Healthy (shaft tone + 2x harmonic)", args.quiet);
    log_mission(0.0, "  33-67%:  Bearing fault (defect tone + harmonic)", args.quiet);
    log_mission(0.0, "  67-100%: Recovery (healthy signature)", args.quiet);
    log_mission(0.0, &"=".repeat(70), args.quiet);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.format == OutputFormat::Csv {
        writeln!(out, "t,amplitude")?;
    }

    let start_time = Instant::now();
    let mut current_phase: Option<ScenarioPhase> = None;
    let mut samples_generated: u64 = 0;

    // One simulated second per iteration
    for second in 0..args.seconds {
        let loop_start = Instant::now();
        let sim_time = f64::from(second);

        let phase = ScenarioPhase::from_progress(sim_time / total_seconds);
        if current_phase != Some(phase) {
            log_mission(sim_time, &format!(">>> PHASE: {}", phase.name()), args.quiet);
            current_phase = Some(phase);
        }

        let batch: Vec<Sample> = (0..args.sample_rate)
            .map(|i| {
                let t = sim_time + f64::from(i) / rate;
                Sample::new(t, vibration_amplitude(t, phase) + noise.sample(&mut rng))
            })
            .collect();
        samples_generated += batch.len() as u64;

        match args.format {
            OutputFormat::Json => {
                for sample in &batch {
                    serde_json::to_writer(&mut out, sample)?;
                    writeln!(out)?;
                }
            }
            OutputFormat::Batches => {
                serde_json::to_writer(&mut out, &batch)?;
                writeln!(out)?;
            }
            OutputFormat::Csv => {
                for sample in &batch {
                    writeln!(out, "{:.6},{:.6}", sample.t, sample.amplitude)?;
                }
            }
        }
        out.flush()?;

        let elapsed = loop_start.elapsed();
        if elapsed < second_real {
            std::thread::sleep(second_real - elapsed);
        }
    }

    out.flush()?;
    drop(out);

    // Mission debrief
    log_mission(total_seconds, &"=".repeat(70), args.quiet);
    log_mission(total_seconds, "SIMULATION COMPLETE", args.quiet);
    log_mission(total_seconds, &format!("Total samples: {}", samples_generated), args.quiet);
    log_mission(total_seconds, &format!("Real time: {:.1}s", start_time.elapsed().as_secs_f64()), args.quiet);
    log_mission(total_seconds, &"=".repeat(70), args.quiet);

    Ok(())
}
