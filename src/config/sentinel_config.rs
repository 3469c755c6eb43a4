//! Sentinel Configuration - detector, stream and output settings as TOML values
//!
//! Each struct implements `Default` with the documented defaults, so a
//! missing file, section or key behaves exactly like the built-in setup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults::{
    CONFIG_ENV_VAR, DEFAULT_CHANGE_THRESHOLD_PERCENT, DEFAULT_CONFIG_FILE,
    DEFAULT_REPLAY_BATCH_SIZE, DEFAULT_REPLAY_DELAY_MS, DEFAULT_TRIGGER_INTERVAL_MS,
    DEFAULT_WINDOW_SIZE,
};
use crate::processing::{SpectrumComponent, WindowSelection};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `SentinelConfig::load()` which searches:
/// 1. `$SENTINEL_CONFIG` env var
/// 2. `./sentinel.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentinelConfig {
    /// Windowing, transform and alerting
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Batch delivery
    #[serde(default)]
    pub stream: StreamConfig,

    /// Event rendering
    #[serde(default)]
    pub output: OutputConfig,
}

impl SentinelConfig {
    /// Load configuration using the standard search order:
    /// 1. `$SENTINEL_CONFIG` environment variable
    /// 2. `./sentinel.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        let env_path = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        Self::load_from_search(env_path.as_deref(), Path::new(DEFAULT_CONFIG_FILE))
    }

    /// The search behind [`SentinelConfig::load`], with both candidates given.
    ///
    /// A missing, unreadable or invalid candidate is logged and the next one
    /// is tried. Never fails.
    pub fn load_from_search(env_path: Option<&Path>, local: &Path) -> Self {
        // 1. Check env var
        if let Some(p) = env_path {
            if p.exists() {
                match Self::load_from_file(p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %p.display(), "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        // 2. Check ./sentinel.toml
        if local.exists() {
            match Self::load_from_file(local) {
                Ok(config) => {
                    info!(path = %local.display(), "Loaded local config");
                    return config;
                }
                Err(e) => {
                    warn!(path = %local.display(), error = %e, "Failed to load local config, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are logged as warnings and otherwise ignored.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        // Two-pass: check for unknown keys first (warnings only)
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Apply command-line overrides on top of the loaded values, then re-validate.
    ///
    /// A window override larger than `stream.replay_batch_size` raises the
    /// batch size with it, otherwise every replayed batch would be short.
    pub fn with_overrides(
        mut self,
        window_size: Option<usize>,
        change_threshold_percent: Option<f64>,
    ) -> Result<Self, ConfigError> {
        if let Some(n) = window_size {
            self.detector.window_size = n;
            if n > self.stream.replay_batch_size {
                info!(
                    window_size = n,
                    previous = self.stream.replay_batch_size,
                    "Raising stream.replay_batch_size to the window size"
                );
                self.stream.replay_batch_size = n;
            }
        }
        if let Some(t) = change_threshold_percent {
            self.detector.change_threshold_percent = t;
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate all values for internal consistency.
    ///
    /// Rules:
    /// - Window size and replay batch size must be > 0
    /// - Threshold must be finite and >= 0
    /// - Trigger interval must be > 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let d = &self.detector;
        if d.window_size == 0 {
            errors.push("detector.window_size must be > 0".to_string());
        }
        if !d.change_threshold_percent.is_finite() {
            errors.push(format!(
                "detector.change_threshold_percent must be finite (got {})",
                d.change_threshold_percent
            ));
        } else if d.change_threshold_percent < 0.0 {
            errors.push(format!(
                "detector.change_threshold_percent ({:.2}) must be >= 0",
                d.change_threshold_percent
            ));
        }

        let s = &self.stream;
        if s.trigger_interval_ms == 0 {
            errors.push("stream.trigger_interval_ms must be > 0".to_string());
        }
        if s.replay_batch_size == 0 {
            errors.push("stream.replay_batch_size must be > 0".to_string());
        }

        let (range_errors, range_warnings) = super::validation::validate_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            Self::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            Self::Serialize(e) => write!(f, "Config serialization error: {}", e),
            Self::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Detector Config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Samples per window and bins per spectrum
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Alert when the spectrum changes by strictly more than this (percent)
    #[serde(default = "default_change_threshold_percent")]
    pub change_threshold_percent: f64,

    /// Window choice for batches larger than `window_size`
    #[serde(default)]
    pub window_selection: WindowSelection,

    /// Which part of each DFT coefficient feeds the comparison
    #[serde(default)]
    pub spectrum_component: SpectrumComponent,
}

const fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}
const fn default_change_threshold_percent() -> f64 {
    DEFAULT_CHANGE_THRESHOLD_PERCENT
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            change_threshold_percent: default_change_threshold_percent(),
            window_selection: WindowSelection::default(),
            spectrum_component: SpectrumComponent::default(),
        }
    }
}

// ============================================================================
// Stream Config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Flush buffered single-record stdin lines this often (ms)
    #[serde(default = "default_trigger_interval_ms")]
    pub trigger_interval_ms: u64,

    /// Samples per batch for file and synthetic replay
    #[serde(default = "default_replay_batch_size")]
    pub replay_batch_size: usize,

    /// Delay between replayed batches at 1x speed (ms)
    #[serde(default = "default_replay_delay_ms")]
    pub replay_delay_ms: u64,
}

const fn default_trigger_interval_ms() -> u64 {
    DEFAULT_TRIGGER_INTERVAL_MS
}
const fn default_replay_batch_size() -> usize {
    DEFAULT_REPLAY_BATCH_SIZE
}
const fn default_replay_delay_ms() -> u64 {
    DEFAULT_REPLAY_DELAY_MS
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            trigger_interval_ms: default_trigger_interval_ms(),
            replay_batch_size: default_replay_batch_size(),
            replay_delay_ms: default_replay_delay_ms(),
        }
    }
}

// ============================================================================
// Output Config
// ============================================================================

/// How detector events are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

// ============================================================================
// Tests
// ============================================================================
