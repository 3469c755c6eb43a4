//! Detector Configuration Module
//!
//! Provides the detector configuration loaded from TOML files, with
//! built-in defaults for every value.
//!
//! ## Loading Order
//!
//! 1. `--config <PATH>` on the command line (errors are fatal)
//! 2. `SENTINEL_CONFIG` environment variable (path to TOML file)
//! 3. `sentinel.toml` in the current working directory
//! 4. Built-in defaults
//!
//! ## Usage
//!
//! ```ignore
//! let config = SentinelConfig::load();
//! let detector = SpectralDetector::from_config(&config.detector)?;
//! ```
//!
//! The config is passed explicitly to the components that need it; there
//! is no process-wide config singleton.

mod sentinel_config;
pub mod defaults;
pub mod validation;

pub use sentinel_config::*;
