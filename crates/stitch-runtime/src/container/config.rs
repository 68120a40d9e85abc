//! # Runtime Configuration
//!
//! Settings for hosts that drive a container: where snapshots live, how much
//! to log, whether declared timers run, and which lifecycle methods mark
//! startup and shutdown.
//!
//! Every field has a default and can be overridden from the environment:
//!
//! | Field            | Variable                          | Default                 |
//! |------------------|-----------------------------------|-------------------------|
//! | `snapshot_path`  | `STITCH_SNAPSHOT_PATH`            | `./data/snapshot.json`  |
//! | `log_level`      | `STITCH_LOG_LEVEL`, `RUST_LOG`    | `info`                  |
//! | `start_timers`   | `STITCH_TIMERS`                   | `true`                  |
//! | `startup_phase`  | `STITCH_STARTUP_PHASE`            | `created`               |
//! | `shutdown_phase` | `STITCH_SHUTDOWN_PHASE`           | `destroyed`             |

use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

pub const ENV_SNAPSHOT_PATH: &str = "STITCH_SNAPSHOT_PATH";
pub const ENV_LOG_LEVEL: &str = "STITCH_LOG_LEVEL";
pub const ENV_TIMERS: &str = "STITCH_TIMERS";
pub const ENV_STARTUP_PHASE: &str = "STITCH_STARTUP_PHASE";
pub const ENV_SHUTDOWN_PHASE: &str = "STITCH_SHUTDOWN_PHASE";

/// Host configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// File the snapshot is loaded from at startup and saved to at shutdown.
    pub snapshot_path: PathBuf,
    /// `EnvFilter` directive for the log subscriber.
    pub log_level: String,
    /// Start the timers declared in service descriptors.
    pub start_timers: bool,
    /// Method invoked in order once the container is built.
    pub startup_phase: String,
    /// Method invoked in order before the host exits.
    pub shutdown_phase: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("./data/snapshot.json"),
            log_level: "info".to_string(),
            start_timers: true,
            startup_phase: "created".to_string(),
            shutdown_phase: "destroyed".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Defaults overridden by the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_SNAPSHOT_PATH) {
            config.snapshot_path = PathBuf::from(path);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).or_else(|| lookup("RUST_LOG")) {
            config.log_level = level;
        }
        if let Some(flag) = lookup(ENV_TIMERS) {
            match parse_flag(&flag) {
                Some(enabled) => config.start_timers = enabled,
                None => warn!(value = %flag, "{} is not a boolean, keeping default", ENV_TIMERS),
            }
        }
        if let Some(phase) = lookup(ENV_STARTUP_PHASE) {
            config.startup_phase = phase;
        }
        if let Some(phase) = lookup(ENV_SHUTDOWN_PHASE) {
            config.shutdown_phase = phase;
        }

        config
    }

    /// Reject settings the host cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.startup_phase.trim().is_empty() {
            return Err(ConfigError::EmptyPhase("startup"));
        }
        if self.shutdown_phase.trim().is_empty() {
            return Err(ConfigError::EmptyPhase("shutdown"));
        }
        if self.snapshot_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptySnapshotPath);
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A lifecycle phase has no method name.
    #[error("The {0} phase needs a method name")]
    EmptyPhase(&'static str),

    #[error("Snapshot path is empty")]
    EmptySnapshotPath,
}
