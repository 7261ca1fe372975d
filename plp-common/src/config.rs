//! Bootstrap configuration loading
//!
//! Configuration comes from a small TOML file. The file is located with the
//! following priority order:
//! 1. Command-line argument (highest priority)
//! 2. `PLP_CONFIG` environment variable
//! 3. `<user config dir>/plp/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! A missing file never terminates the player: a warning is logged and the
//! compiled defaults are used. A file that exists but cannot be parsed is an
//! error.

use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the configuration file
pub const CONFIG_ENV_VAR: &str = "PLP_CONFIG";

/// Complete player configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct PlayerConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Notification bus configuration
    #[serde(default)]
    pub events: EventConfig,

    /// Simulated audio resource configuration
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Notification bus configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EventConfig {
    /// Broadcast buffer size before slow observers start lagging
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

/// Simulated audio resource configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SimulationConfig {
    /// Duration used for tracks without an explicit entry (seconds)
    #[serde(default = "default_track_duration_secs")]
    pub track_duration_secs: f64,

    /// Interval between position-advanced signals (milliseconds)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Per-location durations (seconds)
    #[serde(default)]
    pub durations: HashMap<String, f64>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_event_capacity() -> usize {
    100
}

fn default_track_duration_secs() -> f64 {
    180.0
}

fn default_tick_interval_ms() -> u64 {
    250
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            track_duration_secs: default_track_duration_secs(),
            tick_interval_ms: default_tick_interval_ms(),
            durations: HashMap::new(),
        }
    }
}

impl PlayerConfig {
    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PlayerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an existing file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Reject values the player cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.events.capacity == 0 {
            return Err(Error::Config("events.capacity must be at least 1".to_string()));
        }
        if self.simulation.tick_interval_ms == 0 {
            return Err(Error::Config(
                "simulation.tick_interval_ms must be at least 1".to_string(),
            ));
        }
        let durations = std::iter::once(("<default>", self.simulation.track_duration_secs))
            .chain(
                self.simulation
                    .durations
                    .iter()
                    .map(|(location, secs)| (location.as_str(), *secs)),
            );
        for (location, secs) in durations {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(Error::Config(format!(
                    "track duration for {} must be a positive number of seconds, got {}",
                    location, secs
                )));
            }
        }
        Ok(())
    }
}

/// Locates and loads the configuration file
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Candidate configuration path, highest priority first
    ///
    /// Returns None when neither an explicit path nor a default file exists.
    pub fn resolve_path(&self) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: user config directory
        default_config_path().filter(|path| path.exists())
    }

    /// Load the resolved configuration, falling back to defaults
    pub fn load(&self) -> Result<PlayerConfig> {
        let Some(path) = self.resolve_path() else {
            info!("No configuration file found, using built-in defaults");
            return Ok(PlayerConfig::default());
        };

        if !path.exists() {
            warn!(
                "Configuration file {} not found, using built-in defaults",
                path.display()
            );
            return Ok(PlayerConfig::default());
        }

        let config = PlayerConfig::load(&path)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

/// Default configuration file location for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("plp").join("config.toml"))
}
