//! Configuration loading and management.
//!
//! Configuration is loaded with the following precedence:
//! 1. Environment variables (`STINT_*`)
//! 2. Config file (`~/.stint/config.toml`)
//! 3. Defaults

use crate::error::{Error, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,

    /// Timer configuration.
    pub timer: TimerConfig,

    /// Engine policy configuration.
    pub engine: EngineConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the session database.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_stint_home(),
        }
    }
}

/// Timer configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Countdown length used when none is given.
    pub default_minutes: u32,

    /// Milliseconds between ticks.
    pub tick_interval_ms: u64,
}

impl TimerConfig {
    /// Tick interval as a `Duration`.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_minutes: 25,
            tick_interval_ms: 1000,
        }
    }
}

/// Engine policy configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// What happens when the user declines to resume after returning.
    pub on_resume_declined: DeclinePolicy,

    /// Record non-default categories in the registry when a session starts.
    pub register_categories: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            on_resume_declined: DeclinePolicy::StayPaused,
            register_categories: true,
        }
    }
}

/// Policy for a declined resume prompt.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeclinePolicy {
    /// Keep the session paused (default).
    #[default]
    StayPaused,

    /// Stop and save the session as it stands.
    Stop,
}

impl FromStr for DeclinePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "stay_paused" => Ok(Self::StayPaused),
            "stop" => Ok(Self::Stop),
            other => Err(Error::Config(format!(
                "unknown resume-declined policy '{other}' (expected stay_paused or stop)"
            ))),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `STINT_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Get the default stint home directory.
///
/// Uses `STINT_HOME` if set, otherwise `~/.stint`.
#[must_use]
pub fn default_stint_home() -> PathBuf {
    if let Ok(home) = env::var("STINT_HOME") {
        return PathBuf::from(home);
    }
    dirs::home_dir().map_or_else(|| PathBuf::from(".stint"), |h| h.join(".stint"))
}

/// Load configuration with precedence: env vars → file → defaults.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
pub fn load_config() -> Result<Config> {
    let mut config = Config::default();

    let config_path = get_config_path();
    if config_path.exists() {
        let contents = fs::read_to_string(&config_path)?;
        config = toml::from_str(&contents).map_err(|e| Error::Config(e.to_string()))?;
    }

    apply_env_overrides(&mut config)?;

    Ok(config)
}

/// Get the path to the config file.
fn get_config_path() -> PathBuf {
    if let Ok(path) = env::var("STINT_CONFIG") {
        return PathBuf::from(path);
    }
    default_stint_home().join("config.toml")
}

/// Apply environment variable overrides to config.
///
/// An unknown `STINT_ON_RESUME_DECLINED` is an error, as it is in the file.
fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Ok(path) = env::var("STINT_STORAGE_PATH") {
        config.storage.path = PathBuf::from(path);
    } else if let Ok(home) = env::var("STINT_HOME") {
        config.storage.path = PathBuf::from(home);
    }

    if let Ok(val) = env::var("STINT_DEFAULT_MINUTES") {
        if let Ok(minutes) = val.parse() {
            config.timer.default_minutes = minutes;
        }
    }

    if let Ok(policy) = env::var("STINT_ON_RESUME_DECLINED") {
        config.engine.on_resume_declined = policy.parse()?;
    }

    Ok(())
}
