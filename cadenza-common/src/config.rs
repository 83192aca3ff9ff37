//! Bootstrap configuration loading
//!
//! Configuration is a single TOML file. Every field has a built-in default,
//! so a missing file (or a missing section) is never fatal.
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `CADENZA_CONFIG` environment variable
//! 3. `<user config dir>/cadenza/config.toml`
//! 4. Built-in defaults (no file)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "CADENZA_CONFIG";

/// Top-level configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    pub logging: LoggingConfig,
    pub playback: PlaybackConfig,
    pub paginator: PaginatorConfig,
    pub commands: CommandConfig,
    pub console: ConsoleConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins when set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Where `play` puts a track when something is already playing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnqueuePosition {
    /// Append behind everything already queued
    #[default]
    Back,
    /// Jump the queue and play next
    Front,
}

/// Playback settings applied to every session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaybackConfig {
    pub enqueue_position: EnqueuePosition,
    /// Upper bound on one resolver call
    pub resolve_timeout_secs: u64,
    /// Initial session volume in percent (100 = unity gain)
    pub default_volume_pct: f32,
    /// Ask the audio backend to reconnect dropped network streams
    pub reconnect: bool,
    /// Maximum reconnect back-off handed to the audio backend
    pub reconnect_delay_max_secs: u64,
    /// EventBus channel capacity
    pub event_capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            enqueue_position: EnqueuePosition::Back,
            resolve_timeout_secs: 30,
            default_volume_pct: 100.0,
            reconnect: true,
            reconnect_delay_max_secs: 5,
            event_capacity: 256,
        }
    }
}

impl PlaybackConfig {
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }

    pub fn reconnect_delay_max(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_max_secs)
    }
}

/// Interactive paginator settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PaginatorConfig {
    /// Sliding inactivity timeout
    pub timeout_secs: u64,
    /// Queue entries shown per page
    pub queue_page_size: usize,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            queue_page_size: 10,
        }
    }
}

impl PaginatorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Command parsing settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CommandConfig {
    pub prefix: String,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            prefix: "$".to_string(),
        }
    }
}

/// Settings for the console harness and its simulated audio sink
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsoleConfig {
    /// How long a simulated stream runs before it reports completion
    pub simulated_track_secs: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            simulated_track_secs: 180,
        }
    }
}

impl TomlConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Resolve the config path and load it, falling back to defaults
    ///
    /// A missing file logs a warning and yields defaults; a file that
    /// exists but cannot be parsed is an error.
    pub fn load_or_default(cli_arg: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_arg) {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::load(&path)
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                info!("No config file location available, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.paginator.queue_page_size == 0 {
            return Err(Error::Config(
                "paginator.queue_page_size must be at least 1".to_string(),
            ));
        }
        if self.playback.event_capacity == 0 {
            return Err(Error::Config(
                "playback.event_capacity must be at least 1".to_string(),
            ));
        }
        if !self.playback.default_volume_pct.is_finite() || self.playback.default_volume_pct < 0.0
        {
            return Err(Error::Config(format!(
                "playback.default_volume_pct must be >= 0 (got {})",
                self.playback.default_volume_pct
            )));
        }
        if self.commands.prefix.is_empty()
            || self.commands.prefix.chars().any(char::is_whitespace)
        {
            return Err(Error::Config(
                "commands.prefix must be non-empty without whitespace".to_string(),
            ));
        }
        Ok(())
    }
}

/// Pick the config file location following the priority order above
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: platform config directory
    dirs::config_dir().map(|d| d.join("cadenza").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.playback.enqueue_position, EnqueuePosition::Back);
        assert_eq!(config.paginator.timeout(), Duration::from_secs(120));
        assert_eq!(config.commands.prefix, "$");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
            [playback]
            enqueue_position = "front"
            "#,
        )
        .unwrap();

        assert_eq!(config.playback.enqueue_position, EnqueuePosition::Front);
        assert_eq!(config.playback.resolve_timeout_secs, 30);
        assert_eq!(config.paginator.queue_page_size, 10);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let err = TomlConfig::from_toml_str("[paginator]\nqueue_page_size = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_garbage_is_config_error() {
        let err = TomlConfig::from_toml_str("playback = 12").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
