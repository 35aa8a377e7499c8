//! TOML Configuration File Support
//!
//! Settings for the monitor, loaded from `~/.config/hal-monitor/monitor.toml`.
//!
//! # Configuration Priority
//!
//! Highest first:
//! 1. CLI arguments ([`ConfigOverrides`])
//! 2. Environment variables (`HAL_*`)
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [server]
//! base_url = "http://localhost:8080"
//! user = "DAVE"
//!
//! [log]
//! message_speed_ms = 75
//! cursor_grace_ms = 1500
//!
//! [boot]
//! enabled = true
//! audio_path = "/usr/share/hal/boot.mp3"
//! audio_volume = 0.35
//!
//! [transport]
//! reconnect_attempts = 3
//! reconnect_delay_ms = 3000
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::boot::BootConfig;
use crate::entry::normalize_identity;
use crate::live_log::LogConfig;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Where the highest-priority value in a configuration came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Command-line argument
    Cli,
    /// Environment variable
    Env,
    /// TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[server]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerToml {
    /// Base URL of the monitor server
    pub base_url: Option<String>,

    /// Only show this user's entries
    pub user: Option<String>,
}

/// `[log]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogToml {
    /// Per-character timestamp speed in milliseconds
    pub timestamp_speed_ms: Option<u64>,

    /// Per-character username speed in milliseconds
    pub username_speed_ms: Option<u64>,

    /// Per-character message speed in milliseconds
    pub message_speed_ms: Option<u64>,

    /// Per-character tags speed in milliseconds
    pub tags_speed_ms: Option<u64>,

    /// Trailing cursor lifetime in milliseconds
    pub cursor_grace_ms: Option<u64>,

    /// Pause between live entries in milliseconds
    pub entry_pause_ms: Option<u64>,

    /// Whether `[NAME]` lines are shown in the unscoped view
    pub show_usernames: Option<bool>,
}

/// `[boot]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BootToml {
    /// Whether the boot sequence plays at all
    pub enabled: Option<bool>,

    /// Delay before playback in milliseconds
    pub start_delay_ms: Option<u64>,

    /// Interrupted notice lifetime in milliseconds
    pub skip_notice_delay_ms: Option<u64>,

    /// Final cursor hold in milliseconds
    pub complete_hold_ms: Option<u64>,

    /// Fade length in milliseconds
    pub fade_ms: Option<u64>,

    /// How long key presses can skip, in seconds
    pub skip_listener_window_secs: Option<u64>,

    /// Audio asset played during the sequence
    pub audio_path: Option<PathBuf>,

    /// Playback volume, 0.0 to 1.0
    pub audio_volume: Option<f32>,

    /// External player program
    pub audio_player: Option<String>,
}

/// `[transport]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportToml {
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: Option<u64>,

    /// Event stream reconnection attempts
    pub reconnect_attempts: Option<u32>,

    /// Delay between reconnection attempts in milliseconds
    pub reconnect_delay_ms: Option<u64>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorToml {
    /// Server section
    pub server: ServerToml,

    /// Log section
    pub log: LogToml,

    /// Boot section
    pub boot: BootToml,

    /// Transport section
    pub transport: TransportToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved monitor configuration
#[derive(Clone, Debug)]
pub struct MonitorConfig {
    /// Base URL of the monitor server
    pub base_url: String,

    /// Identity scope, normalized
    pub user: Option<String>,

    /// Log speeds and display options (identity comes from `user`)
    pub log: LogConfig,

    /// Whether the boot sequence plays
    pub boot_enabled: bool,

    /// Boot sequence delays
    pub boot: BootConfig,

    /// Audio asset for the boot sequence
    pub audio_path: Option<PathBuf>,

    /// Audio volume, 0.0 to 1.0
    pub audio_volume: f32,

    /// External audio player program
    pub audio_player: String,

    /// HTTP connect timeout
    pub connect_timeout: Duration,

    /// Event stream reconnection attempts
    pub reconnect_attempts: u32,

    /// Delay between reconnection attempts
    pub reconnect_delay: Duration,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            user: None,
            log: LogConfig::default(),
            boot_enabled: true,
            boot: BootConfig::default(),
            audio_path: None,
            audio_volume: 0.35,
            audio_player: "ffplay".to_string(),
            connect_timeout: Duration::from_secs(5),
            reconnect_attempts: 3,
            reconnect_delay: Duration::from_secs(3),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl MonitorConfig {
    /// Create a configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Log configuration with the identity scope applied
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            identity: self.user.clone(),
            ..self.log.clone()
        }
    }

    /// Check values that parse but cannot work
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "server base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if !(0.0..=1.0).contains(&self.audio_volume) {
            return Err(ConfigError::ValidationError(format!(
                "boot audio_volume must be between 0 and 1, got {}",
                self.audio_volume
            )));
        }
        if self.audio_player.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "boot audio_player must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Default configuration file path
///
/// `$XDG_CONFIG_HOME/hal-monitor/monitor.toml`, typically
/// `~/.config/hal-monitor/monitor.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("hal-monitor").join("monitor.toml"))
}

/// Load configuration from the default file and the environment
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or a
/// value fails validation. A missing file is not an error.
pub fn load_config() -> Result<MonitorConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path and the environment
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a value fails
/// validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<MonitorConfig, ConfigError> {
    let mut config = MonitorConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: MonitorToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(path = %config_path.display(), "Loaded configuration from file");
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, |key| std::env::var(key).ok());
    config.validate()?;

    Ok(config)
}

fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut MonitorConfig, toml: &MonitorToml) {
    // Server
    if let Some(ref url) = toml.server.base_url {
        config.base_url.clone_from(url);
    }
    if let Some(ref user) = toml.server.user {
        config.user = normalize_identity(user);
    }

    // Log
    let log = &mut config.log;
    if let Some(ms) = toml.log.timestamp_speed_ms {
        log.timestamp_speed = millis(ms);
    }
    if let Some(ms) = toml.log.username_speed_ms {
        log.username_speed = millis(ms);
    }
    if let Some(ms) = toml.log.message_speed_ms {
        log.message_speed = millis(ms);
    }
    if let Some(ms) = toml.log.tags_speed_ms {
        log.tags_speed = millis(ms);
    }
    if let Some(ms) = toml.log.cursor_grace_ms {
        log.cursor_grace = millis(ms);
    }
    if let Some(ms) = toml.log.entry_pause_ms {
        log.entry_pause = millis(ms);
    }
    if let Some(show) = toml.log.show_usernames {
        log.show_usernames = show;
    }

    // Boot
    if let Some(enabled) = toml.boot.enabled {
        config.boot_enabled = enabled;
    }
    let boot = &mut config.boot;
    if let Some(ms) = toml.boot.start_delay_ms {
        boot.start_delay = millis(ms);
    }
    if let Some(ms) = toml.boot.skip_notice_delay_ms {
        boot.skip_notice_delay = millis(ms);
    }
    if let Some(ms) = toml.boot.complete_hold_ms {
        boot.complete_hold = millis(ms);
    }
    if let Some(ms) = toml.boot.fade_ms {
        boot.fade = millis(ms);
    }
    if let Some(secs) = toml.boot.skip_listener_window_secs {
        boot.skip_listener_window = Duration::from_secs(secs);
    }
    if toml.boot.audio_path.is_some() {
        config.audio_path.clone_from(&toml.boot.audio_path);
    }
    if let Some(volume) = toml.boot.audio_volume {
        config.audio_volume = volume;
    }
    if let Some(ref player) = toml.boot.audio_player {
        config.audio_player.clone_from(player);
    }

    // Transport
    if let Some(ms) = toml.transport.connect_timeout_ms {
        config.connect_timeout = millis(ms);
    }
    if let Some(attempts) = toml.transport.reconnect_attempts {
        config.reconnect_attempts = attempts;
    }
    if let Some(ms) = toml.transport.reconnect_delay_ms {
        config.reconnect_delay = millis(ms);
    }
}

/// Apply `HAL_*` overrides read through `var`
fn apply_env_config(config: &mut MonitorConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(url) = var("HAL_SERVER") {
        config.base_url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(user) = var("HAL_USER") {
        config.user = normalize_identity(&user);
        config.source = ConfigSource::Env;
    }
    if let Some(value) = var("HAL_NO_BOOT") {
        let disabled = value != "0" && value.to_lowercase() != "false";
        config.boot_enabled = !disabled;
        config.source = ConfigSource::Env;
    }
    if let Some(path) = var("HAL_AUDIO") {
        config.audio_path = (!path.is_empty()).then(|| PathBuf::from(path));
        config.source = ConfigSource::Env;
    }
    if let Some(attempts) = var("HAL_RECONNECT_ATTEMPTS") {
        if let Ok(n) = attempts.parse::<u32>() {
            config.reconnect_attempts = n;
            config.source = ConfigSource::Env;
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Command-line overrides, applied after [`load_config`]
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Server URL override
    pub base_url: Option<String>,

    /// Identity scope override
    pub user: Option<String>,

    /// Skip the boot sequence
    pub no_boot: bool,

    /// Audio asset override
    pub audio_path: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Create an empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set server URL override
    #[must_use]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Set identity scope override
    #[must_use]
    pub fn with_user(mut self, user: String) -> Self {
        self.user = Some(user);
        self
    }

    /// Disable the boot sequence
    #[must_use]
    pub fn with_no_boot(mut self) -> Self {
        self.no_boot = true;
        self
    }

    /// Set audio asset override
    #[must_use]
    pub fn with_audio_path(mut self, path: PathBuf) -> Self {
        self.audio_path = Some(path);
        self
    }

    /// Apply overrides and re-validate
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if an override is invalid.
    pub fn apply(&self, config: &mut MonitorConfig) -> Result<(), ConfigError> {
        if self.base_url.is_some() || self.user.is_some() || self.no_boot || self.audio_path.is_some() {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref url) = self.base_url {
            config.base_url.clone_from(url);
        }
        if let Some(ref user) = self.user {
            config.user = normalize_identity(user);
        }
        if self.no_boot {
            config.boot_enabled = false;
        }
        if self.audio_path.is_some() {
            config.audio_path.clone_from(&self.audio_path);
        }

        config.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn parse(content: &str) -> MonitorConfig {
        let toml_config: MonitorToml = toml::from_str(content).unwrap();
        let mut config = MonitorConfig::default();
        apply_toml_config(&mut config, &toml_config);
        config
    }

    // =========================================================================
    // Defaults
    // =========================================================================

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.user, None);
        assert!(config.boot_enabled);
        assert_eq!(config.boot.start_delay, Duration::from_millis(1200));
        assert_eq!(config.reconnect_attempts, 3);
        assert_eq!(config.reconnect_delay, Duration::from_secs(3));
        assert!((config.audio_volume - 0.35).abs() < f32::EPSILON);
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_path() {
        if let Some(p) = default_config_path() {
            assert!(p.ends_with("hal-monitor/monitor.toml"));
        }
    }

    // =========================================================================
    // TOML Parsing
    // =========================================================================

    #[test]
    fn test_parse_full_toml() {
        let config = parse(
            r#"
[server]
base_url = "https://hal.example"
user = " dave "

[log]
message_speed_ms = 10
cursor_grace_ms = 0
show_usernames = false

[boot]
enabled = false
skip_listener_window_secs = 5
audio_path = "/tmp/boot.mp3"
audio_volume = 0.5

[transport]
reconnect_attempts = 0
reconnect_delay_ms = 250
"#,
        );

        assert_eq!(config.base_url, "https://hal.example");
        assert_eq!(config.user.as_deref(), Some("DAVE"));
        assert_eq!(config.log.message_speed, Duration::from_millis(10));
        assert_eq!(config.log.cursor_grace, Duration::ZERO);
        assert!(!config.log.show_usernames);
        assert!(!config.boot_enabled);
        assert_eq!(config.boot.skip_listener_window, Duration::from_secs(5));
        assert_eq!(config.audio_path, Some(PathBuf::from("/tmp/boot.mp3")));
        assert_eq!(config.reconnect_attempts, 0);
        assert_eq!(config.reconnect_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_parse_partial_toml_keeps_defaults() {
        let config = parse("[log]\ntags_speed_ms = 99\n");
        assert_eq!(config.log.tags_speed, Duration::from_millis(99));
        assert_eq!(config.log.message_speed, Duration::from_millis(75));
        assert_eq!(config.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_log_config_carries_identity() {
        let config = parse("[server]\nuser = \"frank\"\n");
        let log = config.log_config();
        assert_eq!(log.identity.as_deref(), Some("FRANK"));
        assert!(!log.displays_usernames());
    }

    #[test]
    fn test_file_source_is_recorded() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[server]\nbase_url = \"http://10.0.0.1:8080\"\n")
            .unwrap();

        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.config_file_path.as_deref(), Some(file.path()));
        assert!(matches!(config.source(), ConfigSource::File | ConfigSource::Env));
    }

    #[test]
    fn test_missing_file_graceful() {
        let path = PathBuf::from("/nonexistent/path/monitor.toml");
        let config = load_config_from_path(Some(path)).unwrap();
        assert!(config.config_file_path.is_none());
    }

    #[test]
    fn test_malformed_toml_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[server\nbase_url = 3\n").unwrap();

        let result = load_config_from_path(Some(file.path().to_path_buf()));
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    // =========================================================================
    // Environment and CLI
    // =========================================================================

    #[test]
    fn test_env_overrides() {
        let mut config = MonitorConfig::default();
        apply_env_config(
            &mut config,
            env(&[
                ("HAL_SERVER", "http://hal:9000"),
                ("HAL_USER", "poole"),
                ("HAL_NO_BOOT", "1"),
                ("HAL_RECONNECT_ATTEMPTS", "7"),
            ]),
        );

        assert_eq!(config.base_url, "http://hal:9000");
        assert_eq!(config.user.as_deref(), Some("POOLE"));
        assert!(!config.boot_enabled);
        assert_eq!(config.reconnect_attempts, 7);
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_env_no_boot_false_keeps_boot() {
        let mut config = MonitorConfig::default();
        apply_env_config(&mut config, env(&[("HAL_NO_BOOT", "false")]));
        assert!(config.boot_enabled);
    }

    #[test]
    fn test_env_bad_number_ignored() {
        let mut config = MonitorConfig::default();
        apply_env_config(&mut config, env(&[("HAL_RECONNECT_ATTEMPTS", "lots")]));
        assert_eq!(config.reconnect_attempts, 3);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_cli_overrides_win() {
        let mut config = MonitorConfig::default();
        apply_env_config(&mut config, env(&[("HAL_USER", "poole")]));

        ConfigOverrides::new()
            .with_user("dave".to_string())
            .with_no_boot()
            .apply(&mut config)
            .unwrap();

        assert_eq!(config.user.as_deref(), Some("DAVE"));
        assert!(!config.boot_enabled);
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    #[test]
    fn test_empty_overrides_keep_source() {
        let mut config = MonitorConfig::default();
        ConfigOverrides::new().apply(&mut config).unwrap();
        assert_eq!(config.source(), ConfigSource::Default);
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn test_rejects_non_http_url() {
        let mut config = MonitorConfig::default();
        let result = ConfigOverrides::new()
            .with_base_url("ftp://hal".to_string())
            .apply(&mut config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_rejects_loud_volume() {
        let config = MonitorConfig {
            audio_volume: 1.5,
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
