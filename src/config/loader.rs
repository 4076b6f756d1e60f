//! Configuration file loading with precedence handling.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "PHPLOGWATCH_CONFIG";
/// Environment variable overriding `enabled`.
pub const ENABLED_ENV_VAR: &str = "PHPLOGWATCH_ENABLED";
/// Directory searched for vhost configs when `vhost_dir` is not set.
pub const DEFAULT_VHOST_DIR: &str = "/etc/apache2/sites-enabled";
/// Seconds between config reloads when `reload_interval_secs` is not set.
pub const DEFAULT_RELOAD_INTERVAL_SECS: u64 = 10;

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file (file may not exist or have permission issues).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax, unknown keys, or wrongly typed values.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },

    /// A required key is absent.
    #[error("Missing required config key '{0}'")]
    MissingKey(&'static str),

    /// `webhook_url` is present but blank.
    #[error("Config key 'webhook_url' must not be empty")]
    EmptyWebhookUrl,

    /// `log_file` does not name an existing regular file.
    #[error("Log file does not exist: {0}")]
    LogFileMissing(PathBuf),

    /// An override environment variable holds an unusable value.
    #[error("Invalid value '{value}' for {var}")]
    InvalidEnvValue {
        /// Variable name.
        var: &'static str,
        /// Value found.
        value: String,
    },
}

/// TOML configuration file structure.
///
/// Every field is optional at parse time so missing keys surface as
/// [`ConfigError::MissingKey`] during validation rather than as TOML errors.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Apache error log to tail. Required.
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Whether traces are forwarded. Required.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Webhook endpoint. Required. `n8n_url` is accepted as an alias.
    #[serde(default, alias = "n8n_url")]
    pub webhook_url: Option<String>,

    /// Directory of vhost configs searched during enrichment.
    #[serde(default)]
    pub vhost_dir: Option<PathBuf>,

    /// Seconds between config reloads.
    #[serde(default)]
    pub reload_interval_secs: Option<u64>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_path: Option<PathBuf>,
}

/// Validated configuration snapshot consumed by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherConfig {
    /// Apache error log to tail.
    pub log_file: PathBuf,
    /// Whether traces are enriched and forwarded.
    pub enabled: bool,
    /// Webhook endpoint receiving one POST per trace.
    pub webhook_url: String,
    /// Directory of vhost configs.
    pub vhost_dir: PathBuf,
    /// Time between config reloads.
    pub reload_interval: Duration,
    /// Path to log file for tracing output.
    pub log_path: PathBuf,
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/phplogwatch/phplogwatch.log` on Unix-like systems,
/// or appropriate platform path on other systems.
///
/// If state directory cannot be determined, falls back to current directory.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("phplogwatch").join("phplogwatch.log")
    } else {
        PathBuf::from("phplogwatch.log")
    }
}

/// Resolve which config file to load.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `PHPLOGWATCH_CONFIG` environment variable
/// 3. `config.toml` in the working directory
pub fn resolve_config_path(config_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = config_path {
        return path;
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
        return PathBuf::from(env_path);
    }

    PathBuf::from("config.toml")
}

/// Load configuration file from a specific path.
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML for [`ConfigFile`].
pub fn load_config_file(path: impl AsRef<Path>) -> Result<ConfigFile, ConfigError> {
    let path = path.as_ref();

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Apply environment variable overrides to a loaded config file.
///
/// Checks for:
/// - `PHPLOGWATCH_ENABLED`: `true`/`false` (also `1`/`0`)
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvValue` for any other value.
pub fn apply_env_overrides(mut config: ConfigFile) -> Result<ConfigFile, ConfigError> {
    if let Ok(value) = std::env::var(ENABLED_ENV_VAR) {
        config.enabled = Some(parse_bool(&value).ok_or_else(|| ConfigError::InvalidEnvValue {
            var: ENABLED_ENV_VAR,
            value: value.clone(),
        })?);
    }

    Ok(config)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Check required keys and fill in defaults.
///
/// # Errors
///
/// - `MissingKey` if `log_file`, `enabled` or `webhook_url` is absent
/// - `EmptyWebhookUrl` if the URL is blank
/// - `LogFileMissing` if `log_file` is not an existing regular file
pub fn validate(config: ConfigFile) -> Result<WatcherConfig, ConfigError> {
    let log_file = config.log_file.ok_or(ConfigError::MissingKey("log_file"))?;
    let enabled = config.enabled.ok_or(ConfigError::MissingKey("enabled"))?;
    let webhook_url = config
        .webhook_url
        .ok_or(ConfigError::MissingKey("webhook_url"))?;

    if webhook_url.trim().is_empty() {
        return Err(ConfigError::EmptyWebhookUrl);
    }
    if !log_file.is_file() {
        return Err(ConfigError::LogFileMissing(log_file));
    }

    Ok(WatcherConfig {
        log_file,
        enabled,
        webhook_url: webhook_url.trim().to_string(),
        vhost_dir: config
            .vhost_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_VHOST_DIR)),
        reload_interval: Duration::from_secs(
            config
                .reload_interval_secs
                .unwrap_or(DEFAULT_RELOAD_INTERVAL_SECS),
        ),
        log_path: config.log_path.unwrap_or_else(default_log_path),
    })
}

/// Load, apply environment overrides, and validate in one step.
///
/// # Errors
///
/// Propagates any error from [`load_config_file`], [`apply_env_overrides`] or [`validate`].
pub fn load_watcher_config(path: impl AsRef<Path>) -> Result<WatcherConfig, ConfigError> {
    let file = load_config_file(path)?;
    let file = apply_env_overrides(file)?;
    validate(file)
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
