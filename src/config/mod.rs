//! Configuration module.
//!
//! Config is a TOML file resolved from `--config`, `PHPLOGWATCH_CONFIG`, or
//! `./config.toml`, and re-read periodically while the watcher runs.

pub mod loader;
pub mod reload;

pub use loader::{
    apply_env_overrides, default_log_path, load_config_file, load_watcher_config,
    resolve_config_path, validate, ConfigError, ConfigFile, WatcherConfig,
};
pub use reload::{ConfigSnapshot, ReloadingConfig};
