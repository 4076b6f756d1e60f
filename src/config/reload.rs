//! Periodically re-read configuration.

use super::loader::{load_watcher_config, ConfigError, WatcherConfig};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Source of the configuration in effect for the next trace.
pub trait ConfigSnapshot {
    /// Current valid configuration, or `None` while the config is invalid.
    fn current(&mut self) -> Option<&WatcherConfig>;
}

/// Config that reloads itself from disk once `interval` has elapsed.
///
/// An invalid file at reload time leaves no snapshot, which the pipeline
/// treats as disabled until a later reload succeeds.
#[derive(Debug)]
pub struct ReloadingConfig {
    path: PathBuf,
    interval: Duration,
    loaded_at: Instant,
    snapshot: Option<WatcherConfig>,
}

impl ReloadingConfig {
    /// Perform the initial load.
    ///
    /// The reload interval is `interval_override` if given, otherwise the
    /// loaded file's `reload_interval_secs`.
    ///
    /// # Errors
    ///
    /// Returns the load or validation error; startup should abort on it.
    pub fn load(
        path: impl Into<PathBuf>,
        interval_override: Option<Duration>,
    ) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = load_watcher_config(&path)?;
        Ok(Self::new(path, config, interval_override))
    }

    /// Wrap an already loaded config; the next reload happens one interval from now.
    pub fn new(
        path: impl Into<PathBuf>,
        initial: WatcherConfig,
        interval_override: Option<Duration>,
    ) -> Self {
        Self {
            path: path.into(),
            interval: interval_override.unwrap_or(initial.reload_interval),
            loaded_at: Instant::now(),
            snapshot: Some(initial),
        }
    }

    /// Last loaded snapshot, without checking whether a reload is due.
    pub fn snapshot(&self) -> Option<&WatcherConfig> {
        self.snapshot.as_ref()
    }

    /// Config file being watched.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Time between reloads.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a reload is due at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.loaded_at) >= self.interval
    }

    /// Re-read the file immediately.
    pub fn reload(&mut self) {
        self.loaded_at = Instant::now();
        match load_watcher_config(&self.path) {
            Ok(config) => {
                if self.snapshot.as_ref() != Some(&config) {
                    info!(
                        enabled = config.enabled,
                        webhook_url = %config.webhook_url,
                        "Configuration changed"
                    );
                } else {
                    debug!("Configuration unchanged");
                }
                self.snapshot = Some(config);
            }
            Err(err) => {
                error!(path = %self.path.display(), error = %err, "Failed to reload configuration");
                self.snapshot = None;
            }
        }
    }
}

impl ConfigSnapshot for ReloadingConfig {
    fn current(&mut self) -> Option<&WatcherConfig> {
        if self.is_due(Instant::now()) {
            self.reload();
        }
        self.snapshot.as_ref()
    }
}

/// A fixed configuration that never reloads.
impl ConfigSnapshot for WatcherConfig {
    fn current(&mut self) -> Option<&WatcherConfig> {
        Some(self)
    }
}
