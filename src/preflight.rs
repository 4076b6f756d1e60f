//! Startup dependency checks.
//!
//! Missing tools degrade enrichment but never stop the watcher.

use crate::config::WatcherConfig;
use crate::enrich::process::{run, stdout_or_error};
use std::path::Path;
use tracing::{error, info, warn};

/// Outcome of [`check_dependencies`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preflight {
    /// `git --version` output, or `None` if git is unavailable.
    pub git_version: Option<String>,
    /// Whether the vhost directory exists.
    pub vhost_dir_present: bool,
}

impl Preflight {
    /// True when every optional dependency is available.
    pub fn all_ok(&self) -> bool {
        self.git_version.is_some() && self.vhost_dir_present
    }
}

/// Check that `git` runs and the vhost directory exists, logging what is missing.
pub fn check_dependencies(config: &WatcherConfig) -> Preflight {
    check_with_git("git", &config.vhost_dir)
}

fn check_with_git(git: &str, vhost_dir: &Path) -> Preflight {
    let version = run(git, ["--version"], Path::new(".")).and_then(|out| stdout_or_error(git, out));
    let git_version = match version {
        Ok(version) => {
            let version = version.trim().to_string();
            info!(%version, "Found git");
            Some(version)
        }
        Err(err) => {
            error!(error = %err, "git is not available; repository and blame lookups will fail");
            None
        }
    };

    let vhost_dir_present = vhost_dir.is_dir();
    if !vhost_dir_present {
        warn!(
            vhost_dir = %vhost_dir.display(),
            "Vhost directory does not exist; vhost lookups will find nothing"
        );
    }

    Preflight {
        git_version,
        vhost_dir_present,
    }
}
