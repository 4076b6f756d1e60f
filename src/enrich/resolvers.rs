//! Capability traits for the external lookups enrichment depends on.
//!
//! Each trait does exactly one uncached external call. Walking directories,
//! caching and mapping failures to sentinels is the [`Enricher`](super::Enricher)'s job.

use crate::model::error::CommandError;
use std::path::{Path, PathBuf};

/// Substring search over virtual-host configuration files.
pub trait VhostResolver {
    /// Return the first file under `vhost_dir` whose contents mention `needle`.
    ///
    /// `Ok(None)` means the search ran and found nothing.
    fn search(&self, vhost_dir: &Path, needle: &Path) -> Result<Option<String>, CommandError>;
}

/// Repository-level queries run from a working directory.
pub trait RepoResolver {
    /// Top-level directory of the repository containing `dir`.
    fn toplevel(&self, dir: &Path) -> Result<PathBuf, CommandError>;

    /// Raw `remote.origin.url` for the repository containing `dir`.
    fn origin_url(&self, dir: &Path) -> Result<String, CommandError>;
}

/// Single-line blame.
pub trait BlameResolver {
    /// Porcelain blame output for `line` of `relative_path`, run from `repo_root`.
    fn blame_line(
        &self,
        repo_root: &Path,
        relative_path: &Path,
        line: u32,
    ) -> Result<String, CommandError>;
}
