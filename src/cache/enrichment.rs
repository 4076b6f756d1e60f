//! The four caches used by enrichment.

use super::{Cache, CachePolicy, Clock, SystemClock};
use crate::model::BlameRecord;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Lifetime of git root, remote and blame entries.
pub const GIT_TTL: Duration = Duration::from_secs(60 * 60);
/// Capacity of the git root and git remote caches.
pub const GIT_CAPACITY: usize = 1000;
/// Capacity of the blame cache.
pub const BLAME_CAPACITY: usize = 5000;

/// Caches for vhost, repository root, remote URL and blame lookups.
#[derive(Debug)]
pub struct EnrichmentCaches {
    /// Error file path → matching vhost file. Never expires.
    pub vhost: Cache<String, Option<String>>,
    /// Directory → repository top-level.
    pub git_root: Cache<PathBuf, Option<PathBuf>>,
    /// Directory → `remote.origin.url` or `"unknown"`.
    pub git_remote: Cache<PathBuf, String>,
    /// (file, line) → blame for that line.
    pub blame: Cache<(String, u32), Option<BlameRecord>>,
}

impl EnrichmentCaches {
    /// Caches with the standard bounds, reading time from the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Caches with the standard bounds sharing one clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let git = CachePolicy::bounded(GIT_CAPACITY, GIT_TTL);
        Self {
            vhost: Cache::with_clock(CachePolicy::unbounded(), clock.clone()),
            git_root: Cache::with_clock(git, clock.clone()),
            git_remote: Cache::with_clock(git, clock.clone()),
            blame: Cache::with_clock(CachePolicy::bounded(BLAME_CAPACITY, GIT_TTL), clock),
        }
    }
}

impl Default for EnrichmentCaches {
    fn default() -> Self {
        Self::new()
    }
}
