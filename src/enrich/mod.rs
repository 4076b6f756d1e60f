//! Metadata enrichment for error traces.
//!
//! Given a trace, [`Enricher::enrich`] extracts the PHP file and line, then resolves
//! four independent facts about it: the vhost config serving that file, the git
//! repository root, the origin remote URL and the blame for the failing line.
//! Each resolution is cached (see [`EnrichmentCaches`]) and any failure degrades
//! to `None` or [`UNKNOWN_REMOTE`] without affecting the others.

pub mod process;
pub mod resolvers;

pub use process::{GitCli, GrepVhostResolver};
pub use resolvers::{BlameResolver, RepoResolver, VhostResolver};

use crate::cache::EnrichmentCaches;
use crate::model::{BlameRecord, ErrorTrace, ProjectInfo, UNKNOWN_REMOTE};
use crate::parser::{parse_location, parse_porcelain};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Resolves [`ProjectInfo`] for traces, caching every external lookup.
pub struct Enricher {
    vhost: Box<dyn VhostResolver>,
    repo: Box<dyn RepoResolver>,
    blame: Box<dyn BlameResolver>,
    caches: EnrichmentCaches,
}

impl Enricher {
    /// Build an enricher over the given resolvers with fresh caches.
    pub fn new(
        vhost: impl VhostResolver + 'static,
        repo: impl RepoResolver + 'static,
        blame: impl BlameResolver + 'static,
    ) -> Self {
        Self::with_caches(vhost, repo, blame, EnrichmentCaches::new())
    }

    /// Build an enricher with caller-provided caches.
    pub fn with_caches(
        vhost: impl VhostResolver + 'static,
        repo: impl RepoResolver + 'static,
        blame: impl BlameResolver + 'static,
        caches: EnrichmentCaches,
    ) -> Self {
        Self {
            vhost: Box::new(vhost),
            repo: Box::new(repo),
            blame: Box::new(blame),
            caches,
        }
    }

    /// Enricher that shells out to `grep` and `git`.
    pub fn system() -> Self {
        Self::new(GrepVhostResolver::new(), GitCli::new(), GitCli::new())
    }

    /// Read access to the caches.
    pub fn caches(&self) -> &EnrichmentCaches {
        &self.caches
    }

    /// Resolve metadata for `trace`.
    ///
    /// Returns `None` when the trace has no `in <file> on line <N>` location.
    /// `vhost_dir` is the directory searched for virtual-host configs.
    pub fn enrich(&mut self, trace: &ErrorTrace, vhost_dir: &Path) -> Option<ProjectInfo> {
        let text = trace.text();
        let Some(location) = parse_location(&text) else {
            debug!(first_line = trace.first_line(), "No file/line in trace");
            return None;
        };

        let dir = containing_dir(&location.file);

        let vhost = self.resolve_vhost(&location.file, &dir, vhost_dir);
        let repo_root = self.resolve_repo_root(&dir);
        let git_remote = self.resolve_remote(&dir);
        let blame = self.resolve_blame(&location.file, location.line, repo_root.as_deref());

        info!(
            file = %location.file,
            line = location.line,
            vhost = vhost.as_deref().unwrap_or("-"),
            git_remote = %git_remote,
            blamed = blame.is_some(),
            "Enriched trace"
        );

        Some(ProjectInfo {
            file: location.file,
            line: location.line,
            vhost,
            git_remote,
            error_line: text.trim().to_string(),
            blame,
        })
    }

    fn resolve_vhost(&mut self, file: &str, dir: &Path, vhost_dir: &Path) -> Option<String> {
        let resolver = self.vhost.as_ref();
        self.caches
            .vhost
            .get_or_compute(file.to_string(), |_| find_vhost(resolver, vhost_dir, dir))
    }

    fn resolve_repo_root(&mut self, dir: &Path) -> Option<PathBuf> {
        let repo = self.repo.as_ref();
        self.caches
            .git_root
            .get_or_compute(dir.to_path_buf(), |dir| match repo.toplevel(dir) {
                Ok(root) if !root.as_os_str().is_empty() => Some(root),
                Ok(_) => None,
                Err(err) => {
                    debug!(dir = %dir.display(), error = %err, "Not a git repository");
                    None
                }
            })
    }

    fn resolve_remote(&mut self, dir: &Path) -> String {
        let repo = self.repo.as_ref();
        self.caches
            .git_remote
            .get_or_compute(dir.to_path_buf(), |dir| match repo.origin_url(dir) {
                Ok(url) if !url.is_empty() => url,
                Ok(_) => UNKNOWN_REMOTE.to_string(),
                Err(err) => {
                    debug!(dir = %dir.display(), error = %err, "No origin remote");
                    UNKNOWN_REMOTE.to_string()
                }
            })
    }

    fn resolve_blame(
        &mut self,
        file: &str,
        line: u32,
        repo_root: Option<&Path>,
    ) -> Option<BlameRecord> {
        let blamer = self.blame.as_ref();
        self.caches
            .blame
            .get_or_compute((file.to_string(), line), |(file, line)| {
                let root = repo_root?;
                let relative = relative_to(Path::new(file), root);
                match blamer.blame_line(root, &relative, *line) {
                    Ok(output) => Some(parse_porcelain(&output)),
                    Err(err) => {
                        warn!(file = %file, line, error = %err, "Git blame failed");
                        None
                    }
                }
            })
    }
}

impl std::fmt::Debug for Enricher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enricher")
            .field("caches", &self.caches)
            .finish_non_exhaustive()
    }
}

/// Absolute directory containing `file`.
fn containing_dir(file: &str) -> PathBuf {
    let parent = Path::new(file)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::path::absolute(parent).unwrap_or_else(|_| parent.to_path_buf())
}

/// Search `start` and its ancestors, stopping before the filesystem root.
fn find_vhost(resolver: &dyn VhostResolver, vhost_dir: &Path, start: &Path) -> Option<String> {
    let mut current = Some(start);

    while let Some(dir) = current {
        if dir.as_os_str().is_empty() || dir.parent().is_none() {
            break;
        }
        match resolver.search(vhost_dir, dir) {
            Ok(Some(hit)) => return Some(hit.trim().to_string()),
            Ok(None) => {}
            Err(err) => debug!(dir = %dir.display(), error = %err, "Vhost search failed"),
        }
        current = dir.parent();
    }

    None
}

/// `file` relative to `root`, falling back to the canonical path and then the absolute one.
fn relative_to(file: &Path, root: &Path) -> PathBuf {
    let absolute = std::path::absolute(file).unwrap_or_else(|_| file.to_path_buf());
    if let Ok(relative) = absolute.strip_prefix(root) {
        return relative.to_path_buf();
    }
    // git reports the resolved top-level, which differs when the web root is a symlink.
    if let Ok(canonical) = std::fs::canonicalize(file) {
        if let Ok(relative) = canonical.strip_prefix(root) {
            return relative.to_path_buf();
        }
    }
    absolute
}

#[cfg(test)]
#[path = "enrich_tests.rs"]
mod tests;
