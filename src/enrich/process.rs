//! Resolvers backed by the `git` and `grep` command line tools.

use super::resolvers::{BlameResolver, RepoResolver, VhostResolver};
use crate::model::error::CommandError;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

/// Run `program args...` in `cwd` and capture its output. No timeout is enforced.
pub(crate) fn run<I, S>(program: &str, args: I, cwd: &Path) -> Result<Output, CommandError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args).current_dir(cwd);

    debug!(command = ?cmd, "Running external command");

    cmd.output().map_err(|source| CommandError::Spawn {
        program: program.to_string(),
        source,
    })
}

pub(crate) fn stdout_or_error(program: &str, output: Output) -> Result<String, CommandError> {
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(CommandError::Failed {
            program: program.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Finds vhost files with `grep -r -l -F`.
#[derive(Debug, Clone)]
pub struct GrepVhostResolver {
    program: String,
}

impl GrepVhostResolver {
    /// Use `grep` from `PATH`.
    pub fn new() -> Self {
        Self::with_program("grep")
    }

    /// Use a specific grep binary.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for GrepVhostResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn first_match(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

impl VhostResolver for GrepVhostResolver {
    fn search(&self, vhost_dir: &Path, needle: &Path) -> Result<Option<String>, CommandError> {
        // -R follows symlinks inside the directory (sites-enabled -> sites-available).
        let output = run(
            &self.program,
            [
                OsStr::new("-R"),
                OsStr::new("-l"),
                OsStr::new("-F"),
                OsStr::new("--"),
                needle.as_os_str(),
                vhost_dir.as_os_str(),
            ],
            vhost_dir,
        )?;

        match output.status.code() {
            // No match.
            Some(1) => return Ok(None),
            // Some file was unreadable (e.g. a dangling symlink); matches are still printed.
            Some(2) => {
                if let Some(hit) = first_match(&String::from_utf8_lossy(&output.stdout)) {
                    debug!(
                        stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                        "grep reported unreadable vhost files"
                    );
                    return Ok(Some(hit));
                }
            }
            _ => {}
        }

        let stdout = stdout_or_error(&self.program, output)?;
        Ok(first_match(&stdout))
    }
}

/// Runs `git` subcommands for repository and blame lookups.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl GitCli {
    /// Use `git` from `PATH`.
    pub fn new() -> Self {
        Self::with_program("git")
    }

    /// Use a specific git binary.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn git<I, S>(&self, args: I, cwd: &Path) -> Result<String, CommandError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = run(&self.program, args, cwd)?;
        stdout_or_error(&self.program, output)
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl RepoResolver for GitCli {
    fn toplevel(&self, dir: &Path) -> Result<PathBuf, CommandError> {
        let stdout = self.git(["rev-parse", "--show-toplevel"], dir)?;
        Ok(PathBuf::from(stdout.trim()))
    }

    fn origin_url(&self, dir: &Path) -> Result<String, CommandError> {
        let stdout = self.git(["config", "--get", "remote.origin.url"], dir)?;
        Ok(stdout.trim().to_string())
    }
}

impl BlameResolver for GitCli {
    fn blame_line(
        &self,
        repo_root: &Path,
        relative_path: &Path,
        line: u32,
    ) -> Result<String, CommandError> {
        let range = format!("{line},{line}");
        self.git(
            [
                OsStr::new("blame"),
                OsStr::new("-L"),
                OsStr::new(&range),
                OsStr::new("--porcelain"),
                OsStr::new("--"),
                relative_path.as_os_str(),
            ],
            repo_root,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_program_is_a_spawn_error() {
        let git = GitCli::with_program("definitely-not-a-real-git-binary");
        let result = git.toplevel(Path::new("."));
        assert!(matches!(result, Err(CommandError::Spawn { .. })));
    }

    #[test]
    fn grep_finds_vhost_mentioning_directory() {
        let vhosts = tempfile::tempdir().unwrap();
        fs::write(
            vhosts.path().join("shop.conf"),
            "<VirtualHost *:80>\n  DocumentRoot /var/www/shop/public\n</VirtualHost>\n",
        )
        .unwrap();
        fs::write(
            vhosts.path().join("blog.conf"),
            "<VirtualHost *:80>\n  DocumentRoot /var/www/blog\n</VirtualHost>\n",
        )
        .unwrap();

        let grep = GrepVhostResolver::new();
        let hit = grep
            .search(vhosts.path(), Path::new("/var/www/shop"))
            .expect("grep should run");

        let hit = hit.expect("shop.conf should match");
        assert!(hit.ends_with("shop.conf"), "got {hit}");
    }

    #[test]
    fn grep_without_match_is_ok_none() {
        let vhosts = tempfile::tempdir().unwrap();
        fs::write(vhosts.path().join("a.conf"), "DocumentRoot /srv/a\n").unwrap();

        let grep = GrepVhostResolver::new();
        let hit = grep.search(vhosts.path(), Path::new("/var/www/nothing")).unwrap();
        assert_eq!(hit, None);
    }

    #[test]
    fn grep_on_missing_directory_fails() {
        let grep = GrepVhostResolver::new();
        let result = grep.search(
            Path::new("/nonexistent/vhost/dir/for/tests"),
            Path::new("/var/www"),
        );
        assert!(result.is_err());
    }

    #[cfg(unix)]
    fn sites_layout() -> (tempfile::TempDir, std::path::PathBuf) {
        let root = tempfile::tempdir().unwrap();
        let available = root.path().join("sites-available");
        let enabled = root.path().join("sites-enabled");
        fs::create_dir_all(&available).unwrap();
        fs::create_dir_all(&enabled).unwrap();
        fs::write(
            available.join("shop.conf"),
            "<VirtualHost *:80>\n  DocumentRoot /var/www/shop\n</VirtualHost>\n",
        )
        .unwrap();
        std::os::unix::fs::symlink("../sites-available/shop.conf", enabled.join("shop.conf"))
            .unwrap();
        (root, enabled)
    }

    #[cfg(unix)]
    #[test]
    fn grep_follows_symlinked_vhost_files() {
        let (_root, enabled) = sites_layout();

        let hit = GrepVhostResolver::new()
            .search(&enabled, Path::new("/var/www/shop"))
            .expect("grep should run")
            .expect("symlinked shop.conf should match");

        assert_eq!(hit, enabled.join("shop.conf").display().to_string());
    }

    #[cfg(unix)]
    #[test]
    fn grep_keeps_matches_despite_dangling_symlink() {
        let (_root, enabled) = sites_layout();
        std::os::unix::fs::symlink("../sites-available/gone.conf", enabled.join("gone.conf"))
            .unwrap();

        let hit = GrepVhostResolver::new()
            .search(&enabled, Path::new("/var/www/shop"))
            .expect("partial results are still an answer");

        assert_eq!(hit, Some(enabled.join("shop.conf").display().to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn grep_dangling_symlink_without_match_is_an_error() {
        let (_root, enabled) = sites_layout();
        std::os::unix::fs::symlink("../sites-available/gone.conf", enabled.join("gone.conf"))
            .unwrap();

        let result = GrepVhostResolver::new().search(&enabled, Path::new("/srv/elsewhere"));

        assert!(matches!(result, Err(CommandError::Failed { .. })));
    }
}
