//! Log input: tailing the error log and grouping lines into traces.
//!
//! - [`FileTailer`] reads complete lines appended after open
//! - [`TraceGrouper`] applies the start-marker / idle-timeout grouping rules
//! - [`LogTailer`] drives both as a blocking `Iterator<Item = ErrorTrace>`

pub mod file;
pub mod grouper;

pub use file::FileTailer;
pub use grouper::TraceGrouper;

use crate::model::error::InputError;
use crate::model::{ErrorTrace, RawLine};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Polling and grouping intervals for [`LogTailer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailTiming {
    /// Sleep between polls while no trace is open.
    pub poll_interval: Duration,
    /// Sleep between polls while a trace is being collected.
    pub inner_poll_interval: Duration,
    /// Inactivity after which an open trace is emitted.
    pub idle_timeout: Duration,
}

impl Default for TailTiming {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            inner_poll_interval: Duration::from_millis(200),
            idle_timeout: Duration::from_secs(2),
        }
    }
}

/// Infinite, blocking sequence of completed error traces from a growing log file.
///
/// Iteration ends only when the cancellation token fires. A trace still being
/// collected at that point is discarded.
#[derive(Debug)]
pub struct LogTailer {
    file: FileTailer,
    grouper: TraceGrouper,
    timing: TailTiming,
    cancel: CancellationToken,
}

impl LogTailer {
    /// Open `path` at its current end.
    ///
    /// # Errors
    ///
    /// Returns `InputError::FileNotFound` or `InputError::Io` if the file cannot be
    /// opened. The caller should treat this as a startup failure.
    pub fn open(
        path: impl AsRef<Path>,
        timing: TailTiming,
        cancel: CancellationToken,
    ) -> Result<Self, InputError> {
        let file = FileTailer::open_at_end(path)?;
        info!(path = %file.path().display(), "Tailing log file");
        Ok(Self {
            file,
            grouper: TraceGrouper::new(),
            timing,
            cancel,
        })
    }

    /// The underlying file reader.
    pub fn file(&self) -> &FileTailer {
        &self.file
    }
}

impl Iterator for LogTailer {
    type Item = ErrorTrace;

    fn next(&mut self) -> Option<ErrorTrace> {
        loop {
            if self.cancel.is_cancelled() {
                if self.grouper.is_open() {
                    debug!(
                        lines = self.grouper.open_len(),
                        "Discarding partial trace on shutdown"
                    );
                }
                return None;
            }

            match self.file.read_line() {
                Ok(Some(text)) => {
                    if let Some(done) = self.grouper.push(RawLine::new(text), Instant::now()) {
                        return Some(done);
                    }
                }
                Ok(None) if self.grouper.is_open() => {
                    if let Some(done) = self
                        .grouper
                        .flush_if_idle(Instant::now(), self.timing.idle_timeout)
                    {
                        return Some(done);
                    }
                    thread::sleep(self.timing.inner_poll_interval);
                }
                Ok(None) => thread::sleep(self.timing.poll_interval),
                Err(err) => {
                    warn!(error = %err, "Failed to read log file");
                    thread::sleep(self.timing.poll_interval);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    const FAST: TailTiming = TailTiming {
        poll_interval: Duration::from_millis(10),
        inner_poll_interval: Duration::from_millis(5),
        idle_timeout: Duration::from_millis(100),
    };

    fn append(path: &Path, lines: &[&str]) {
        let mut file = fs::OpenOptions::new().append(true).open(path).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
    }

    fn texts(trace: &ErrorTrace) -> Vec<String> {
        trace.lines().iter().map(|l| l.text().to_string()).collect()
    }

    fn log_with_history() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("error.log");
        fs::write(&log, "PHP Fatal error: old in /srv/old.php on line 1\nold detail\n").unwrap();
        (dir, log)
    }

    #[test]
    fn open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = LogTailer::open(
            dir.path().join("missing.log"),
            FAST,
            CancellationToken::new(),
        );
        assert!(matches!(result, Err(InputError::FileNotFound { .. })));
    }

    #[test]
    fn marker_and_continuations_form_one_trace_after_idle() {
        let (_dir, log) = log_with_history();
        let mut tailer = LogTailer::open(&log, FAST, CancellationToken::new()).unwrap();

        append(
            &log,
            &[
                "PHP Fatal error:  Uncaught Error in /srv/a.php:3",
                "Stack trace:",
                "#0 {main}",
            ],
        );

        let trace = tailer.next().expect("trace after idle timeout");
        assert_eq!(
            texts(&trace),
            vec![
                "PHP Fatal error:  Uncaught Error in /srv/a.php:3",
                "Stack trace:",
                "#0 {main}"
            ]
        );
    }

    #[test]
    fn history_before_open_is_ignored() {
        let (_dir, log) = log_with_history();
        let mut tailer = LogTailer::open(&log, FAST, CancellationToken::new()).unwrap();

        append(&log, &["PHP Notice: new"]);

        let trace = tailer.next().unwrap();
        assert_eq!(texts(&trace), vec!["PHP Notice: new"]);
    }

    #[test]
    fn second_marker_splits_traces_in_order() {
        let (_dir, log) = log_with_history();
        let mut tailer = LogTailer::open(&log, FAST, CancellationToken::new()).unwrap();

        append(
            &log,
            &["noise before", "PHP Warning: a", "a detail", "[error] b", "b detail"],
        );

        let first = tailer.next().unwrap();
        let second = tailer.next().unwrap();
        assert_eq!(texts(&first), vec!["PHP Warning: a", "a detail"]);
        assert_eq!(texts(&second), vec!["[error] b", "b detail"]);
    }

    #[test]
    fn cancelled_token_ends_iteration() {
        let (_dir, log) = log_with_history();
        let cancel = CancellationToken::new();
        let mut tailer = LogTailer::open(&log, FAST, cancel.clone()).unwrap();

        cancel.cancel();

        assert!(tailer.next().is_none());
    }

    #[test]
    fn cancellation_discards_open_trace() {
        let (_dir, log) = log_with_history();
        let cancel = CancellationToken::new();
        let slow_idle = TailTiming {
            idle_timeout: Duration::from_secs(30),
            ..FAST
        };
        let mut tailer = LogTailer::open(&log, slow_idle, cancel.clone()).unwrap();
        append(&log, &["PHP Warning: never flushed"]);

        let canceller = {
            let cancel = cancel.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(100));
                cancel.cancel();
            })
        };

        let started = Instant::now();
        assert!(tailer.next().is_none());
        assert!(started.elapsed() < Duration::from_secs(5));
        canceller.join().unwrap();
    }

    #[test]
    fn default_timing_matches_polling_contract() {
        let timing = TailTiming::default();
        assert_eq!(timing.poll_interval, Duration::from_millis(500));
        assert_eq!(timing.idle_timeout, Duration::from_secs(2));
    }
}
