//! The watcher pipeline: config gate, enrichment, delivery.

use crate::config::ConfigSnapshot;
use crate::enrich::Enricher;
use crate::model::ErrorTrace;
use crate::sink::Sink;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Counters reported when the pipeline stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Traces taken from the input.
    pub received: u64,
    /// Traces the sink accepted.
    pub delivered: u64,
    /// Traces dropped because the watcher was disabled or the config invalid.
    pub skipped_disabled: u64,
    /// Traces whose delivery failed.
    pub failed: u64,
}

/// Drives traces through config gating, enrichment and delivery, one at a time.
pub struct Orchestrator<C, S> {
    config: C,
    enricher: Enricher,
    sink: S,
}

impl<C: ConfigSnapshot, S: Sink> Orchestrator<C, S> {
    /// Assemble a pipeline.
    pub fn new(config: C, enricher: Enricher, sink: S) -> Self {
        Self {
            config,
            enricher,
            sink,
        }
    }

    /// Handle a single trace under the current config.
    pub fn process(&mut self, trace: &ErrorTrace, stats: &mut RunStats) {
        stats.received += 1;

        let Some(config) = self.config.current() else {
            warn!(first_line = trace.first_line(), "No valid configuration, dropping trace");
            stats.skipped_disabled += 1;
            return;
        };
        if !config.enabled {
            info!(first_line = trace.first_line(), "Watcher disabled, skipping trace");
            stats.skipped_disabled += 1;
            return;
        }

        let info = self.enricher.enrich(trace, &config.vhost_dir);
        match self.sink.deliver(&config.webhook_url, trace, info.as_ref()) {
            Ok(()) => stats.delivered += 1,
            Err(err) => {
                error!(
                    url = %config.webhook_url,
                    error = %err,
                    "Failed to deliver trace"
                );
                stats.failed += 1;
            }
        }
    }

    /// Consume `traces` in order until the input ends or `cancel` fires.
    ///
    /// A trace in flight when cancellation is requested is finished first.
    pub fn run(
        &mut self,
        traces: impl IntoIterator<Item = ErrorTrace>,
        cancel: &CancellationToken,
    ) -> RunStats {
        let mut stats = RunStats::default();
        for trace in traces {
            if cancel.is_cancelled() {
                break;
            }
            self.process(&trace, &mut stats);
        }
        info!(?stats, "Pipeline stopped");
        stats
    }
}

impl<C, S> std::fmt::Debug for Orchestrator<C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WatcherConfig;
    use crate::enrich::{BlameResolver, RepoResolver, VhostResolver};
    use crate::model::error::{CommandError, DeliveryError};
    use crate::model::ProjectInfo;
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;
    use std::time::Duration;

    struct NoVhost;
    impl VhostResolver for NoVhost {
        fn search(&self, _: &Path, _: &Path) -> Result<Option<String>, CommandError> {
            Ok(None)
        }
    }

    struct NoRepo;
    impl RepoResolver for NoRepo {
        fn toplevel(&self, _: &Path) -> Result<PathBuf, CommandError> {
            Err(CommandError::Spawn {
                program: "git".to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        }
        fn origin_url(&self, _: &Path) -> Result<String, CommandError> {
            Err(CommandError::Spawn {
                program: "git".to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        }
    }
    impl BlameResolver for NoRepo {
        fn blame_line(&self, _: &Path, _: &Path, _: u32) -> Result<String, CommandError> {
            Ok(String::new())
        }
    }

    type Delivered = Rc<RefCell<Vec<(String, String, Option<ProjectInfo>)>>>;

    #[derive(Clone, Default)]
    struct RecordingSink {
        delivered: Delivered,
        fail: bool,
    }

    impl Sink for RecordingSink {
        fn deliver(
            &self,
            url: &str,
            trace: &ErrorTrace,
            info: Option<&ProjectInfo>,
        ) -> Result<(), DeliveryError> {
            self.delivered
                .borrow_mut()
                .push((url.to_string(), trace.text(), info.cloned()));
            if self.fail {
                Err(DeliveryError::Status {
                    status: reqwest::StatusCode::BAD_GATEWAY,
                })
            } else {
                Ok(())
            }
        }
    }

    /// Config that is disabled for the first `disabled_for` lookups.
    struct Toggling {
        config: WatcherConfig,
        disabled_for: usize,
    }

    impl ConfigSnapshot for Toggling {
        fn current(&mut self) -> Option<&WatcherConfig> {
            self.config.enabled = self.disabled_for == 0;
            self.disabled_for = self.disabled_for.saturating_sub(1);
            Some(&self.config)
        }
    }

    struct Missing;
    impl ConfigSnapshot for Missing {
        fn current(&mut self) -> Option<&WatcherConfig> {
            None
        }
    }

    fn config(enabled: bool) -> WatcherConfig {
        WatcherConfig {
            log_file: PathBuf::from("/var/log/apache2/error.log"),
            enabled,
            webhook_url: "http://hook.test/php".to_string(),
            vhost_dir: PathBuf::from("/etc/apache2/sites-enabled"),
            reload_interval: Duration::from_secs(10),
            log_path: PathBuf::from("phplogwatch.log"),
        }
    }

    fn enricher() -> Enricher {
        Enricher::new(NoVhost, NoRepo, NoRepo)
    }

    fn traces(texts: &[&str]) -> Vec<ErrorTrace> {
        texts
            .iter()
            .map(|t| ErrorTrace::from_lines([*t]).unwrap())
            .collect()
    }

    #[test]
    fn delivers_in_input_order() {
        let sink = RecordingSink::default();
        let mut pipeline = Orchestrator::new(config(true), enricher(), sink.clone());

        let stats = pipeline.run(
            traces(&["PHP Warning: one", "PHP Warning: two", "PHP Warning: three"]),
            &CancellationToken::new(),
        );

        let delivered: Vec<_> = sink.delivered.borrow().iter().map(|d| d.1.clone()).collect();
        assert_eq!(
            delivered,
            vec!["PHP Warning: one", "PHP Warning: two", "PHP Warning: three"]
        );
        assert_eq!(
            stats,
            RunStats {
                received: 3,
                delivered: 3,
                ..RunStats::default()
            }
        );
    }

    #[test]
    fn disabled_config_delivers_nothing() {
        let sink = RecordingSink::default();
        let mut pipeline = Orchestrator::new(config(false), enricher(), sink.clone());

        let stats = pipeline.run(traces(&["PHP Warning: x"]), &CancellationToken::new());

        assert!(sink.delivered.borrow().is_empty());
        assert_eq!(stats.skipped_disabled, 1);
    }

    #[test]
    fn invalid_config_is_treated_as_disabled() {
        let sink = RecordingSink::default();
        let mut pipeline = Orchestrator::new(Missing, enricher(), sink.clone());

        let stats = pipeline.run(traces(&["PHP Warning: x"]), &CancellationToken::new());

        assert!(sink.delivered.borrow().is_empty());
        assert_eq!(stats.skipped_disabled, 1);
    }

    #[test]
    fn enabling_at_runtime_resumes_delivery() {
        let sink = RecordingSink::default();
        let toggling = Toggling {
            config: config(false),
            disabled_for: 1,
        };
        let mut pipeline = Orchestrator::new(toggling, enricher(), sink.clone());

        let stats = pipeline.run(
            traces(&["PHP Warning: skipped", "PHP Warning: sent"]),
            &CancellationToken::new(),
        );

        let delivered = sink.delivered.borrow();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].1, "PHP Warning: sent");
        assert_eq!(stats.skipped_disabled, 1);
        assert_eq!(stats.delivered, 1);
    }

    #[test]
    fn trace_without_location_is_sent_with_null_detail() {
        let sink = RecordingSink::default();
        let mut pipeline = Orchestrator::new(config(true), enricher(), sink.clone());

        pipeline.run(traces(&["[error] something odd"]), &CancellationToken::new());

        let delivered = sink.delivered.borrow();
        assert_eq!(delivered[0].0, "http://hook.test/php");
        assert!(delivered[0].2.is_none());
    }

    #[test]
    fn trace_with_location_carries_project_info() {
        let sink = RecordingSink::default();
        let mut pipeline = Orchestrator::new(config(true), enricher(), sink.clone());

        pipeline.run(
            traces(&["PHP Notice: x in /srv/www/site/index.php on line 7"]),
            &CancellationToken::new(),
        );

        let delivered = sink.delivered.borrow();
        let info = delivered[0].2.as_ref().expect("project info");
        assert_eq!(info.file, "/srv/www/site/index.php");
        assert_eq!(info.line, 7);
        assert_eq!(info.git_remote, "unknown");
        assert_eq!(info.blame, None);
    }

    #[test]
    fn delivery_failure_does_not_stop_the_pipeline() {
        let sink = RecordingSink {
            fail: true,
            ..RecordingSink::default()
        };
        let mut pipeline = Orchestrator::new(config(true), enricher(), sink.clone());

        let stats = pipeline.run(
            traces(&["PHP Warning: a", "PHP Warning: b"]),
            &CancellationToken::new(),
        );

        assert_eq!(sink.delivered.borrow().len(), 2);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.delivered, 0);
    }

    #[test]
    fn cancelled_before_start_processes_nothing() {
        let sink = RecordingSink::default();
        let mut pipeline = Orchestrator::new(config(true), enricher(), sink.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let stats = pipeline.run(traces(&["PHP Warning: a"]), &cancel);

        assert_eq!(stats, RunStats::default());
        assert!(sink.delivered.borrow().is_empty());
    }
}
