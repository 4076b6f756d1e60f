//! Trace grouping state machine.
//!
//! Pure and clock-free: callers pass the current instant, so grouping can be
//! tested without files or sleeping.

use crate::model::{ErrorTrace, RawLine};
use crate::parser::is_error_start;
use std::time::{Duration, Instant};
use tracing::trace;

/// Groups lines into [`ErrorTrace`]s.
///
/// - A start-marker line closes the open trace (returned) and opens a new one,
///   even inside the idle window. Markers are never appended as continuations.
/// - Any other line extends the open trace, or is dropped if none is open.
/// - An open trace with no append for the idle timeout is closed by [`flush_if_idle`].
///
/// [`flush_if_idle`]: TraceGrouper::flush_if_idle
#[derive(Debug, Default)]
pub struct TraceGrouper {
    open: Option<(ErrorTrace, Instant)>,
}

impl TraceGrouper {
    /// Create a grouper with no open trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line read at `now`. Returns the trace this line completed, if any.
    pub fn push(&mut self, line: RawLine, now: Instant) -> Option<ErrorTrace> {
        if is_error_start(line.text()) {
            return self
                .open
                .replace((ErrorTrace::start(line), now))
                .map(|(done, _)| done);
        }

        match self.open.as_mut() {
            Some((current, last_append)) => {
                current.push(line);
                *last_append = now;
            }
            None => trace!(line = line.text(), "Dropping line outside any trace"),
        }
        None
    }

    /// Close the open trace if nothing was appended for at least `idle`.
    pub fn flush_if_idle(&mut self, now: Instant, idle: Duration) -> Option<ErrorTrace> {
        let (_, last_append) = self.open.as_ref()?;
        if now.saturating_duration_since(*last_append) >= idle {
            self.open.take().map(|(done, _)| done)
        } else {
            None
        }
    }

    /// Close the open trace unconditionally.
    pub fn finish(&mut self) -> Option<ErrorTrace> {
        self.open.take().map(|(done, _)| done)
    }

    /// True while a trace is being collected.
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Lines collected so far in the open trace.
    pub fn open_len(&self) -> usize {
        self.open.as_ref().map_or(0, |(trace, _)| trace.len())
    }
}
