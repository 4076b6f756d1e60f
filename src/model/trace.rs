//! Raw log lines and grouped error traces.

use chrono::{DateTime, Utc};

/// A single line read from the watched log file.
///
/// Surrounding whitespace (including the newline) is trimmed at read time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    text: String,
    read_at: DateTime<Utc>,
}

impl RawLine {
    /// Create a line stamped with the current time.
    pub fn new(text: impl Into<String>) -> Self {
        Self::at(text, Utc::now())
    }

    /// Create a line with an explicit read timestamp.
    pub fn at(text: impl Into<String>, read_at: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            read_at,
        }
    }

    /// Line content without the trailing newline.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// When the tailer read this line.
    pub fn read_at(&self) -> DateTime<Utc> {
        self.read_at
    }
}

/// One grouped error message: a start-marker line plus its continuation lines.
///
/// Always non-empty. Only [`TraceGrouper`](crate::source::TraceGrouper) builds these;
/// downstream code can read but not modify them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorTrace {
    lines: Vec<RawLine>,
}

impl ErrorTrace {
    /// Start a trace from its first line.
    pub(crate) fn start(first: RawLine) -> Self {
        Self { lines: vec![first] }
    }

    pub(crate) fn push(&mut self, line: RawLine) {
        self.lines.push(line);
    }

    /// Build a trace from literal lines. Returns `None` for an empty input.
    pub fn from_lines<I, S>(lines: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<RawLine> = lines.into_iter().map(RawLine::new).collect();
        if lines.is_empty() {
            None
        } else {
            Some(Self { lines })
        }
    }

    /// Lines in the order they were read.
    pub fn lines(&self) -> &[RawLine] {
        &self.lines
    }

    /// Number of lines, at least one.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True if the trace holds no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The first (marker) line.
    pub fn first_line(&self) -> &str {
        self.lines[0].text()
    }

    /// The trace as a single string, lines joined with `\n`.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(RawLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
