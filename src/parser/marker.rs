//! Error-start detection.

use regex::Regex;
use std::sync::LazyLock;

static ERROR_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(PHP (Fatal error|Warning|Notice|Parse error)|\[error\])")
        .expect("error start pattern is valid")
});

/// True if `line` opens a new error trace.
///
/// Case-insensitive match of `PHP Fatal error`, `PHP Warning`, `PHP Notice`,
/// `PHP Parse error` or `[error]` anywhere in the line.
pub fn is_error_start(line: &str) -> bool {
    ERROR_START.is_match(line)
}
