//! Source location extraction from PHP error text.

use regex::Regex;
use std::sync::LazyLock;

static LOCATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"in (.+?) on line (\d+)").expect("location pattern is valid"));

/// File and line a PHP error points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// Path exactly as printed by PHP, trimmed.
    pub file: String,
    /// 1-based line number.
    pub line: u32,
}

/// Find the first `in <path> on line <N>` in `text`.
///
/// The path is matched non-greedily and cannot span lines. Returns `None` if the
/// pattern is absent or the number does not fit in a `u32`.
pub fn parse_location(text: &str) -> Option<SourceLocation> {
    let captures = LOCATION.captures(text)?;
    let file = captures.get(1)?.as_str().trim();
    let line = captures.get(2)?.as_str().parse().ok()?;
    if file.is_empty() {
        return None;
    }
    Some(SourceLocation {
        file: file.to_string(),
        line,
    })
}
