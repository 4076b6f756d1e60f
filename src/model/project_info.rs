//! Enrichment results and the outbound webhook payload.

use serde::Serialize;

/// Sentinel used for `git_remote` when no origin URL can be resolved.
pub const UNKNOWN_REMOTE: &str = "unknown";

/// Per-line authorship from `git blame --porcelain`.
///
/// Every field is independently optional; the porcelain output may omit any of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlameRecord {
    /// Author name.
    pub author: Option<String>,
    /// Author email without the surrounding angle brackets.
    pub email: Option<String>,
    /// Short commit id (first 8 hex characters).
    pub commit: Option<String>,
    /// First line of the commit message.
    pub summary: Option<String>,
}

/// Source-location and repository metadata resolved for one trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectInfo {
    /// File path as it appeared in the trace.
    pub file: String,
    /// 1-based line number from the trace.
    pub line: u32,
    /// First vhost config file mentioning the file's directory or an ancestor.
    pub vhost: Option<String>,
    /// `remote.origin.url` of the enclosing repository, or [`UNKNOWN_REMOTE`].
    pub git_remote: String,
    /// Trimmed trace text.
    pub error_line: String,
    /// Blame for the failing line, if the file is inside a repository.
    pub blame: Option<BlameRecord>,
}

/// JSON body POSTed to the webhook.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WebhookPayload<'a> {
    /// Full trace text.
    pub error_line: &'a str,
    /// Enrichment result, serialized as `null` when the trace had no location.
    pub error_detail: Option<&'a ProjectInfo>,
}
