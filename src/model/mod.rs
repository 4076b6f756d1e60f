//! Domain model types (pure).
//!
//! All types in this module are plain data; behavior lives in the pipeline stages.

pub mod error;
pub mod project_info;
pub mod trace;

// Re-export for convenience
pub use project_info::{BlameRecord, ProjectInfo, WebhookPayload, UNKNOWN_REMOTE};
pub use trace::{ErrorTrace, RawLine};
