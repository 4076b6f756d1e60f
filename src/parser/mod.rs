//! Pure text parsers for log lines and git output.
//!
//! Nothing in this module touches the filesystem or spawns processes:
//! - [`marker`] recognizes lines that begin a new error trace
//! - [`location`] extracts `in <file> on line <N>` from trace text
//! - [`blame`] reads `git blame --porcelain` output into a [`BlameRecord`](crate::model::BlameRecord)

pub mod blame;
pub mod location;
pub mod marker;

pub use blame::parse_porcelain;
pub use location::{parse_location, SourceLocation};
pub use marker::is_error_start;
