//! PHP error log watcher (phplogwatch)
//!
//! Tails an Apache/PHP error log, groups lines into error traces, enriches each
//! trace with the serving vhost, git remote and blame for the failing line, and
//! posts the result to a webhook.
//!
//! The core is synchronous: [`source::LogTailer`] is a blocking iterator of
//! traces and [`pipeline::Orchestrator`] consumes it one trace at a time.
//! The binary runs that loop on a blocking thread and cancels it on SIGINT/SIGTERM.

pub mod cache;
pub mod config;
pub mod enrich;
pub mod logging;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod preflight;
pub mod sink;
pub mod source;
