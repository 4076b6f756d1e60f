//! Error types for phplogwatch.
//!
//! This module defines the error taxonomy using `thiserror` for structured error
//! handling. Errors compose via `?` and `From` conversions.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level error returned by the binary's startup path
//!   - [`InputError`] - Log file opening failures (file not found, IO)
//!   - [`ConfigError`](crate::config::ConfigError) - Config file read/parse/validation failures
//!   - [`LoggingError`](crate::logging::LoggingError) - Tracing subscriber setup failures
//! - [`CommandError`] - External tool failures (git, grep); never leaves the enrichment boundary
//! - [`DeliveryError`] - Webhook POST failures; logged and dropped by the pipeline
//!
//! # Error Recovery Strategy
//!
//! Only startup failures are fatal. Once the pipeline is running, command and delivery
//! failures degrade to sentinel values or dropped payloads and the loop continues.

use crate::config::ConfigError;
use crate::logging::LoggingError;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error encompassing all fatal failure modes.
///
/// Everything wrapped here happens before the first trace is read. Once the
/// pipeline is running, failures are handled locally and never surface as `AppError`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to open the watched log file.
    ///
    /// Without the input file no trace can ever be produced, so the process exits
    /// with a non-zero status.
    #[error("Failed to open log input: {0}")]
    Input(#[from] InputError),

    /// Configuration could not be loaded or validated at startup.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Tracing subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    Logging(#[from] LoggingError),

    /// The HTTP client for the webhook sink could not be built.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// The blocking pipeline thread panicked or was aborted.
    #[error("Pipeline task failed: {0}")]
    Pipeline(#[from] tokio::task::JoinError),
}

/// Errors encountered when opening or reading the watched log file.
///
/// # Recovery Patterns
///
/// - **FileNotFound**: Fatal at startup. The operator must fix `log_file`.
/// - **Io**: Fatal at open time; during tailing, read errors are logged and retried
///   on the next poll.
#[derive(Debug, Error)]
pub enum InputError {
    /// The configured log file does not exist at the given path.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use phplogwatch::model::error::InputError;
    ///
    /// let err = InputError::FileNotFound {
    ///     path: PathBuf::from("/var/log/apache2/missing.log")
    /// };
    /// assert!(err.to_string().contains("/var/log/apache2/missing.log"));
    /// ```
    #[error("File not found: {path}")]
    FileNotFound {
        /// The filesystem path that was not found.
        path: PathBuf,
    },

    /// Generic I/O error opening, seeking or reading the log file.
    ///
    /// The `#[from]` attribute lets `std::io::Error` propagate with `?`.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of an external command used during enrichment.
///
/// These never propagate past [`Enricher`](crate::enrich::Enricher): each call site
/// maps them to `None` or the `"unknown"` sentinel.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The program could not be started (not installed, not in PATH, bad cwd).
    #[error("Failed to run {program}: {source}")]
    Spawn {
        /// Program name as invoked.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The program ran but exited unsuccessfully.
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        /// Program name as invoked.
        program: String,
        /// Exit status as reported by the OS.
        status: std::process::ExitStatus,
        /// Trimmed standard error output.
        stderr: String,
    },
}

/// Failure delivering a payload to the webhook endpoint.
///
/// Delivery is at-most-once: the pipeline logs this and drops the payload.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Transport failure: connection refused, DNS, TLS, or the 2s timeout elapsed.
    #[error("Webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("Webhook responded with status {status}")]
    Status {
        /// HTTP status returned by the endpoint.
        status: reqwest::StatusCode,
    },
}
