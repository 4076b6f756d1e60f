//! Outbound delivery of enriched traces.
//!
//! Delivery is best-effort and at-most-once: one POST per trace, no retry.

use crate::model::error::DeliveryError;
use crate::model::{ErrorTrace, ProjectInfo, WebhookPayload};
use std::time::Duration;
use tracing::{debug, info};

/// Timeout applied to every webhook request.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Destination for enriched traces.
pub trait Sink {
    /// Deliver one trace and its (possibly absent) enrichment to `url`.
    fn deliver(
        &self,
        url: &str,
        trace: &ErrorTrace,
        info: Option<&ProjectInfo>,
    ) -> Result<(), DeliveryError>;
}

/// Posts JSON payloads to a webhook with a reused blocking HTTP client.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: reqwest::blocking::Client,
}

impl WebhookSink {
    /// Build a sink with the standard 2-second timeout.
    ///
    /// # Errors
    ///
    /// Returns the client builder error if TLS or the resolver cannot be initialized.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(DELIVERY_TIMEOUT)
    }

    /// Build a sink with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns the client builder error if TLS or the resolver cannot be initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Sink for WebhookSink {
    fn deliver(
        &self,
        url: &str,
        trace: &ErrorTrace,
        info: Option<&ProjectInfo>,
    ) -> Result<(), DeliveryError> {
        let text = trace.text();
        let payload = WebhookPayload {
            error_line: &text,
            error_detail: info,
        };

        info!(url, lines = trace.len(), "Sending error trace to webhook");

        let response = self.client.post(url).json(&payload).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status { status });
        }

        debug!(%status, "Webhook accepted trace");
        Ok(())
    }
}
