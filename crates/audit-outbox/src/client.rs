//! Delivery client: direct send with retry, falling back to the offline buffer.

use crate::config::duration_to_ms;
use crate::{
    BufferConfig, ClientConfig, HttpTransport, OfflineBuffer, OutboxResult, RetryPolicy,
    Transport, TransportResult, AUTO_FLUSH_INTERVAL,
};
use audit_event::LogEventPayload;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Log id reported for an event accepted into the offline buffer.
pub const QUEUED_LOG_ID: &str = "queued";

/// Outcome of a submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryResult {
    pub fn delivered(log_id: impl Into<String>) -> Self {
        Self {
            success: true,
            log_id: Some(log_id.into()),
            error: None,
        }
    }

    pub fn queued() -> Self {
        Self::delivered(QUEUED_LOG_ID)
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            log_id: None,
            error: Some(error.into()),
        }
    }

    /// Accepted into the offline buffer rather than confirmed by the collector.
    ///
    /// This is also reported when the buffer was full and the event dropped.
    pub fn is_queued(&self) -> bool {
        self.success && self.log_id.as_deref() == Some(QUEUED_LOG_ID)
    }
}

/// Client for submitting audit events to the collector.
///
/// Never fails a valid submit because of a transport outage while buffering
/// is enabled: exhausted deliveries are buffered and reported as queued.
pub struct DeliveryClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    buffer: Option<OfflineBuffer>,
}

impl DeliveryClient {
    /// Create a client talking HTTP to `config.api_url`.
    pub fn new(config: ClientConfig) -> OutboxResult<Self> {
        config.validate()?;
        let transport = Arc::new(HttpTransport::new(&config)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Create a client over a custom transport. `api_url` is not checked.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let buffer = config.enable_offline_queue.then(|| {
            OfflineBuffer::new(
                BufferConfig {
                    max_size: config.max_queue_size,
                    flush_interval: AUTO_FLUSH_INTERVAL,
                    debug: config.debug,
                },
                transport.clone(),
            )
        });

        info!(
            api_url = %config.api_url,
            retry_attempts = config.retry_attempts,
            offline_queue = config.enable_offline_queue,
            "Delivery client created"
        );

        Self {
            retry: RetryPolicy::from_config(&config),
            config,
            transport,
            buffer,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Submit one event.
    ///
    /// Invalid events fail immediately without touching the transport or the
    /// buffer.
    pub async fn submit(&self, payload: LogEventPayload) -> DeliveryResult {
        if let Err(e) = payload.validate() {
            if self.config.debug {
                debug!(error = %e, "Rejected invalid event");
            }
            return DeliveryResult::failed(e.to_string());
        }

        match self.send_with_retry(&payload).await {
            Ok(log_id) => {
                if self.config.debug {
                    debug!(log_id = %log_id, "Event delivered");
                }
                DeliveryResult::delivered(log_id)
            }
            Err(e) => match &self.buffer {
                Some(buffer) => {
                    buffer.enqueue(payload);
                    if self.config.debug {
                        debug!(size = buffer.size(), "Event queued for later delivery");
                    }
                    DeliveryResult::queued()
                }
                None => {
                    if self.config.debug {
                        debug!(error = %e, "Event delivery failed");
                    }
                    DeliveryResult::failed(e.to_string())
                }
            },
        }
    }

    /// Submit events one at a time, in order.
    pub async fn submit_batch(&self, payloads: Vec<LogEventPayload>) -> Vec<DeliveryResult> {
        let mut results = Vec::with_capacity(payloads.len());
        for payload in payloads {
            results.push(self.submit(payload).await);
        }
        results
    }

    /// Flush the offline buffer now. Returns the number delivered.
    pub async fn flush(&self) -> usize {
        match &self.buffer {
            Some(buffer) => buffer.flush().await,
            None => 0,
        }
    }

    /// Number of buffered events.
    pub fn size(&self) -> usize {
        self.buffer.as_ref().map_or(0, OfflineBuffer::size)
    }

    /// Check that the collector is reachable. Any failure is reported as `false`.
    pub async fn health_check(&self) -> bool {
        match self.transport.health_check().await {
            Ok(()) => true,
            Err(e) => {
                if self.config.debug {
                    debug!(error = %e, "Health check failed");
                }
                false
            }
        }
    }

    /// Drain the buffer and stop its background flush.
    ///
    /// Waits for a running flush rather than interrupting it. Returns the
    /// number of events delivered by the final drain.
    pub async fn close(&self) -> usize {
        let Some(buffer) = &self.buffer else {
            return 0;
        };

        let delivered = buffer.close().await;
        let remaining = buffer.size();
        if remaining > 0 {
            warn!(remaining = remaining, "Closing with undelivered events");
        }
        delivered
    }

    async fn send_with_retry(&self, payload: &LogEventPayload) -> TransportResult<String> {
        let mut attempt = 0;
        loop {
            match self.transport.send(payload).await {
                Ok(log_id) => return Ok(log_id),
                Err(e) if self.retry.should_retry(attempt) => {
                    let delay = self.retry.delay(attempt);
                    if self.config.debug {
                        debug!(
                            error = %e,
                            attempt = attempt,
                            delay_ms = duration_to_ms(delay),
                            "Send failed, retrying"
                        );
                    }
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        attempts = attempt + 1,
                        "Delivery attempts exhausted"
                    );
                    return Err(e);
                }
            }
        }
    }
}
