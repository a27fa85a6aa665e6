//! Resilient delivery of audit events to a remote collector.
//!
//! This crate provides:
//! - DeliveryClient: direct send with bounded retry, falling back to the offline buffer
//! - OfflineBuffer: bounded in-memory FIFO with auto-flush and requeue on failure
//! - RetryPolicy: linear backoff between direct-send attempts
//! - Transport / HttpTransport: the collector seam and its HTTP binding

mod client;
mod config;
mod error;
mod queue;
mod retry;
mod transport;

#[cfg(test)]
mod testing;

pub use audit_event::LogEventPayload;
pub use client::{DeliveryClient, DeliveryResult, QUEUED_LOG_ID};
pub use config::{
    ClientConfig, DEFAULT_MAX_QUEUE_SIZE, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY_MS,
    DEFAULT_TIMEOUT_MS, ENV_API_KEY, ENV_API_URL, ENV_DEBUG,
};
pub use error::{OutboxError, OutboxResult, TransportError, TransportResult};
pub use queue::{BufferConfig, OfflineBuffer, QueueEntry, AUTO_FLUSH_INTERVAL};
pub use retry::RetryPolicy;
pub use transport::{HttpTransport, Transport, HEALTH_PATH, LOGS_PATH};
