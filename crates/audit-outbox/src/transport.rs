//! Collector transport and its HTTP binding.

use crate::{ClientConfig, OutboxResult, TransportError, TransportResult};
use async_trait::async_trait;
use audit_event::LogEventPayload;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;

/// Path events are posted to, relative to the collector base URL.
pub const LOGS_PATH: &str = "/api/logs";

/// Liveness check path, relative to the collector base URL.
pub const HEALTH_PATH: &str = "/health";

/// A way of getting one event to the collector.
///
/// Implementations make a single attempt per call; retry and buffering are
/// layered on top by [`DeliveryClient`](crate::DeliveryClient).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one event, returning the identifier assigned by the collector.
    async fn send(&self, payload: &LogEventPayload) -> TransportResult<String>;

    /// Check that the collector is reachable.
    async fn health_check(&self) -> TransportResult<()>;
}

/// HTTP transport: JSON `POST` to [`LOGS_PATH`], `GET` on [`HEALTH_PATH`].
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    debug: bool,
}

impl HttpTransport {
    /// Create a transport from the client configuration.
    ///
    /// Every request is bounded by `config.timeout()`.
    pub fn new(config: &ClientConfig) -> OutboxResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(TransportError::from)?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key().map(str::to_string),
            debug: config.debug,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("X-API-Key", key),
            None => request,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, payload: &LogEventPayload) -> TransportResult<String> {
        let url = self.url(LOGS_PATH);

        if self.debug {
            debug!(url = %url, "Sending event");
        }

        let response = self
            .authorize(self.client.post(&url))
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        Ok(extract_log_id(&body))
    }

    async fn health_check(&self) -> TransportResult<()> {
        let response = self
            .authorize(self.client.get(self.url(HEALTH_PATH)))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TransportError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }
}

/// Read the stored event id from a collector response.
///
/// Accepts `_id` or `id`, as a string or a number. An accepted response
/// without a usable id yields an empty string rather than an error, so the
/// event is not sent again.
fn extract_log_id(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return String::new();
    };

    ["_id", "id"]
        .iter()
        .find_map(|key| match value.get(key) {
            Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}
