//! Client configuration.

use crate::{OutboxError, OutboxResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default per-attempt timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default number of retries after the first direct-send attempt.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Default backoff unit in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Default offline buffer capacity.
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 1000;

/// Environment variable overriding `api_url`.
pub const ENV_API_URL: &str = "AUDIT_RELAY_API_URL";

/// Environment variable overriding `api_key`.
pub const ENV_API_KEY: &str = "AUDIT_RELAY_API_KEY";

/// Environment variable overriding `debug` (`1`/`true`/`yes`/`on`).
pub const ENV_DEBUG: &str = "AUDIT_RELAY_DEBUG";

/// Delivery client configuration, resolved once at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the collector.
    #[serde(default)]
    pub api_url: String,
    /// Optional API key, sent as `X-API-Key`.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-attempt timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Retries after the first attempt before falling back.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Backoff unit in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Buffer undeliverable events in memory.
    #[serde(default = "default_enable_offline_queue")]
    pub enable_offline_queue: bool,
    /// Offline buffer capacity.
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,
    /// Emit per-event diagnostics.
    #[serde(default)]
    pub debug: bool,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_retry_attempts() -> u32 {
    DEFAULT_RETRY_ATTEMPTS
}

fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}

fn default_enable_offline_queue() -> bool {
    true
}

fn default_max_queue_size() -> usize {
    DEFAULT_MAX_QUEUE_SIZE
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            enable_offline_queue: true,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            debug: false,
        }
    }
}

impl ClientConfig {
    /// Create a configuration with default values for the given collector.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = duration_to_ms(timeout);
        self
    }

    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay_ms = duration_to_ms(delay);
        self
    }

    pub fn with_offline_queue(mut self, enabled: bool) -> Self {
        self.enable_offline_queue = enabled;
        self
    }

    pub fn with_max_queue_size(mut self, max_queue_size: usize) -> Self {
        self.max_queue_size = max_queue_size;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Backoff unit.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// The API key, if set to a non-empty value.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }

    /// Check that the collector URL is present and parsable.
    pub fn validate(&self) -> OutboxResult<Url> {
        if self.api_url.trim().is_empty() {
            return Err(OutboxError::Config("api_url is required".to_string()));
        }
        Url::parse(&self.api_url).map_err(OutboxError::from)
    }

    /// Load configuration from a JSON file.
    pub fn load_from_file(path: &Path) -> OutboxResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load from an optional file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> OutboxResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.load_from_env();
        Ok(config)
    }

    /// Override configuration from environment variables.
    pub fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(api_url) = read(ENV_API_URL) {
            self.api_url = api_url;
        }
        if let Some(api_key) = read(ENV_API_KEY) {
            self.api_key = Some(api_key);
        }
        if let Some(debug) = read(ENV_DEBUG) {
            self.debug = matches!(
                debug.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
pub(crate) fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
