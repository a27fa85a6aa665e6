//! End-to-end delivery behavior through the public API.

use async_trait::async_trait;
use audit_event::{AuthEventBuilder, DataEventBuilder, LogEventPayload};
use audit_outbox::{
    ClientConfig, DeliveryClient, Transport, TransportError, TransportResult, QUEUED_LOG_ID,
};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Collector that stores what it accepts and can be switched off.
#[derive(Default)]
struct Collector {
    offline: AtomicBool,
    stored: Mutex<Vec<LogEventPayload>>,
    attempts: Mutex<usize>,
}

impl Collector {
    fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn stored_subcategories(&self) -> Vec<String> {
        self.stored
            .lock()
            .iter()
            .map(|p| p.subcategory.clone().unwrap_or_default())
            .collect()
    }
}

#[async_trait]
impl Transport for Collector {
    async fn send(&self, payload: &LogEventPayload) -> TransportResult<String> {
        *self.attempts.lock() += 1;
        if self.offline.load(Ordering::SeqCst) {
            return Err(TransportError::Send("connection refused".to_string()));
        }
        let mut stored = self.stored.lock();
        stored.push(payload.clone());
        Ok(format!("{:024x}", stored.len()))
    }

    async fn health_check(&self) -> TransportResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(TransportError::Status {
                status: 503,
                body: String::new(),
            })
        } else {
            Ok(())
        }
    }
}

fn client(collector: &Arc<Collector>, config: ClientConfig) -> DeliveryClient {
    DeliveryClient::with_transport(config, collector.clone())
}

fn config() -> ClientConfig {
    ClientConfig::new("http://collector.test").with_retry(2, Duration::from_millis(200))
}

#[tokio::test]
async fn built_events_are_delivered() {
    let collector = Arc::new(Collector::default());
    let client = client(&collector, config());

    let login = AuthEventBuilder::login()
        .user("user-1", Some("ada"), None)
        .from_ip("10.0.0.1")
        .build();
    let update = DataEventBuilder::update("invoice", "inv-9")
        .by_user("user-1")
        .with_state(json!({ "total": 1 }), json!({ "total": 2 }))
        .build();

    let results = client.submit_batch(vec![login, update]).await;

    assert!(results.iter().all(|r| r.success && !r.is_queued()));
    assert_eq!(collector.stored_subcategories(), vec!["login_success", "update"]);
    assert!(client.health_check().await);
}

#[tokio::test(start_paused = true)]
async fn outage_buffers_then_recovers() {
    let collector = Arc::new(Collector::default());
    collector.set_offline(true);
    let client = client(&collector, config());

    let result = client.submit(AuthEventBuilder::logout().build()).await;
    assert!(result.success);
    assert_eq!(result.log_id.as_deref(), Some(QUEUED_LOG_ID));
    assert_eq!(*collector.attempts.lock(), 3);
    assert_eq!(client.size(), 1);
    assert!(!client.health_check().await);

    collector.set_offline(false);

    // The background flush picks the event up without a manual call.
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(client.size(), 0);
    assert_eq!(collector.stored_subcategories(), vec!["logout"]);
}

#[tokio::test(start_paused = true)]
async fn buffered_order_survives_repeated_outages() {
    let collector = Arc::new(Collector::default());
    collector.set_offline(true);
    let client = client(&collector, config().with_retry(0, Duration::from_millis(1)));

    let events = ["create", "update", "delete"].map(|kind| {
        let mut payload = DataEventBuilder::create("doc", "d-1").build();
        payload.subcategory = Some(kind.to_string());
        payload
    });
    for payload in events {
        assert!(client.submit(payload).await.is_queued());
    }

    assert_eq!(client.flush().await, 0);
    assert_eq!(client.size(), 3);

    collector.set_offline(false);
    assert_eq!(client.close().await, 3);
    assert_eq!(
        collector.stored_subcategories(),
        vec!["create", "update", "delete"]
    );
}

#[tokio::test]
async fn validation_failures_never_reach_the_collector() {
    let collector = Arc::new(Collector::default());
    let client = client(&collector, config());

    let payload: LogEventPayload =
        serde_json::from_value(json!({ "result": { "outcome": "maybe" } })).unwrap();
    let result = client.submit(payload).await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("invalid result.outcome: maybe"));
    assert_eq!(*collector.attempts.lock(), 0);
    assert_eq!(client.size(), 0);
}

#[tokio::test(start_paused = true)]
async fn disabled_buffer_surfaces_transport_errors() {
    let collector = Arc::new(Collector::default());
    collector.set_offline(true);
    let client = client(&collector, config().with_offline_queue(false));

    let result = client.submit(AuthEventBuilder::login_failed().build()).await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Send failed: connection refused"));
    assert_eq!(client.size(), 0);
    assert_eq!(client.close().await, 0);
}
