//! Scriptable transport for unit tests.
//!
//! Events are identified by their `subcategory`, which tests use as a label.

use crate::{QueueEntry, Transport, TransportError, TransportResult};
use async_trait::async_trait;
use audit_event::{LogEventPayload, Outcome};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Notify;

pub(crate) fn event(label: &str) -> LogEventPayload {
    let mut payload = LogEventPayload::with_outcome(Outcome::Success);
    payload.subcategory = Some(label.to_string());
    payload
}

pub(crate) fn labels(entries: &[QueueEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| entry.subcategory.clone().unwrap_or_default())
        .collect()
}

#[derive(Default)]
pub(crate) struct MockTransport {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    fail_all: AtomicBool,
    unhealthy: AtomicBool,
    blocked: Mutex<Option<String>>,
    blocked_entered: Notify,
    release: Notify,
    next_id: AtomicUsize,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub(crate) fn fail_on<'a>(&self, labels: impl IntoIterator<Item = &'a str>) {
        let mut failing = self.failing.lock();
        failing.extend(labels.into_iter().map(str::to_string));
    }

    pub(crate) fn succeed_on<'a>(&self, labels: impl IntoIterator<Item = &'a str>) {
        let mut failing = self.failing.lock();
        for label in labels {
            failing.remove(label);
        }
    }

    pub(crate) fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_healthy(&self, healthy: bool) {
        self.unhealthy.store(!healthy, Ordering::SeqCst);
    }

    /// Park every send of `label` until [`release`](Self::release).
    pub(crate) fn block_on(&self, label: &str) {
        *self.blocked.lock() = Some(label.to_string());
    }

    pub(crate) fn unblock(&self) {
        *self.blocked.lock() = None;
    }

    /// Wait until a send is parked on the blocked label.
    pub(crate) async fn wait_blocked(&self) {
        self.blocked_entered.notified().await;
    }

    pub(crate) fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, payload: &LogEventPayload) -> TransportResult<String> {
        let label = payload.subcategory.clone().unwrap_or_default();
        self.calls.lock().push(label.clone());

        let parked = self.blocked.lock().as_deref() == Some(label.as_str());
        if parked {
            self.blocked_entered.notify_one();
            self.release.notified().await;
        }

        if self.fail_all.load(Ordering::SeqCst) || self.failing.lock().contains(&label) {
            return Err(TransportError::Send(format!("rejected {label}")));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(format!("log-{id}"))
    }

    async fn health_check(&self) -> TransportResult<()> {
        if self.unhealthy.load(Ordering::SeqCst) {
            Err(TransportError::Send("collector unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}
