//! Bounded in-memory buffer for events that could not be delivered directly.

use crate::{Transport, DEFAULT_MAX_QUEUE_SIZE};
use audit_event::LogEventPayload;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Period of the background flush.
pub const AUTO_FLUSH_INTERVAL: Duration = Duration::from_secs(10);

/// A buffered event.
///
/// Entries are compared by allocation, never by value: two identical payloads
/// submitted separately are two entries.
pub type QueueEntry = Arc<LogEventPayload>;

/// Buffer configuration.
#[derive(Debug, Clone)]
pub struct BufferConfig {
    /// Capacity; enqueue beyond it drops the new entry.
    pub max_size: usize,
    /// Period of the background flush.
    pub flush_interval: Duration,
    /// Emit per-entry diagnostics.
    pub debug: bool,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_QUEUE_SIZE,
            flush_interval: AUTO_FLUSH_INTERVAL,
            debug: false,
        }
    }
}

struct QueueInner {
    entries: VecDeque<QueueEntry>,
    /// Entries taken out by a running flush and not yet delivered. They still
    /// count against capacity because they may be requeued.
    checked_out: usize,
}

struct BufferState {
    inner: Mutex<QueueInner>,
    /// Held for the whole of a flush pass.
    flush_lock: tokio::sync::Mutex<()>,
    transport: Arc<dyn Transport>,
    max_size: usize,
    debug: bool,
}

/// Entries owned by one flush pass.
///
/// Dropping the pass, whether it ran to completion or its future was
/// cancelled, puts failed and in-flight entries back at the front of the
/// queue in their original order.
struct FlushPass<'a> {
    state: &'a BufferState,
    failed: Vec<QueueEntry>,
    in_flight: Option<QueueEntry>,
    /// Pops not yet settled by a delivery.
    held: usize,
}

impl<'a> FlushPass<'a> {
    fn new(state: &'a BufferState) -> Self {
        Self {
            state,
            failed: Vec::new(),
            in_flight: None,
            held: 0,
        }
    }

    fn take_next(&mut self) -> Option<QueueEntry> {
        let mut inner = self.state.inner.lock();
        let entry = inner.entries.pop_front()?;
        inner.checked_out += 1;
        self.held += 1;
        self.in_flight = Some(entry.clone());
        Some(entry)
    }

    fn mark_delivered(&mut self) {
        self.in_flight = None;
        self.held -= 1;
        self.state.inner.lock().checked_out -= 1;
    }

    fn mark_failed(&mut self) {
        if let Some(entry) = self.in_flight.take() {
            if !self.failed.iter().any(|seen| Arc::ptr_eq(seen, &entry)) {
                self.failed.push(entry);
            }
        }
    }
}

impl Drop for FlushPass<'_> {
    fn drop(&mut self) {
        let mut requeue = std::mem::take(&mut self.failed);
        if let Some(entry) = self.in_flight.take() {
            if !requeue.iter().any(|seen| Arc::ptr_eq(seen, &entry)) {
                requeue.push(entry);
            }
        }

        let mut inner = self.state.inner.lock();
        inner.checked_out -= self.held;
        for entry in requeue.into_iter().rev() {
            inner.entries.push_front(entry);
        }
    }
}

impl BufferState {
    /// Entries waiting in the queue.
    fn queued(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Entries not yet delivered, including those held by a running pass.
    fn buffered(&self) -> usize {
        let inner = self.inner.lock();
        inner.entries.len() + inner.checked_out
    }

    /// Drain the queue once. The caller must hold `flush_lock`.
    async fn run_pass(&self) -> usize {
        let pending = self.queued();
        if pending == 0 {
            return 0;
        }

        if self.debug {
            debug!(pending = pending, "Flushing offline buffer");
        }

        let mut pass = FlushPass::new(self);
        let mut delivered = 0;

        while let Some(entry) = pass.take_next() {
            match self.transport.send(&entry).await {
                Ok(log_id) => {
                    pass.mark_delivered();
                    delivered += 1;
                    if self.debug {
                        debug!(log_id = %log_id, "Buffered event delivered");
                    }
                }
                Err(e) => {
                    pass.mark_failed();
                    if self.debug {
                        debug!(error = %e, "Buffered event delivery failed");
                    }
                }
            }
        }

        let failed = pass.failed.len();
        drop(pass);

        if self.debug {
            debug!(
                delivered = delivered,
                failed = failed,
                remaining = self.queued(),
                "Flush pass complete"
            );
        }

        delivered
    }

    async fn flush(&self) -> usize {
        let Ok(_guard) = self.flush_lock.try_lock() else {
            if self.debug {
                debug!("Flush already in progress, skipping");
            }
            return 0;
        };
        self.run_pass().await
    }
}

/// Bounded FIFO buffer with a background flush.
///
/// Flushes are single-flight: a call made while another pass is running
/// returns 0 without touching the queue. A pass drains the queue, including
/// entries enqueued while it runs, then puts the failures back at the front.
pub struct OfflineBuffer {
    state: Arc<BufferState>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl OfflineBuffer {
    /// Create a buffer delivering through `transport`.
    ///
    /// The background flush is started on the current Tokio runtime. Outside
    /// a runtime the buffer still works but only flushes on demand.
    pub fn new(config: BufferConfig, transport: Arc<dyn Transport>) -> Self {
        let state = Arc::new(BufferState {
            inner: Mutex::new(QueueInner {
                entries: VecDeque::new(),
                checked_out: 0,
            }),
            flush_lock: tokio::sync::Mutex::new(()),
            transport,
            max_size: config.max_size,
            debug: config.debug,
        });

        let timer = spawn_auto_flush(Arc::downgrade(&state), config.flush_interval);

        Self {
            state,
            timer: Mutex::new(timer),
        }
    }

    /// Append an entry. Returns false, leaving the queue unchanged, when full.
    pub fn enqueue(&self, entry: impl Into<QueueEntry>) -> bool {
        let entry = entry.into();
        let mut inner = self.state.inner.lock();

        if inner.entries.len() + inner.checked_out >= self.state.max_size {
            warn!(
                max_size = self.state.max_size,
                "Offline buffer full, dropping event"
            );
            return false;
        }

        inner.entries.push_back(entry);
        if self.state.debug {
            debug!(size = inner.entries.len() + inner.checked_out, "Event buffered");
        }
        true
    }

    /// Run one flush pass and return the number of entries delivered.
    pub async fn flush(&self) -> usize {
        self.state.flush().await
    }

    /// Number of undelivered entries, counting those a running pass has
    /// taken out. `enqueue` succeeds exactly when this is below capacity.
    pub fn size(&self) -> usize {
        self.state.buffered()
    }

    /// Discard every queued entry. Entries held by a running pass that fail
    /// are still requeued when it ends.
    pub fn clear(&self) {
        self.state.inner.lock().entries.clear();
    }

    /// Queued entries, front first.
    pub fn snapshot(&self) -> Vec<QueueEntry> {
        self.state.inner.lock().entries.iter().cloned().collect()
    }

    /// Cancel the background flush. Idempotent.
    pub fn stop(&self) {
        if let Some(handle) = self.timer.lock().take() {
            handle.abort();
            if self.state.debug {
                debug!("Auto-flush stopped");
            }
        }
    }

    /// Wait for any running pass, stop the background flush, then drain.
    ///
    /// Returns the number of entries delivered by the final pass.
    pub async fn close(&self) -> usize {
        let _guard = self.state.flush_lock.lock().await;
        self.stop();
        self.state.run_pass().await
    }
}

impl Drop for OfflineBuffer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_auto_flush(state: Weak<BufferState>, period: Duration) -> Option<JoinHandle<()>> {
    let handle = match Handle::try_current() {
        Ok(handle) => handle,
        Err(_) => {
            warn!("No Tokio runtime, offline buffer will only flush on demand");
            return None;
        }
    };

    Some(handle.spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(state) = state.upgrade() else {
                break;
            };
            if state.queued() > 0 {
                state.flush().await;
            }
        }
    }))
}
