//! Common test helpers and utilities for Spacebrew tests
//!
//! This crate provides:
//! - Condition-based waiting (no hardcoded sleeps)
//! - A scripted in-memory router peer with RAII cleanup
//! - Collectors for verifying handler invocations

use bytes::Bytes;
use serde_json::Value;
use spacebrew_client::Spacebrew;
use spacebrew_transport::memory;
use spacebrew_transport::{ChannelSender, TransportEvent, TransportReceiver, TransportSender};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default test timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default condition check interval
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// Condition-Based Waiting
// ============================================================================

/// Wait for a condition with timeout - condition-based, not time-based
pub async fn wait_for<F, Fut>(check: F, interval: Duration, max_wait: Duration) -> bool
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = Instant::now();
    while start.elapsed() < max_wait {
        if check().await {
            return true;
        }
        tokio::time::sleep(interval).await;
    }
    false
}

/// Wait for an atomic counter to reach a target value
pub async fn wait_for_count(counter: &AtomicU32, target: u32, max_wait: Duration) -> bool {
    wait_for(
        || async { counter.load(Ordering::SeqCst) >= target },
        DEFAULT_CHECK_INTERVAL,
        max_wait,
    )
    .await
}

/// Wait for a boolean flag to become true
pub async fn wait_for_flag(flag: &AtomicBool, max_wait: Duration) -> bool {
    wait_for(
        || async { flag.load(Ordering::SeqCst) },
        DEFAULT_CHECK_INTERVAL,
        max_wait,
    )
    .await
}

// ============================================================================
// Mock Router - scripted peer over the in-memory transport
// ============================================================================

/// Router side of an in-memory connection
///
/// Records every frame the client sends (parsed as JSON) and lets the test
/// push frames back. The reader task is aborted on drop.
pub struct MockRouter {
    sender: ChannelSender,
    frames: Arc<parking_lot::Mutex<Vec<Value>>>,
    count: Arc<AtomicU32>,
    closed: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl MockRouter {
    /// Connect `client` to a fresh mock router and wait for the open handshake
    pub async fn attach(client: &Spacebrew) -> Self {
        let router = Self::attach_pending(client).await;
        let connected = wait_for(
            || async { client.is_connected() },
            DEFAULT_CHECK_INTERVAL,
            DEFAULT_TIMEOUT,
        )
        .await;
        assert!(connected, "client never reported open");
        router
    }

    /// Connect without waiting for the client to process `Connected`
    async fn attach_pending(client: &Spacebrew) -> Self {
        let ((client_tx, client_rx), (router_tx, mut router_rx)) = memory::pair();

        client
            .connect_with(client_tx, client_rx)
            .await
            .expect("connect_with failed");

        let frames = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let count = Arc::new(AtomicU32::new(0));
        let closed = Arc::new(AtomicBool::new(false));

        let handle = {
            let frames = frames.clone();
            let count = count.clone();
            let closed = closed.clone();
            tokio::spawn(async move {
                while let Some(event) = router_rx.recv().await {
                    match event {
                        TransportEvent::Data(data) => {
                            let frame: Value =
                                serde_json::from_slice(&data).expect("client sent invalid JSON");
                            frames.lock().push(frame);
                            count.fetch_add(1, Ordering::SeqCst);
                        }
                        TransportEvent::Disconnected { .. } => {
                            closed.store(true, Ordering::SeqCst);
                            break;
                        }
                        _ => {}
                    }
                }
            })
        };

        Self {
            sender: router_tx,
            frames,
            count,
            closed,
            handle: Some(handle),
        }
    }

    /// Deliver a JSON frame to the client
    pub async fn push(&self, frame: Value) {
        self.push_raw(&frame.to_string()).await;
    }

    /// Deliver raw text to the client
    pub async fn push_raw(&self, text: &str) {
        self.sender
            .send(Bytes::from(text.to_string()))
            .await
            .expect("push failed");
    }

    /// Frames received from the client so far
    pub fn frames(&self) -> Vec<Value> {
        self.frames.lock().clone()
    }

    /// Frames carrying the given top-level key (`config`, `message`, `route`, `admin`)
    pub fn frames_with(&self, key: &str) -> Vec<Value> {
        self.frames
            .lock()
            .iter()
            .filter(|f| f.get(key).is_some())
            .cloned()
            .collect()
    }

    /// Wait until at least `n` frames have arrived
    pub async fn wait_for_frames(&self, n: u32) -> bool {
        wait_for_count(&self.count, n, DEFAULT_TIMEOUT).await
    }

    /// Close from the router side
    pub async fn close(&self) {
        let _ = self.sender.close().await;
    }

    pub async fn wait_for_close(&self) -> bool {
        wait_for_flag(&self.closed, DEFAULT_TIMEOUT).await
    }
}

impl Drop for MockRouter {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

// ============================================================================
// Collectors - for verifying handler invocations
// ============================================================================

/// Thread-safe record of handler invocations
#[derive(Clone)]
pub struct Collector<T> {
    values: Arc<parking_lot::Mutex<Vec<T>>>,
    count: Arc<AtomicU32>,
}

impl<T: Clone + Send + 'static> Collector<T> {
    pub fn new() -> Self {
        Self {
            values: Arc::new(parking_lot::Mutex::new(Vec::new())),
            count: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Record one invocation
    pub fn push(&self, value: T) {
        self.values.lock().push(value);
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    /// Get the count of recorded invocations
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }

    /// Wait for at least n invocations
    pub async fn wait_for_count(&self, n: u32) -> bool {
        wait_for_count(&self.count, n, DEFAULT_TIMEOUT).await
    }

    pub fn values(&self) -> Vec<T> {
        self.values.lock().clone()
    }

    pub fn last(&self) -> Option<T> {
        self.values.lock().last().cloned()
    }
}

impl<T: Clone + Send + 'static> Default for Collector<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter for argument-less handlers such as open and close
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicU32>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler that increments this counter
    pub fn handler(&self) -> impl Fn() + Send + Sync + 'static {
        let count = self.0.clone();
        move || {
            count.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn get(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }

    pub async fn wait_for(&self, n: u32) -> bool {
        wait_for_count(&self.0, n, DEFAULT_TIMEOUT).await
    }
}
