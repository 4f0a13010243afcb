//! Test doubles and common utilities for architecture contract tests
//!
//! The doubles share their counters through Arcs, so a clone handed to the
//! engine and the handle kept by the test observe the same calls.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use wanwatch_core::error::{FetchError, NotifyError, StoreError};
use wanwatch_core::state::MemoryStateStore;
use wanwatch_core::traits::{
    AddressSet, AddressSource, InterfaceSnapshot, InterfaceStatus, NotificationRequest, Notifier,
    StateStore,
};
use wanwatch_core::WatchConfig;

/// What the stub source answers on the next fetch
pub enum SourceBehavior {
    /// Respond with the given status and address set
    Respond(InterfaceStatus, Vec<String>),
    /// Fail at the transport level (simulated timeout)
    FailTransport,
}

/// A controlled AddressSource whose behavior the test can change mid-run
#[derive(Clone)]
pub struct StubAddressSource {
    behavior: Arc<std::sync::Mutex<SourceBehavior>>,
    fetch_count: Arc<AtomicUsize>,
}

impl StubAddressSource {
    pub fn up(addrs: &[&str]) -> Self {
        Self::with_behavior(SourceBehavior::Respond(
            InterfaceStatus::Up,
            addrs.iter().map(|a| a.to_string()).collect(),
        ))
    }

    pub fn down(addrs: &[&str]) -> Self {
        Self::with_behavior(SourceBehavior::Respond(
            InterfaceStatus::Down,
            addrs.iter().map(|a| a.to_string()).collect(),
        ))
    }

    pub fn failing() -> Self {
        Self::with_behavior(SourceBehavior::FailTransport)
    }

    fn with_behavior(behavior: SourceBehavior) -> Self {
        Self {
            behavior: Arc::new(std::sync::Mutex::new(behavior)),
            fetch_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Switch the source to answering up with the given addresses
    pub fn set_up(&self, addrs: &[&str]) {
        *self.behavior.lock().unwrap() = SourceBehavior::Respond(
            InterfaceStatus::Up,
            addrs.iter().map(|a| a.to_string()).collect(),
        );
    }

    /// Get the number of times fetch() was called
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AddressSource for StubAddressSource {
    async fn fetch(&self, _interface: &str) -> Result<InterfaceSnapshot, FetchError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        match &*self.behavior.lock().unwrap() {
            SourceBehavior::Respond(status, addrs) => Ok(InterfaceSnapshot {
                status: *status,
                addresses: addrs.iter().map(String::as_str).collect(),
            }),
            SourceBehavior::FailTransport => {
                Err(FetchError::transport("simulated timeout"))
            }
        }
    }

    fn source_name(&self) -> &'static str {
        "stub"
    }
}

/// A mock Notifier that records deliveries and can be told to fail
#[derive(Clone, Default)]
pub struct MockNotifier {
    failing: Arc<AtomicBool>,
    notify_count: Arc<AtomicUsize>,
    deliveries: Arc<std::sync::Mutex<Vec<NotificationRequest>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent notify() calls fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Get the number of times notify() was called (including failures)
    pub fn notify_count(&self) -> usize {
        self.notify_count.load(Ordering::SeqCst)
    }

    /// Get the successfully delivered requests
    pub fn deliveries(&self) -> Vec<NotificationRequest> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
        self.notify_count.fetch_add(1, Ordering::SeqCst);

        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Transport(
                "simulated connection refused".to_string(),
            ));
        }

        self.deliveries.lock().unwrap().push(request.clone());
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "mock"
    }
}

/// A StateStore wrapper that counts loads and saves
#[derive(Clone)]
pub struct CountingStateStore {
    inner: MemoryStateStore,
    load_count: Arc<AtomicUsize>,
    save_count: Arc<AtomicUsize>,
}

impl CountingStateStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStateStore::new(),
            load_count: Arc::new(AtomicUsize::new(0)),
            save_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a store pre-populated with prior state
    pub fn seeded(addrs: &[&str]) -> Self {
        Self {
            inner: MemoryStateStore::with_state(addrs.iter().copied().collect()),
            load_count: Arc::new(AtomicUsize::new(0)),
            save_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times save() was called
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    /// Get the number of times load() was called
    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }

    /// Current contents, for assertions
    pub async fn snapshot(&self) -> AddressSet {
        self.inner.snapshot().await
    }
}

#[async_trait]
impl StateStore for CountingStateStore {
    async fn load(&self) -> AddressSet {
        self.load_count.fetch_add(1, Ordering::SeqCst);
        self.inner.load().await
    }

    async fn save(&self, addresses: &AddressSet) -> Result<(), StoreError> {
        self.save_count.fetch_add(1, Ordering::SeqCst);
        self.inner.save(addresses).await
    }
}

/// Helper to create a minimal WatchConfig for testing
pub fn test_config() -> WatchConfig {
    WatchConfig::new("wan", "ops@example.net")
}
