//! Architectural Contract Test: At-Least-Once Notification
//!
//! This test verifies the notify-then-commit ordering: a failed delivery
//! leaves the persisted state untouched, so the same change is re-detected
//! and re-sent on the next cycle. A change can be notified twice, but it
//! can never be silently lost.
//!
//! If this test fails, someone has reordered commit before delivery or
//! started persisting state on failed cycles.

mod common;

use common::*;
use wanwatch_core::{AddressSet, CycleOutcome, WatchEngine};

#[tokio::test]
async fn notify_failure_leaves_store_untouched_and_retries() {
    let source = StubAddressSource::up(&["203.0.113.5", "2001:db8::1"]);
    let notifier = MockNotifier::new();
    let store = CountingStateStore::seeded(&["203.0.113.5"]);

    notifier.set_failing(true);

    let (engine, _event_rx) = WatchEngine::new(
        Box::new(source.clone()),
        Box::new(notifier.clone()),
        Box::new(store.clone()),
        test_config(),
    )
    .expect("engine construction succeeds");

    // Delivery fails: outcome recorded, store untouched
    assert_eq!(engine.run_cycle().await, CycleOutcome::NotifyFailed);
    assert_eq!(store.save_count(), 0);

    let prior: AddressSet = ["203.0.113.5"].into_iter().collect();
    assert_eq!(store.snapshot().await, prior);

    // Remote unchanged, delivery recovers: the same change is re-sent
    notifier.set_failing(false);
    assert_eq!(engine.run_cycle().await, CycleOutcome::Committed);
    assert_eq!(notifier.notify_count(), 2);

    let deliveries = notifier.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].addresses.len(), 2);
    assert!(deliveries[0].addresses.contains("2001:db8::1"));

    let expected: AddressSet = ["203.0.113.5", "2001:db8::1"].into_iter().collect();
    assert_eq!(store.snapshot().await, expected);
}

#[tokio::test]
async fn fetch_failure_is_transient_and_mutates_nothing() {
    let source = StubAddressSource::failing();
    let notifier = MockNotifier::new();
    let store = CountingStateStore::seeded(&["203.0.113.5"]);

    let (engine, _event_rx) = WatchEngine::new(
        Box::new(source.clone()),
        Box::new(notifier.clone()),
        Box::new(store.clone()),
        test_config(),
    )
    .expect("engine construction succeeds");

    // Simulated timeout: no comparison, no delivery, no write
    assert_eq!(engine.run_cycle().await, CycleOutcome::FetchFailed);
    assert_eq!(notifier.notify_count(), 0);
    assert_eq!(store.save_count(), 0);
    assert_eq!(store.load_count(), 0, "failed fetch must not reach the store");

    // The next cycle is independent: once the source recovers, detection
    // proceeds as usual
    source.set_up(&["203.0.113.5", "2001:db8::1"]);
    assert_eq!(engine.run_cycle().await, CycleOutcome::Committed);
    assert_eq!(notifier.notify_count(), 1);
}
