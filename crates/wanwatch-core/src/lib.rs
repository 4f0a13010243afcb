// # wanwatch-core
//
// Core library for the WAN address change watcher.
//
// ## Architecture Overview
//
// This library provides the change-detection loop for one monitored
// interface:
// - **AddressSource**: Trait for fetching the interface's current addresses
// - **Notifier**: Trait for delivering a change notification
// - **StateStore**: Trait for the durable record of the last notified set
// - **WatchEngine**: Core engine driving the fetch → compare → notify →
//   commit cycle on a fixed interval
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from the API and
//    mail adapters, which live in their own crates
// 2. **Notify-then-commit**: Persisted state only advances once the
//    operator has been informed, giving at-least-once notifications
// 3. **Absorb per-cycle failures**: Transient errors end the cycle and are
//    retried on the next tick; only bad configuration is fatal
// 4. **Library-First**: The engine is constructed from trait objects and
//    runs one cycle on demand, so it is testable without wall-clock delays

pub mod config;
pub mod engine;
pub mod error;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::WatchConfig;
pub use engine::{CycleOutcome, EngineEvent, WatchEngine};
pub use error::{Error, FetchError, NotifyError, Result, StoreError};
pub use state::{FileStateStore, MemoryStateStore};
pub use traits::{
    AddressRecord, AddressSet, AddressSource, InterfaceSnapshot, InterfaceStatus,
    NotificationRequest, Notifier, StateStore,
};
