//! Core traits for the watcher
//!
//! This module defines the abstract interfaces the engine is wired against.
//!
//! - [`AddressSource`]: fetch the monitored interface's current addresses
//! - [`Notifier`]: deliver a change notification to the operator
//! - [`StateStore`]: durable record of the last notified address set

pub mod address_source;
pub mod notifier;
pub mod state_store;

pub use address_source::{
    AddressRecord, AddressSet, AddressSource, InterfaceSnapshot, InterfaceStatus,
};
pub use notifier::{NotificationRequest, Notifier};
pub use state_store::StateStore;
