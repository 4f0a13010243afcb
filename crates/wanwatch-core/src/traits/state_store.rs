// # State Store Trait
//
// Defines the interface for the durable record of the last successfully
// notified address set.
//
// ## Contract
//
// - `load()` never fails. A missing record is a valid initial state and
//   yields the empty set; an unreadable or unparseable record is logged by
//   the implementation and treated identically. The engine therefore never
//   has to distinguish "no prior state" from "broken prior state".
// - `save()` atomically overwrites the whole record. There are no partial
//   or incremental writes, so a crash at any point leaves either the old
//   or the new record on disk, never a mix.
//
// ## Implementations
//
// - File-based (newline-delimited addresses): [`crate::state::FileStateStore`]
// - In-memory (tests, ephemeral deployments): [`crate::state::MemoryStateStore`]

use async_trait::async_trait;

use crate::error::StoreError;
use crate::traits::address_source::AddressSet;

/// Trait for state store implementations
///
/// Stores are stateless services from the engine's point of view: the
/// record is read in full before every comparison and written in full
/// after every committed change.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the last committed address set, or the empty set if there is
    /// none or it cannot be read
    async fn load(&self) -> AddressSet;

    /// Atomically replace the durable record with the given set
    async fn save(&self, addresses: &AddressSet) -> Result<(), StoreError>;
}
