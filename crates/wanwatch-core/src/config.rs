//! Configuration types for the watcher engine
//!
//! Adapter-specific settings (API endpoint, mail server) live with their
//! adapter crates; this is only what the engine itself needs. The daemon
//! builds one of these at startup and passes it in — core logic never
//! reads the environment.

use serde::{Deserialize, Serialize};

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Name of the monitored interface, as the appliance knows it
    pub interface: String,

    /// Recipient of change notifications
    pub recipient: String,

    /// Seconds between cycles
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped with a warning so a slow consumer
    /// can never stall a cycle or grow memory without bound.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl WatchConfig {
    /// Create a configuration with default interval and channel capacity
    pub fn new(interface: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            recipient: recipient.into(),
            poll_interval_secs: default_poll_interval_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Set the poll interval
    pub fn with_poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interface.is_empty() {
            return Err(crate::Error::config("Interface name cannot be empty"));
        }
        if self.recipient.is_empty() {
            return Err(crate::Error::config("Recipient cannot be empty"));
        }
        if self.poll_interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_event_channel_capacity() -> usize {
    100
}
