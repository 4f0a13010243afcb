// # Notifier Trait
//
// Defines the interface for delivering a change notification to the
// operator.
//
// ## Implementations
//
// - SMTP mail delivery: `wanwatch-notify-smtp` crate
//
// A notifier delivers exactly one message per call over a session scoped to
// that call; nothing stays open between cycles. It never retries: a failed
// delivery is reported to the engine, which leaves the persisted state
// untouched so the same change is re-detected and re-sent next cycle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::NotifyError;
use crate::traits::address_source::AddressSet;

/// Everything needed to render and address one change notification
///
/// Constructed by the engine when a change is confirmed, consumed once by
/// the notifier, never retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    /// Name of the monitored interface
    pub interface: String,
    /// Recipient address for the single configured channel
    pub recipient: String,
    /// The new address set being announced
    pub addresses: AddressSet,
    /// When the change was detected
    pub detected_at: DateTime<Utc>,
}

impl NotificationRequest {
    /// Create a request stamped with the current time
    pub fn new(
        interface: impl Into<String>,
        recipient: impl Into<String>,
        addresses: AddressSet,
    ) -> Self {
        Self {
            interface: interface.into(),
            recipient: recipient.into(),
            addresses,
            detected_at: Utc::now(),
        }
    }
}

/// Trait for notifier implementations
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification for the given request
    ///
    /// # Returns
    ///
    /// - `Ok(())`: the message was accepted by the transport
    /// - `Err(NotifyError)`: authentication, transport, or protocol failure;
    ///   the caller decides whether the change is retried
    async fn notify(&self, request: &NotificationRequest) -> Result<(), NotifyError>;

    /// Get the notifier name (for logging/debugging)
    fn notifier_name(&self) -> &'static str;
}
