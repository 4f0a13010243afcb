//! Core change-detection engine
//!
//! The WatchEngine is responsible for:
//! - Fetching the monitored interface's state via AddressSource
//! - Comparing the normalized address set against the StateStore
//! - Delivering a notification via Notifier when the set changed
//! - Committing the new set only after delivery succeeded
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐
//! │ AddressSource │─── InterfaceSnapshot ───┐
//! └───────────────┘                         │
//!                                           ▼
//!                                  ┌──────────────┐
//!                                  │ WatchEngine  │
//!                                  └──────────────┘
//!                                           │
//!              ┌────────────────────────────┼────────────────────────────┐
//!              │                            │                            │
//!              ▼                            ▼                            ▼
//!      ┌─────────────┐             ┌──────────────┐             ┌─────────────┐
//!      │ StateStore  │             │   Notifier   │             │   Events    │
//!      │ (load/save) │             │  (deliver)   │             │ (monitoring)│
//!      └─────────────┘             └──────────────┘             └─────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. Fetch status + addresses (failure ends the cycle, retried next tick)
//! 2. Interface down → stop; a down interface reports stale address data
//! 3. Empty address set → stop with a warning; treated as a data anomaly,
//!    never as a real change
//! 4. Load prior set, compare (order-insensitive)
//! 5. On change: notify, and only after successful delivery commit the new
//!    set. A crash or delivery failure between detection and commit means
//!    the same change is re-detected next cycle — notifications are
//!    at-least-once, possibly duplicated, never silently dropped.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, error, info, warn};

use crate::config::WatchConfig;
use crate::error::{FetchError, Result};
use crate::traits::{AddressSet, AddressSource, NotificationRequest, Notifier, StateStore};

/// Terminal state of one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The fetch failed; nothing was compared or mutated
    FetchFailed,
    /// The interface reported down; nothing was compared or mutated
    InterfaceDown,
    /// No actionable change (includes the empty-set anomaly)
    Unchanged,
    /// Change notified and committed to the store
    Committed,
    /// Change detected but delivery failed; store untouched
    NotifyFailed,
    /// Delivered, but the store write failed; the change is re-detected
    /// (and re-notified) next cycle
    CommitFailed,
}

/// Events emitted by the WatchEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        interface: String,
    },

    /// A changed address set was detected
    ChangeDetected {
        previous: AddressSet,
        current: AddressSet,
    },

    /// Notification delivered
    NotificationSent {
        addresses: AddressSet,
    },

    /// Notification delivery failed
    NotificationFailed {
        error: String,
    },

    /// A cycle finished
    CycleCompleted {
        outcome: CycleOutcome,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Core change-detection engine
///
/// Owns the per-cycle state machine and the failure policy: every
/// per-cycle error is absorbed into a [`CycleOutcome`] and retried on the
/// next tick, never escalated. The engine is the sole writer of the state
/// store.
///
/// ## Lifecycle
///
/// 1. Create with [`WatchEngine::new()`]
/// 2. Start with [`WatchEngine::run()`] (ctrl-c bound) or
///    [`WatchEngine::run_with_shutdown()`] (caller-provided signal)
/// 3. Cycles run strictly sequentially on a fixed interval, the first one
///    immediately; cancellation is only observed between cycles
pub struct WatchEngine {
    /// Address source for the monitored interface
    source: Box<dyn AddressSource>,

    /// Notification channel
    notifier: Box<dyn Notifier>,

    /// Durable record of the last notified set
    state_store: Box<dyn StateStore>,

    /// Monitored interface name
    interface: String,

    /// Notification recipient
    recipient: String,

    /// Interval between cycles
    poll_interval: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl WatchEngine {
    /// Create a new engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields
    /// engine events for logging or monitoring
    pub fn new(
        source: Box<dyn AddressSource>,
        notifier: Box<dyn Notifier>,
        state_store: Box<dyn StateStore>,
        config: WatchConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let engine = Self {
            source,
            notifier,
            state_store,
            interface: config.interface,
            recipient: config.recipient,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run until ctrl-c
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run until the provided shutdown signal fires
    ///
    /// The daemon wires its SIGTERM/SIGINT handling here; tests use a
    /// oneshot to stop the loop deterministically.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.emit_event(EngineEvent::Started {
            interface: self.interface.clone(),
        });
        info!(
            "Watching interface {} every {:?}",
            self.interface, self.poll_interval
        );

        // The first tick completes immediately, so the first cycle runs at
        // startup rather than one interval later. Delay keeps overrunning
        // cycles strictly sequential instead of bursting to catch up.
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = IntervalStream::new(interval);

        if let Some(mut rx) = shutdown_rx {
            loop {
                tokio::select! {
                    Some(_) = ticks.next() => {
                        let outcome = self.run_cycle().await;
                        self.emit_event(EngineEvent::CycleCompleted { outcome });
                    }

                    _ = &mut rx => {
                        info!("Shutdown signal received");
                        self.emit_event(EngineEvent::Stopped {
                            reason: "Shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        } else {
            loop {
                tokio::select! {
                    Some(_) = ticks.next() => {
                        let outcome = self.run_cycle().await;
                        self.emit_event(EngineEvent::CycleCompleted { outcome });
                    }

                    _ = tokio::signal::ctrl_c() => {
                        info!("Shutdown signal received");
                        self.emit_event(EngineEvent::Stopped {
                            reason: "Shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Execute one fetch-compare-notify-commit cycle
    ///
    /// Public so the cycle can be driven synchronously in tests, without
    /// the scheduler or wall-clock delays.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let snapshot = match self.source.fetch(&self.interface).await {
            Ok(snapshot) => snapshot,
            Err(FetchError::RemoteError { status, body }) => {
                warn!(
                    "Address fetch rejected by remote (status {}): {}",
                    status, body
                );
                return CycleOutcome::FetchFailed;
            }
            Err(e) => {
                warn!("Address fetch failed: {}", e);
                return CycleOutcome::FetchFailed;
            }
        };

        if !snapshot.status.is_up() {
            debug!("Interface {} is down, skipping cycle", self.interface);
            return CycleOutcome::InterfaceDown;
        }

        // An interface that is up but reports zero routable addresses is
        // treated as a bad reading, not as "all addresses removed". The
        // asymmetry is deliberate: never notify on disappearance alone.
        if snapshot.addresses.is_empty() {
            warn!(
                "Interface {} reported no routable addresses, ignoring as anomaly",
                self.interface
            );
            return CycleOutcome::Unchanged;
        }

        let previous = self.state_store.load().await;
        if snapshot.addresses == previous {
            debug!("Address set unchanged ({})", previous);
            return CycleOutcome::Unchanged;
        }

        info!(
            "Address change on {}: [{}] -> [{}]",
            self.interface, previous, snapshot.addresses
        );
        self.emit_event(EngineEvent::ChangeDetected {
            previous,
            current: snapshot.addresses.clone(),
        });

        let request = NotificationRequest::new(
            self.interface.clone(),
            self.recipient.clone(),
            snapshot.addresses.clone(),
        );

        match self.notifier.notify(&request).await {
            Ok(()) => {
                self.emit_event(EngineEvent::NotificationSent {
                    addresses: snapshot.addresses.clone(),
                });

                // Commit strictly after delivery: state only advances past a
                // change once the operator has been told about it.
                match self.state_store.save(&snapshot.addresses).await {
                    Ok(()) => {
                        info!("Committed new address set for {}", self.interface);
                        CycleOutcome::Committed
                    }
                    Err(e) => {
                        error!(
                            "Notified but failed to commit state: {}. \
                            The change will be re-detected (and re-notified) next cycle.",
                            e
                        );
                        CycleOutcome::CommitFailed
                    }
                }
            }
            Err(e) => {
                warn!(
                    "Notification via {} failed: {}. Will retry next cycle.",
                    self.notifier.notifier_name(),
                    e
                );
                self.emit_event(EngineEvent::NotificationFailed {
                    error: e.to_string(),
                });
                CycleOutcome::NotifyFailed
            }
        }
    }

    /// Emit an engine event, dropping it if the channel is full
    fn emit_event(&self, event: EngineEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event");
        }
    }
}
