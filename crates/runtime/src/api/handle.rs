//! Cloneable façade for observing and stopping a running encounter.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Notify, broadcast, watch};

use crate::controller::EncounterSummary;
use crate::events::{Event, EventBus, Topic};

/// Cooperative flags shared between the scheduler and its handles.
#[derive(Debug, Default)]
pub(crate) struct ControlFlags {
    shutdown: AtomicBool,
    paused: AtomicBool,
    wake: Notify,
}

impl ControlFlags {
    /// Raises the shutdown flag. Returns `false` when it was already raised.
    pub(crate) fn request_shutdown(&self) -> bool {
        let first = !self.shutdown.swap(true, Ordering::SeqCst);
        if first {
            // Stores a permit if the scheduler is not parked yet.
            self.wake.notify_one();
        }
        first
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    pub(crate) fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub(crate) async fn woken(&self) {
        self.wake.notified().await;
    }
}

/// Client-facing handle to a controller.
#[derive(Clone)]
pub struct ControllerHandle {
    flags: Arc<ControlFlags>,
    event_bus: EventBus,
    summary: watch::Receiver<EncounterSummary>,
}

impl ControllerHandle {
    pub(crate) fn new(
        flags: Arc<ControlFlags>,
        event_bus: EventBus,
        summary: watch::Receiver<EncounterSummary>,
    ) -> Self {
        Self {
            flags,
            event_bus,
            summary,
        }
    }

    /// Asks the scheduler to stop after the in-flight pass.
    ///
    /// Safe to call from any task and any number of times; only the first call
    /// has an effect.
    pub fn shutdown(&self) {
        if self.flags.request_shutdown() {
            tracing::info!(target: "encounter::handle", "Shutdown requested");
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.flags.is_shutdown()
    }

    /// True while a retreat holds dependent subsystems back.
    pub fn is_paused(&self) -> bool {
        self.flags.is_paused()
    }

    /// Latest published summary of the encounter.
    pub fn summary(&self) -> EncounterSummary {
        self.summary.borrow().clone()
    }

    /// Receiver that is notified whenever the summary changes.
    pub fn watch_summary(&self) -> watch::Receiver<EncounterSummary> {
        self.summary.clone()
    }

    /// Subscribe to events from a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
