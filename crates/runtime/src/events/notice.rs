//! User-visible notices, de-duplicated against the previous message.
use tracing::{error, info, warn};

use encounter_core::ErrorSeverity;

use super::bus::EventBus;
use super::types::ControllerEvent;
use crate::api::RuntimeError;

/// Emits a message once per distinct cause.
///
/// A message identical to the previously emitted one is dropped, so a
/// condition that persists across passes shows up a single time until
/// something else is reported.
#[derive(Clone)]
pub struct NoticeLog {
    last: Option<String>,
    bus: EventBus,
}

impl NoticeLog {
    pub fn new(bus: EventBus) -> Self {
        Self { last: None, bus }
    }

    /// Emits an informational notice. Returns `false` when it was suppressed.
    pub fn notify(&mut self, message: impl Into<String>) -> bool {
        let message = message.into();
        if !self.remember(&message) {
            return false;
        }
        info!(target: "encounter::notice", "{message}");
        self.bus.publish(ControllerEvent::Notice { message });
        true
    }

    /// Emits an error as a notice at a level matching its severity.
    pub fn report(&mut self, error: &RuntimeError) -> bool {
        let message = error.to_string();
        if !self.remember(&message) {
            return false;
        }
        match error.severity() {
            ErrorSeverity::Recoverable => {
                warn!(target: "encounter::notice", severity = "recoverable", "{message}")
            }
            ErrorSeverity::Fatal => {
                error!(target: "encounter::notice", severity = "fatal", "{message}")
            }
        }
        self.bus.publish(ControllerEvent::Notice { message });
        true
    }

    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }

    pub fn reset(&mut self) {
        self.last = None;
    }

    fn remember(&mut self, message: &str) -> bool {
        if self.last.as_deref() == Some(message) {
            return false;
        }
        self.last = Some(message.to_owned());
        true
    }
}
