//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::ControllerEvent;

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Phase transitions, retreats and the terminal stop
    Phase,
    /// Per-pass combat decisions (targets, postures, loadouts, movement)
    Combat,
    /// De-duplicated user-visible notices
    Notice,
}

/// Event wrapper that carries the typed controller event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event(pub ControllerEvent);

impl Event {
    pub fn topic(&self) -> Topic {
        self.0.topic()
    }

    pub fn into_inner(self) -> ControllerEvent {
        self.0
    }
}

/// Topic-based event bus
///
/// Each topic owns its own broadcast channel so consumers only receive the
/// events they subscribed to. Publishing never blocks and never fails.
#[derive(Clone)]
pub struct EventBus {
    phase: broadcast::Sender<Event>,
    combat: broadcast::Sender<Event>,
    notice: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            phase: broadcast::channel(capacity).0,
            combat: broadcast::channel(capacity).0,
            notice: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Phase => &self.phase,
            Topic::Combat => &self.combat,
            Topic::Notice => &self.notice,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: impl Into<Event>) {
        let event = event.into();
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> std::collections::HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ControllerEvent> for Event {
    fn from(event: ControllerEvent) -> Self {
        Event(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_reach_only_their_topic() {
        let bus = EventBus::with_capacity(4);
        let mut notices = bus.subscribe(Topic::Notice);
        let mut combat = bus.subscribe(Topic::Combat);

        bus.publish(ControllerEvent::Notice {
            message: "no target".into(),
        });

        let event = notices.recv().await.expect("notice delivered");
        assert_eq!(event.topic(), Topic::Notice);
        assert!(combat.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_silent() {
        let bus = EventBus::new();
        bus.publish(ControllerEvent::Notice {
            message: "nobody listens".into(),
        });
    }
}
