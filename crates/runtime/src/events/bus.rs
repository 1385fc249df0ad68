//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use arena_core::{CombatEvent, Timestamp};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Spawns, deaths and despawns
    Lifecycle,
    /// Status effect triggers
    Status,
    /// Ability begins and interrupts
    Combat,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::Lifecycle, Topic::Status, Topic::Combat];

    const fn index(self) -> usize {
        self as usize
    }

    pub fn of(event: &CombatEvent) -> Self {
        match event {
            CombatEvent::Spawned { .. }
            | CombatEvent::AgentDied { .. }
            | CombatEvent::Despawned { .. } => Topic::Lifecycle,
            CombatEvent::StatusTriggered { .. } => Topic::Status,
            CombatEvent::AbilityBegan { .. } | CombatEvent::Interrupted { .. } => Topic::Combat,
        }
    }
}

/// Combat event stamped with the frame that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub frame: u64,
    pub at: Timestamp,
    pub event: CombatEvent,
}

impl Event {
    pub fn topic(&self) -> Topic {
        Topic::of(&self.event)
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Publishing never blocks; slow subscribers lag.
#[derive(Clone)]
pub struct EventBus {
    channels: [broadcast::Sender<Event>; 3],
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
            channels: Topic::ALL.map(|_| broadcast::channel(capacity).0),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.channels[topic.index()].send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channels[topic.index()].subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> Vec<(Topic, broadcast::Receiver<Event>)> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.channels[topic.index()].receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use arena_core::{AgentId, Archetype, StatusKind};

    use super::*;

    fn stamped(event: CombatEvent) -> Event {
        Event {
            frame: 1,
            at: Timestamp::from_millis(16),
            event,
        }
    }

    #[test]
    fn subscribers_only_see_their_topic() {
        let bus = EventBus::with_capacity(8);
        let mut status = bus.subscribe(Topic::Status);
        let agent = AgentId::new(0, 0);

        bus.publish(stamped(CombatEvent::Despawned {
            agent,
            archetype: Archetype::Mine,
        }));
        bus.publish(stamped(CombatEvent::StatusTriggered {
            agent,
            kind: StatusKind::Toxin,
        }));

        let received = status.try_recv().expect("status event");
        assert_eq!(received.topic(), Topic::Status);
        assert!(status.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::new();
        bus.publish(stamped(CombatEvent::AbilityBegan {
            agent: AgentId::new(1, 0),
            ability: arena_core::AbilityId::Teleport,
        }));
        assert_eq!(bus.subscriber_count(Topic::Combat), 0);
    }
}
