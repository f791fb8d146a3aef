//! Topic-based event bus implementation.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{BattleEnded, BattleEvent, BattleStarted, RoundResolved, SyncGateway, VitalsChanged};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Resolved rounds and turns with their log entries
    Round,
    /// Per-participant vitals changes
    Vitals,
    /// Battle start and end
    Battle,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::Round, Topic::Vitals, Topic::Battle];
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    Round(RoundResolved),
    Vitals(VitalsChanged),
    Battle(BattleEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Round(_) => Topic::Round,
            Event::Vitals(_) => Topic::Vitals,
            Event::Battle(_) => Topic::Battle,
        }
    }
}

/// Topic-based event bus
///
/// One bus per battle. The channel map is fixed at construction, so
/// publishing and subscribing never contend on a lock.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<HashMap<Topic, broadcast::Sender<Event>>>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let channels = Topic::ALL
            .into_iter()
            .map(|topic| (topic, broadcast::channel(capacity.max(1)).0))
            .collect();
        Self {
            channels: Arc::new(channels),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if let Some(tx) = self.channels.get(&topic)
            && tx.send(event).is_err()
        {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!(target: "runtime::events", ?topic, "no subscribers");
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        match self.channels.get(&topic) {
            Some(tx) => tx.subscribe(),
            // Every topic is created in `with_capacity`; a detached receiver
            // reports the channel closed.
            None => broadcast::channel(1).1,
        }
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
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

impl SyncGateway for EventBus {
    fn on_round_resolved(&self, event: RoundResolved) {
        self.publish(Event::Round(event));
    }

    fn on_battle_ended(&self, event: BattleEnded) {
        self.publish(Event::Battle(BattleEvent::Ended(event)));
    }

    fn on_vitals_changed(&self, event: VitalsChanged) {
        self.publish(Event::Vitals(event));
    }

    fn on_battle_started(&self, event: BattleStarted) {
        self.publish(Event::Battle(BattleEvent::Started(event)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::{BattleId, BattleResult};

    #[tokio::test]
    async fn events_reach_only_their_topic() {
        let bus = EventBus::with_capacity(8);
        let mut battle_rx = bus.subscribe(Topic::Battle);
        let mut round_rx = bus.subscribe(Topic::Round);

        bus.on_battle_ended(BattleEnded {
            battle_id: BattleId::new(),
            result: BattleResult::Draw,
            rounds: 3,
            entries: Vec::new(),
        });

        let event = battle_rx.recv().await.unwrap();
        assert!(matches!(event, Event::Battle(BattleEvent::Ended(ref ended)) if ended.rounds == 3));
        assert!(round_rx.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::new();
        bus.on_vitals_changed(VitalsChanged {
            battle_id: BattleId::new(),
            change: combat_core::VitalsChange {
                participant: combat_core::ParticipantId(1),
                kind: combat_core::VitalsKind::Heal,
                amount: 3,
                hp_after: 10,
                resource_after: 0,
            },
        });
    }
}
