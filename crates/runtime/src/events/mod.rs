//! Topic-based event bus and the outbound gateway contract.
//!
//! Events are published to specific topics, and consumers subscribe only to
//! the topics they need. The battle worker never waits on a subscriber.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{BattleEnded, BattleEvent, BattleStarted, RoundResolved, SyncGateway, VitalsChanged};
