//! Event payloads and the Synchronization Gateway trait.

use combat_core::{BattleId, BattleResult, CombatLogEntry, ParticipantId, VitalsChange};
use serde::{Deserialize, Serialize};

/// A simultaneous round or an alternating turn finished resolving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResolved {
    pub battle_id: BattleId,
    pub round_number: u32,
    pub entries: Vec<CombatLogEntry>,
    pub vitals: Vec<VitalsChange>,
    /// Alternating mode: who acts next.
    pub next_actor: Option<ParticipantId>,
}

/// The battle reached `completed`; `entries` are the ones the final step wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleEnded {
    pub battle_id: BattleId,
    pub result: BattleResult,
    pub rounds: u32,
    pub entries: Vec<CombatLogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VitalsChanged {
    pub battle_id: BattleId,
    pub change: VitalsChange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleStarted {
    pub battle_id: BattleId,
    pub initiative_order: Vec<ParticipantId>,
    pub entries: Vec<CombatLogEntry>,
}

/// Lifecycle events on [`super::Topic::Battle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleEvent {
    Started(BattleStarted),
    Ended(BattleEnded),
}

/// Outbound boundary the battle worker publishes through.
///
/// Calls are fire-and-forget: implementations must not block, and any retry
/// is their own business.
pub trait SyncGateway: Send + Sync {
    fn on_round_resolved(&self, event: RoundResolved);

    fn on_battle_ended(&self, event: BattleEnded);

    fn on_vitals_changed(&self, event: VitalsChanged);

    fn on_battle_started(&self, _event: BattleStarted) {}
}
