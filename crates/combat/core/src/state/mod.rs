//! Battle state: the battle record, its participants, the log and the input history.
//!
//! [`BattleState`] is the unit the engine reduces over. Cloning it yields a
//! consistent snapshot, which is what readers outside the coordinator get.

mod battle;
mod ids;
mod participant;
mod store;

use std::collections::BTreeMap;

pub use battle::{Battle, BattleMode, BattleResult, BattleStatus};
pub use ids::{BattleId, GridPosition, ParticipantId, ShareToken, Team};
pub use participant::{
    AttackTemplate, CombatCounters, Controller, DamageApplied, Loadout, Participant,
    ParticipantSpec, SkillTemplate, StatSnapshot, Withdrawal,
};
pub use store::ParticipantStore;

use crate::action::ActionSelection;
use crate::log::CombatLog;

/// One applied input, in the order the coordinator applied it.
///
/// Feeding the same records to [`crate::engine::replay`] reproduces the log
/// and the final vitals exactly.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum RoundRecord {
    /// Battle start with the participants that were ready.
    Start { ready: Vec<ParticipantId> },
    /// A simultaneous round with every effective selection.
    Round {
        round: u32,
        selections: BTreeMap<ParticipantId, ActionSelection>,
        /// Participants auto-resolved with the timeout default.
        defaulted: Vec<ParticipantId>,
    },
    /// One alternating turn; `selection` is `None` for a pass.
    Turn {
        round: u32,
        actor: ParticipantId,
        selection: Option<ActionSelection>,
        timed_out: bool,
    },
    Forfeit { participant: ParticipantId },
    Cancel { reason: String },
}

/// Aggregate the engine mutates; owned exclusively by one coordinator.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleState {
    pub battle: Battle,
    pub participants: ParticipantStore,
    pub log: CombatLog,
    pub history: Vec<RoundRecord>,
}

impl BattleState {
    pub fn new(battle: Battle, roster: impl IntoIterator<Item = ParticipantSpec>) -> Self {
        let log = CombatLog::new(battle.id);
        Self {
            battle,
            participants: ParticipantStore::from_roster(roster),
            log,
            history: Vec::new(),
        }
    }
}
