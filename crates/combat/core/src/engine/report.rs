//! What one engine step produced, in the shape the gateway publishes.

use strum::{Display, IntoStaticStr};

use crate::log::CombatLogEntry;
use crate::state::{BattleResult, ParticipantId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum VitalsKind {
    Damage,
    Heal,
    ResourceUse,
    ResourceRestore,
    Death,
    /// Never produced by this engine; no mid-battle resurrection.
    Revive,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VitalsChange {
    pub participant: ParticipantId,
    pub kind: VitalsKind,
    pub amount: u32,
    pub hp_after: u32,
    pub resource_after: u32,
}

/// Result of a resolved round, turn, forfeit, start or cancel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundReport {
    /// Round the step resolved in (not the one that opens next).
    pub round: u32,
    pub entries: Vec<CombatLogEntry>,
    pub vitals: Vec<VitalsChange>,
    /// Set when this step completed the battle.
    pub outcome: Option<BattleResult>,
    /// Alternating mode: who acts next.
    pub next_actor: Option<ParticipantId>,
}

impl RoundReport {
    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }
}
