use chrono::{DateTime, Utc};
use strum::{Display, IntoStaticStr};

use crate::engine::StateError;

use super::ids::{BattleId, ParticipantId, ShareToken, Team};

/// Lifecycle status. `pending -> active -> completed`, nothing else.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BattleStatus {
    #[default]
    Pending,
    Active,
    Completed,
}

/// Turn-resolution strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BattleMode {
    /// Everyone queues a selection; the round resolves all of them together.
    #[default]
    SimultaneousRound,
    /// One participant acts per turn, in initiative order.
    AlternatingTurn,
}

/// Terminal result of a battle.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum BattleResult {
    Victory { team: Team },
    Draw,
    /// The last opposing participants withdrew instead of dying.
    Fled { by: ParticipantId, winner: Team },
    Cancelled { reason: String },
}

impl BattleResult {
    pub fn winner(&self) -> Option<&Team> {
        match self {
            Self::Victory { team } => Some(team),
            Self::Fled { winner, .. } => Some(winner),
            Self::Draw | Self::Cancelled { .. } => None,
        }
    }
}

impl std::fmt::Display for BattleResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Victory { team } => write!(f, "{team} wins"),
            Self::Draw => f.write_str("draw"),
            Self::Fled { by, winner } => write!(f, "{by} fled, {winner} wins"),
            Self::Cancelled { reason } => write!(f, "cancelled: {reason}"),
        }
    }
}

/// One combat encounter.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Battle {
    pub id: BattleId,
    status: BattleStatus,
    pub mode: BattleMode,
    /// Starts at 1; never decreases.
    pub round_number: u32,
    pub action_points_per_turn: u32,
    pub max_resource_per_turn: u32,
    /// Alternating-turn mode only.
    pub current_actor: Option<ParticipantId>,
    /// Cached initiative view, refreshed at start and after every resolution.
    pub initiative_order: Vec<ParticipantId>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub share_token: ShareToken,
    result: Option<BattleResult>,
    /// Seed for the deterministic resolver rolls.
    pub seed: u64,
}

impl Battle {
    pub fn new(
        mode: BattleMode,
        action_points_per_turn: u32,
        max_resource_per_turn: u32,
        seed: u64,
    ) -> Self {
        Self {
            id: BattleId::new(),
            status: BattleStatus::Pending,
            mode,
            round_number: 1,
            action_points_per_turn,
            max_resource_per_turn,
            current_actor: None,
            initiative_order: Vec::new(),
            started_at: None,
            ended_at: None,
            share_token: ShareToken::generate(),
            result: None,
            seed,
        }
    }

    pub fn status(&self) -> BattleStatus {
        self.status
    }

    pub fn result(&self) -> Option<&BattleResult> {
        self.result.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.status == BattleStatus::Active
    }

    pub fn is_completed(&self) -> bool {
        self.status == BattleStatus::Completed
    }

    pub(crate) fn activate(&mut self, now: DateTime<Utc>) -> Result<(), StateError> {
        if self.status != BattleStatus::Pending {
            return Err(StateError::InvalidTransition {
                from: self.status,
                to: BattleStatus::Active,
            });
        }
        self.status = BattleStatus::Active;
        self.started_at = Some(now);
        Ok(())
    }

    /// Moves to `completed`. Allowed from `pending` only for cancellation.
    pub(crate) fn complete(
        &mut self,
        result: BattleResult,
        now: DateTime<Utc>,
    ) -> Result<(), StateError> {
        let allowed = match self.status {
            BattleStatus::Active => true,
            BattleStatus::Pending => matches!(result, BattleResult::Cancelled { .. }),
            BattleStatus::Completed => false,
        };
        if !allowed {
            return Err(StateError::InvalidTransition {
                from: self.status,
                to: BattleStatus::Completed,
            });
        }
        self.status = BattleStatus::Completed;
        self.ended_at = Some(now);
        self.current_actor = None;
        self.result = Some(result);
        Ok(())
    }
}
