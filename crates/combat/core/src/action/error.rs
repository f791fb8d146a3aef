//! Validation errors raised while checking an [`super::ActionSelection`].
//!
//! Every variant is recoverable: nothing was applied and the participant may
//! resubmit.

use crate::error::{CombatError, ErrorSeverity};
use crate::state::{GridPosition, ParticipantId};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum ValidationError {
    #[error("budget exceeded: selection costs {cost} action points, budget is {budget}")]
    BudgetExceeded { cost: u32, budget: u32 },

    #[error("attack '{attack}' is not in the participant's loadout")]
    UnknownAttack { attack: String },

    #[error("skill '{skill}' is not in the participant's loadout")]
    UnknownSkill { skill: String },

    #[error("target {target} is not part of this battle")]
    UnknownTarget { target: ParticipantId },

    #[error("target {target} is no longer in the fight")]
    TargetUnavailable { target: ParticipantId },

    #[error("attack target {target} is on the attacker's own team")]
    FriendlyTarget { target: ParticipantId },

    #[error("only one block may be active, {count} were selected")]
    TooManyBlocks { count: usize },

    #[error("only one move may be selected per turn")]
    MultipleMoves,

    #[error("skill '{skill}' needs {required} resource, {available} available this turn")]
    InsufficientResource {
        skill: String,
        required: u32,
        available: u32,
    },

    #[error("movement is only available in alternating-turn battles")]
    MovementNotAllowed,

    #[error("participant {participant} has no grid position")]
    NoPosition { participant: ParticipantId },

    #[error("destination {to} is outside the grid")]
    OutOfBounds { to: GridPosition },

    #[error("destination {to} is occupied")]
    CellOccupied { to: GridPosition },

    #[error("destination is {distance} tiles away, move range is {range}")]
    MoveTooFar { distance: u32, range: u32 },

    #[error("target {target} is {distance} tiles away, reach is {reach}")]
    OutOfReach {
        target: ParticipantId,
        distance: u32,
        reach: u32,
    },
}

impl CombatError for ValidationError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BudgetExceeded { .. } => "BUDGET_EXCEEDED",
            Self::UnknownAttack { .. } => "UNKNOWN_ATTACK",
            Self::UnknownSkill { .. } => "UNKNOWN_SKILL",
            Self::UnknownTarget { .. } => "UNKNOWN_TARGET",
            Self::TargetUnavailable { .. } => "TARGET_UNAVAILABLE",
            Self::FriendlyTarget { .. } => "FRIENDLY_TARGET",
            Self::TooManyBlocks { .. } => "TOO_MANY_BLOCKS",
            Self::MultipleMoves => "MULTIPLE_MOVES",
            Self::InsufficientResource { .. } => "INSUFFICIENT_RESOURCE",
            Self::MovementNotAllowed => "MOVEMENT_NOT_ALLOWED",
            Self::NoPosition { .. } => "NO_POSITION",
            Self::OutOfBounds { .. } => "OUT_OF_BOUNDS",
            Self::CellOccupied { .. } => "CELL_OCCUPIED",
            Self::MoveTooFar { .. } => "MOVE_TOO_FAR",
            Self::OutOfReach { .. } => "OUT_OF_REACH",
        }
    }
}
