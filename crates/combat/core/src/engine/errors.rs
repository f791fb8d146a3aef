//! Error types raised by the battle engine.
//!
//! [`StateError`] rejects a request that does not fit the battle's current
//! state; nothing is mutated. [`InvariantViolation`] means the round would
//! have produced state inconsistent with its own log; the working copy is
//! discarded and the round is aborted.

use crate::action::ValidationError;
use crate::error::{CombatError, ErrorSeverity};
use crate::state::{BattleStatus, ParticipantId};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum StateError {
    #[error("battle is not active (status: {status})")]
    BattleNotActive { status: BattleStatus },

    #[error("battle has already started")]
    AlreadyStarted,

    #[error("invalid battle transition {from} -> {to}")]
    InvalidTransition { from: BattleStatus, to: BattleStatus },

    #[error("participant {participant} is not part of this battle")]
    UnknownParticipant { participant: ParticipantId },

    #[error("participant {participant} is no longer in the fight")]
    ParticipantInactive { participant: ParticipantId },

    #[error("it is {current:?}'s turn, not {participant}'s")]
    OutOfTurn {
        participant: ParticipantId,
        current: Option<ParticipantId>,
    },

    #[error("operation is only valid in alternating-turn battles")]
    NotAlternating,

    #[error("operation is only valid in simultaneous-round battles")]
    NotSimultaneous,

    #[error("roster needs {required} ready participants on two teams, {ready} ready")]
    RosterTooSmall { required: usize, ready: usize },
}

impl CombatError for StateError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BattleNotActive { .. } => "BATTLE_NOT_ACTIVE",
            Self::AlreadyStarted => "ALREADY_STARTED",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::UnknownParticipant { .. } => "UNKNOWN_PARTICIPANT",
            Self::ParticipantInactive { .. } => "PARTICIPANT_INACTIVE",
            Self::OutOfTurn { .. } => "OUT_OF_TURN",
            Self::NotAlternating => "NOT_ALTERNATING",
            Self::NotSimultaneous => "NOT_SIMULTANEOUS",
            Self::RosterTooSmall { .. } => "ROSTER_TOO_SMALL",
        }
    }
}

/// Programming or data-corruption fault detected while resolving.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum InvariantViolation {
    #[error("participant {participant} is dead and cannot be mutated")]
    DeadParticipantMutated { participant: ParticipantId },

    #[error("participant {participant} would spend {requested} resource with {available} left")]
    ResourceUnderflow {
        participant: ParticipantId,
        requested: u32,
        available: u32,
    },

    #[error("participant {participant} has {current} hp, max is {max}")]
    HpOutOfBounds {
        participant: ParticipantId,
        current: u32,
        max: u32,
    },

    #[error("participant {participant} has {current} resource, max is {max}")]
    ResourceOutOfBounds {
        participant: ParticipantId,
        current: u32,
        max: u32,
    },

    #[error("participant {participant} is alive after dying")]
    Resurrected { participant: ParticipantId },

    #[error("resolver returned {amount} for a missed or blocked action")]
    InconsistentOutcome { amount: u32 },

    #[error("log sequence {found} does not follow {expected}")]
    SequenceGap { expected: u64, found: u64 },

    #[error("log round {found} is before round {current}")]
    RoundRegressed { current: u32, found: u32 },

    #[error("participant {participant} acted after leaving the fight")]
    ActorNotActive { participant: ParticipantId },
}

impl CombatError for InvariantViolation {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InconsistentOutcome { .. } => ErrorSeverity::Internal,
            _ => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::DeadParticipantMutated { .. } => "DEAD_PARTICIPANT_MUTATED",
            Self::ResourceUnderflow { .. } => "RESOURCE_UNDERFLOW",
            Self::HpOutOfBounds { .. } => "HP_OUT_OF_BOUNDS",
            Self::ResourceOutOfBounds { .. } => "RESOURCE_OUT_OF_BOUNDS",
            Self::Resurrected { .. } => "RESURRECTED",
            Self::InconsistentOutcome { .. } => "INCONSISTENT_OUTCOME",
            Self::SequenceGap { .. } => "SEQUENCE_GAP",
            Self::RoundRegressed { .. } => "ROUND_REGRESSED",
            Self::ActorNotActive { .. } => "ACTOR_NOT_ACTIVE",
        }
    }
}

/// Any error surfaced by [`super::BattleEngine`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "category", content = "error", rename_all = "snake_case"))]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("round aborted: {0}")]
    Invariant(#[from] InvariantViolation),
}

impl CombatError for EngineError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Validation(error) => error.severity(),
            Self::State(error) => error.severity(),
            Self::Invariant(error) => error.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(error) => error.error_code(),
            Self::State(error) => error.error_code(),
            Self::Invariant(error) => error.error_code(),
        }
    }
}
