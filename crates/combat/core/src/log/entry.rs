//! Combat log entries and their closed payload union.

use std::collections::BTreeSet;

use strum::{Display, IntoStaticStr};

use crate::action::{BodyRegion, Element, SkillEffect};
use crate::config::DefaultAction;
use crate::state::{BattleId, BattleResult, GridPosition, ParticipantId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LogType {
    Attack,
    Skill,
    Restoration,
    Miss,
    Death,
    System,
}

/// Engine events that are not an action outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "snake_case"))]
pub enum SystemEvent {
    BattleStarted { order: Vec<ParticipantId> },
    /// Withdrawn at start for not being ready.
    NotReady { participant: ParticipantId },
    /// Missed the round deadline; the configured default was applied.
    AutoResolved {
        participant: ParticipantId,
        default: DefaultAction,
    },
    TurnTimedOut { participant: ParticipantId },
    TurnPassed { participant: ParticipantId },
    Defending { participant: ParticipantId },
    Blocking {
        participant: ParticipantId,
        region: BodyRegion,
    },
    Moved {
        participant: ParticipantId,
        from: GridPosition,
        to: GridPosition,
    },
    /// Queued action skipped because its target left the fight earlier in the round.
    TargetUnavailable {
        actor: ParticipantId,
        target: ParticipantId,
    },
    Fled { participant: ParticipantId },
    Forfeited { participant: ParticipantId },
    RoundCapReached { rounds: u32 },
    BattleEnded { result: BattleResult },
}

/// Type-specific structured data; the entry's [`LogType`] is derived from it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum LogPayload {
    Attack {
        element: Element,
        region: BodyRegion,
        /// HP actually removed.
        amount: u32,
        overkill: u32,
        critical: bool,
    },
    Skill {
        skill: String,
        element: Element,
        region: BodyRegion,
        amount: u32,
        overkill: u32,
        critical: bool,
        resource_cost: u32,
    },
    Restoration {
        skill: String,
        effect: SkillEffect,
        amount: u32,
        resource_cost: u32,
    },
    Miss {
        /// Skill name for a failed skill, `None` for a weapon attack.
        skill: Option<String>,
        element: Element,
        region: BodyRegion,
        blocked: bool,
    },
    Death {
        participant: ParticipantId,
        killer: Option<ParticipantId>,
    },
    System(SystemEvent),
}

impl LogPayload {
    pub fn log_type(&self) -> LogType {
        match self {
            Self::Attack { .. } => LogType::Attack,
            Self::Skill { .. } => LogType::Skill,
            Self::Restoration { .. } => LogType::Restoration,
            Self::Miss { .. } => LogType::Miss,
            Self::Death { .. } => LogType::Death,
            Self::System(_) => LogType::System,
        }
    }

    pub fn damage_amount(&self) -> u32 {
        match self {
            Self::Attack { amount, .. } | Self::Skill { amount, .. } => *amount,
            _ => 0,
        }
    }

    pub fn healing_amount(&self) -> u32 {
        match self {
            Self::Restoration {
                effect: SkillEffect::Heal,
                amount,
                ..
            } => *amount,
            _ => 0,
        }
    }

    pub fn element(&self) -> Option<Element> {
        match self {
            Self::Attack { element, .. } | Self::Skill { element, .. } | Self::Miss { element, .. } => {
                Some(*element)
            }
            _ => None,
        }
    }
}

impl From<SystemEvent> for LogPayload {
    fn from(event: SystemEvent) -> Self {
        Self::System(event)
    }
}

/// Immutable record of one resolved event.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatLogEntry {
    pub battle_id: BattleId,
    pub round_number: u32,
    pub sequence: u64,
    pub log_type: LogType,
    pub actor: Option<ParticipantId>,
    pub target: Option<ParticipantId>,
    pub damage_amount: u32,
    pub healing_amount: u32,
    pub message: String,
    pub tags: BTreeSet<String>,
    pub payload: LogPayload,
}

/// Entry under construction; the writer assigns battle, sequence and amounts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogDraft {
    pub round_number: u32,
    pub actor: Option<ParticipantId>,
    pub target: Option<ParticipantId>,
    pub message: String,
    pub tags: BTreeSet<String>,
    pub payload: LogPayload,
}

impl LogDraft {
    pub fn new(round_number: u32, payload: impl Into<LogPayload>) -> Self {
        let payload = payload.into();
        let mut tags = BTreeSet::new();
        if let Some(element) = payload.element() {
            tags.insert(format!("element:{element}"));
        }
        Self {
            round_number,
            actor: None,
            target: None,
            message: String::new(),
            tags,
            payload,
        }
    }

    pub fn actor(mut self, actor: ParticipantId) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn target(mut self, target: ParticipantId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }
}
