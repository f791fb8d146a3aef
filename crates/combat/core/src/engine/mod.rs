//! Battle engine: the pure, synchronous state machine behind one battle.
//!
//! [`BattleEngine`] borrows a [`BattleState`] mutably for the duration of one
//! operation. Every mutating operation runs against a working copy and
//! commits only when the whole step succeeded, so readers see either the
//! pre-step or the fully post-step state. An [`InvariantViolation`] discards
//! the working copy.
//!
//! Timers, channels and publishing live in the runtime; this module only
//! takes `now` as an argument.

mod errors;
mod outcome;
mod replay;
mod report;
mod round;
mod turns;

use chrono::{DateTime, Utc};

pub use errors::{EngineError, InvariantViolation, StateError};
pub use outcome::OutcomeDetector;
pub use replay::replay;
pub use report::{RoundReport, VitalsChange, VitalsKind};

use crate::action::{
    ActionBudget, ActionSelection, BudgetCalculator, CostBreakdown, DroppedSkill,
    GridBudgetCalculator,
};
use crate::combat::DamageResolver;
use crate::config::CombatConfig;
use crate::state::{
    BattleMode, BattleResult, BattleState, BattleStatus, ParticipantId, RoundRecord, Team,
};

use round::Resolution;

/// Acknowledgement of an accepted selection.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubmitReceipt {
    pub cost: CostBreakdown,
    pub resource_cost: u32,
    pub dropped_skills: Vec<DroppedSkill>,
    pub dropped_blocks: usize,
    /// Simultaneous mode: every active participant has now submitted.
    pub round_ready: bool,
}

pub struct BattleEngine<'a> {
    state: &'a mut BattleState,
    config: &'a CombatConfig,
    resolver: &'a dyn DamageResolver,
}

impl<'a> BattleEngine<'a> {
    pub fn new(
        state: &'a mut BattleState,
        config: &'a CombatConfig,
        resolver: &'a dyn DamageResolver,
    ) -> Self {
        Self {
            state,
            config,
            resolver,
        }
    }

    pub fn state(&self) -> &BattleState {
        self.state
    }

    fn ensure_active(&self) -> Result<(), StateError> {
        let status = self.state.battle.status();
        if status != BattleStatus::Active {
            return Err(StateError::BattleNotActive { status });
        }
        Ok(())
    }

    fn active_participant(&self, id: ParticipantId) -> Result<(), StateError> {
        let participant = self
            .state
            .participants
            .get(id)
            .ok_or(StateError::UnknownParticipant { participant: id })?;
        if !participant.is_active() {
            return Err(StateError::ParticipantInactive { participant: id });
        }
        Ok(())
    }

    /// Runs one step on a working copy and commits it on success.
    fn transact(
        &mut self,
        step: impl FnOnce(&mut Resolution<'_>) -> Result<(), EngineError>,
    ) -> Result<RoundReport, EngineError> {
        let mut working = self.state.clone();
        let since = working.log.last_sequence().unwrap_or(0);

        let (round, vitals, outcome) = {
            let mut resolution = Resolution::new(&mut working, self.config, self.resolver);
            step(&mut resolution)?;
            (resolution.round, resolution.vitals, resolution.outcome)
        };

        working.participants.check_invariants()?;
        working.battle.initiative_order = working.participants.initiative_order();

        let report = RoundReport {
            round,
            entries: working.log.since(since).to_vec(),
            vitals,
            outcome,
            next_actor: working.battle.current_actor,
        };
        *self.state = working;
        Ok(report)
    }

    // ---------------------------------------------------------------------
    // Readiness
    // ---------------------------------------------------------------------

    fn ready_roster(&self) -> (usize, usize) {
        let ready: Vec<&Team> = self
            .state
            .participants
            .iter()
            .filter(|p| p.ready)
            .map(|p| &p.team)
            .collect();
        let mut teams = ready.clone();
        teams.sort();
        teams.dedup();
        (ready.len(), teams.len())
    }

    /// True once enough participants on at least two teams are ready.
    pub fn can_start(&self) -> bool {
        let (ready, teams) = self.ready_roster();
        ready >= self.config.min_participants.max(2) && teams >= 2
    }

    /// Marks a participant ready; returns whether the battle can now start.
    pub fn mark_ready(&mut self, id: ParticipantId) -> Result<bool, EngineError> {
        if self.state.battle.status() != BattleStatus::Pending {
            return Err(StateError::AlreadyStarted.into());
        }
        self.state
            .participants
            .get_mut(id)
            .ok_or(StateError::UnknownParticipant { participant: id })?
            .ready = true;
        Ok(self.can_start())
    }

    /// `pending -> active`. Participants still not ready are withdrawn.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<RoundReport, EngineError> {
        if self.state.battle.status() != BattleStatus::Pending {
            return Err(StateError::AlreadyStarted.into());
        }
        if !self.can_start() {
            return Err(StateError::RosterTooSmall {
                required: self.config.min_participants.max(2),
                ready: self.ready_roster().0,
            }
            .into());
        }
        self.transact(|step| step.start(now))
    }

    // ---------------------------------------------------------------------
    // Submissions
    // ---------------------------------------------------------------------

    /// Validates and queues a selection, replacing any earlier one.
    ///
    /// A rejected selection leaves the previously queued one untouched.
    pub fn submit(
        &mut self,
        id: ParticipantId,
        selection: &ActionSelection,
    ) -> Result<SubmitReceipt, EngineError> {
        self.ensure_active()?;
        self.active_participant(id)?;

        let battle = &self.state.battle;
        if battle.mode == BattleMode::AlternatingTurn && battle.current_actor != Some(id) {
            return Err(StateError::OutOfTurn {
                participant: id,
                current: battle.current_actor,
            }
            .into());
        }

        let verdict = {
            let store = &self.state.participants;
            let actor = store
                .get(id)
                .ok_or(StateError::UnknownParticipant { participant: id })?;
            let calculator = BudgetCalculator::for_battle(self.config, battle);
            if battle.mode == BattleMode::AlternatingTurn && actor.position.is_some() {
                GridBudgetCalculator::new(calculator).evaluate(selection, actor, store)?
            } else {
                calculator.evaluate(selection, actor, store)?
            }
        };

        self.state
            .participants
            .get_mut(id)
            .ok_or(StateError::UnknownParticipant { participant: id })?
            .queue(&verdict.selection);

        Ok(SubmitReceipt {
            cost: verdict.cost,
            resource_cost: verdict.resource_cost,
            dropped_skills: verdict.dropped_skills,
            dropped_blocks: verdict.dropped_blocks,
            round_ready: self.is_round_ready(),
        })
    }

    /// Queues an already-validated selection (replay).
    pub(crate) fn requeue(
        &mut self,
        id: ParticipantId,
        selection: &ActionSelection,
    ) -> Result<(), EngineError> {
        self.ensure_active()?;
        self.state
            .participants
            .get_mut(id)
            .ok_or(StateError::UnknownParticipant { participant: id })?
            .queue(selection);
        Ok(())
    }

    /// Simultaneous mode: every active participant has a queued selection.
    pub fn is_round_ready(&self) -> bool {
        self.state.battle.is_active()
            && self.state.battle.mode == BattleMode::SimultaneousRound
            && self.state.participants.awaiting_submission().is_empty()
    }

    /// Participants the open round is still waiting on.
    pub fn awaiting(&self) -> Vec<ParticipantId> {
        self.state.participants.awaiting_submission()
    }

    // ---------------------------------------------------------------------
    // Resolution
    // ---------------------------------------------------------------------

    /// Resolves the open simultaneous round, ready or not (deadline path).
    pub fn resolve_round(&mut self, now: DateTime<Utc>) -> Result<RoundReport, EngineError> {
        self.ensure_active()?;
        if self.state.battle.mode != BattleMode::SimultaneousRound {
            return Err(StateError::NotSimultaneous.into());
        }
        self.transact(|step| step.resolve_round(now))
    }

    /// Ends `id`'s turn in alternating mode, executing whatever is queued.
    pub fn advance_turn(
        &mut self,
        id: ParticipantId,
        timed_out: bool,
        now: DateTime<Utc>,
    ) -> Result<RoundReport, EngineError> {
        self.ensure_active()?;
        let battle = &self.state.battle;
        if battle.mode != BattleMode::AlternatingTurn {
            return Err(StateError::NotAlternating.into());
        }
        if battle.current_actor != Some(id) {
            return Err(StateError::OutOfTurn {
                participant: id,
                current: battle.current_actor,
            }
            .into());
        }
        self.transact(|step| step.take_turn(id, timed_out, now))
    }

    /// Withdraws a participant for good.
    pub fn forfeit(
        &mut self,
        id: ParticipantId,
        now: DateTime<Utc>,
    ) -> Result<RoundReport, EngineError> {
        self.ensure_active()?;
        self.active_participant(id)?;
        self.transact(|step| step.forfeit(id, now))
    }

    /// Moderator override: completes a pending or active battle immediately.
    pub fn cancel(
        &mut self,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<RoundReport, EngineError> {
        let status = self.state.battle.status();
        if status == BattleStatus::Completed {
            return Err(StateError::BattleNotActive { status }.into());
        }
        let reason = reason.into();
        self.transact(|step| {
            step.state
                .history
                .push(RoundRecord::Cancel { reason: reason.clone() });
            step.finish(BattleResult::Cancelled { reason }, now)
        })
    }
}
