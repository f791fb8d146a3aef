//! Alternating-turn resolution: one actor per turn, in initiative order.

use chrono::{DateTime, Utc};

use crate::log::{LogDraft, SystemEvent};
use crate::state::{BattleResult, ParticipantId, ParticipantStore, RoundRecord};

use super::errors::{EngineError, StateError};
use super::round::Resolution;

/// Every participant in initiative order, active or not.
///
/// Positions in this list stay fixed for the whole battle, which is what the
/// turn pointer walks over.
fn seating(store: &ParticipantStore) -> Vec<ParticipantId> {
    let mut seats: Vec<(i32, ParticipantId)> = store.iter().map(|p| (p.initiative, p.id)).collect();
    seats.sort_by(|(ia, a), (ib, b)| ib.cmp(ia).then(a.cmp(b)));
    seats.into_iter().map(|(_, id)| id).collect()
}

impl Resolution<'_> {
    /// Resolves the current actor's turn.
    ///
    /// A queued selection executes even when the turn timed out; without one
    /// the turn passes. The guard raised on the actor's previous turn lapses
    /// here.
    pub(crate) fn take_turn(
        &mut self,
        actor: ParticipantId,
        timed_out: bool,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let round = self.round;
        let queued = {
            let participant = self.participant_mut(actor)?;
            participant.guard = None;
            participant.is_defending = false;
            participant
                .has_submitted
                .then(|| participant.pending_selection())
        };

        let name = self.participant(actor)?.name.clone();
        if timed_out {
            self.log(
                LogDraft::new(round, SystemEvent::TurnTimedOut { participant: actor })
                    .actor(actor)
                    .message(format!("{name} ran out of time"))
                    .tag("timeout"),
            )?;
        }

        match &queued {
            Some(selection) => {
                if let Some(block) = selection.blocks().next() {
                    self.raise_guard(actor, block)?;
                }
                self.execute(actor, selection)?;
            }
            None => {
                self.log(
                    LogDraft::new(round, SystemEvent::TurnPassed { participant: actor })
                        .actor(actor)
                        .message(format!("{name} passes")),
                )?;
            }
        }
        self.participant_mut(actor)?.clear_pending();

        self.state.history.push(RoundRecord::Turn {
            round,
            actor,
            selection: queued,
            timed_out,
        });

        if self.conclude(now, None)? {
            return Ok(());
        }
        self.pass_turn(actor, now)
    }

    /// Moves the turn pointer to the next active participant after `from`.
    ///
    /// Wrapping past the end of the seating closes the round.
    pub(crate) fn pass_turn(
        &mut self,
        from: ParticipantId,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let seats = seating(&self.state.participants);
        let position = seats
            .iter()
            .position(|id| *id == from)
            .ok_or(StateError::UnknownParticipant { participant: from })?;

        let store = &self.state.participants;
        let is_active = |id: &&ParticipantId| store.get(**id).is_some_and(|p| p.is_active());
        let next = match seats[position + 1..].iter().find(is_active) {
            Some(id) => Some((*id, false)),
            None => seats[..=position].iter().find(is_active).map(|id| (*id, true)),
        };

        let Some((next, wrapped)) = next else {
            self.state.battle.current_actor = None;
            return Ok(());
        };

        if wrapped {
            self.close_round(false)?;
            if let Some(cap) = self.config.max_rounds
                && self.round >= cap
            {
                let rounds = self.round;
                self.log(
                    LogDraft::new(rounds, SystemEvent::RoundCapReached { rounds })
                        .message(format!("round limit of {rounds} reached")),
                )?;
                return self.finish(BattleResult::Draw, now);
            }
            self.state.battle.round_number += 1;
            self.round = self.state.battle.round_number;
        }
        self.state.battle.current_actor = Some(next);
        Ok(())
    }
}
