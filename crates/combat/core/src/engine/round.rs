//! Round Resolver.
//!
//! [`Resolution`] is one engine step running against a working copy of the
//! battle state. Every action goes through the same path in both modes:
//! roll through the [`DamageResolver`], validate the outcome, mutate the
//! store, append log entries, record the vitals change. A `death` entry is
//! appended the moment a participant's HP reaches zero.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::action::{ActionSelection, AttackAction, BlockAction, SkillAction, SkillEffect};
use crate::combat::{
    ActionDescriptor, AttackerView, DamageResolver, DefenderView, EffectKind, Outcome,
    ResolveRequest, action_nonce,
};
use crate::config::{CombatConfig, DefaultAction};
use crate::log::{LogDraft, LogPayload, SystemEvent};
use crate::state::{
    BattleMode, BattleResult, BattleState, GridPosition, Participant, ParticipantId, RoundRecord,
    Withdrawal,
};

use super::errors::{EngineError, InvariantViolation, StateError};
use super::outcome::OutcomeDetector;
use super::report::{VitalsChange, VitalsKind};

pub(crate) struct Resolution<'s> {
    pub(crate) state: &'s mut BattleState,
    pub(crate) config: &'s CombatConfig,
    resolver: &'s dyn DamageResolver,
    pub(crate) round: u32,
    slot: u32,
    pub(crate) vitals: Vec<VitalsChange>,
    pub(crate) withdrawn: Vec<ParticipantId>,
    pub(crate) outcome: Option<BattleResult>,
}

impl<'s> Resolution<'s> {
    pub(crate) fn new(
        state: &'s mut BattleState,
        config: &'s CombatConfig,
        resolver: &'s dyn DamageResolver,
    ) -> Self {
        let round = state.battle.round_number;
        Self {
            state,
            config,
            resolver,
            round,
            slot: 0,
            vitals: Vec::new(),
            withdrawn: Vec::new(),
            outcome: None,
        }
    }

    pub(crate) fn log(&mut self, draft: LogDraft) -> Result<u64, InvariantViolation> {
        self.state.log.append(draft)
    }

    pub(crate) fn participant(&self, id: ParticipantId) -> Result<&Participant, StateError> {
        self.state
            .participants
            .get(id)
            .ok_or(StateError::UnknownParticipant { participant: id })
    }

    pub(crate) fn participant_mut(
        &mut self,
        id: ParticipantId,
    ) -> Result<&mut Participant, StateError> {
        self.state
            .participants
            .get_mut(id)
            .ok_or(StateError::UnknownParticipant { participant: id })
    }

    fn name(&self, id: ParticipantId) -> Result<String, StateError> {
        Ok(self.participant(id)?.name.clone())
    }

    fn team_tag(&self, id: ParticipantId) -> Result<String, StateError> {
        Ok(format!("team:{}", self.participant(id)?.team))
    }

    fn record_vitals(
        &mut self,
        id: ParticipantId,
        kind: VitalsKind,
        amount: u32,
    ) -> Result<(), StateError> {
        let participant = self.participant(id)?;
        let change = VitalsChange {
            participant: id,
            kind,
            amount,
            hp_after: participant.current_hp(),
            resource_after: participant.current_resource(),
        };
        self.vitals.push(change);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Withdraws participants that are not ready and activates the battle.
    pub(crate) fn start(&mut self, now: DateTime<Utc>) -> Result<(), EngineError> {
        let (ready, not_ready): (Vec<&Participant>, Vec<&Participant>) =
            self.state.participants.iter().partition(|p| p.ready);
        let ready: Vec<ParticipantId> = ready.into_iter().map(|p| p.id).collect();
        let not_ready: Vec<ParticipantId> = not_ready.into_iter().map(|p| p.id).collect();

        for id in not_ready {
            self.participant_mut(id)?.withdraw(Withdrawal::NotReady);
            let message = format!("{} was not ready and sits this battle out", self.name(id)?);
            self.log(
                LogDraft::new(self.round, SystemEvent::NotReady { participant: id })
                    .target(id)
                    .message(message),
            )?;
        }

        self.state.battle.activate(now)?;
        let order = self.state.participants.initiative_order();
        if self.state.battle.mode == BattleMode::AlternatingTurn {
            self.state.battle.current_actor = order.first().copied();
        }
        let message = format!("battle started with {} combatants", order.len());
        self.log(
            LogDraft::new(self.round, SystemEvent::BattleStarted { order })
                .message(message)
                .tag("lifecycle"),
        )?;
        self.state.history.push(RoundRecord::Start { ready });
        Ok(())
    }

    /// Completes the battle and writes the closing entry.
    ///
    /// Queued selections and guards are dropped: nothing is pending once the
    /// battle is over.
    pub(crate) fn finish(
        &mut self,
        result: BattleResult,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        self.state.battle.complete(result.clone(), now)?;
        for participant in self.state.participants.iter_mut() {
            participant.is_defending = false;
            participant.guard = None;
            participant.clear_pending();
        }
        self.log(
            LogDraft::new(self.round, SystemEvent::BattleEnded { result: result.clone() })
                .message(format!("battle over: {result}"))
                .tag("lifecycle"),
        )?;
        self.outcome = Some(result);
        Ok(())
    }

    /// Runs the Outcome Detector and completes the battle on a terminal result.
    pub(crate) fn conclude(
        &mut self,
        now: DateTime<Utc>,
        max_rounds: Option<u32>,
    ) -> Result<bool, EngineError> {
        let Some(result) = OutcomeDetector::evaluate(
            &self.state.participants,
            &self.withdrawn,
            self.round,
            max_rounds,
        ) else {
            return Ok(false);
        };

        let standing = self
            .state
            .participants
            .active_per_team()
            .values()
            .filter(|active| **active > 0)
            .count();
        if result == BattleResult::Draw && standing >= 2 {
            self.log(
                LogDraft::new(self.round, SystemEvent::RoundCapReached { rounds: self.round })
                    .message(format!("round limit of {} reached", self.round)),
            )?;
        }
        self.finish(result, now)?;
        Ok(true)
    }

    pub(crate) fn forfeit(
        &mut self,
        id: ParticipantId,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        self.participant_mut(id)?.withdraw(Withdrawal::Forfeited);
        self.withdrawn.push(id);
        let message = format!("{} forfeits", self.name(id)?);
        let team = self.team_tag(id)?;
        self.log(
            LogDraft::new(self.round, SystemEvent::Forfeited { participant: id })
                .actor(id)
                .message(message)
                .tag(team),
        )?;
        self.state.history.push(RoundRecord::Forfeit { participant: id });

        if self.conclude(now, None)? {
            return Ok(());
        }
        if self.state.battle.current_actor == Some(id) {
            self.pass_turn(id, now)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Simultaneous round
    // ---------------------------------------------------------------------

    /// Resolves every queued selection in initiative order.
    ///
    /// Participants without a submission get the configured timeout default
    /// and a `system` entry saying so.
    pub(crate) fn resolve_round(&mut self, now: DateTime<Utc>) -> Result<(), EngineError> {
        let round = self.round;
        let mut selections = BTreeMap::new();
        let mut defaulted = Vec::new();
        for participant in self.state.participants.iter().filter(|p| p.is_active()) {
            if participant.has_submitted {
                selections.insert(participant.id, participant.pending_selection());
            } else {
                defaulted.push(participant.id);
            }
        }

        let fallback = self.config.timeout_default;
        for &id in &defaulted {
            let message = match fallback {
                DefaultAction::Pass => format!("{} missed the deadline and passes", self.name(id)?),
                DefaultAction::Defend => {
                    format!("{} missed the deadline and defends", self.name(id)?)
                }
            };
            self.log(
                LogDraft::new(
                    round,
                    SystemEvent::AutoResolved {
                        participant: id,
                        default: fallback,
                    },
                )
                .actor(id)
                .message(message)
                .tag("timeout"),
            )?;
            if fallback == DefaultAction::Defend {
                self.defend(id)?;
            }
        }

        // Blocks cover the whole round, including faster attackers.
        for (&id, selection) in &selections {
            if let Some(block) = selection.blocks().next() {
                self.raise_guard(id, block)?;
            }
        }

        for id in self.state.participants.initiative_order() {
            if let Some(selection) = selections.get(&id) {
                self.execute(id, selection)?;
            }
        }

        self.close_round(true)?;
        self.state.history.push(RoundRecord::Round {
            round,
            selections,
            defaulted,
        });

        if !self.conclude(now, self.config.max_rounds)? {
            self.state.battle.round_number += 1;
        }
        Ok(())
    }

    /// Fatigue, regeneration and per-round cleanup.
    pub(crate) fn close_round(&mut self, clear_guards: bool) -> Result<(), EngineError> {
        let config = self.config;
        let fatigue = &config.fatigue;
        let mut regenerating = Vec::new();
        for participant in self.state.participants.iter_mut() {
            if clear_guards {
                participant.is_defending = false;
                participant.guard = None;
                participant.clear_pending();
            }
            if participant.is_alive() {
                let gained = participant.fatigue + fatigue.per_attack * participant.round_attacks;
                participant.fatigue = gained
                    .saturating_sub(fatigue.recovery_per_round)
                    .min(fatigue.max);
            }
            participant.round_attacks = 0;
            if participant.is_active() {
                regenerating.push(participant.id);
            }
        }

        let regen = config.resource_regen_per_round;
        if regen == 0 {
            return Ok(());
        }
        for id in regenerating {
            let restored = self.participant_mut(id)?.restore_resource(regen);
            if restored > 0 {
                self.record_vitals(id, VitalsKind::ResourceRestore, restored)?;
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Actions
    // ---------------------------------------------------------------------

    pub(crate) fn defend(&mut self, id: ParticipantId) -> Result<(), EngineError> {
        self.participant_mut(id)?.is_defending = true;
        let message = format!("{} takes a defensive stance", self.name(id)?);
        self.log(
            LogDraft::new(self.round, SystemEvent::Defending { participant: id })
                .actor(id)
                .message(message),
        )?;
        Ok(())
    }

    pub(crate) fn raise_guard(
        &mut self,
        id: ParticipantId,
        block: &BlockAction,
    ) -> Result<(), EngineError> {
        self.participant_mut(id)?.guard = Some(block.region);
        let message = format!("{} guards the {}", self.name(id)?, block.region);
        self.log(
            LogDraft::new(
                self.round,
                SystemEvent::Blocking {
                    participant: id,
                    region: block.region,
                },
            )
            .actor(id)
            .message(message)
            .tag(format!("region:{}", block.region)),
        )?;
        Ok(())
    }

    /// Executes a validated selection. Blocks are raised by the caller.
    pub(crate) fn execute(
        &mut self,
        actor: ParticipantId,
        selection: &ActionSelection,
    ) -> Result<(), EngineError> {
        if !self.participant(actor)?.is_active() {
            return Ok(());
        }
        if selection.wants_to_flee() {
            return self.flee(actor);
        }
        if let Some(movement) = selection.movement() {
            self.move_to(actor, movement.to)?;
        }
        for attack in selection.attacks() {
            self.attack(actor, attack)?;
        }
        for skill in selection.skills() {
            self.skill(actor, skill)?;
        }
        Ok(())
    }

    fn flee(&mut self, id: ParticipantId) -> Result<(), EngineError> {
        self.participant_mut(id)?.withdraw(Withdrawal::Fled);
        self.withdrawn.push(id);
        let message = format!("{} flees the battle", self.name(id)?);
        let team = self.team_tag(id)?;
        self.log(
            LogDraft::new(self.round, SystemEvent::Fled { participant: id })
                .actor(id)
                .message(message)
                .tag(team)
                .tag("flee"),
        )?;
        Ok(())
    }

    fn move_to(&mut self, id: ParticipantId, to: GridPosition) -> Result<(), EngineError> {
        let participant = self.participant_mut(id)?;
        let from = participant.position.unwrap_or(to);
        participant.position = Some(to);
        let message = format!("{} moves from {from} to {to}", self.name(id)?);
        self.log(
            LogDraft::new(self.round, SystemEvent::Moved { participant: id, from, to })
                .actor(id)
                .message(message),
        )?;
        Ok(())
    }

    /// Logs and returns false when the target left the fight earlier.
    fn target_available(
        &mut self,
        actor: ParticipantId,
        target: ParticipantId,
    ) -> Result<bool, EngineError> {
        if self.participant(target)?.is_active() {
            return Ok(true);
        }
        let message = format!(
            "{}'s target {} is no longer in the fight",
            self.name(actor)?,
            self.name(target)?
        );
        self.log(
            LogDraft::new(self.round, SystemEvent::TargetUnavailable { actor, target })
                .actor(actor)
                .target(target)
                .message(message),
        )?;
        Ok(false)
    }

    fn roll(
        &mut self,
        actor: ParticipantId,
        target: ParticipantId,
        action: ActionDescriptor,
    ) -> Result<Outcome, EngineError> {
        self.slot += 1;
        let attacker = self.participant(actor)?;
        let defender = self.participant(target)?;
        let request = ResolveRequest {
            attacker: AttackerView {
                id: attacker.id,
                stats: &attacker.stats,
                fatigue: attacker.fatigue,
            },
            defender: DefenderView {
                id: defender.id,
                stats: &defender.stats,
                is_defending: defender.is_defending,
                block: defender.guard,
                current_hp: defender.current_hp(),
                max_hp: defender.max_hp(),
            },
            action,
            battle_seed: self.state.battle.seed,
            nonce: action_nonce(self.round, self.slot),
        };
        let outcome = self.resolver.resolve(&request);
        outcome.validate()?;
        Ok(outcome)
    }

    fn attack(&mut self, actor: ParticipantId, attack: &AttackAction) -> Result<(), EngineError> {
        self.participant_mut(actor)?.round_attacks += 1;
        if !self.target_available(actor, attack.target)? {
            return Ok(());
        }
        let outcome = self.roll(
            actor,
            attack.target,
            ActionDescriptor {
                kind: EffectKind::Strike,
                element: attack.element,
                region: attack.region,
                potency: attack.potency,
            },
        )?;
        self.land(actor, attack.target, outcome, None)
    }

    fn skill(&mut self, actor: ParticipantId, skill: &SkillAction) -> Result<(), EngineError> {
        if !self.target_available(actor, skill.target)? {
            return Ok(());
        }
        if skill.resource_cost > 0 {
            self.participant_mut(actor)?.spend_resource(skill.resource_cost)?;
            self.record_vitals(actor, VitalsKind::ResourceUse, skill.resource_cost)?;
        }

        match skill.effect {
            SkillEffect::Damage => {
                let outcome = self.roll(
                    actor,
                    skill.target,
                    ActionDescriptor {
                        kind: EffectKind::Spell,
                        element: skill.element,
                        region: skill.region,
                        potency: skill.potency,
                    },
                )?;
                self.land(actor, skill.target, outcome, Some(skill))
            }
            SkillEffect::Heal => {
                let outcome = self.roll(
                    actor,
                    skill.target,
                    ActionDescriptor {
                        kind: EffectKind::Heal,
                        element: skill.element,
                        region: skill.region,
                        potency: skill.potency,
                    },
                )?;
                let restored = self.participant_mut(skill.target)?.heal(outcome.amount)?;
                self.participant_mut(actor)?.counters.healing_done += u64::from(restored);
                self.restoration(actor, skill, restored, VitalsKind::Heal)
            }
            SkillEffect::RestoreResource => {
                self.slot += 1;
                let restored = self
                    .participant_mut(skill.target)?
                    .restore_resource(skill.potency);
                self.restoration(actor, skill, restored, VitalsKind::ResourceRestore)
            }
        }
    }

    fn restoration(
        &mut self,
        actor: ParticipantId,
        skill: &SkillAction,
        amount: u32,
        kind: VitalsKind,
    ) -> Result<(), EngineError> {
        let what = if kind == VitalsKind::Heal { "hp" } else { "resource" };
        let message = format!(
            "{} uses {} on {}, restoring {amount} {what}",
            self.name(actor)?,
            skill.skill,
            self.name(skill.target)?
        );
        let team = self.team_tag(actor)?;
        self.log(
            LogDraft::new(
                self.round,
                LogPayload::Restoration {
                    skill: skill.skill.clone(),
                    effect: skill.effect,
                    amount,
                    resource_cost: skill.resource_cost,
                },
            )
            .actor(actor)
            .target(skill.target)
            .message(message)
            .tag(team)
            .tag(format!("skill:{}", skill.skill)),
        )?;
        self.record_vitals(skill.target, kind, amount)?;
        Ok(())
    }

    /// Applies a resolved damaging outcome and writes its entries.
    fn land(
        &mut self,
        actor: ParticipantId,
        target: ParticipantId,
        outcome: Outcome,
        skill: Option<&SkillAction>,
    ) -> Result<(), EngineError> {
        let actor_name = self.name(actor)?;
        let target_name = self.name(target)?;
        let team = self.team_tag(actor)?;
        let region_tag = format!("region:{}", outcome.region);

        if !outcome.landed() {
            self.participant_mut(actor)?.counters.misses += 1;
            if outcome.blocked {
                self.participant_mut(target)?.counters.hits_blocked += 1;
            }
            let message = if outcome.blocked {
                format!("{target_name} blocks {actor_name}'s blow to the {}", outcome.region)
            } else {
                format!("{actor_name} misses {target_name}")
            };
            let mut draft = LogDraft::new(
                self.round,
                LogPayload::Miss {
                    skill: skill.map(|s| s.skill.clone()),
                    element: outcome.element,
                    region: outcome.region,
                    blocked: outcome.blocked,
                },
            )
            .actor(actor)
            .target(target)
            .message(message)
            .tag(team)
            .tag(region_tag);
            if outcome.blocked {
                draft = draft.tag("blocked");
            }
            self.log(draft)?;
            return Ok(());
        }

        let round = self.round;
        let hit = self.participant_mut(target)?.apply_damage(
            outcome.amount,
            outcome.element,
            outcome.region,
            round,
        )?;
        {
            let counters = &mut self.participant_mut(actor)?.counters;
            *counters.damage_dealt.entry(outcome.element).or_default() += u64::from(hit.applied);
            counters.hits_landed += 1;
            if outcome.critical {
                counters.criticals += 1;
            }
            if hit.died {
                counters.kills += 1;
            }
        }

        let payload = match skill {
            None => LogPayload::Attack {
                element: outcome.element,
                region: outcome.region,
                amount: hit.applied,
                overkill: hit.overkill,
                critical: outcome.critical,
            },
            Some(skill) => LogPayload::Skill {
                skill: skill.skill.clone(),
                element: outcome.element,
                region: outcome.region,
                amount: hit.applied,
                overkill: hit.overkill,
                critical: outcome.critical,
                resource_cost: skill.resource_cost,
            },
        };
        let how = skill.map_or_else(|| "hits".to_string(), |s| format!("casts {} on", s.skill));
        let mut message = format!(
            "{actor_name} {how} {target_name} in the {} for {} {} damage",
            outcome.region, hit.applied, outcome.element
        );
        if outcome.critical {
            message.push_str(" (critical)");
        }
        let mut draft = LogDraft::new(self.round, payload)
            .actor(actor)
            .target(target)
            .message(message)
            .tag(team)
            .tag(region_tag);
        if outcome.critical {
            draft = draft.tag("critical");
        }
        if hit.overkill > 0 {
            draft = draft.tag("overkill");
        }
        self.log(draft)?;
        self.record_vitals(target, VitalsKind::Damage, hit.applied)?;

        if hit.died {
            let target_team = self.team_tag(target)?;
            self.log(
                LogDraft::new(
                    self.round,
                    LogPayload::Death {
                        participant: target,
                        killer: Some(actor),
                    },
                )
                .actor(actor)
                .target(target)
                .message(format!("{target_name} falls to {actor_name}"))
                .tag(target_team),
            )?;
            self.record_vitals(target, VitalsKind::Death, 0)?;
        }
        Ok(())
    }
}
