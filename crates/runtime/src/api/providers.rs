//! Asynchronous abstraction for sourcing AI stand-in selections.
//!
//! Participants flagged `Controller::Ai` get their selection from an
//! [`ActionProvider`] whenever a round or turn opens. Human participants
//! submit through [`super::BattleHandle`] instead.
use async_trait::async_trait;
use combat_core::{
    ActionBudget, ActionSelection, AttackAction, AttackTemplate, BattleMode, BattleState,
    BlockAction, BodyRegion, BudgetCalculator, CombatConfig, GridBudgetCalculator, GridPosition,
    Participant, ParticipantId, SkillEffect,
};

use super::errors::{Result, RuntimeError};

/// Trait for providing selections based on the current battle state.
///
/// Different implementations can handle:
/// - AI stand-ins
/// - Scripted/replayed selections
/// - Testing fixtures
#[async_trait]
pub trait ActionProvider: Send + Sync {
    /// Provide a selection for `participant` from a read-only snapshot.
    ///
    /// An error leaves the participant on the timeout-default path.
    async fn provide_selection(
        &self,
        participant: ParticipantId,
        state: &BattleState,
        config: &CombatConfig,
    ) -> Result<ActionSelection>;
}

/// A provider that always passes.
/// Useful for testing or as a fallback.
pub struct PassProvider;

#[async_trait]
impl ActionProvider for PassProvider {
    async fn provide_selection(
        &self,
        _participant: ParticipantId,
        _state: &BattleState,
        _config: &CombatConfig,
    ) -> Result<ActionSelection> {
        Ok(ActionSelection::pass())
    }
}

/// Straightforward stand-in: heal when low, otherwise hit the weakest enemy.
///
/// Only the actor's loadout is drawn from. Every addition is checked with
/// the engine's own budget calculator, so the result is always accepted on
/// submission.
#[derive(Debug, Clone)]
pub struct AggressiveProvider {
    /// HP percentage below which a known heal is preferred.
    pub heal_below_percent: u32,
}

impl Default for AggressiveProvider {
    fn default() -> Self {
        Self { heal_below_percent: 35 }
    }
}

impl AggressiveProvider {
    fn fits(
        selection: &ActionSelection,
        actor: &Participant,
        state: &BattleState,
        config: &CombatConfig,
    ) -> bool {
        let calculator = BudgetCalculator::for_battle(config, &state.battle);
        let grid = state.battle.mode == BattleMode::AlternatingTurn && actor.position.is_some();
        let verdict = if grid {
            GridBudgetCalculator::new(calculator).evaluate(selection, actor, &state.participants)
        } else {
            calculator.evaluate(selection, actor, &state.participants)
        };
        verdict.is_ok_and(|verdict| verdict.dropped_skills.is_empty())
    }

    fn weakest_enemy<'s>(actor: &Participant, state: &'s BattleState) -> Option<&'s Participant> {
        state
            .participants
            .iter()
            .filter(|p| p.is_active() && p.team != actor.team)
            .min_by_key(|p| (p.current_hp(), p.id))
    }

    /// Free cell within move range that ends closest to `target`.
    fn approach(
        actor: &Participant,
        target: GridPosition,
        reach: u32,
        state: &BattleState,
        config: &CombatConfig,
    ) -> Option<GridPosition> {
        let origin = actor.position?;
        if origin.distance(target) <= reach {
            return None;
        }
        let range = actor.move_range as i32;
        let mut best: Option<(u32, u32, GridPosition)> = None;
        for dx in -range..=range {
            for dy in -range..=range {
                let cell = GridPosition::new(origin.x + dx, origin.y + dy);
                let inside = cell.x >= 0
                    && cell.y >= 0
                    && (cell.x as u32) < config.grid.width
                    && (cell.y as u32) < config.grid.height;
                if !inside || cell == origin || state.participants.occupant(cell).is_some() {
                    continue;
                }
                let key = (cell.distance(target), origin.distance(cell), cell);
                if best.is_none_or(|current| key < current) {
                    best = Some(key);
                }
            }
        }
        best.map(|(_, _, cell)| cell)
    }

    fn choose(
        &self,
        actor: &Participant,
        state: &BattleState,
        config: &CombatConfig,
    ) -> ActionSelection {
        let mut selection = ActionSelection::pass();

        let wounded = actor.current_hp() * 100 < actor.max_hp() * self.heal_below_percent;
        if wounded {
            let heal = actor
                .loadout
                .skills
                .iter()
                .find(|skill| skill.effect == SkillEffect::Heal);
            if let Some(heal) = heal {
                let candidate = selection.clone().skill(heal.aim(actor.id));
                if Self::fits(&candidate, actor, state, config) {
                    selection = candidate;
                }
            }
        }

        let Some(target) = Self::weakest_enemy(actor, state) else {
            return selection;
        };

        let attacks: &[AttackTemplate] = &actor.loadout.attacks;

        if state.battle.mode == BattleMode::AlternatingTurn
            && let (Some(at), Some(first)) = (target.position, attacks.first())
            && let Some(cell) = Self::approach(actor, at, first.reach, state, config)
        {
            let candidate = selection.clone().move_to(cell);
            if Self::fits(&candidate, actor, state, config) {
                selection = candidate;
            }
        }

        // Keep adding strikes until the budget (penalty included) says no.
        let mut added = true;
        while added {
            added = false;
            for template in attacks {
                let strike: AttackAction = template.aim(target.id, BodyRegion::Torso);
                let candidate = selection.clone().attack(strike);
                if Self::fits(&candidate, actor, state, config) {
                    selection = candidate;
                    added = true;
                    break;
                }
            }
        }

        if actor.loadout.block_cost > 0 {
            let candidate = selection
                .clone()
                .block(BlockAction::new(BodyRegion::Torso));
            if Self::fits(&candidate, actor, state, config) {
                selection = candidate;
            }
        }
        selection
    }
}

#[async_trait]
impl ActionProvider for AggressiveProvider {
    async fn provide_selection(
        &self,
        participant: ParticipantId,
        state: &BattleState,
        config: &CombatConfig,
    ) -> Result<ActionSelection> {
        let actor = state
            .participants
            .get(participant)
            .ok_or_else(|| RuntimeError::Provider {
                participant,
                reason: "not on the roster".into(),
            })?;
        Ok(self.choose(actor, state, config))
    }
}
