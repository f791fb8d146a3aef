//! Action Budget Calculator.
//!
//! Computes what a selection costs and decides whether it fits the per-round
//! budget. Validation order:
//!
//! 1. extra blocks are truncated or rejected per [`ExtraBlockPolicy`]
//! 2. attacks and skills are looked up in the actor's loadout and priced
//!    from the template
//! 3. targets are checked (alive, active, damage aimed at another team)
//! 4. skills the resource pool cannot pay for are dropped individually
//! 5. action points are summed (attacks + block + skills + movement + penalty)
//! 6. the total is compared with `action_points_per_turn`
//!
//! Sums saturate, so an absurd template cost lands on `u32::MAX` and fails
//! the budget comparison.
//!
//! A rejected selection is never applied; the caller keeps whatever was
//! queued before.

use crate::config::{CombatConfig, ExtraBlockPolicy};
use crate::state::{Battle, Participant, ParticipantId, ParticipantStore};

use super::error::ValidationError;
use super::types::{ActionSelection, BlockAction, CombatAction, SkillEffect};

/// Itemised action-point cost of an accepted selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CostBreakdown {
    pub attacks: u32,
    pub block: u32,
    pub skills: u32,
    pub movement: u32,
    pub penalty: u32,
    pub total: u32,
}

/// Skill removed from a selection without rejecting the rest of it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DroppedSkill {
    pub skill: String,
    pub reason: ValidationError,
}

/// Accepted selection, normalised, with its cost.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BudgetVerdict {
    /// What will actually be queued (extra blocks and unaffordable skills removed).
    pub selection: ActionSelection,
    pub cost: CostBreakdown,
    pub resource_cost: u32,
    pub dropped_skills: Vec<DroppedSkill>,
    pub dropped_blocks: usize,
}

/// Seam between the round resolver and budget validation.
///
/// Simultaneous battles use [`BudgetCalculator`]; tactical battles use the
/// position-aware [`super::GridBudgetCalculator`] wrapped around it.
pub trait ActionBudget {
    fn evaluate(
        &self,
        selection: &ActionSelection,
        actor: &Participant,
        store: &ParticipantStore,
    ) -> Result<BudgetVerdict, ValidationError>;
}

/// Budget rules for battles without a grid.
#[derive(Clone, Copy, Debug)]
pub struct BudgetCalculator<'a> {
    config: &'a CombatConfig,
    action_points_per_turn: u32,
    max_resource_per_turn: u32,
}

impl<'a> BudgetCalculator<'a> {
    pub fn new(config: &'a CombatConfig) -> Self {
        Self {
            config,
            action_points_per_turn: config.action_points_per_turn,
            max_resource_per_turn: config.max_resource_per_turn,
        }
    }

    /// Uses the budgets frozen on the battle record.
    pub fn for_battle(config: &'a CombatConfig, battle: &Battle) -> Self {
        Self {
            config,
            action_points_per_turn: battle.action_points_per_turn,
            max_resource_per_turn: battle.max_resource_per_turn,
        }
    }

    pub fn config(&self) -> &'a CombatConfig {
        self.config
    }

    pub fn action_points_per_turn(&self) -> u32 {
        self.action_points_per_turn
    }

    /// Core cost computation; `extra_cost` is added by position-aware callers
    /// (movement) before the budget comparison.
    pub(crate) fn compute_cost(
        &self,
        selection: &ActionSelection,
        actor: &Participant,
        store: &ParticipantStore,
        extra_cost: u32,
    ) -> Result<BudgetVerdict, ValidationError> {
        // Fleeing replaces everything else the participant selected.
        if selection.wants_to_flee() {
            return Ok(BudgetVerdict {
                selection: ActionSelection::pass().flee(),
                cost: CostBreakdown::default(),
                resource_cost: 0,
                dropped_skills: Vec::new(),
                dropped_blocks: 0,
            });
        }

        let block_count = selection.blocks().count();
        if block_count > 1 && self.config.extra_block_policy == ExtraBlockPolicy::Reject {
            return Err(ValidationError::TooManyBlocks { count: block_count });
        }

        let mut normalized = Vec::with_capacity(selection.actions.len());
        let mut cost = CostBreakdown {
            movement: extra_cost,
            ..CostBreakdown::default()
        };
        let mut block_seen = false;
        let mut dropped_blocks = 0;
        let mut dropped_skills = Vec::new();
        let mut resource_left = self.max_resource_per_turn.min(actor.current_resource());
        let mut resource_cost = 0;
        let mut attack_count = 0;

        for action in &selection.actions {
            match action {
                CombatAction::Attack(attack) => {
                    let template = actor.loadout.attack(&attack.attack).ok_or_else(|| {
                        ValidationError::UnknownAttack { attack: attack.attack.clone() }
                    })?;
                    Self::check_attack_target(actor, store, attack.target)?;
                    cost.attacks = cost.attacks.saturating_add(template.cost);
                    attack_count += 1;
                    let priced = template.aim(attack.target, attack.region);
                    normalized.push(CombatAction::Attack(priced));
                }
                CombatAction::Block(block) => {
                    if block_seen {
                        dropped_blocks += 1;
                        continue;
                    }
                    block_seen = true;
                    cost.block = actor.loadout.block_cost;
                    normalized.push(CombatAction::Block(BlockAction {
                        region: block.region,
                        cost: actor.loadout.block_cost,
                    }));
                }
                CombatAction::Skill(skill) => {
                    let template = actor.loadout.skill(&skill.skill).ok_or_else(|| {
                        ValidationError::UnknownSkill { skill: skill.skill.clone() }
                    })?;
                    let skill = template.price(skill.clone());
                    if skill.effect == SkillEffect::Damage {
                        Self::check_attack_target(actor, store, skill.target)?;
                    } else {
                        Self::check_skill_target(store, skill.target)?;
                    }
                    if skill.resource_cost > resource_left {
                        dropped_skills.push(DroppedSkill {
                            skill: skill.skill.clone(),
                            reason: ValidationError::InsufficientResource {
                                skill: skill.skill,
                                required: template.resource_cost,
                                available: resource_left,
                            },
                        });
                        continue;
                    }
                    resource_left -= skill.resource_cost;
                    resource_cost += skill.resource_cost;
                    cost.skills = cost.skills.saturating_add(skill.cost);
                    normalized.push(CombatAction::Skill(skill));
                }
                // Position-aware callers strip moves before delegating here.
                CombatAction::Move(_) => return Err(ValidationError::MovementNotAllowed),
                CombatAction::Flee => {}
            }
        }

        cost.penalty = self.config.multi_attack_penalty.penalty_for(attack_count);
        cost.total = [cost.block, cost.skills, cost.movement, cost.penalty]
            .into_iter()
            .fold(cost.attacks, u32::saturating_add);

        if cost.total > self.action_points_per_turn {
            return Err(ValidationError::BudgetExceeded {
                cost: cost.total,
                budget: self.action_points_per_turn,
            });
        }

        Ok(BudgetVerdict {
            selection: ActionSelection::new(normalized),
            cost,
            resource_cost,
            dropped_skills,
            dropped_blocks,
        })
    }

    fn check_attack_target(
        actor: &Participant,
        store: &ParticipantStore,
        target: ParticipantId,
    ) -> Result<(), ValidationError> {
        let defender = Self::check_skill_target(store, target)?;
        if defender.team == actor.team {
            return Err(ValidationError::FriendlyTarget { target });
        }
        Ok(())
    }

    fn check_skill_target(
        store: &ParticipantStore,
        target: ParticipantId,
    ) -> Result<&Participant, ValidationError> {
        let participant = store
            .get(target)
            .ok_or(ValidationError::UnknownTarget { target })?;
        if !participant.is_active() {
            return Err(ValidationError::TargetUnavailable { target });
        }
        Ok(participant)
    }
}

impl ActionBudget for BudgetCalculator<'_> {
    fn evaluate(
        &self,
        selection: &ActionSelection,
        actor: &Participant,
        store: &ParticipantStore,
    ) -> Result<BudgetVerdict, ValidationError> {
        self.compute_cost(selection, actor, store, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{AttackAction, BlockAction, BodyRegion, Element, SkillAction, SkillEffect};
    use crate::config::PenaltyCurve;
    use crate::state::{AttackTemplate, Loadout, ParticipantSpec, SkillTemplate};

    fn attack(name: &str, potency: u32, cost: u32) -> AttackTemplate {
        AttackTemplate {
            name: name.into(),
            element: Element::Normal,
            potency,
            cost,
            reach: 1,
        }
    }

    fn kit() -> Loadout {
        Loadout {
            attacks: vec![
                attack("jab", 5, 10),
                attack("hook", 10, 12),
                attack("feint", 2, 8),
                attack("haymaker", 99, u32::MAX),
            ],
            skills: vec![
                SkillTemplate {
                    name: "mend".into(),
                    effect: SkillEffect::Heal,
                    element: Element::Normal,
                    potency: 10,
                    cost: 5,
                    resource_cost: 10,
                },
                SkillTemplate {
                    name: "renew".into(),
                    effect: SkillEffect::Heal,
                    element: Element::Normal,
                    potency: 10,
                    cost: 5,
                    resource_cost: 20,
                },
                SkillTemplate {
                    name: "bolt".into(),
                    effect: SkillEffect::Damage,
                    element: Element::Fire,
                    potency: 12,
                    cost: 15,
                    resource_cost: 5,
                },
            ],
            block_cost: 4,
        }
    }

    fn store() -> ParticipantStore {
        ParticipantStore::from_roster([
            ParticipantSpec::new(1, "Aria", "alpha", 100)
                .with_resource(30)
                .with_loadout(kit()),
            ParticipantSpec::new(2, "Bram", "beta", 100),
            ParticipantSpec::new(3, "Cato", "alpha", 100),
        ])
    }

    fn strike(name: &str) -> AttackAction {
        AttackAction::new(name, ParticipantId(2), BodyRegion::Torso)
    }

    fn cast(name: &str, target: u32) -> SkillAction {
        SkillAction::new(name, ParticipantId(target))
    }

    #[test]
    fn three_attacks_over_budget_are_rejected() {
        let mut config = CombatConfig::default();
        config.multi_attack_penalty = PenaltyCurve(vec![0, 0, 25, 75, 150, 250]);
        config.action_points_per_turn = 80;
        let store = store();
        let actor = store.get(ParticipantId(1)).unwrap();

        let selection = ActionSelection::pass()
            .attack(strike("jab"))
            .attack(strike("jab"))
            .attack(strike("jab"));
        let result = BudgetCalculator::new(&config).evaluate(&selection, actor, &store);

        assert_eq!(result, Err(ValidationError::BudgetExceeded { cost: 105, budget: 80 }));
    }

    #[test]
    fn cost_sums_every_component() {
        let config = CombatConfig::default();
        let store = store();
        let actor = store.get(ParticipantId(1)).unwrap();

        let selection = ActionSelection::pass()
            .attack(strike("hook"))
            .attack(strike("feint"))
            .block(BlockAction::new(BodyRegion::Head))
            .skill(cast("mend", 3));
        let verdict = BudgetCalculator::new(&config)
            .evaluate(&selection, actor, &store)
            .unwrap();

        assert_eq!(verdict.cost.attacks, 20);
        assert_eq!(verdict.cost.block, 4);
        assert_eq!(verdict.cost.skills, 5);
        assert_eq!(verdict.cost.penalty, 25);
        assert_eq!(verdict.cost.total, 54);
        assert_eq!(verdict.resource_cost, 10);
    }

    #[test]
    fn submitted_prices_are_replaced_by_the_loadout() {
        let config = CombatConfig::default();
        let store = store();
        let actor = store.get(ParticipantId(1)).unwrap();

        let mut forged = AttackAction::new("jab", ParticipantId(2), BodyRegion::Head);
        forged.potency = 1_000_000;
        forged.cost = 0;
        forged.element = Element::Arcane;
        let mut bolt = cast("bolt", 2);
        bolt.potency = 500;
        bolt.resource_cost = 0;
        let mut guard = BlockAction::new(BodyRegion::Legs);
        guard.cost = 0;

        let selection = ActionSelection::pass().attack(forged).skill(bolt).block(guard);
        let verdict = BudgetCalculator::new(&config)
            .evaluate(&selection, actor, &store)
            .unwrap();

        let queued = verdict.selection.attacks().next().unwrap();
        assert_eq!((queued.potency, queued.cost), (5, 10));
        assert_eq!(queued.element, Element::Normal);
        assert_eq!(queued.region, BodyRegion::Head);
        let skill = verdict.selection.skills().next().unwrap();
        assert_eq!((skill.potency, skill.resource_cost), (12, 5));
        assert_eq!(skill.element, Element::Fire);
        assert_eq!(verdict.selection.blocks().next().map(|b| b.cost), Some(4));
        assert_eq!(verdict.cost.total, 10 + 15 + 4);
        assert_eq!(verdict.resource_cost, 5);
    }

    #[test]
    fn unknown_attacks_and_skills_are_rejected() {
        let config = CombatConfig::default();
        let store = store();
        let actor = store.get(ParticipantId(1)).unwrap();
        let calculator = BudgetCalculator::new(&config);

        let attack = ActionSelection::pass().attack(strike("meteor"));
        assert_eq!(
            calculator.evaluate(&attack, actor, &store),
            Err(ValidationError::UnknownAttack { attack: "meteor".into() })
        );

        let skill = ActionSelection::pass().skill(cast("resurrect", 3));
        assert_eq!(
            calculator.evaluate(&skill, actor, &store),
            Err(ValidationError::UnknownSkill { skill: "resurrect".into() })
        );
    }

    #[test]
    fn huge_costs_saturate_into_a_budget_rejection() {
        let config = CombatConfig::default();
        let store = store();
        let actor = store.get(ParticipantId(1)).unwrap();

        let selection = ActionSelection::pass()
            .attack(strike("haymaker"))
            .attack(strike("feint"))
            .block(BlockAction::new(BodyRegion::Torso));
        let result = BudgetCalculator::new(&config).evaluate(&selection, actor, &store);

        assert_eq!(
            result,
            Err(ValidationError::BudgetExceeded {
                cost: u32::MAX,
                budget: config.action_points_per_turn,
            })
        );
    }

    #[test]
    fn extra_blocks_follow_policy() {
        let mut config = CombatConfig::default();
        let store = store();
        let actor = store.get(ParticipantId(1)).unwrap();
        let selection = ActionSelection::pass()
            .block(BlockAction::new(BodyRegion::Head))
            .block(BlockAction::new(BodyRegion::Legs));

        let verdict = BudgetCalculator::new(&config)
            .evaluate(&selection, actor, &store)
            .unwrap();
        assert_eq!(verdict.dropped_blocks, 1);
        assert_eq!(verdict.cost.block, 4);
        assert_eq!(verdict.selection.blocks().next().map(|b| b.region), Some(BodyRegion::Head));

        config.extra_block_policy = ExtraBlockPolicy::Reject;
        let rejected = BudgetCalculator::new(&config).evaluate(&selection, actor, &store);
        assert_eq!(rejected, Err(ValidationError::TooManyBlocks { count: 2 }));
    }

    #[test]
    fn unaffordable_skill_is_dropped_alone() {
        let config = CombatConfig::default();
        let store = store();
        let actor = store.get(ParticipantId(1)).unwrap();

        let selection = ActionSelection::pass()
            .attack(strike("jab"))
            .skill(cast("renew", 3))
            .skill(cast("renew", 3));
        let verdict = BudgetCalculator::new(&config)
            .evaluate(&selection, actor, &store)
            .unwrap();

        assert_eq!(verdict.selection.skills().count(), 1);
        assert_eq!(verdict.selection.attack_count(), 1);
        assert_eq!(verdict.dropped_skills.len(), 1);
        assert!(matches!(
            verdict.dropped_skills[0].reason,
            ValidationError::InsufficientResource { required: 20, available: 10, .. }
        ));
    }

    #[test]
    fn friendly_and_unknown_targets_are_rejected() {
        let config = CombatConfig::default();
        let store = store();
        let actor = store.get(ParticipantId(1)).unwrap();
        let calculator = BudgetCalculator::new(&config);

        let friendly = ActionSelection::pass()
            .attack(AttackAction::new("jab", ParticipantId(3), BodyRegion::Head));
        assert_eq!(
            calculator.evaluate(&friendly, actor, &store),
            Err(ValidationError::FriendlyTarget { target: ParticipantId(3) })
        );

        let unknown = ActionSelection::pass()
            .attack(AttackAction::new("jab", ParticipantId(9), BodyRegion::Head));
        assert_eq!(
            calculator.evaluate(&unknown, actor, &store),
            Err(ValidationError::UnknownTarget { target: ParticipantId(9) })
        );
    }

    #[test]
    fn damage_skills_cannot_target_allies() {
        let config = CombatConfig::default();
        let store = store();
        let actor = store.get(ParticipantId(1)).unwrap();
        let calculator = BudgetCalculator::new(&config);

        let at_ally = ActionSelection::pass().skill(cast("bolt", 3));
        assert_eq!(
            calculator.evaluate(&at_ally, actor, &store),
            Err(ValidationError::FriendlyTarget { target: ParticipantId(3) })
        );

        let heal_ally = ActionSelection::pass().skill(cast("mend", 3));
        assert!(calculator.evaluate(&heal_ally, actor, &store).is_ok());
    }

    #[test]
    fn flee_replaces_the_rest_of_the_selection() {
        let config = CombatConfig::default();
        let store = store();
        let actor = store.get(ParticipantId(1)).unwrap();
        let selection = ActionSelection::pass().attack(strike("haymaker")).flee();

        let verdict = BudgetCalculator::new(&config)
            .evaluate(&selection, actor, &store)
            .unwrap();
        assert!(verdict.selection.wants_to_flee());
        assert_eq!(verdict.selection.actions.len(), 1);
        assert_eq!(verdict.cost.total, 0);
    }
}
