//! Combatant state: vitals, queued actions and cumulative counters.
//!
//! Vitals are private; every mutation goes through a method that preserves
//! `0 <= current_hp <= max_hp` and `0 <= current_resource <= max_resource`.
//! `is_alive` is derived from `current_hp`, so it cannot drift from it.

use std::collections::BTreeMap;

use crate::action::{
    ActionSelection, AttackAction, BlockAction, BodyRegion, CombatAction, Element, MoveAction,
    SkillAction,
};
use crate::engine::InvariantViolation;

use super::ids::{GridPosition, ParticipantId, Team};

/// Who chooses this participant's actions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Controller {
    #[default]
    Human,
    Ai,
}

/// Combat stats frozen at battle start.
///
/// The damage resolver only ever sees this snapshot, so equipment changes
/// made outside the battle cannot alter rounds already resolved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StatSnapshot {
    pub attack: u32,
    pub defense: u32,
    pub accuracy: i32,
    pub evasion: i32,
    /// Critical chance in percent.
    pub critical_chance: u32,
    pub healing_power: u32,
    /// Resistance per element, in percent (clamped to 100 by resolvers).
    pub resistances: BTreeMap<Element, u32>,
}

impl StatSnapshot {
    pub fn resistance(&self, element: Element) -> u32 {
        self.resistances.get(&element).copied().unwrap_or(0)
    }
}

/// Roster entry supplied by encounter setup.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParticipantSpec {
    pub id: ParticipantId,
    pub name: String,
    pub team: Team,
    #[cfg_attr(feature = "serde", serde(default))]
    pub role: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub controller: Controller,
    pub max_hp: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_resource: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub initiative: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub stats: StatSnapshot,
    #[cfg_attr(feature = "serde", serde(default))]
    pub position: Option<GridPosition>,
    #[cfg_attr(feature = "serde", serde(default = "ParticipantSpec::default_move_range"))]
    pub move_range: u32,
    /// Attacks and skills this participant knows; submissions are priced from it.
    #[cfg_attr(feature = "serde", serde(default))]
    pub loadout: Loadout,
}

impl ParticipantSpec {
    pub fn new(id: u32, name: impl Into<String>, team: impl Into<String>, max_hp: u32) -> Self {
        Self {
            id: ParticipantId(id),
            name: name.into(),
            team: Team::new(team),
            role: String::new(),
            controller: Controller::Human,
            max_hp,
            max_resource: 0,
            initiative: 0,
            stats: StatSnapshot::default(),
            position: None,
            move_range: Self::default_move_range(),
            loadout: Loadout::default(),
        }
    }

    pub fn with_initiative(mut self, initiative: i32) -> Self {
        self.initiative = initiative;
        self
    }

    pub fn with_resource(mut self, max_resource: u32) -> Self {
        self.max_resource = max_resource;
        self
    }

    pub fn with_stats(mut self, stats: StatSnapshot) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_position(mut self, position: GridPosition) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_controller(mut self, controller: Controller) -> Self {
        self.controller = controller;
        self
    }

    pub fn with_loadout(mut self, loadout: Loadout) -> Self {
        self.loadout = loadout;
        self
    }

    const fn default_move_range() -> u32 {
        3
    }
}

/// Known attack and skill templates; target is filled in at selection time.
///
/// The loadout is the price list: submitted attacks, blocks and skills are
/// looked up here by name and priced from the template, never from the
/// submission itself.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Loadout {
    pub attacks: Vec<AttackTemplate>,
    pub skills: Vec<SkillTemplate>,
    pub block_cost: u32,
}

impl Default for Loadout {
    /// A single basic strike and a cheap guard.
    fn default() -> Self {
        Self {
            attacks: vec![AttackTemplate {
                name: Self::BASIC_ATTACK.into(),
                element: Element::Normal,
                potency: 10,
                cost: 20,
                reach: AttackTemplate::default_reach(),
            }],
            skills: Vec::new(),
            block_cost: 10,
        }
    }
}

impl Loadout {
    pub const BASIC_ATTACK: &'static str = "strike";

    pub fn attack(&self, name: &str) -> Option<&AttackTemplate> {
        self.attacks.iter().find(|template| template.name == name)
    }

    pub fn skill(&self, name: &str) -> Option<&SkillTemplate> {
        self.skills.iter().find(|template| template.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackTemplate {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub element: Element,
    pub potency: u32,
    pub cost: u32,
    #[cfg_attr(feature = "serde", serde(default = "AttackTemplate::default_reach"))]
    pub reach: u32,
}

impl AttackTemplate {
    /// Fully priced attack against `target`.
    pub fn aim(&self, target: ParticipantId, region: BodyRegion) -> AttackAction {
        AttackAction {
            attack: self.name.clone(),
            target,
            region,
            element: self.element,
            potency: self.potency,
            cost: self.cost,
            reach: self.reach,
        }
    }

    const fn default_reach() -> u32 {
        1
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillTemplate {
    pub name: String,
    pub effect: crate::action::SkillEffect,
    #[cfg_attr(feature = "serde", serde(default))]
    pub element: Element,
    pub potency: u32,
    pub cost: u32,
    pub resource_cost: u32,
}

impl SkillTemplate {
    pub fn aim(&self, target: ParticipantId) -> SkillAction {
        self.price(SkillAction::new(self.name.clone(), target))
    }

    /// Copies this template's effect and prices onto a submitted skill,
    /// keeping its target and region.
    pub fn price(&self, skill: SkillAction) -> SkillAction {
        SkillAction {
            effect: self.effect,
            element: self.element,
            potency: self.potency,
            cost: self.cost,
            resource_cost: self.resource_cost,
            ..skill
        }
    }
}

/// Why a participant no longer takes part in rounds while still alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Withdrawal {
    Fled,
    Forfeited,
    NotReady,
}

/// Cumulative per-battle counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatCounters {
    pub damage_dealt: BTreeMap<Element, u64>,
    pub damage_received: BTreeMap<Element, u64>,
    pub healing_done: u64,
    pub healing_received: u64,
    pub hits_landed: u32,
    pub hits_blocked: u32,
    pub misses: u32,
    pub criticals: u32,
    pub kills: u32,
}

impl CombatCounters {
    pub fn total_damage_dealt(&self) -> u64 {
        self.damage_dealt.values().sum()
    }

    pub fn total_damage_received(&self) -> u64 {
        self.damage_received.values().sum()
    }
}

/// Result of applying damage to a participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageApplied {
    /// HP actually removed (never more than the HP the target had).
    pub applied: u32,
    /// Portion of the outcome amount that exceeded the remaining HP.
    pub overkill: u32,
    /// True when this hit flipped `is_alive` to false.
    pub died: bool,
}

/// One combatant inside a battle.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub team: Team,
    pub role: String,
    pub controller: Controller,
    current_hp: u32,
    max_hp: u32,
    current_resource: u32,
    max_resource: u32,
    pub is_defending: bool,
    /// Region covered by the block in effect; outlives the queued selection in
    /// alternating mode until the participant's next turn.
    pub guard: Option<BodyRegion>,
    pub initiative: i32,
    pub fatigue: u32,
    pub stats: StatSnapshot,
    pub position: Option<GridPosition>,
    pub move_range: u32,
    pub loadout: Loadout,
    pub ready: bool,

    pub pending_attacks: Vec<AttackAction>,
    pub pending_block: Option<BlockAction>,
    pub pending_skills: Vec<SkillAction>,
    pub pending_move: Option<MoveAction>,
    pub pending_flee: bool,
    /// Set once a valid selection is queued for the open round.
    pub has_submitted: bool,
    /// Attacks executed in the current round, turned into fatigue when it closes.
    pub round_attacks: u32,

    pub counters: CombatCounters,
    pub region_damage: BTreeMap<BodyRegion, u64>,
    died_in_round: Option<u32>,
    withdrawal: Option<Withdrawal>,
}

impl Participant {
    pub fn from_spec(spec: ParticipantSpec) -> Self {
        Self {
            id: spec.id,
            name: spec.name,
            team: spec.team,
            role: spec.role,
            controller: spec.controller,
            current_hp: spec.max_hp,
            max_hp: spec.max_hp,
            current_resource: spec.max_resource,
            max_resource: spec.max_resource,
            is_defending: false,
            guard: None,
            initiative: spec.initiative,
            fatigue: 0,
            stats: spec.stats,
            position: spec.position,
            move_range: spec.move_range,
            loadout: spec.loadout,
            ready: spec.controller == Controller::Ai,
            pending_attacks: Vec::new(),
            pending_block: None,
            pending_skills: Vec::new(),
            pending_move: None,
            pending_flee: false,
            has_submitted: false,
            round_attacks: 0,
            counters: CombatCounters::default(),
            region_damage: BTreeMap::new(),
            died_in_round: None,
            withdrawal: None,
        }
    }

    pub fn current_hp(&self) -> u32 {
        self.current_hp
    }

    pub fn max_hp(&self) -> u32 {
        self.max_hp
    }

    pub fn current_resource(&self) -> u32 {
        self.current_resource
    }

    pub fn max_resource(&self) -> u32 {
        self.max_resource
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    /// Alive and still taking part in rounds.
    pub fn is_active(&self) -> bool {
        self.is_alive() && self.withdrawal.is_none()
    }

    pub fn died_in_round(&self) -> Option<u32> {
        self.died_in_round
    }

    pub fn withdrawal(&self) -> Option<Withdrawal> {
        self.withdrawal
    }

    /// Removes damage from HP, saturating at zero.
    ///
    /// Dead participants cannot be damaged again; that would mean a second
    /// death transition.
    pub fn apply_damage(
        &mut self,
        amount: u32,
        element: Element,
        region: BodyRegion,
        round: u32,
    ) -> Result<DamageApplied, InvariantViolation> {
        if !self.is_alive() {
            return Err(InvariantViolation::DeadParticipantMutated { participant: self.id });
        }

        let applied = amount.min(self.current_hp);
        self.current_hp -= applied;
        *self.counters.damage_received.entry(element).or_default() += u64::from(applied);
        *self.region_damage.entry(region).or_default() += u64::from(applied);

        let died = self.current_hp == 0;
        if died {
            self.died_in_round = Some(round);
            self.is_defending = false;
            self.guard = None;
            self.clear_pending();
        }

        Ok(DamageApplied {
            applied,
            overkill: amount - applied,
            died,
        })
    }

    /// Restores HP up to `max_hp`; returns the amount actually restored.
    pub fn heal(&mut self, amount: u32) -> Result<u32, InvariantViolation> {
        if !self.is_alive() {
            return Err(InvariantViolation::DeadParticipantMutated { participant: self.id });
        }
        let restored = amount.min(self.max_hp - self.current_hp);
        self.current_hp += restored;
        self.counters.healing_received += u64::from(restored);
        Ok(restored)
    }

    /// Spends resource that the budget calculator has already validated.
    pub fn spend_resource(&mut self, amount: u32) -> Result<(), InvariantViolation> {
        if amount > self.current_resource {
            return Err(InvariantViolation::ResourceUnderflow {
                participant: self.id,
                requested: amount,
                available: self.current_resource,
            });
        }
        self.current_resource -= amount;
        Ok(())
    }

    /// Restores resource up to `max_resource`; returns the amount restored.
    pub fn restore_resource(&mut self, amount: u32) -> u32 {
        if !self.is_alive() {
            return 0;
        }
        let restored = amount.min(self.max_resource - self.current_resource);
        self.current_resource += restored;
        restored
    }

    /// Removes a living participant from future rounds. The first reason wins.
    pub fn withdraw(&mut self, reason: Withdrawal) {
        if self.withdrawal.is_none() {
            self.withdrawal = Some(reason);
            self.is_defending = false;
            self.guard = None;
            self.clear_pending();
        }
    }

    /// Replaces the queued selection for the open round.
    pub fn queue(&mut self, selection: &ActionSelection) {
        self.clear_pending();
        for action in &selection.actions {
            match action {
                CombatAction::Attack(attack) => self.pending_attacks.push(attack.clone()),
                CombatAction::Block(block) => {
                    if self.pending_block.is_none() {
                        self.pending_block = Some(block.clone());
                    }
                }
                CombatAction::Skill(skill) => self.pending_skills.push(skill.clone()),
                CombatAction::Move(movement) => self.pending_move = Some(*movement),
                CombatAction::Flee => self.pending_flee = true,
            }
        }
        self.has_submitted = true;
    }

    /// Rebuilds the queued selection in canonical order (move, block, attacks, skills, flee).
    pub fn pending_selection(&self) -> ActionSelection {
        let mut actions = Vec::new();
        if let Some(movement) = self.pending_move {
            actions.push(CombatAction::Move(movement));
        }
        if let Some(block) = &self.pending_block {
            actions.push(CombatAction::Block(block.clone()));
        }
        actions.extend(self.pending_attacks.iter().cloned().map(CombatAction::Attack));
        actions.extend(self.pending_skills.iter().cloned().map(CombatAction::Skill));
        if self.pending_flee {
            actions.push(CombatAction::Flee);
        }
        ActionSelection::new(actions)
    }

    pub fn clear_pending(&mut self) {
        self.pending_attacks.clear();
        self.pending_block = None;
        self.pending_skills.clear();
        self.pending_move = None;
        self.pending_flee = false;
        self.has_submitted = false;
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if self.current_hp > self.max_hp {
            return Err(InvariantViolation::HpOutOfBounds {
                participant: self.id,
                current: self.current_hp,
                max: self.max_hp,
            });
        }
        if self.current_resource > self.max_resource {
            return Err(InvariantViolation::ResourceOutOfBounds {
                participant: self.id,
                current: self.current_resource,
                max: self.max_resource,
            });
        }
        if self.is_alive() && self.died_in_round.is_some() {
            return Err(InvariantViolation::Resurrected { participant: self.id });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fighter(hp: u32) -> Participant {
        Participant::from_spec(ParticipantSpec::new(1, "Aria", "alpha", hp).with_resource(20))
    }

    #[test]
    fn lethal_damage_flips_alive_once() {
        let mut p = fighter(40);
        let hit = p
            .apply_damage(55, Element::Fire, BodyRegion::Head, 2)
            .unwrap();

        assert_eq!(hit, DamageApplied { applied: 40, overkill: 15, died: true });
        assert_eq!(p.current_hp(), 0);
        assert!(!p.is_alive());
        assert_eq!(p.died_in_round(), Some(2));
        assert_eq!(p.region_damage[&BodyRegion::Head], 40);

        let again = p.apply_damage(1, Element::Normal, BodyRegion::Torso, 2);
        assert!(matches!(again, Err(InvariantViolation::DeadParticipantMutated { .. })));
    }

    #[test]
    fn heal_clamps_to_max_and_rejects_dead() {
        let mut p = fighter(50);
        p.apply_damage(10, Element::Normal, BodyRegion::Legs, 1).unwrap();
        assert_eq!(p.heal(25).unwrap(), 10);
        assert_eq!(p.current_hp(), 50);

        p.apply_damage(50, Element::Normal, BodyRegion::Legs, 1).unwrap();
        assert!(p.heal(5).is_err());
    }

    #[test]
    fn resource_spend_and_restore_stay_in_bounds() {
        let mut p = fighter(10);
        p.spend_resource(15).unwrap();
        assert_eq!(p.current_resource(), 5);
        assert!(p.spend_resource(6).is_err());
        assert_eq!(p.restore_resource(100), 15);
        assert_eq!(p.current_resource(), 20);
        p.check_invariants().unwrap();
    }

    #[test]
    fn queue_keeps_first_block_and_round_trips() {
        let mut p = fighter(10);
        let selection = ActionSelection::pass()
            .block(BlockAction::new(BodyRegion::Head))
            .block(BlockAction::new(BodyRegion::Legs))
            .attack(AttackAction::new("strike", ParticipantId(2), BodyRegion::Torso));
        p.queue(&selection);

        assert_eq!(p.pending_block.as_ref().map(|b| b.region), Some(BodyRegion::Head));
        assert_eq!(p.pending_attacks.len(), 1);
        assert!(p.has_submitted);
        assert_eq!(p.pending_selection().blocks().count(), 1);

        p.clear_pending();
        assert!(p.pending_selection().is_pass());
        assert!(!p.has_submitted);
    }
}
