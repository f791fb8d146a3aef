//! Action selection types.
//!
//! An [`ActionSelection`] is a participant's proposed contribution to the
//! round (or turn) in progress. It is a list of tagged [`CombatAction`]s so
//! every consumer handles each action kind exhaustively.

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::state::{GridPosition, ParticipantId};

/// Damage/healing type tag, used for resistances and analytics breakdowns.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Element {
    #[default]
    Normal,
    Fire,
    Water,
    Earth,
    Air,
    Arcane,
}

/// Targeted damage location, used for block matching and per-region tracking.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BodyRegion {
    Head,
    #[default]
    Torso,
    Stomach,
    Legs,
}

/// One attack slot: strikes a single body region of one enemy.
///
/// Clients only name the attack, the target and the region. Element,
/// potency, cost and reach are filled in from the actor's loadout when the
/// selection is priced; whatever a client put there is overwritten.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackAction {
    /// Name of the [`crate::AttackTemplate`] being used.
    pub attack: String,
    pub target: ParticipantId,
    pub region: BodyRegion,
    #[cfg_attr(feature = "serde", serde(default))]
    pub element: Element,
    /// Base potency handed to the damage resolver.
    #[cfg_attr(feature = "serde", serde(default))]
    pub potency: u32,
    /// Action-point cost of this attack.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cost: u32,
    /// Maximum grid distance to the target (alternating grid mode only).
    #[cfg_attr(feature = "serde", serde(default = "AttackAction::default_reach"))]
    pub reach: u32,
}

impl AttackAction {
    pub fn new(attack: impl Into<String>, target: ParticipantId, region: BodyRegion) -> Self {
        Self {
            attack: attack.into(),
            target,
            region,
            element: Element::Normal,
            potency: 0,
            cost: 0,
            reach: Self::default_reach(),
        }
    }

    const fn default_reach() -> u32 {
        1
    }
}

/// Guard selection covering one body region for the whole round.
///
/// `cost` is taken from the actor's loadout when the selection is priced.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockAction {
    pub region: BodyRegion,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cost: u32,
}

impl BlockAction {
    pub fn new(region: BodyRegion) -> Self {
        Self { region, cost: 0 }
    }
}

/// What a skill does once it resolves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SkillEffect {
    /// Deals damage through the damage resolver.
    #[default]
    Damage,
    /// Restores hit points through the healing resolver.
    Heal,
    /// Restores the target's resource pool by the skill's potency.
    RestoreResource,
}

/// Skill or ability invocation.
///
/// Like attacks, only `skill`, `target` and `region` come from the client;
/// the rest is copied from the matching [`crate::SkillTemplate`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillAction {
    pub skill: String,
    pub target: ParticipantId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub effect: SkillEffect,
    #[cfg_attr(feature = "serde", serde(default))]
    pub element: Element,
    #[cfg_attr(feature = "serde", serde(default))]
    pub region: BodyRegion,
    #[cfg_attr(feature = "serde", serde(default))]
    pub potency: u32,
    /// Action-point cost.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cost: u32,
    /// Resource (mana-like) cost, validated independently of the AP budget.
    #[cfg_attr(feature = "serde", serde(default))]
    pub resource_cost: u32,
}

impl SkillAction {
    pub fn new(skill: impl Into<String>, target: ParticipantId) -> Self {
        Self {
            skill: skill.into(),
            target,
            effect: SkillEffect::Damage,
            element: Element::Normal,
            region: BodyRegion::Torso,
            potency: 0,
            cost: 0,
            resource_cost: 0,
        }
    }

    pub fn at(mut self, region: BodyRegion) -> Self {
        self.region = region;
        self
    }
}

/// Grid movement to a destination cell (alternating grid mode only).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveAction {
    pub to: GridPosition,
}

/// Tagged action variants a selection is made of.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum CombatAction {
    Attack(AttackAction),
    Block(BlockAction),
    Skill(SkillAction),
    Move(MoveAction),
    /// Leave the battle; resolved at the participant's initiative slot.
    Flee,
}

/// A participant's proposed contribution to the round in progress.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionSelection {
    pub actions: Vec<CombatAction>,
}

impl ActionSelection {
    /// Empty selection: the participant passes.
    pub fn pass() -> Self {
        Self::default()
    }

    pub fn new(actions: Vec<CombatAction>) -> Self {
        Self { actions }
    }

    pub fn attack(mut self, attack: AttackAction) -> Self {
        self.actions.push(CombatAction::Attack(attack));
        self
    }

    pub fn block(mut self, block: BlockAction) -> Self {
        self.actions.push(CombatAction::Block(block));
        self
    }

    pub fn skill(mut self, skill: SkillAction) -> Self {
        self.actions.push(CombatAction::Skill(skill));
        self
    }

    pub fn move_to(mut self, to: GridPosition) -> Self {
        self.actions.push(CombatAction::Move(MoveAction { to }));
        self
    }

    pub fn flee(mut self) -> Self {
        self.actions.push(CombatAction::Flee);
        self
    }

    pub fn attacks(&self) -> impl Iterator<Item = &AttackAction> {
        self.actions.iter().filter_map(|action| match action {
            CombatAction::Attack(attack) => Some(attack),
            _ => None,
        })
    }

    pub fn blocks(&self) -> impl Iterator<Item = &BlockAction> {
        self.actions.iter().filter_map(|action| match action {
            CombatAction::Block(block) => Some(block),
            _ => None,
        })
    }

    pub fn skills(&self) -> impl Iterator<Item = &SkillAction> {
        self.actions.iter().filter_map(|action| match action {
            CombatAction::Skill(skill) => Some(skill),
            _ => None,
        })
    }

    pub fn movement(&self) -> Option<&MoveAction> {
        self.actions.iter().find_map(|action| match action {
            CombatAction::Move(movement) => Some(movement),
            _ => None,
        })
    }

    pub fn attack_count(&self) -> usize {
        self.attacks().count()
    }

    pub fn wants_to_flee(&self) -> bool {
        self.actions.iter().any(|action| matches!(action, CombatAction::Flee))
    }

    pub fn is_pass(&self) -> bool {
        self.actions.is_empty()
    }
}
