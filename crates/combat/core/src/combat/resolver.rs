//! Damage/Healing Resolver contract.
//!
//! The round resolver depends on nothing but [`DamageResolver::resolve`]:
//! outputs are non-negative and a `missed` or `blocked` outcome carries a
//! zero amount. Anything else aborts the round.

use crate::action::{BodyRegion, Element};
use crate::engine::InvariantViolation;
use crate::state::{ParticipantId, StatSnapshot};

use super::rng::compute_seed;

/// Broad category of the action being resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EffectKind {
    /// Weapon attack: can miss and can be blocked.
    Strike,
    /// Damaging skill: bypasses blocks.
    Spell,
    /// Restores hit points.
    Heal,
}

#[derive(Clone, Copy, Debug)]
pub struct AttackerView<'a> {
    pub id: ParticipantId,
    pub stats: &'a StatSnapshot,
    /// Percentage potency reduction.
    pub fatigue: u32,
}

#[derive(Clone, Copy, Debug)]
pub struct DefenderView<'a> {
    pub id: ParticipantId,
    pub stats: &'a StatSnapshot,
    pub is_defending: bool,
    pub block: Option<BodyRegion>,
    pub current_hp: u32,
    pub max_hp: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionDescriptor {
    pub kind: EffectKind,
    pub element: Element,
    pub region: BodyRegion,
    pub potency: u32,
}

/// Everything a resolver may look at for one action.
#[derive(Clone, Copy, Debug)]
pub struct ResolveRequest<'a> {
    pub attacker: AttackerView<'a>,
    pub defender: DefenderView<'a>,
    pub action: ActionDescriptor,
    pub battle_seed: u64,
    pub nonce: u64,
}

impl ResolveRequest<'_> {
    /// Seed for the roll identified by `context`.
    pub fn seed_for(&self, context: u32) -> u64 {
        compute_seed(self.battle_seed, self.nonce, self.attacker.id.0, context)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Outcome {
    pub amount: u32,
    pub element: Element,
    pub critical: bool,
    pub blocked: bool,
    pub missed: bool,
    pub region: BodyRegion,
}

impl Outcome {
    pub fn hit(amount: u32, element: Element, region: BodyRegion) -> Self {
        Self {
            amount,
            element,
            critical: false,
            blocked: false,
            missed: false,
            region,
        }
    }

    pub fn miss(element: Element, region: BodyRegion) -> Self {
        Self {
            missed: true,
            ..Self::hit(0, element, region)
        }
    }

    pub fn blocked(element: Element, region: BodyRegion) -> Self {
        Self {
            blocked: true,
            ..Self::hit(0, element, region)
        }
    }

    pub fn landed(&self) -> bool {
        !self.missed && !self.blocked
    }

    pub fn validate(&self) -> Result<(), InvariantViolation> {
        if (self.missed || self.blocked) && self.amount != 0 {
            return Err(InvariantViolation::InconsistentOutcome { amount: self.amount });
        }
        Ok(())
    }
}

/// Pluggable balance formula.
pub trait DamageResolver: Send + Sync {
    fn resolve(&self, request: &ResolveRequest<'_>) -> Outcome;
}

/// Resolver with a fixed amount per hit; handy for scripted encounters.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlatResolver;

impl DamageResolver for FlatResolver {
    fn resolve(&self, request: &ResolveRequest<'_>) -> Outcome {
        let action = request.action;
        if action.kind == EffectKind::Strike && request.defender.block == Some(action.region) {
            return Outcome::blocked(action.element, action.region);
        }
        Outcome::hit(action.potency, action.element, action.region)
    }
}
