//! Reference resolver driven by [`BalanceTable`].
//!
//! ```text
//! hit_chance = clamp(base + accuracy - evasion, min, max)
//! damage     = potency + attack - defense / divisor   (at least minimum_damage)
//! damage    -= damage * resistance%                   (resistance capped at 100)
//! damage    -= damage * defend_reduction%             (when defending)
//! damage    -= damage * fatigue%
//! damage    *= critical_multiplier%                   (on a critical roll)
//! heal       = (potency + healing_power) - fatigue%
//! ```

use crate::config::BalanceTable;

use super::resolver::{DamageResolver, EffectKind, Outcome, ResolveRequest};
use super::rng::{PcgRng, RngOracle};

const HIT_ROLL: u32 = 0;
const CRIT_ROLL: u32 = 1;

#[derive(Clone, Debug, Default)]
pub struct StandardResolver {
    balance: BalanceTable,
    rng: PcgRng,
}

impl StandardResolver {
    pub fn new(balance: BalanceTable) -> Self {
        Self { balance, rng: PcgRng }
    }

    pub fn hit_chance(&self, accuracy: i32, evasion: i32) -> u32 {
        let chance = self.balance.hit_chance_base + accuracy - evasion;
        chance.clamp(
            self.balance.hit_chance_min as i32,
            self.balance.hit_chance_max as i32,
        ) as u32
    }

    /// `amount * percent / 100`, widened so large potencies cannot wrap.
    fn scale(amount: u32, percent: u32) -> u32 {
        let scaled = u64::from(amount) * u64::from(percent) / 100;
        u32::try_from(scaled).unwrap_or(u32::MAX)
    }

    fn reduce(amount: u32, percent: u32) -> u32 {
        amount - Self::scale(amount, percent.min(100))
    }

    fn damage(&self, request: &ResolveRequest<'_>) -> u32 {
        let attacker = request.attacker.stats;
        let defender = request.defender.stats;
        let action = request.action;

        let mitigation = defender.defense / self.balance.defense_divisor.max(1);
        let mut amount = action
            .potency
            .saturating_add(attacker.attack)
            .saturating_sub(mitigation)
            .max(self.balance.minimum_damage);
        amount = Self::reduce(amount, defender.resistance(action.element));
        if request.defender.is_defending {
            amount = Self::reduce(amount, self.balance.defend_reduction);
        }
        Self::reduce(amount, request.attacker.fatigue)
    }
}

impl DamageResolver for StandardResolver {
    fn resolve(&self, request: &ResolveRequest<'_>) -> Outcome {
        let action = request.action;

        if action.kind == EffectKind::Heal {
            let raw = action
                .potency
                .saturating_add(request.attacker.stats.healing_power);
            let amount = Self::reduce(raw, request.attacker.fatigue);
            return Outcome::hit(amount, action.element, action.region);
        }

        if action.kind == EffectKind::Strike {
            let chance = self.hit_chance(
                request.attacker.stats.accuracy,
                request.defender.stats.evasion,
            );
            if self.rng.roll_d100(request.seed_for(HIT_ROLL)) > chance {
                return Outcome::miss(action.element, action.region);
            }
            if request.defender.block == Some(action.region) {
                return Outcome::blocked(action.element, action.region);
            }
        }

        let mut outcome = Outcome::hit(self.damage(request), action.element, action.region);
        let crit_chance = request.attacker.stats.critical_chance;
        if crit_chance > 0 && self.rng.roll_d100(request.seed_for(CRIT_ROLL)) <= crit_chance {
            outcome.critical = true;
            outcome.amount = Self::scale(outcome.amount, self.balance.critical_multiplier);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{BodyRegion, Element};
    use crate::combat::{ActionDescriptor, AttackerView, DefenderView};
    use crate::state::{ParticipantId, StatSnapshot};

    fn request<'a>(
        attacker: &'a StatSnapshot,
        defender: &'a StatSnapshot,
        kind: EffectKind,
        block: Option<BodyRegion>,
        is_defending: bool,
    ) -> ResolveRequest<'a> {
        ResolveRequest {
            attacker: AttackerView { id: ParticipantId(1), stats: attacker, fatigue: 0 },
            defender: DefenderView {
                id: ParticipantId(2),
                stats: defender,
                is_defending,
                block,
                current_hp: 100,
                max_hp: 100,
            },
            action: ActionDescriptor {
                kind,
                element: Element::Fire,
                region: BodyRegion::Head,
                potency: 20,
            },
            battle_seed: 11,
            nonce: 1,
        }
    }

    fn sure_hit() -> StatSnapshot {
        StatSnapshot { attack: 4, accuracy: 100, ..StatSnapshot::default() }
    }

    #[test]
    fn hit_chance_is_clamped() {
        let resolver = StandardResolver::default();
        assert_eq!(resolver.hit_chance(0, 0), 85);
        assert_eq!(resolver.hit_chance(100, 0), 95);
        assert_eq!(resolver.hit_chance(-200, 0), 5);
    }

    #[test]
    fn matching_block_zeroes_the_strike() {
        let resolver = StandardResolver::default();
        let attacker = sure_hit();
        let defender = StatSnapshot::default();
        let outcome = resolver.resolve(&request(
            &attacker,
            &defender,
            EffectKind::Strike,
            Some(BodyRegion::Head),
            false,
        ));
        // 95% cap: the roll may still miss, but never lands damage.
        assert!(outcome.blocked || outcome.missed);
        assert_eq!(outcome.amount, 0);
        outcome.validate().unwrap();
    }

    #[test]
    fn resistance_and_defending_reduce_spell_damage() {
        let resolver = StandardResolver::default();
        let attacker = sure_hit();
        let mut defender = StatSnapshot { defense: 8, ..StatSnapshot::default() };
        defender.resistances.insert(Element::Fire, 50);

        let open = resolver.resolve(&request(&attacker, &defender, EffectKind::Spell, None, false));
        // (20 + 4 - 8/2) = 20, halved by resistance.
        assert_eq!(open.amount, 10);
        assert!(!open.critical);

        let guarded =
            resolver.resolve(&request(&attacker, &defender, EffectKind::Spell, None, true));
        assert_eq!(guarded.amount, 5);
    }

    #[test]
    fn heals_add_healing_power() {
        let resolver = StandardResolver::default();
        let attacker = StatSnapshot { healing_power: 6, ..StatSnapshot::default() };
        let defender = StatSnapshot::default();
        let outcome =
            resolver.resolve(&request(&attacker, &defender, EffectKind::Heal, None, false));
        assert_eq!(outcome.amount, 26);
        assert!(outcome.landed());
    }

    #[test]
    fn same_request_same_outcome() {
        let resolver = StandardResolver::default();
        let attacker = StatSnapshot { critical_chance: 50, ..sure_hit() };
        let defender = StatSnapshot::default();
        let req = request(&attacker, &defender, EffectKind::Strike, None, false);
        assert_eq!(resolver.resolve(&req), resolver.resolve(&req));
    }

    #[test]
    fn huge_potency_saturates_instead_of_wrapping() {
        let resolver = StandardResolver::default();
        let attacker = StatSnapshot { critical_chance: 100, healing_power: 6, ..sure_hit() };
        let defender = StatSnapshot::default();

        let mut spell = request(&attacker, &defender, EffectKind::Spell, None, false);
        spell.action.potency = u32::MAX;
        let outcome = resolver.resolve(&spell);
        assert!(outcome.critical);
        assert_eq!(outcome.amount, u32::MAX);

        let mut heal = request(&attacker, &defender, EffectKind::Heal, None, false);
        heal.action.potency = u32::MAX;
        assert_eq!(resolver.resolve(&heal).amount, u32::MAX);
    }
}
