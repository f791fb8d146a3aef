//! Deterministic random rolls for the reference resolver.
//!
//! Every roll is a pure function of its seed, so a battle replayed from its
//! records draws exactly the same numbers.

pub trait RngOracle: Send + Sync {
    fn next_u32(&self, seed: u64) -> u32;

    /// Roll a d100 (1-100 inclusive).
    fn roll_d100(&self, seed: u64) -> u32 {
        (self.next_u32(seed) % 100) + 1
    }

    /// Value in `[min, max]` inclusive.
    fn range(&self, seed: u64, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        min + (self.next_u32(seed) % (max - min + 1))
    }
}

/// PCG-XSH-RR: 64-bit state, 32-bit output.
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::output(Self::step(seed))
    }
}

/// Derives the seed of one roll.
///
/// * `battle_seed` - fixed when the battle is created
/// * `nonce` - round number and action slot, see [`action_nonce`]
/// * `actor` - participant performing the action
/// * `context` - distinguishes several rolls of the same action (hit, crit, ...)
pub fn compute_seed(battle_seed: u64, nonce: u64, actor: u32, context: u32) -> u64 {
    let mut hash = battle_seed;
    hash ^= nonce.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= u64::from(actor).wrapping_mul(0x517cc1b727220a95);
    hash ^= u64::from(context).wrapping_mul(0x85ebca6b);

    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;
    hash
}

/// Packs a round number and the action's position within it.
pub fn action_nonce(round: u32, slot: u32) -> u64 {
    (u64::from(round) << 32) | u64::from(slot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolls_are_pure_functions_of_the_seed() {
        let rng = PcgRng;
        let seed = compute_seed(42, action_nonce(3, 1), 7, 0);
        assert_eq!(rng.next_u32(seed), rng.next_u32(seed));
        assert_ne!(seed, compute_seed(42, action_nonce(3, 1), 7, 1));
        assert_ne!(seed, compute_seed(42, action_nonce(3, 2), 7, 0));
    }

    #[test]
    fn d100_stays_in_range() {
        let rng = PcgRng;
        for n in 0..1_000u64 {
            let roll = rng.roll_d100(compute_seed(9, n, 1, 0));
            assert!((1..=100).contains(&roll));
        }
        assert_eq!(rng.range(5, 10, 10), 10);
    }
}
