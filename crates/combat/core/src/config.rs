//! Combat configuration: budgets, penalty curve, timers and balance tables.
//!
//! Every tunable lives here so the budget calculator and the round resolver
//! are pure functions of `(state, config)`. All fields default, so partial
//! TOML files load.

use std::time::Duration;

/// Escalating multi-attack penalty indexed by attack count.
///
/// Counts past the end of the table reuse the last value; an empty table
/// means no penalty.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PenaltyCurve(pub Vec<u32>);

impl PenaltyCurve {
    pub fn penalty_for(&self, attack_count: usize) -> u32 {
        self.0
            .get(attack_count)
            .or_else(|| self.0.last())
            .copied()
            .unwrap_or(0)
    }
}

impl Default for PenaltyCurve {
    fn default() -> Self {
        Self(vec![0, 0, 25, 75, 150, 250])
    }
}

/// What to do when a selection carries more than one block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ExtraBlockPolicy {
    /// Keep the first block, silently drop the rest.
    #[default]
    KeepFirst,
    /// Reject the whole selection.
    Reject,
}

/// Action applied to a participant who missed the submission deadline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DefaultAction {
    Pass,
    #[default]
    Defend,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FatigueConfig {
    pub per_attack: u32,
    pub recovery_per_round: u32,
    /// Fatigue is a percentage potency reduction; capped here.
    pub max: u32,
}

impl Default for FatigueConfig {
    fn default() -> Self {
        Self {
            per_attack: 5,
            recovery_per_round: 3,
            max: 50,
        }
    }
}

/// Board used by tactical matches.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GridConfig {
    pub width: u32,
    pub height: u32,
    /// AP charged per tile moved.
    pub move_cost_per_tile: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            move_cost_per_tile: 5,
        }
    }
}

/// Balance parameters for [`crate::combat::StandardResolver`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BalanceTable {
    pub hit_chance_base: i32,
    pub hit_chance_min: u32,
    pub hit_chance_max: u32,
    /// Critical multiplier in percent (200 = double damage).
    pub critical_multiplier: u32,
    pub defense_divisor: u32,
    /// Percent of damage removed while defending.
    pub defend_reduction: u32,
    pub minimum_damage: u32,
}

impl Default for BalanceTable {
    fn default() -> Self {
        Self {
            hit_chance_base: 85,
            hit_chance_min: 5,
            hit_chance_max: 95,
            critical_multiplier: 200,
            defense_divisor: 2,
            defend_reduction: 50,
            minimum_damage: 1,
        }
    }
}

/// Tunable combat rules for one battle.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatConfig {
    pub action_points_per_turn: u32,
    pub max_resource_per_turn: u32,
    pub multi_attack_penalty: PenaltyCurve,
    pub extra_block_policy: ExtraBlockPolicy,
    /// Ready participants needed before a pending battle starts.
    pub min_participants: usize,
    pub round_deadline_ms: u64,
    pub turn_time_limit_ms: u64,
    pub timeout_default: DefaultAction,
    pub resource_regen_per_round: u32,
    pub fatigue: FatigueConfig,
    pub grid: GridConfig,
    /// Rounds after which an undecided battle ends in a draw.
    pub max_rounds: Option<u32>,
    pub balance: BalanceTable,
}

impl CombatConfig {
    pub const DEFAULT_ACTION_POINTS: u32 = 80;
    pub const DEFAULT_MAX_RESOURCE_PER_TURN: u32 = 50;
    pub const DEFAULT_ROUND_DEADLINE_MS: u64 = 30_000;
    pub const DEFAULT_TURN_TIME_LIMIT_MS: u64 = 20_000;

    pub fn new() -> Self {
        Self {
            action_points_per_turn: Self::DEFAULT_ACTION_POINTS,
            max_resource_per_turn: Self::DEFAULT_MAX_RESOURCE_PER_TURN,
            multi_attack_penalty: PenaltyCurve::default(),
            extra_block_policy: ExtraBlockPolicy::default(),
            min_participants: 2,
            round_deadline_ms: Self::DEFAULT_ROUND_DEADLINE_MS,
            turn_time_limit_ms: Self::DEFAULT_TURN_TIME_LIMIT_MS,
            timeout_default: DefaultAction::default(),
            resource_regen_per_round: 5,
            fatigue: FatigueConfig::default(),
            grid: GridConfig::default(),
            max_rounds: None,
            balance: BalanceTable::default(),
        }
    }

    pub fn round_deadline(&self) -> Duration {
        Duration::from_millis(self.round_deadline_ms)
    }

    pub fn turn_time_limit(&self) -> Duration {
        Duration::from_millis(self.turn_time_limit_ms)
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn penalty_uses_last_value_past_the_table() {
        let curve = PenaltyCurve(vec![0, 0, 25, 75, 150, 250]);
        assert_eq!(curve.penalty_for(0), 0);
        assert_eq!(curve.penalty_for(1), 0);
        assert_eq!(curve.penalty_for(3), 75);
        assert_eq!(curve.penalty_for(5), 250);
        assert_eq!(curve.penalty_for(9), 250);
        assert_eq!(PenaltyCurve(vec![]).penalty_for(4), 0);
    }
}
