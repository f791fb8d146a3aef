//! Combat configuration loader.

use std::path::Path;

use anyhow::Context;
use combat_core::CombatConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for combat rules from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a `CombatConfig` from a TOML file.
    ///
    /// Every field is optional; missing ones keep their defaults.
    pub fn load(path: &Path) -> LoadResult<CombatConfig> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("in {}", path.display()))
    }

    pub fn parse(content: &str) -> LoadResult<CombatConfig> {
        let config: CombatConfig =
            toml::from_str(content).context("Failed to parse combat config TOML")?;
        if config.action_points_per_turn == 0 {
            anyhow::bail!("action_points_per_turn must be positive");
        }
        if config.grid.width == 0 || config.grid.height == 0 {
            anyhow::bail!("grid dimensions must be positive");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::{DefaultAction, ExtraBlockPolicy};

    #[test]
    fn partial_file_keeps_defaults() {
        let config = ConfigLoader::parse(
            r#"
            action_points_per_turn = 100
            multi_attack_penalty = [0, 10, 20]
            timeout_default = "pass"
            extra_block_policy = "reject"
            max_rounds = 30

            [fatigue]
            per_attack = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.action_points_per_turn, 100);
        assert_eq!(config.multi_attack_penalty.penalty_for(7), 20);
        assert_eq!(config.timeout_default, DefaultAction::Pass);
        assert_eq!(config.extra_block_policy, ExtraBlockPolicy::Reject);
        assert_eq!(config.max_rounds, Some(30));
        assert_eq!(config.fatigue.per_attack, 2);
        assert_eq!(config.fatigue.max, CombatConfig::default().fatigue.max);
        assert_eq!(config.max_resource_per_turn, CombatConfig::DEFAULT_MAX_RESOURCE_PER_TURN);
    }

    #[test]
    fn zero_budget_is_rejected() {
        assert!(ConfigLoader::parse("action_points_per_turn = 0").is_err());
        assert!(ConfigLoader::parse("action_points_per_turn = \"many\"").is_err());
    }
}
