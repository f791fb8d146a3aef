//! Scenario loader: battle mode, seed and the starting roster.
//!
//! ```toml
//! name = "ambush"
//! mode = "alternating_turn"
//! seed = 42
//!
//! [[participants]]
//! id = 1
//! name = "Aria"
//! team = "alpha"
//! max_hp = 80
//! position = { x = 0, y = 0 }
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Context;
use combat_core::{Battle, BattleMode, BattleState, CombatConfig, ParticipantSpec};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Encounter setup as stored on disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mode: BattleMode,
    #[serde(default)]
    pub seed: u64,
    pub participants: Vec<ParticipantSpec>,
}

impl ScenarioSpec {
    /// Builds a fresh pending battle for this roster.
    pub fn into_state(self, config: &CombatConfig) -> BattleState {
        let battle = Battle::new(
            self.mode,
            config.action_points_per_turn,
            config.max_resource_per_turn,
            self.seed,
        );
        BattleState::new(battle, self.participants)
    }

    fn validate(&self, config: &CombatConfig) -> LoadResult<()> {
        let mut ids = BTreeSet::new();
        let mut cells = BTreeSet::new();
        for participant in &self.participants {
            if !ids.insert(participant.id) {
                anyhow::bail!("duplicate participant id {}", participant.id);
            }
            if participant.max_hp == 0 {
                anyhow::bail!("participant {} has no hit points", participant.name);
            }
            if let Some(cell) = participant.position {
                let grid = &config.grid;
                if cell.x < 0 || cell.y < 0 || cell.x as u32 >= grid.width || cell.y as u32 >= grid.height {
                    anyhow::bail!("participant {} starts off the grid at {cell}", participant.name);
                }
                if !cells.insert(cell) {
                    anyhow::bail!("two participants start on {cell}");
                }
            }
        }

        let teams: BTreeSet<_> = self.participants.iter().map(|p| &p.team).collect();
        if teams.len() < 2 {
            anyhow::bail!("scenario '{}' needs at least two teams", self.name);
        }
        if self.mode == BattleMode::AlternatingTurn && self.participants.iter().any(|p| p.position.is_none()) {
            anyhow::bail!("alternating-turn scenario '{}' needs a position for every participant", self.name);
        }
        Ok(())
    }
}

/// Loader for scenario files.
pub struct ScenarioLoader;

impl ScenarioLoader {
    /// Load and validate a scenario against the grid in `config`.
    pub fn load(path: &Path, config: &CombatConfig) -> LoadResult<ScenarioSpec> {
        let content = read_file(path)?;
        Self::parse(&content, config).with_context(|| format!("in {}", path.display()))
    }

    pub fn parse(content: &str, config: &CombatConfig) -> LoadResult<ScenarioSpec> {
        let scenario: ScenarioSpec =
            toml::from_str(content).context("Failed to parse scenario TOML")?;
        scenario.validate(config)?;
        Ok(scenario)
    }
}
