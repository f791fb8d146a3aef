//! Run a scenario end-to-end
//!
//! Every participant is driven by the aggressive AI stand-in. The log is
//! written as JSON lines and the final snapshot as JSON, both named after
//! the battle id.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use combat_content::{ConfigLoader, ScenarioLoader};
use combat_core::{BattleState, CombatConfig, Controller};
use combat_runtime::{AggressiveProvider, Arena, FileBattleRepo, JsonLinesLogRepo, RuntimeConfig};

use crate::utils;

/// Rounds an uncapped simulation is allowed before it is called a draw.
const SIMULATION_ROUND_CAP: u32 = 200;

/// Run a scenario with AI stand-ins
#[derive(Parser)]
pub struct Simulate {
    /// Scenario file (TOML roster)
    #[arg(value_name = "SCENARIO")]
    scenario: PathBuf,

    /// Combat config file (TOML); defaults apply when omitted
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Output directory for the log and snapshot (default: $COMBAT_LOG_DIR or ./battle-logs)
    #[arg(short, long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Print the final state as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

impl Simulate {
    pub fn execute(self) -> Result<()> {
        tokio::runtime::Runtime::new()?.block_on(self.execute_async())
    }

    async fn execute_async(self) -> Result<()> {
        let mut config = match &self.config {
            Some(path) => ConfigLoader::load(path)?,
            None => CombatConfig::default(),
        };
        if config.max_rounds.is_none() {
            tracing::info!(cap = SIMULATION_ROUND_CAP, "no round cap configured, using the simulation cap");
            config.max_rounds = Some(SIMULATION_ROUND_CAP);
        }

        let mut scenario = ScenarioLoader::load(&self.scenario, &config)?;
        if let Some(seed) = self.seed {
            scenario.seed = seed;
        }
        for participant in &mut scenario.participants {
            participant.controller = Controller::Ai;
        }
        let name = scenario.name.clone();
        let state = scenario.into_state(&config);

        let out = utils::log_dir(self.out);
        let logs = JsonLinesLogRepo::new(&out)
            .with_context(|| format!("Failed to prepare output directory: {}", out.display()))?;
        let battles = FileBattleRepo::new(&out)
            .with_context(|| format!("Failed to prepare output directory: {}", out.display()))?;
        let log_path = logs.path_for(state.battle.id);

        let arena = Arena::builder()
            .config(RuntimeConfig {
                combat: config,
                ..RuntimeConfig::default()
            })
            .provider(AggressiveProvider::default())
            .log_repository(Arc::new(logs))
            .battle_repository(Arc::new(battles))
            .build();

        let handle = arena.create_battle(state).await?;
        let finished = loop {
            let state = handle.query_state().await?;
            if state.battle.is_completed() {
                break state;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        };
        drop(handle);
        arena.shutdown().await?;

        if self.json {
            let json = serde_json::to_string_pretty(&finished)
                .context("Failed to serialize battle state to JSON")?;
            println!("{json}");
        } else {
            print_summary(&name, &finished);
            println!("{} {}", style("Log:").bold().cyan(), log_path.display());
        }
        Ok(())
    }
}

fn print_summary(name: &str, state: &BattleState) {
    let title = if name.is_empty() { "Battle" } else { name };
    println!("{}", style(format!("=== {title} ===")).bold().green());
    println!("{} {}", style("Battle:").bold().cyan(), state.battle.id);
    println!("{} {}", style("Mode:").bold().cyan(), state.battle.mode);
    println!("{} {}", style("Seed:").bold().cyan(), state.battle.seed);
    println!("{} {}", style("Rounds:").bold().cyan(), state.battle.round_number);
    match state.battle.result() {
        Some(result) => println!("{} {}", style("Result:").bold().cyan(), style(result).bold()),
        None => println!("{} {}", style("Result:").bold().cyan(), style("unfinished").red()),
    }
    println!();

    println!("{}", style("Participants:").bold().yellow());
    for participant in state.participants.iter() {
        let status = if !participant.is_alive() {
            style("dead").red().to_string()
        } else if let Some(withdrawal) = participant.withdrawal() {
            style(format!("withdrawn ({withdrawal:?})")).yellow().to_string()
        } else {
            style("standing").green().to_string()
        };
        println!(
            "  {} [{}] HP {}/{} - {}",
            participant.name,
            participant.team,
            participant.current_hp(),
            participant.max_hp(),
            status
        );
    }
    println!();
    println!("{} {}", style("Log entries:").bold().cyan(), state.log.len());
}
