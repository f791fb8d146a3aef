//! Print the analytics report for a stored combat log
//!
//! Rates (DPS/HPS) are only shown when the battle's snapshot sits next to
//! the log, since entries carry no wall-clock time.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use combat_core::CombatAnalyticsReport;

use crate::utils;

/// Print the analytics report for a stored combat log
#[derive(Parser)]
pub struct Report {
    /// Log file to analyse (`<battle>.jsonl`)
    #[arg(value_name = "LOG")]
    log: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Totals and per-participant breakdown
    Summary,
    /// Full JSON output
    Json,
}

impl Report {
    pub fn execute(self) -> Result<()> {
        let log = utils::read_log(&self.log)?;
        let snapshot = utils::sibling_snapshot(&self.log)?;
        let duration = snapshot.as_ref().and_then(|state| {
            let started = state.battle.started_at?;
            let ended = state.battle.ended_at?;
            Some(ended - started)
        });

        let report = CombatAnalyticsReport::from_entries(log.entries(), duration);
        match self.format {
            OutputFormat::Summary => print_summary(&report),
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&report)
                    .context("Failed to serialize report to JSON")?;
                println!("{json}");
            }
        }
        Ok(())
    }
}

fn print_summary(report: &CombatAnalyticsReport) {
    println!("{}", style("=== Combat Analytics ===").bold().green());
    if let Some(battle) = report.battle_id {
        println!("{} {}", style("Battle:").bold().cyan(), battle);
    }
    println!("{} {}", style("Rounds:").bold().cyan(), report.rounds);
    println!("{} {}", style("Entries:").bold().cyan(), report.entries);
    println!("{} {}", style("Total damage:").bold().cyan(), report.total_damage);
    println!("{} {}", style("Total healing:").bold().cyan(), report.total_healing);
    if let Some(secs) = report.duration_secs {
        println!("{} {:.1}s", style("Duration:").bold().cyan(), secs);
    }
    if let (Some(dps), Some(hps)) = (report.dps, report.hps) {
        println!("{} {:.2} / {:.2}", style("DPS / HPS:").bold().cyan(), dps, hps);
    }
    println!();

    println!("{}", style("Damage by round:").bold().yellow());
    for (round, damage) in &report.damage_by_round {
        let healing = report.healing_by_round.get(round).copied().unwrap_or(0);
        println!("  Round {round:>3}: {damage:>5} dmg, {healing:>5} heal");
    }
    println!();

    println!("{}", style("Participants:").bold().yellow());
    for (participant, breakdown) in &report.participants {
        println!(
            "  {}: dealt {}, received {}, healed {}, hits {}/{} blocked, {} misses, {} crits, {} kills",
            participant,
            breakdown.total_damage_dealt(),
            breakdown.damage_received.values().sum::<u64>(),
            breakdown.healing_done,
            breakdown.hits_landed,
            breakdown.hits_blocked,
            breakdown.misses,
            breakdown.criticals,
            breakdown.kills,
        );
    }
    if let Some(top) = report.top_damage_dealer() {
        println!();
        println!("{} {}", style("Top damage dealer:").bold().cyan(), top);
    }
}
