//! Utility functions for xtask commands

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use combat_core::{BattleId, BattleState, CombatLog};
use combat_runtime::JsonLinesLogRepo;

/// Directory simulate writes to unless told otherwise.
pub fn log_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| std::env::var_os("COMBAT_LOG_DIR").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("battle-logs"))
}

/// Reads a `<battle>.jsonl` log and checks its ordering.
pub fn read_log(path: &Path) -> Result<CombatLog> {
    if !path.exists() {
        bail!("Log file not found: {}", path.display());
    }
    let entries = JsonLinesLogRepo::read_file(path)
        .with_context(|| format!("Failed to read log file: {}", path.display()))?;
    let Some(first) = entries.first() else {
        bail!("Log file is empty: {}", path.display());
    };
    let battle_id: BattleId = first.battle_id;
    CombatLog::from_entries(battle_id, entries)
        .with_context(|| format!("Log file is out of order: {}", path.display()))
}

/// Loads the `<battle>.json` snapshot stored next to a log, when there is one.
pub fn sibling_snapshot(log_path: &Path) -> Result<Option<BattleState>> {
    let snapshot = log_path.with_extension("json");
    if !snapshot.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&snapshot)
        .with_context(|| format!("Failed to read snapshot: {}", snapshot.display()))?;
    let state = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse snapshot: {}", snapshot.display()))?;
    Ok(Some(state))
}
