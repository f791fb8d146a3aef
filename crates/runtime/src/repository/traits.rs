//! Repository contracts for battle persistence.

use combat_core::{BattleId, BattleState, CombatLogEntry};

use super::Result;

/// Append-only store of combat log entries.
pub trait LogRepository: Send + Sync {
    /// Append entries in sequence order.
    fn append(&self, battle: BattleId, entries: &[CombatLogEntry]) -> Result<()>;

    /// Every stored entry for `battle`, in sequence order.
    fn load(&self, battle: BattleId) -> Result<Vec<CombatLogEntry>>;
}

/// Snapshot store for battles.
pub trait BattleRepository: Send + Sync {
    /// Save (or overwrite) the snapshot for `state.battle.id`.
    fn save(&self, state: &BattleState) -> Result<()>;

    fn load(&self, battle: BattleId) -> Result<Option<BattleState>>;

    /// All stored battle ids.
    fn list(&self) -> Result<Vec<BattleId>> {
        Ok(vec![])
    }
}
