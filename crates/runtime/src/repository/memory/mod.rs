//! In-memory repositories for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;

use combat_core::{BattleId, BattleState, CombatLogEntry};

use crate::repository::{BattleRepository, LogRepository, RepositoryError, Result};

#[derive(Default)]
pub struct InMemoryLogRepo {
    entries: RwLock<HashMap<BattleId, Vec<CombatLogEntry>>>,
}

impl InMemoryLogRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogRepository for InMemoryLogRepo {
    fn append(&self, battle: BattleId, entries: &[CombatLogEntry]) -> Result<()> {
        let mut logs = self
            .entries
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let log = logs.entry(battle).or_default();
        if let (Some(last), Some(first)) = (log.last(), entries.first())
            && first.sequence <= last.sequence
        {
            return Err(RepositoryError::CorruptedData(format!(
                "sequence {} appended after {}",
                first.sequence, last.sequence
            )));
        }
        log.extend_from_slice(entries);
        Ok(())
    }

    fn load(&self, battle: BattleId) -> Result<Vec<CombatLogEntry>> {
        let logs = self
            .entries
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(logs.get(&battle).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct InMemoryBattleRepo {
    battles: RwLock<HashMap<BattleId, BattleState>>,
}

impl InMemoryBattleRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BattleRepository for InMemoryBattleRepo {
    fn save(&self, state: &BattleState) -> Result<()> {
        let mut battles = self
            .battles
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        battles.insert(state.battle.id, state.clone());
        Ok(())
    }

    fn load(&self, battle: BattleId) -> Result<Option<BattleState>> {
        let battles = self
            .battles
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(battles.get(&battle).cloned())
    }

    fn list(&self) -> Result<Vec<BattleId>> {
        let battles = self
            .battles
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let mut ids: Vec<BattleId> = battles.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}
