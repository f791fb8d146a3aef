//! File-backed repositories.
//!
//! Logs are JSON lines, one file per battle (`<battle>.jsonl`), so they can
//! be tailed or grepped. Snapshots are one pretty-printed JSON document per
//! battle (`<battle>.json`), written through a temp file and renamed.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use combat_core::{BattleId, BattleState, CombatLogEntry};

use crate::repository::{BattleRepository, LogRepository, RepositoryError, Result};

fn parse_id(stem: &str) -> Option<BattleId> {
    stem.parse().ok().map(BattleId)
}

/// Append-only JSON-lines combat log store.
pub struct JsonLinesLogRepo {
    dir: PathBuf,
    /// Serializes appends so concurrent battles never interleave lines.
    write_lock: Mutex<()>,
}

impl JsonLinesLogRepo {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path_for(&self, battle: BattleId) -> PathBuf {
        self.dir.join(format!("{battle}.jsonl"))
    }

    /// Reads a log file written by this repository.
    pub fn read_file(path: &Path) -> Result<Vec<CombatLogEntry>> {
        let reader = BufReader::new(File::open(path)?);
        let mut entries = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: CombatLogEntry = serde_json::from_str(&line).map_err(|e| {
                RepositoryError::CorruptedData(format!("{} line {}: {e}", path.display(), index + 1))
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }
}

impl LogRepository for JsonLinesLogRepo {
    fn append(&self, battle: BattleId, entries: &[CombatLogEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(battle))?;
        let mut writer = BufWriter::new(file);
        for entry in entries {
            serde_json::to_writer(&mut writer, entry)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        tracing::trace!(target: "runtime::repository", battle = %battle, count = entries.len(), "log entries appended");
        Ok(())
    }

    fn load(&self, battle: BattleId) -> Result<Vec<CombatLogEntry>> {
        let path = self.path_for(battle);
        if !path.exists() {
            return Ok(Vec::new());
        }
        Self::read_file(&path)
    }
}

/// One JSON snapshot per battle.
pub struct FileBattleRepo {
    dir: PathBuf,
}

impl FileBattleRepo {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, battle: BattleId) -> PathBuf {
        self.dir.join(format!("{battle}.json"))
    }
}

impl BattleRepository for FileBattleRepo {
    fn save(&self, state: &BattleState) -> Result<()> {
        let path = self.path_for(state.battle.id);
        let staging = path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&staging)?);
            serde_json::to_writer_pretty(&mut writer, state)?;
            writer.flush()?;
        }
        std::fs::rename(&staging, &path)?;
        Ok(())
    }

    fn load(&self, battle: BattleId) -> Result<Option<BattleState>> {
        let path = self.path_for(battle);
        if !path.exists() {
            return Ok(None);
        }
        let reader = BufReader::new(File::open(&path)?);
        let state: BattleState = serde_json::from_reader(reader)?;
        if state.battle.id != battle {
            return Err(RepositoryError::CorruptedData(format!(
                "{} holds battle {}",
                path.display(),
                state.battle.id
            )));
        }
        Ok(Some(state))
    }

    fn list(&self) -> Result<Vec<BattleId>> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && let Some(id) = path.file_stem().and_then(|s| s.to_str()).and_then(parse_id)
            {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}
