//! Repository layer for battle data
//!
//! Repositories persist what a battle produces:
//! - Combat log entries (append-only, per battle)
//! - Final battle snapshots
//!
//! Workers treat persistence as best-effort: a failing repository is logged
//! and never holds up resolution.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::{FileBattleRepo, JsonLinesLogRepo};
pub use memory::{InMemoryBattleRepo, InMemoryLogRepo};
pub use traits::{BattleRepository, LogRepository};
