//! Worker tasks that back the runtime orchestration.
//!
//! One [`BattleWorker`] per battle owns its state; nothing else mutates it.

mod coordinator;

pub use coordinator::{BattleWorker, Command, WorkerServices};
