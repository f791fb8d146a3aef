//! Async orchestration for live battles.
//!
//! Each battle runs in its own worker task that owns the authoritative
//! [`combat_core::BattleState`]. Callers talk to it through a cloneable
//! [`BattleHandle`]; the worker serializes submissions, arms the round
//! deadline and publishes results.
//!
//! Modules are organized by responsibility:
//! - [`arena`] hosts the battle registry and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the topic event bus and the gateway contract
//! - [`repository`] persists logs and final snapshots
//! - `workers` keeps the battle worker internal to the crate
pub mod api;
pub mod arena;
pub mod events;
pub mod repository;

mod workers;

pub use api::{
    ActionProvider, AggressiveProvider, BattleHandle, PassProvider, Result, RuntimeError,
    Spectator, SubmissionAck,
};
pub use arena::{Arena, ArenaBuilder, RuntimeConfig};
pub use events::{
    BattleEnded, BattleEvent, BattleStarted, Event, EventBus, RoundResolved, SyncGateway, Topic,
    VitalsChanged,
};
pub use repository::{
    BattleRepository, FileBattleRepo, InMemoryBattleRepo, InMemoryLogRepo, JsonLinesLogRepo,
    LogRepository, RepositoryError,
};
