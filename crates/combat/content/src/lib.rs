//! Data-driven combat content and loaders.
//!
//! This crate reads encounter data from TOML files:
//! - Combat rules (`CombatConfig`: budgets, penalty curve, timers, balance)
//! - Scenarios (battle mode, seed and the starting roster)
//!
//! Content feeds battle setup in the runtime and never mutates battle state.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, LoadResult, ScenarioLoader, ScenarioSpec};
