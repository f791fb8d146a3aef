//! Damage/Healing resolution.
//!
//! - [`resolver`] defines the pluggable [`DamageResolver`] contract
//! - [`standard`] is the reference implementation driven by the balance table
//! - [`rng`] supplies the deterministic rolls both rely on

pub mod resolver;
pub mod rng;
pub mod standard;

pub use resolver::{
    ActionDescriptor, AttackerView, DamageResolver, DefenderView, EffectKind, FlatResolver,
    Outcome, ResolveRequest,
};
pub use rng::{PcgRng, RngOracle, action_nonce, compute_seed};
pub use standard::StandardResolver;
