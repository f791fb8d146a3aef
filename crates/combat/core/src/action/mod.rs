//! Participant actions and their validation.
//!
//! - [`types`] defines the tagged action variants and [`ActionSelection`]
//! - [`budget`] is the Action Budget Calculator
//! - [`spatial`] extends it with grid movement and reach for tactical matches

mod budget;
mod error;
mod spatial;
mod types;

pub use budget::{ActionBudget, BudgetCalculator, BudgetVerdict, CostBreakdown, DroppedSkill};
pub use error::ValidationError;
pub use spatial::GridBudgetCalculator;
pub use types::{
    ActionSelection, AttackAction, BlockAction, BodyRegion, CombatAction, Element, MoveAction,
    SkillAction, SkillEffect,
};
