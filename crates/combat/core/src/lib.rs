//! Deterministic turn resolution for multi-party combat.
//!
//! `combat-core` defines the canonical rules (action budgets, round and turn
//! resolution, outcome detection) and the append-only combat log. It performs
//! no I/O and keeps no clocks: the runtime feeds it submissions and `now`, and
//! every state change flows through [`engine::BattleEngine`].
pub mod action;
pub mod combat;
pub mod config;
pub mod engine;
pub mod error;
pub mod log;
pub mod state;

pub use action::{
    ActionBudget, ActionSelection, AttackAction, BlockAction, BodyRegion, BudgetCalculator,
    BudgetVerdict, CombatAction, CostBreakdown, DroppedSkill, Element, GridBudgetCalculator,
    MoveAction, SkillAction, SkillEffect, ValidationError,
};
pub use combat::{DamageResolver, FlatResolver, Outcome, ResolveRequest, StandardResolver};
pub use config::{
    BalanceTable, CombatConfig, DefaultAction, ExtraBlockPolicy, FatigueConfig, GridConfig,
    PenaltyCurve,
};
pub use engine::{
    BattleEngine, EngineError, InvariantViolation, OutcomeDetector, RoundReport, StateError,
    SubmitReceipt, VitalsChange, VitalsKind, replay,
};
pub use error::{CombatError, ErrorSeverity};
pub use log::{
    CombatAnalyticsReport, CombatLog, CombatLogEntry, ExportRecord, LogDraft, LogPayload, LogType,
    SystemEvent, export_records, write_csv,
};
pub use state::{
    AttackTemplate, Battle, BattleId, BattleMode, BattleResult, BattleState, BattleStatus,
    Controller, GridPosition, Loadout, Participant, ParticipantId, ParticipantSpec,
    ParticipantStore, RoundRecord, ShareToken, SkillTemplate, StatSnapshot, Team, Withdrawal,
};
