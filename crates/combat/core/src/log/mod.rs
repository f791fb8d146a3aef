//! Combat log: the append-only record every replay and spectator reads.

mod analytics;
mod entry;
mod export;
mod writer;

pub use analytics::{CombatAnalyticsReport, ParticipantBreakdown};
pub use entry::{CombatLogEntry, LogDraft, LogPayload, LogType, SystemEvent};
pub use export::{CSV_HEADER, ExportRecord, export_records, write_csv};
pub use writer::CombatLog;
