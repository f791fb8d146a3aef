//! Command implementations for xtask
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod export_csv;
mod report;
mod simulate;

pub use export_csv::ExportCsv;
pub use report::Report;
pub use simulate::Simulate;
