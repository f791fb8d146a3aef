//! Export a stored combat log as CSV
//!
//! Reads a `<battle>.jsonl` file written by the JSON-lines log repository
//! and flattens it into one row per entry.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use combat_core::{export_records, write_csv};

use crate::utils;

/// Export a stored combat log as CSV
#[derive(Parser)]
pub struct ExportCsv {
    /// Log file to export (`<battle>.jsonl`)
    #[arg(value_name = "LOG")]
    log: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl ExportCsv {
    pub fn execute(self) -> Result<()> {
        let log = utils::read_log(&self.log)?;
        let records = export_records(&log);

        match &self.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create output file: {}", path.display()))?;
                write_csv(&records, BufWriter::new(file))
                    .with_context(|| format!("Failed to write CSV: {}", path.display()))?;
                eprintln!(
                    "{} {} rows written to {}",
                    style("✓").green().bold(),
                    records.len(),
                    path.display()
                );
            }
            None => {
                write_csv(&records, io::stdout().lock()).context("Failed to write CSV to stdout")?;
            }
        }
        Ok(())
    }
}
