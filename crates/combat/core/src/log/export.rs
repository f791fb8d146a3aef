//! Flat export format for offline analysis.

use std::io;

use super::entry::LogType;
use super::writer::CombatLog;

pub const CSV_HEADER: [&str; 7] = [
    "round_number",
    "sequence",
    "log_type",
    "message",
    "damage_amount",
    "healing_amount",
    "tags",
];

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExportRecord {
    pub round_number: u32,
    pub sequence: u64,
    pub log_type: LogType,
    pub message: String,
    pub damage_amount: u32,
    pub healing_amount: u32,
    pub tags: Vec<String>,
}

/// Log entries in sequence order, flattened.
pub fn export_records(log: &CombatLog) -> Vec<ExportRecord> {
    log.entries()
        .iter()
        .map(|entry| ExportRecord {
            round_number: entry.round_number,
            sequence: entry.sequence,
            log_type: entry.log_type,
            message: entry.message.clone(),
            damage_amount: entry.damage_amount,
            healing_amount: entry.healing_amount,
            tags: entry.tags.iter().cloned().collect(),
        })
        .collect()
}

/// Writes records as CSV with a header row; tags are joined with `;`.
pub fn write_csv<W: io::Write>(records: &[ExportRecord], writer: W) -> Result<(), csv::Error> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)?;
    for record in records {
        csv.write_record([
            record.round_number.to_string(),
            record.sequence.to_string(),
            record.log_type.to_string(),
            record.message.clone(),
            record.damage_amount.to_string(),
            record.healing_amount.to_string(),
            record.tags.join(";"),
        ])?;
    }
    csv.flush()?;
    Ok(())
}
