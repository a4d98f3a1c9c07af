//! CSV mirror of the URL ledger
//!
//! `visited_urls_<domain>.csv` is rewritten every time the ledger is
//! persisted. Projects created before the SQLite ledger existed only have this
//! file; it is imported when the database is empty.

use crate::ledger::{Ledger, LedgerEntry, VISIT_DATE_FORMAT};
use crate::output::{OutputError, OutputResult};
use crate::state::UrlStatus;
use chrono::NaiveDate;
use std::path::Path;

/// Header row of the ledger CSV
pub const LEDGER_CSV_HEADER: [&str; 5] = ["URL", "Status", "Data", "MD File", "JSON File"];

/// Writes every ledger row, in ledger order
pub fn write_ledger_csv(path: &Path, ledger: &Ledger) -> OutputResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(LEDGER_CSV_HEADER)?;

    for entry in ledger.entries() {
        writer.write_record([
            entry.url.as_str(),
            entry.status.to_db_string(),
            entry.visit_date_string().as_str(),
            entry.markdown_file.as_deref().unwrap_or_default(),
            entry.json_file.as_deref().unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Reads a ledger CSV, accepting the legacy `1`/`2` status codes
///
/// Missing trailing columns are treated as empty.
pub fn read_ledger_csv(path: &Path) -> OutputResult<Ledger> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let mut entries = Vec::new();

    for result in reader.records() {
        let record = result?;
        let column = |i: usize| record.get(i).map(str::trim).unwrap_or_default();

        let url = column(0);
        if url.is_empty() {
            continue;
        }

        let status = UrlStatus::from_db_string(column(1)).ok_or_else(|| {
            OutputError::Format(format!("unknown status '{}' for {}", column(1), url))
        })?;

        let optional = |value: &str| (!value.is_empty()).then(|| value.to_string());

        entries.push(LedgerEntry {
            url: url.to_string(),
            status,
            last_visited: NaiveDate::parse_from_str(column(2), VISIT_DATE_FORMAT).ok(),
            markdown_file: optional(column(3)),
            json_file: optional(column(4)),
        });
    }

    Ok(Ledger::from_entries(entries))
}
