//! Ledger statistics for the `stats` command
//!
//! This module provides functionality for extracting and displaying
//! per-status counts from a project's ledger database.

use crate::state::UrlStatus;
use crate::storage::{LedgerStore, RunRecord, StorageResult};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Ledger statistics summary
#[derive(Debug, Clone)]
pub struct LedgerStatistics {
    /// Total number of URLs in the ledger
    pub total_urls: u64,

    /// Count of URLs by status
    pub urls_by_status: HashMap<UrlStatus, u64>,

    /// Most recent visit date of any URL
    pub last_visit: Option<NaiveDate>,

    /// Most recent crawl run
    pub latest_run: Option<RunRecord>,
}

impl LedgerStatistics {
    pub fn count(&self, status: UrlStatus) -> u64 {
        self.urls_by_status.get(&status).copied().unwrap_or(0)
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(LedgerStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn LedgerStore) -> StorageResult<LedgerStatistics> {
    let mut urls_by_status = HashMap::new();
    for status in UrlStatus::all() {
        urls_by_status.insert(status, storage.count_by_status(status)?);
    }

    let ledger = storage.load_ledger()?;

    Ok(LedgerStatistics {
        total_urls: urls_by_status.values().sum(),
        urls_by_status,
        last_visit: ledger.last_visit(),
        latest_run: storage.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `project` - Project slug shown in the heading
/// * `stats` - The statistics to display
pub fn print_statistics(project: &str, stats: &LedgerStatistics) {
    println!("=== Ledger Statistics: {} ===\n", project);

    println!("URLs by Status:");
    for status in UrlStatus::all() {
        let count = stats.count(status);
        let percentage = if stats.total_urls > 0 {
            (count as f64 / stats.total_urls as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
    println!("  Total: {}", stats.total_urls);
    println!();

    match stats.last_visit {
        Some(date) => println!("Last visit: {}", date),
        None => println!("Last visit: never"),
    }

    if let Some(run) = &stats.latest_run {
        println!();
        println!("Latest Run:");
        println!("  ID: {}", run.id);
        println!("  Started: {}", run.started_at);
        if let Some(finished) = &run.finished_at {
            println!("  Finished: {}", finished);
        }
        println!("  Status: {}", run.status.to_db_string());
        println!(
            "  Pages: {} processed, {} failed",
            run.pages_processed, run.pages_failed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;
    use crate::storage::SqliteStorage;
    use tempfile::TempDir;

    #[test]
    fn test_load_statistics() {
        let dir = TempDir::new().unwrap();
        let mut storage = SqliteStorage::new(&dir.path().join("ledger.db")).unwrap();

        let mut ledger = Ledger::new();
        ledger.insert_pending("https://example.com/");
        ledger.insert_pending("https://example.com/a");
        ledger.insert_pending("https://example.com/b");
        ledger.mark_visited(
            "https://example.com/",
            NaiveDate::from_ymd_opt(2024, 2, 3).unwrap(),
            "home.md",
            "home.json",
        );
        ledger.mark_failed("https://example.com/b");
        storage.save_ledger(&ledger).unwrap();

        let stats = load_statistics(&storage).unwrap();

        assert_eq!(stats.total_urls, 3);
        assert_eq!(stats.count(UrlStatus::Pending), 1);
        assert_eq!(stats.count(UrlStatus::Visited), 1);
        assert_eq!(stats.count(UrlStatus::Failed), 1);
        assert_eq!(stats.last_visit, NaiveDate::from_ymd_opt(2024, 2, 3));
        assert!(stats.latest_run.is_none());
    }

    #[test]
    fn test_empty_ledger_statistics() {
        let dir = TempDir::new().unwrap();
        let storage = SqliteStorage::new(&dir.path().join("ledger.db")).unwrap();

        let stats = load_statistics(&storage).unwrap();

        assert_eq!(stats.total_urls, 0);
        assert_eq!(stats.last_visit, None);
        print_statistics("example-com", &stats);
    }
}
