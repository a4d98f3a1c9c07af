//! Storage traits and error types
//!
//! This module defines the trait interface for ledger storage backends and
//! associated error types.

use crate::ledger::Ledger;
use crate::state::UrlStatus;
use crate::storage::{RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Corrupt ledger row for {url}: {message}")]
    CorruptRow { url: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for ledger storage backends
///
/// The orchestrator loads the ledger once before a run and saves it once
/// after every task has completed.
pub trait LedgerStore {
    // ===== Ledger =====

    /// Loads every row in ledger order
    fn load_ledger(&self) -> StorageResult<Ledger>;

    /// Replaces the stored ledger with `ledger` atomically
    fn save_ledger(&mut self, ledger: &Ledger) -> StorageResult<()>;

    /// Counts stored rows in a given status
    fn count_by_status(&self, status: UrlStatus) -> StorageResult<u64>;

    // ===== Run Management =====

    /// Creates a new crawl run and returns its ID
    fn create_run(&mut self) -> StorageResult<i64>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Marks a run as finished with its final status and counts
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        pages_processed: u64,
        pages_failed: u64,
    ) -> StorageResult<()>;
}
