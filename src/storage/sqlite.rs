//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the LedgerStore trait.

use crate::ledger::{Ledger, LedgerEntry, VISIT_DATE_FORMAT};
use crate::state::UrlStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{LedgerStore, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn row_to_entry(
        url: String,
        status: String,
        last_visited: Option<String>,
        md_file: Option<String>,
        json_file: Option<String>,
    ) -> StorageResult<LedgerEntry> {
        let status = UrlStatus::from_db_string(&status).ok_or_else(|| StorageError::CorruptRow {
            url: url.clone(),
            message: format!("unknown status '{}'", status),
        })?;

        // Unparseable dates are dropped rather than failing the whole load
        let last_visited = last_visited
            .filter(|d| !d.trim().is_empty())
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), VISIT_DATE_FORMAT).ok());

        Ok(LedgerEntry {
            url,
            status,
            last_visited,
            markdown_file: md_file.filter(|f| !f.is_empty()),
            json_file: json_file.filter(|f| !f.is_empty()),
        })
    }

    fn read_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRecord> {
        Ok(RunRecord {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            status: RunStatus::from_db_string(&row.get::<_, String>(3)?)
                .unwrap_or(RunStatus::Running),
            pages_processed: row.get::<_, i64>(4)? as u64,
            pages_failed: row.get::<_, i64>(5)? as u64,
        })
    }
}

impl LedgerStore for SqliteStorage {
    // ===== Ledger =====

    fn load_ledger(&self) -> StorageResult<Ledger> {
        let mut stmt = self.conn.prepare(
            "SELECT url, status, last_visited, md_file, json_file FROM ledger ORDER BY position",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let entries = rows
            .into_iter()
            .map(|(url, status, date, md, json)| Self::row_to_entry(url, status, date, md, json))
            .collect::<StorageResult<Vec<_>>>()?;

        Ok(Ledger::from_entries(entries))
    }

    fn save_ledger(&mut self, ledger: &Ledger) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM ledger", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO ledger (url, position, status, last_visited, md_file, json_file)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (position, entry) in ledger.entries().iter().enumerate() {
                let date = entry
                    .last_visited
                    .map(|d| d.format(VISIT_DATE_FORMAT).to_string());
                stmt.execute(params![
                    entry.url,
                    position as i64,
                    entry.status.to_db_string(),
                    date,
                    entry.markdown_file,
                    entry.json_file,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn count_by_status(&self, status: UrlStatus) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM ledger WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Run Management =====

    fn create_run(&mut self) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, status) VALUES (?1, ?2)",
            params![now, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, status, pages_processed, pages_failed
             FROM runs ORDER BY id DESC LIMIT 1",
        )?;

        let run = stmt.query_row([], Self::read_run).optional()?;

        Ok(run)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        pages_processed: u64,
        pages_failed: u64,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, pages_processed = ?3, pages_failed = ?4
             WHERE id = ?5",
            params![
                status.to_db_string(),
                now,
                pages_processed as i64,
                pages_failed as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.insert_pending("https://example.com/");
        ledger.insert_pending("https://example.com/about");
        ledger.insert_pending("https://example.com/contact");
        ledger.mark_visited(
            "https://example.com/about",
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            "about.md",
            "about.json",
        );
        ledger.mark_failed("https://example.com/contact");
        ledger
    }

    #[test]
    fn test_empty_database_loads_empty_ledger() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let ledger = storage.load_ledger().unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_save_and_load_preserves_order_and_fields() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let ledger = sample_ledger();

        storage.save_ledger(&ledger).unwrap();
        let loaded = storage.load_ledger().unwrap();

        assert_eq!(loaded, ledger);
        let urls: Vec<&str> = loaded.entries().iter().map(|e| e.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/",
                "https://example.com/about",
                "https://example.com/contact"
            ]
        );
    }

    #[test]
    fn test_save_replaces_previous_contents() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.save_ledger(&sample_ledger()).unwrap();

        let mut smaller = Ledger::new();
        smaller.insert_pending("https://example.com/only");
        storage.save_ledger(&smaller).unwrap();

        let loaded = storage.load_ledger().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains("https://example.com/only"));
    }

    #[test]
    fn test_legacy_status_codes_load() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .conn
            .execute(
                "INSERT INTO ledger (url, position, status, last_visited, md_file, json_file)
                 VALUES ('https://example.com/', 0, '1', '2023-12-31', 'home.md', 'home.json'),
                        ('https://example.com/next', 1, '2', '', '', NULL)",
                [],
            )
            .unwrap();

        let ledger = storage.load_ledger().unwrap();
        let home = ledger.get("https://example.com/").unwrap();
        assert_eq!(home.status, UrlStatus::Visited);
        assert_eq!(home.visit_date_string(), "2023-12-31");

        let next = ledger.get("https://example.com/next").unwrap();
        assert_eq!(next.status, UrlStatus::Pending);
        assert_eq!(next.last_visited, None);
        assert_eq!(next.markdown_file, None);
    }

    #[test]
    fn test_unknown_status_is_corrupt_row() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .conn
            .execute(
                "INSERT INTO ledger (url, position, status) VALUES ('https://x.test/', 0, 'bogus')",
                [],
            )
            .unwrap();

        let result = storage.load_ledger();
        assert!(matches!(result, Err(StorageError::CorruptRow { .. })));
    }

    #[test]
    fn test_count_by_status() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.save_ledger(&sample_ledger()).unwrap();

        assert_eq!(storage.count_by_status(UrlStatus::Pending).unwrap(), 1);
        assert_eq!(storage.count_by_status(UrlStatus::Visited).unwrap(), 1);
        assert_eq!(storage.count_by_status(UrlStatus::Failed).unwrap(), 1);
    }

    #[test]
    fn test_run_lifecycle() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        assert!(storage.get_latest_run().unwrap().is_none());

        let run_id = storage.create_run().unwrap();
        let run = storage.get_latest_run().unwrap().unwrap();
        assert_eq!(run.id, run_id);
        assert_eq!(run.status, RunStatus::Running);
        assert!(run.finished_at.is_none());

        storage
            .finish_run(run_id, RunStatus::Completed, 7, 2)
            .unwrap();
        let run = storage.get_latest_run().unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.pages_processed, 7);
        assert_eq!(run.pages_failed, 2);
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn test_finish_unknown_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let result = storage.finish_run(42, RunStatus::Completed, 0, 0);
        assert!(matches!(result, Err(StorageError::RunNotFound(42))));
    }

    #[test]
    fn test_file_database_persists_across_opens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.db");

        {
            let mut storage = SqliteStorage::new(&path).unwrap();
            storage.save_ledger(&sample_ledger()).unwrap();
        }

        let storage = SqliteStorage::new(&path).unwrap();
        assert_eq!(storage.load_ledger().unwrap().len(), 3);
    }
}
