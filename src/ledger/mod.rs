//! URL ledger: the durable record of every URL seen during a project's life
//!
//! The ledger is an ordered, URL-keyed table. Insertion order is significant:
//! the orchestrator selects pending URLs in ledger order, which makes runs
//! resumable (a later run picks up where the previous one stopped).
//!
//! Persistence lives in [`crate::storage`]; this module is the in-memory model
//! and the self-healing reconciliation pass.

mod reconcile;

pub use reconcile::reconcile;

use crate::state::UrlStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Date format used for the `last_visited` column
pub const VISIT_DATE_FORMAT: &str = "%Y-%m-%d";

/// One row per discovered URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Absolute URL, unique across the ledger
    pub url: String,

    /// Processing status
    pub status: UrlStatus,

    /// Date of the last successful processing
    pub last_visited: Option<NaiveDate>,

    /// Generated Markdown artifact filename (relative to `pages_md/`)
    pub markdown_file: Option<String>,

    /// Generated JSON artifact filename (relative to `pages_json/`)
    pub json_file: Option<String>,
}

impl LedgerEntry {
    /// Creates a new pending entry with no visit history
    pub fn pending(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: UrlStatus::Pending,
            last_visited: None,
            markdown_file: None,
            json_file: None,
        }
    }

    /// Returns the visit date formatted for storage, or an empty string
    pub fn visit_date_string(&self) -> String {
        self.last_visited
            .map(|d| d.format(VISIT_DATE_FORMAT).to_string())
            .unwrap_or_default()
    }
}

/// Ordered, deduplicated collection of ledger entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
    index: HashMap<String, usize>,
}

impl Ledger {
    /// Creates an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger from rows in storage order
    ///
    /// Duplicate URLs are collapsed: the last row wins, but it keeps the
    /// position of the first occurrence.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = LedgerEntry>,
    {
        let mut ledger = Self::new();
        for entry in entries {
            ledger.upsert(entry);
        }
        ledger
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the ledger has no rows
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All rows in ledger order
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Looks up a row by URL
    pub fn get(&self, url: &str) -> Option<&LedgerEntry> {
        self.index.get(url).map(|&i| &self.entries[i])
    }

    fn get_mut(&mut self, url: &str) -> Option<&mut LedgerEntry> {
        match self.index.get(url) {
            Some(&i) => Some(&mut self.entries[i]),
            None => None,
        }
    }

    /// Returns whether a URL is already tracked
    pub fn contains(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    /// Inserts a row, replacing any existing row for the same URL in place
    pub fn upsert(&mut self, entry: LedgerEntry) {
        match self.index.get(&entry.url) {
            Some(&i) => self.entries[i] = entry,
            None => {
                self.index.insert(entry.url.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    /// Adds a pending row for `url` unless it is already tracked
    ///
    /// Returns true if a row was added. Existing rows keep their status.
    pub fn insert_pending(&mut self, url: &str) -> bool {
        if self.contains(url) {
            return false;
        }
        self.upsert(LedgerEntry::pending(url));
        true
    }

    /// Adds pending rows for every URL not already tracked
    ///
    /// Returns the number of rows added.
    pub fn merge_discovered<I, S>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        urls.into_iter()
            .filter(|url| self.insert_pending(url.as_ref()))
            .count()
    }

    /// Returns the first `limit` pending URLs in ledger order
    pub fn select_pending(&self, limit: usize) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.status.is_pending())
            .take(limit)
            .map(|e| e.url.clone())
            .collect()
    }

    /// Records a successful visit with its artifacts
    ///
    /// Returns false if the URL is not tracked.
    pub fn mark_visited(
        &mut self,
        url: &str,
        date: NaiveDate,
        markdown_file: &str,
        json_file: &str,
    ) -> bool {
        match self.get_mut(url) {
            Some(entry) => {
                entry.status = UrlStatus::Visited;
                entry.last_visited = Some(date);
                entry.markdown_file = Some(markdown_file.to_string());
                entry.json_file = Some(json_file.to_string());
                true
            }
            None => false,
        }
    }

    /// Marks a URL as permanently failed for this run
    pub fn mark_failed(&mut self, url: &str) -> bool {
        match self.get_mut(url) {
            Some(entry) => {
                entry.status = UrlStatus::Failed;
                true
            }
            None => false,
        }
    }

    /// Puts a URL back on the frontier, dropping its stale artifact references
    pub fn reset_to_pending(&mut self, url: &str) -> bool {
        match self.get_mut(url) {
            Some(entry) => {
                entry.status = UrlStatus::Pending;
                entry.markdown_file = None;
                entry.json_file = None;
                true
            }
            None => false,
        }
    }

    /// Counts rows in a given status
    pub fn count_by_status(&self, status: UrlStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    /// Most recent visit date across all rows
    pub fn last_visit(&self) -> Option<NaiveDate> {
        self.entries.iter().filter_map(|e| e.last_visited).max()
    }
}
