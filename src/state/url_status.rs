/// URL status definitions for tracking crawl progress
///
/// Every ledger row is in exactly one of these states.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the processing state of a URL in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UrlStatus {
    /// Discovered and waiting to be fetched (the frontier)
    Pending,

    /// Fetched, extracted and exported successfully
    Visited,

    /// Failed permanently during the last run; reset to Pending by reconciliation
    Failed,
}

impl UrlStatus {
    /// Returns true if this URL is a dispatch candidate
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Visited)
    }

    /// Converts the status to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Visited => "visited",
            Self::Failed => "failed",
        }
    }

    /// Parses a status from its stored representation
    ///
    /// Accepts the canonical names as well as the legacy integer codes
    /// (`2` pending, `1` visited). Returns None for anything else.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "2" => Some(Self::Pending),
            "visited" | "1" => Some(Self::Visited),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all possible statuses
    pub fn all() -> [Self; 3] {
        [Self::Pending, Self::Visited, Self::Failed]
    }
}

impl fmt::Display for UrlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "Pending",
            Self::Visited => "Visited",
            Self::Failed => "Failed",
        };
        write!(f, "{}", label)
    }
}
