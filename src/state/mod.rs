//! State module for tracking URL progress
//!
//! # Components
//!
//! - `UrlStatus`: the lifecycle state of a single ledger row (pending, visited, failed)

mod url_status;

pub use url_status::UrlStatus;
