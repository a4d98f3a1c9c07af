//! Output module for per-page and aggregate crawl artifacts
//!
//! This module handles:
//! - The on-disk project layout
//! - Per-page Markdown and JSON documents
//! - Aggregate exports (external URLs, keyword frequencies, indexes, project document)
//! - The CSV mirror of the URL ledger
//! - Reports and statistics for the `export` and `stats` commands

mod export;
mod json;
mod keywords;
mod layout;
mod ledger_csv;
mod markdown;
pub mod stats;

pub use export::{export_report, ExportFormat};
pub use json::{
    load_page_documents, update_project_document, write_external_urls_json, write_index_json,
    write_ledger_json, write_page_json, ProjectInfo, CRAWLED_BY,
};
pub use keywords::{read_keyword_frequency, update_keyword_frequency, write_keyword_json};
pub use layout::{ProjectLayout, JSON_DIR, LEDGER_DB, MARKDOWN_DIR};
pub use ledger_csv::{read_ledger_csv, write_ledger_csv, LEDGER_CSV_HEADER};
pub use markdown::{
    format_page_markdown, write_external_urls_markdown, write_index_markdown, write_page_markdown,
};
pub use stats::{load_statistics, print_statistics, LedgerStatistics};

use crate::crawler::PageResult;
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors that can occur while writing or reading artifacts
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Format error: {0}")]
    Format(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes the Markdown and JSON documents of one page
///
/// The JSON document is written last so a page with a JSON file always has
/// its Markdown companion.
pub fn write_page_artifacts(
    layout: &ProjectLayout,
    page: &PageResult,
    raw_html: &str,
) -> OutputResult<()> {
    write_page_markdown(layout, page, raw_html)?;
    write_page_json(layout, page)?;
    Ok(())
}

/// Inputs of the aggregate export stage
pub struct AggregateInput<'a> {
    pub domain: &'a str,
    pub external_links: &'a BTreeSet<String>,
    pub corpus: &'a str,
    pub language: crate::config::Language,
    pub pages: &'a [PageResult],
    pub project: ProjectInfo<'a>,
}

/// Writes every aggregate artifact once for a finished run
///
/// Each artifact is attempted independently; failures are logged and
/// returned so a broken keyword file does not prevent the index from being
/// refreshed. Ledger rows are never touched here.
pub fn write_aggregates(layout: &ProjectLayout, input: &AggregateInput<'_>) -> Vec<OutputError> {
    let mut errors = Vec::new();

    let mut record = |name: &str, result: OutputResult<()>| {
        if let Err(e) = result {
            tracing::error!("Failed to export {}: {}", name, e);
            errors.push(e);
        }
    };

    record(
        "external URLs (markdown)",
        write_external_urls_markdown(&layout.external_urls_md(), input.external_links),
    );
    record(
        "external URLs (json)",
        write_external_urls_json(&layout.external_urls_json(), input.external_links),
    );

    let tokens = crate::crawler::tokenize(input.corpus, input.language);
    let run_frequency = crate::crawler::word_frequency(tokens);
    let keyword_result = update_keyword_frequency(&layout.keyword_csv(input.domain), &run_frequency)
        .and_then(|merged| write_keyword_json(&layout.keyword_json(input.domain), &merged));
    record("keyword frequency", keyword_result);

    record("index (markdown)", write_index_markdown(layout));
    record("index (json)", write_index_json(layout));
    record(
        "project document",
        update_project_document(layout, &input.project, input.pages).map(|_| ()),
    );

    errors
}
