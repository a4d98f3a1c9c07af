//! JSON artifact generation
//!
//! Page documents are the serialized [`PageResult`]; the index, external URL
//! list and project document are derived from them.

use crate::crawler::PageResult;
use crate::ledger::Ledger;
use crate::output::{OutputError, OutputResult, ProjectLayout};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Value of the `crawled_by` field of the project document
pub const CRAWLED_BY: &str = "site-insights";

fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> OutputResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Writes `pages_json/<slug>.json` for a page
pub fn write_page_json(layout: &ProjectLayout, page: &PageResult) -> OutputResult<()> {
    let path = layout.json_path(&page.json_filename);
    write_pretty(&path, page)?;
    tracing::debug!("Exported JSON for {} to {}", page.url, path.display());
    Ok(())
}

/// Reads every page document under `pages_json/`, sorted by file name
///
/// Unreadable documents are skipped with a warning.
pub fn load_page_documents(layout: &ProjectLayout) -> OutputResult<Vec<Value>> {
    let mut documents = Vec::new();

    for name in ProjectLayout::list_files(&layout.json_dir(), "json")? {
        let path = layout.json_path(&name);
        let parsed: OutputResult<Value> = File::open(&path)
            .map_err(OutputError::from)
            .and_then(|file| serde_json::from_reader(BufReader::new(file)).map_err(OutputError::from));

        match parsed {
            Ok(value) => documents.push(value),
            Err(e) => tracing::warn!("Skipping unreadable page document {}: {}", path.display(), e),
        }
    }

    Ok(documents)
}

/// Regenerates `index.json` as a list of `{slug, title, md_filename}`
pub fn write_index_json(layout: &ProjectLayout) -> OutputResult<()> {
    let index: Vec<Value> = load_page_documents(layout)?
        .iter()
        .map(|doc| {
            let field = |name: &str| doc.get(name).cloned().unwrap_or_else(|| Value::String(String::new()));
            serde_json::json!({
                "slug": field("slug"),
                "title": field("title"),
                "md_filename": field("md_filename"),
            })
        })
        .collect();

    write_pretty(&layout.index_json(), &index)?;
    tracing::info!("Exported JSON index of {} pages", index.len());
    Ok(())
}

/// Writes the sorted external URLs as a JSON array
pub fn write_external_urls_json(path: &Path, links: &BTreeSet<String>) -> OutputResult<()> {
    write_pretty(path, links)
}

/// Run metadata stored in the project document
#[derive(Debug, Clone)]
pub struct ProjectInfo<'a> {
    pub project_slug: &'a str,
    pub domain: &'a str,
    pub base_url: &'a str,
    pub language: &'a str,
    pub max_pages: usize,
    pub max_workers: usize,
    /// Seconds between requests
    pub crawl_delay: f64,
}

/// Creates or merges `project_<slug>.json`
///
/// An existing document keeps its `created_at` and any unknown fields; run
/// metadata and `last_updated_at` are refreshed, pages are upserted by slug
/// and `pages_count` is recomputed.
///
/// # Returns
///
/// The document as written
pub fn update_project_document(
    layout: &ProjectLayout,
    info: &ProjectInfo<'_>,
    pages: &[PageResult],
) -> OutputResult<Value> {
    let path = layout.project_json(info.project_slug);
    let now = Utc::now().to_rfc3339();

    let mut document = if path.is_file() {
        let existing: Value = serde_json::from_reader(BufReader::new(File::open(&path)?))?;
        match existing {
            Value::Object(map) => map,
            _ => {
                return Err(OutputError::Format(format!(
                    "{} is not a JSON object",
                    path.display()
                )))
            }
        }
    } else {
        Map::new()
    };

    let created_at = document
        .get("created_at")
        .cloned()
        .unwrap_or_else(|| Value::String(now.clone()));

    let mut merged: Vec<Value> = Vec::new();
    if let Some(Value::Array(existing)) = document.remove("pages") {
        for page in existing {
            upsert_by_slug(&mut merged, page);
        }
    }
    for page in pages {
        upsert_by_slug(&mut merged, serde_json::to_value(page)?);
    }

    document.insert("version".into(), env!("CARGO_PKG_VERSION").into());
    document.insert("crawled_by".into(), CRAWLED_BY.into());
    document.insert("project_slug".into(), info.project_slug.into());
    document.insert("domain".into(), info.domain.into());
    document.insert("base_url".into(), info.base_url.into());
    document.insert("language".into(), info.language.into());
    document.insert("created_at".into(), created_at);
    document.insert("last_updated_at".into(), now.into());
    document.insert("max_pages".into(), info.max_pages.into());
    document.insert("max_workers".into(), info.max_workers.into());
    document.insert("crawl_delay".into(), info.crawl_delay.into());
    document.insert("pages_count".into(), merged.len().into());
    document.insert("pages".into(), Value::Array(merged));

    let document = Value::Object(document);
    write_pretty(&path, &document)?;
    tracing::info!("Project document written to {}", path.display());

    Ok(document)
}

fn upsert_by_slug(pages: &mut Vec<Value>, page: Value) {
    let slug = page.get("slug").and_then(Value::as_str).map(str::to_owned);

    let existing = slug.as_deref().and_then(|slug| {
        pages
            .iter_mut()
            .find(|p| p.get("slug").and_then(Value::as_str) == Some(slug))
    });

    match existing {
        Some(slot) => *slot = page,
        None => pages.push(page),
    }
}

/// One row of `visited_urls_<domain>.json`, keyed like the ledger CSV columns
#[derive(Serialize)]
struct LedgerRecord<'a> {
    #[serde(rename = "URL")]
    url: &'a str,
    #[serde(rename = "Status")]
    status: &'static str,
    #[serde(rename = "Data")]
    last_visited: Option<String>,
    #[serde(rename = "MD File")]
    markdown_file: Option<&'a str>,
    #[serde(rename = "JSON File")]
    json_file: Option<&'a str>,
}

/// Writes the JSON twin of the ledger CSV, one record per row in ledger order
pub fn write_ledger_json(path: &Path, ledger: &Ledger) -> OutputResult<()> {
    let records: Vec<LedgerRecord<'_>> = ledger
        .entries()
        .iter()
        .map(|entry| LedgerRecord {
            url: &entry.url,
            status: entry.status.to_db_string(),
            last_visited: entry.last_visited.map(|_| entry.visit_date_string()),
            markdown_file: entry.markdown_file.as_deref(),
            json_file: entry.json_file.as_deref(),
        })
        .collect();

    write_pretty(path, &records)?;
    tracing::debug!("Exported {} ledger records to {}", records.len(), path.display());
    Ok(())
}
