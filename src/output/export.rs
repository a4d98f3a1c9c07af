//! Reports built from a project's page documents
//!
//! Used by the `export` command after one or more crawl runs.

use crate::output::keywords::KEYWORD_CSV_HEADER;
use crate::output::{load_page_documents, write_index_markdown, OutputError, OutputResult, ProjectLayout};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;

/// Report formats of the `export` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// `report.csv`: word frequencies summed over every page
    Csv,
    /// `report.json`: array of every page document
    Json,
    /// `index.md` regenerated from the page documents on disk
    Markdown,
}

impl FromStr for ExportFormat {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(OutputError::Format(format!(
                "unknown export format '{}' (expected csv, json or markdown)",
                other
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Markdown => "markdown",
        };
        write!(f, "{}", name)
    }
}

/// Writes the report for `format` into the project folder
///
/// # Returns
///
/// Path of the written report
pub fn export_report(layout: &ProjectLayout, format: ExportFormat) -> OutputResult<PathBuf> {
    if !layout.dir().is_dir() {
        return Err(OutputError::Format(format!(
            "project folder {} does not exist",
            layout.dir().display()
        )));
    }

    let path = match format {
        ExportFormat::Json => {
            let path = layout.report("json");
            let documents = load_page_documents(layout)?;
            let mut writer = BufWriter::new(File::create(&path)?);
            serde_json::to_writer_pretty(&mut writer, &documents)?;
            writer.flush()?;
            path
        }
        ExportFormat::Csv => {
            let path = layout.report("csv");
            let totals = summed_word_frequency(&load_page_documents(layout)?);

            let mut rows: Vec<(&String, &u64)> = totals.iter().collect();
            rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

            let mut writer = csv::Writer::from_path(&path)?;
            writer.write_record(KEYWORD_CSV_HEADER)?;
            for (word, count) in rows {
                writer.write_record(&[word.clone(), count.to_string()])?;
            }
            writer.flush()?;
            path
        }
        ExportFormat::Markdown => {
            write_index_markdown(layout)?;
            layout.index_md()
        }
    };

    tracing::info!("Exported {} report to {}", format, path.display());
    Ok(path)
}

fn summed_word_frequency(documents: &[Value]) -> BTreeMap<String, u64> {
    let mut totals = BTreeMap::new();
    for doc in documents {
        let Some(freq) = doc.get("word_frequency").and_then(Value::as_object) else {
            continue;
        };
        for (word, count) in freq {
            if let Some(count) = count.as_u64() {
                *totals.entry(word.clone()).or_insert(0) += count;
            }
        }
    }
    totals
}
