//! Keyword frequency tables
//!
//! `keyword_frequency_<domain>.csv` accumulates word counts across runs: each
//! run adds its own counts to the stored ones and rewrites the file sorted by
//! frequency.

use crate::output::OutputResult;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Header row of the keyword frequency CSV
pub const KEYWORD_CSV_HEADER: [&str; 2] = ["Word", "Frequency"];

/// Reads a keyword frequency CSV into a word → count map
///
/// A missing file is an empty table. Rows without a numeric count are skipped.
pub fn read_keyword_frequency(path: &Path) -> OutputResult<BTreeMap<String, u64>> {
    let mut frequencies = BTreeMap::new();
    if !path.is_file() {
        return Ok(frequencies);
    }

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    for result in reader.records() {
        let record = result?;
        let (Some(word), Some(count)) = (record.get(0), record.get(1)) else {
            continue;
        };

        match count.trim().parse::<u64>() {
            Ok(count) if !word.is_empty() => {
                *frequencies.entry(word.to_string()).or_insert(0) += count;
            }
            _ => tracing::warn!("Skipping keyword row {:?} in {}", record, path.display()),
        }
    }

    Ok(frequencies)
}

/// Adds `run_frequency` to the stored table and rewrites it
///
/// # Returns
///
/// The merged table, sorted by frequency descending then word
pub fn update_keyword_frequency(
    path: &Path,
    run_frequency: &BTreeMap<String, u64>,
) -> OutputResult<Vec<(String, u64)>> {
    let mut merged = read_keyword_frequency(path)?;
    for (word, count) in run_frequency {
        *merged.entry(word.clone()).or_insert(0) += count;
    }

    let mut sorted: Vec<(String, u64)> = merged.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(KEYWORD_CSV_HEADER)?;
    for (word, count) in &sorted {
        writer.write_record(&[word.clone(), count.to_string()])?;
    }
    writer.flush()?;

    tracing::info!("Exported {} keyword frequencies to {}", sorted.len(), path.display());
    Ok(sorted)
}

/// Writes the keyword table as a `{word: frequency}` JSON object
pub fn write_keyword_json(path: &Path, frequencies: &[(String, u64)]) -> OutputResult<()> {
    let map: BTreeMap<&str, u64> = frequencies
        .iter()
        .map(|(word, count)| (word.as_str(), *count))
        .collect();

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &map)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn freq(pairs: &[(&str, u64)]) -> BTreeMap<String, u64> {
        pairs.iter().map(|(w, c)| (w.to_string(), *c)).collect()
    }

    #[test]
    fn test_first_run_writes_sorted_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keyword_frequency_example.com.csv");

        let sorted = update_keyword_frequency(&path, &freq(&[("alpha", 1), ("beta", 3), ("gamma", 3)])).unwrap();

        assert_eq!(
            sorted,
            vec![
                ("beta".to_string(), 3),
                ("gamma".to_string(), 3),
                ("alpha".to_string(), 1)
            ]
        );
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Word,Frequency\nbeta,3\ngamma,3\nalpha,1\n");
    }

    #[test]
    fn test_runs_are_summed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keywords.csv");

        update_keyword_frequency(&path, &freq(&[("rust", 2), ("web", 1)])).unwrap();
        let sorted = update_keyword_frequency(&path, &freq(&[("web", 4)])).unwrap();

        assert_eq!(sorted, vec![("web".to_string(), 5), ("rust".to_string(), 2)]);
        assert_eq!(read_keyword_frequency(&path).unwrap(), freq(&[("rust", 2), ("web", 5)]));
    }

    #[test]
    fn test_legacy_header_and_bad_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keywords.csv");
        std::fs::write(&path, "word,freq\nrust,7\nbroken,many\nlonely\n").unwrap();

        assert_eq!(read_keyword_frequency(&path).unwrap(), freq(&[("rust", 7)]));
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        assert!(read_keyword_frequency(&dir.path().join("none.csv")).unwrap().is_empty());
    }

    #[test]
    fn test_keyword_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keywords.json");

        write_keyword_json(&path, &[("web".to_string(), 5), ("rust".to_string(), 2)]).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["web"], 5);
        assert_eq!(value["rust"], 2);
    }
}
