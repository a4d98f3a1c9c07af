//! On-disk layout of a project folder
//!
//! ```text
//! <root>/<project-slug>/
//!   ledger.db
//!   visited_urls_<domain>.csv
//!   pages_md/<slug>.md
//!   pages_json/<slug>.json
//!   external_urls.md / external_urls.json
//!   keyword_frequency_<domain>.csv / .json
//!   index.md / index.json
//!   project_<project-slug>.json
//! ```

use crate::url::slugify;
use std::io;
use std::path::{Path, PathBuf};

pub const MARKDOWN_DIR: &str = "pages_md";
pub const JSON_DIR: &str = "pages_json";
pub const LEDGER_DB: &str = "ledger.db";

/// Paths of every artifact inside one project folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    dir: PathBuf,
}

impl ProjectLayout {
    /// Wraps an existing or future project folder
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Project folder for `project` (usually the site's domain) under the output root
    pub fn for_project(root: impl AsRef<Path>, project: &str) -> Self {
        Self::new(root.as_ref().join(slugify(project)))
    }

    /// Slug of the project folder, e.g. `example-com`
    pub fn project_slug(&self) -> String {
        self.dir
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .unwrap_or_default()
    }

    /// Creates the project folder and its page directories
    pub fn ensure_dirs(&self) -> io::Result<()> {
        std::fs::create_dir_all(self.markdown_dir())?;
        std::fs::create_dir_all(self.json_dir())?;
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn markdown_dir(&self) -> PathBuf {
        self.dir.join(MARKDOWN_DIR)
    }

    pub fn json_dir(&self) -> PathBuf {
        self.dir.join(JSON_DIR)
    }

    pub fn markdown_path(&self, file_name: &str) -> PathBuf {
        self.markdown_dir().join(file_name)
    }

    pub fn json_path(&self, file_name: &str) -> PathBuf {
        self.json_dir().join(file_name)
    }

    pub fn ledger_db(&self) -> PathBuf {
        self.dir.join(LEDGER_DB)
    }

    pub fn ledger_csv(&self, domain: &str) -> PathBuf {
        self.dir.join(format!("visited_urls_{}.csv", domain))
    }

    pub fn ledger_json(&self, domain: &str) -> PathBuf {
        self.dir.join(format!("visited_urls_{}.json", domain))
    }

    pub fn external_urls_md(&self) -> PathBuf {
        self.dir.join("external_urls.md")
    }

    pub fn external_urls_json(&self) -> PathBuf {
        self.dir.join("external_urls.json")
    }

    pub fn keyword_csv(&self, domain: &str) -> PathBuf {
        self.dir.join(format!("keyword_frequency_{}.csv", domain))
    }

    pub fn keyword_json(&self, domain: &str) -> PathBuf {
        self.dir.join(format!("keyword_frequency_{}.json", domain))
    }

    pub fn index_md(&self) -> PathBuf {
        self.dir.join("index.md")
    }

    pub fn index_json(&self) -> PathBuf {
        self.dir.join("index.json")
    }

    pub fn project_json(&self, project_slug: &str) -> PathBuf {
        self.dir.join(format!("project_{}.json", project_slug))
    }

    pub fn report(&self, extension: &str) -> PathBuf {
        self.dir.join(format!("report.{}", extension))
    }

    /// File names with `extension` directly inside `dir`, sorted
    pub fn list_files(dir: &Path, extension: &str) -> io::Result<Vec<String>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(extension) {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
