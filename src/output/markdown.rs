//! Markdown artifact generation
//!
//! This module writes the human-readable documents of a project: one analysis
//! per page, the index of analyzed pages and the list of external URLs.

use crate::crawler::{top_words, PageResult};
use crate::output::{OutputResult, ProjectLayout, MARKDOWN_DIR};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Words listed in the frequency section of a page
pub const TOP_WORDS: usize = 50;

/// Characters of visible text kept in a page document
pub const CLEANED_TEXT_CHARS: usize = 3000;

/// Characters of raw HTML kept in a page document
pub const RAW_HTML_CHARS: usize = 5000;

const EXTERNAL_URLS_HEADER: &str = "# External URLs\n\n";

/// Writes `pages_md/<slug>.md` for a page
pub fn write_page_markdown(layout: &ProjectLayout, page: &PageResult, raw_html: &str) -> OutputResult<()> {
    let markdown = format_page_markdown(page, raw_html);
    let path = layout.markdown_path(&page.markdown_filename);

    let mut file = File::create(&path)?;
    file.write_all(markdown.as_bytes())?;

    tracing::debug!("Exported Markdown for {} to {}", page.url, path.display());
    Ok(())
}

/// Formats the analysis document of a page
///
/// # Arguments
///
/// * `page` - The extracted page
/// * `raw_html` - The body the page was extracted from
///
/// # Returns
///
/// A formatted markdown string
pub fn format_page_markdown(page: &PageResult, raw_html: &str) -> String {
    let mut md = String::new();

    md.push_str(&format!("# `{}`\n\n", page.url));
    md.push_str(&format!("**Title**: {}\n\n", page.title));
    md.push_str(&format!("**Meta Description**: {}\n\n", page.description));

    md.push_str("## Headings\n");
    if page.headings.is_empty() {
        md.push_str("_No headings found._");
    } else {
        let lines: Vec<String> = page
            .headings
            .iter()
            .map(|h| format!("- {}", h.to_markdown()))
            .collect();
        md.push_str(&lines.join("\n"));
    }
    md.push_str("\n\n");

    md.push_str(&format!("## Word Frequency (Top {})\n", TOP_WORDS));
    for (word, count) in top_words(&page.word_frequency, TOP_WORDS) {
        md.push_str(&format!("- **{}**: {}\n", word, count));
    }
    md.push('\n');

    md.push_str("## External Links\n");
    if page.external_links.is_empty() {
        md.push_str("_No external links found._");
    } else {
        let lines: Vec<String> = page
            .external_links
            .iter()
            .map(|link| format!("- {}", link))
            .collect();
        md.push_str(&lines.join("\n"));
    }
    md.push_str("\n\n");

    md.push_str("## Images with ALT\n");
    if page.images.is_empty() {
        md.push_str("_No images found._\n");
    } else {
        let lines: Vec<String> = page
            .images
            .iter()
            .map(|img| {
                let alt = if img.alt.is_empty() { "_(no ALT)_" } else { img.alt.as_str() };
                format!("- `src`: {}\n  - alt: {}", img.src, alt)
            })
            .collect();
        md.push_str(&lines.join("\n"));
    }
    md.push('\n');

    md.push_str("## Cleaned Text\n");
    md.push_str(&format!(
        "```\n{}...\n```\n\n",
        truncate_chars(&page.visible_text, CLEANED_TEXT_CHARS)
    ));

    md.push_str("## Raw HTML\n");
    md.push_str("```html\n");
    md.push_str(truncate_chars(raw_html, RAW_HTML_CHARS));
    md.push_str("\n... (truncated)\n```\n\n");

    md.push_str("---\n");
    md.push_str(&format!("_Total words analyzed: {}_\n", page.word_count));

    md
}

/// Regenerates `index.md` from the Markdown files present on disk
pub fn write_index_markdown(layout: &ProjectLayout) -> OutputResult<()> {
    let names = ProjectLayout::list_files(&layout.markdown_dir(), "md")?;

    let mut md = String::from("# Analyzed Pages Index\n\n");
    for name in &names {
        let stem = name.trim_end_matches(".md");
        md.push_str(&format!("- [{}]({}/{})\n", title_case(stem), MARKDOWN_DIR, name));
    }

    let mut file = File::create(layout.index_md())?;
    file.write_all(md.as_bytes())?;

    tracing::info!("Exported index of {} pages to {}", names.len(), layout.index_md().display());
    Ok(())
}

/// Writes the sorted external URLs as a Markdown list
pub fn write_external_urls_markdown(path: &Path, links: &BTreeSet<String>) -> OutputResult<()> {
    let mut md = String::from(EXTERNAL_URLS_HEADER);
    if links.is_empty() {
        md.push_str("_No external URLs found._\n");
    } else {
        for link in links {
            md.push_str(&format!("- {}\n", link));
        }
    }

    let mut file = File::create(path)?;
    file.write_all(md.as_bytes())?;

    tracing::info!("Exported {} external URLs to {}", links.len(), path.display());
    Ok(())
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// `about-us` → `About Us`
fn title_case(stem: &str) -> String {
    stem.split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
