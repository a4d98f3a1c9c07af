//! Ledger reconciliation
//!
//! A row can be marked Visited in memory while its artifact write fails, or the
//! process can die between writing artifacts and persisting the ledger. This
//! pass runs before every dispatch and puts such rows back on the frontier, so
//! every URL is eventually exported at least once.

use crate::ledger::Ledger;
use crate::output::ProjectLayout;
use crate::state::UrlStatus;

/// Resets Visited rows with missing artifacts, and Failed rows, to Pending
///
/// Both the Markdown and the JSON artifact are required for a row to count as
/// done: a Visited row whose either filename is empty, or whose file is absent
/// from the project layout, is reset.
///
/// # Returns
///
/// The number of rows reset to Pending
pub fn reconcile(ledger: &mut Ledger, layout: &ProjectLayout) -> usize {
    let stale: Vec<String> = ledger
        .entries()
        .iter()
        .filter(|entry| match entry.status {
            UrlStatus::Pending => false,
            UrlStatus::Failed => true,
            UrlStatus::Visited => !artifacts_present(
                layout,
                entry.markdown_file.as_deref(),
                entry.json_file.as_deref(),
            ),
        })
        .map(|entry| entry.url.clone())
        .collect();

    for url in &stale {
        tracing::debug!("Reconciliation reset {} to pending", url);
        ledger.reset_to_pending(url);
    }

    if !stale.is_empty() {
        tracing::info!("Reconciliation reset {} URLs to pending", stale.len());
    }

    stale.len()
}

fn artifacts_present(layout: &ProjectLayout, markdown: Option<&str>, json: Option<&str>) -> bool {
    match (markdown, json) {
        (Some(md), Some(js)) if !md.is_empty() && !js.is_empty() => {
            layout.markdown_path(md).is_file() && layout.json_path(js).is_file()
        }
        _ => false,
    }
}
