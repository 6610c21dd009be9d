//! Line diffs of queries about to be overwritten.

use allowlist_engine::QueryEntry;
use similar::TextDiff;

/// Unified diff of a published query against the text replacing it.
pub fn render_query_diff(name: &str, remote: &str, fresh: &str) -> String {
    // Both sides end in a newline so the last line diffs like the others
    let remote = format!("{remote}\n");
    let fresh = format!("{fresh}\n");
    let diff = TextDiff::from_lines(&remote, &fresh);
    format!(
        "{name} has changed\n{}",
        diff.unified_diff().context_radius(3).header("remote", "local")
    )
}

/// Diffs of every `updated` entry against the `remote` entry of the same name.
pub fn render_changes(remote: &[QueryEntry], updated: &[QueryEntry]) -> String {
    updated
        .iter()
        .map(|entry| {
            let published = remote
                .iter()
                .find(|candidate| candidate.name == entry.name)
                .map_or("", |candidate| candidate.query.as_str());
            render_query_diff(&entry.name, published, &entry.query)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
