// SPDX-License-Identifier: MIT

//! Report persistence - saves finished reports as Markdown with YAML
//! front matter under a reports directory.

use crate::error::ScoutError;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

/// Filename-safe slug from the first words of the query
fn slugify(query: &str) -> String {
    let slug: String = query
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    let trimmed: Vec<&str> = slug.split('-').filter(|s| !s.is_empty()).take(6).collect();
    if trimmed.is_empty() {
        "report".to_string()
    } else {
        trimmed.join("-")
    }
}

/// Write the report to `dir`, returning the path written
pub fn save(dir: &Path, query: &str, workflow: &str, report: &str) -> Result<PathBuf, ScoutError> {
    fs::create_dir_all(dir)?;
    let now = Utc::now();
    let filename = format!("{}-{}.md", now.format("%Y%m%d-%H%M%S"), slugify(query));
    let path = dir.join(filename);

    let front_matter = serde_yaml::to_string(&serde_json::json!({
        "query": query,
        "workflow": workflow,
        "generated": now.to_rfc3339(),
    }))?;
    let content = format!("---\n{}---\n\n{}\n", front_matter, report);
    fs::write(&path, content)?;
    log::info!("Saved report to {}", path.display());
    Ok(path)
}

/// The `n` most recent report paths, newest first. `filter` keeps only
/// filenames containing the given term (matched against the query slug).
pub fn list_recent(dir: &Path, n: usize, filter: Option<&str>) -> Result<Vec<PathBuf>, ScoutError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let term = filter.map(|f| slugify(f));
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
        .filter(|p| match (&term, p.file_stem().and_then(|s| s.to_str())) {
            (Some(term), Some(stem)) => stem.contains(term.as_str()),
            (Some(_), None) => false,
            (None, _) => true,
        })
        .collect();
    // Timestamped filenames sort chronologically.
    paths.sort();
    paths.reverse();
    paths.truncate(n);
    Ok(paths)
}
