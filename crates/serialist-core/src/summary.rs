//! The running global summary in `notes/global_summary.md`.
//!
//! One `## Chapter N` block per chapter. Re-ingesting a chapter replaces its
//! block instead of adding a second one.

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use regex::Regex;

pub const SUMMARY_HEADING: &str = "# Global Summary";

/// Initial contents written by `init` when no summary exists yet.
#[must_use]
pub fn seed_text(topic: &str) -> String {
    format!("{SUMMARY_HEADING}\n\nTopic: {topic}\n\n")
}

/// Replace or append the block for `chapter_no` in `content`.
///
/// The block is moved to the end of the document.
#[must_use]
pub fn upsert_block(content: &str, chapter_no: u32, summary_line: &str) -> String {
    // `regex` has no lookahead; match up to the next heading or end instead.
    let pattern = format!(r"(?s)\n## Chapter {chapter_no}[ \t]*(?:\n.*?)?(\n## Chapter |\z)");
    let block = Regex::new(&pattern).ok();

    let mut kept = content.to_string();
    if let Some(block) = block {
        while let Some(caps) = block.captures(&kept) {
            let (Some(whole), Some(next)) = (caps.get(0), caps.get(1)) else {
                break;
            };
            let range = whole.start()..next.start();
            if range.is_empty() {
                break;
            }
            kept.replace_range(range, "");
        }
    }

    let mut updated = kept.trim_end().to_string();
    updated.push_str(&format!("\n\n## Chapter {chapter_no}\n{}\n", summary_line.trim()));
    updated
}

/// Upsert the block for `chapter_no` in the summary file at `path`.
///
/// A missing file starts from the bare heading.
///
/// # Errors
///
/// Returns an error if the file cannot be read or written.
pub fn upsert(path: &Path, chapter_no: u32, summary_line: &str) -> Result<()> {
    let content = if path.exists() {
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?
    } else {
        format!("{SUMMARY_HEADING}\n")
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, upsert_block(&content, chapter_no, summary_line))
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::debug!(chapter = chapter_no, path = %path.display(), "global summary updated");
    Ok(())
}
