//! `srl validate`: dry-run the pack checks used by `srl ingest`.

use crate::output::{OutputMode, render};
use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;
use serialist_core::pack::{CHAPTER_TEXT_MARK, ChapterOutput, PACK_MARK, parse_pack_str};
use std::io::{Read, Write};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Response or pack file to check; `-` or omitted reads standard input.
    pub file: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ValidateOutput {
    ok: bool,
    chapter_no: u32,
    /// Present when the input was a full response with chapter text.
    #[serde(skip_serializing_if = "Option::is_none")]
    word_count: Option<u64>,
    open_loops: Vec<String>,
    resolved_loops: Vec<String>,
}

fn read_input(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut raw = String::new();
            std::io::stdin()
                .lock()
                .read_to_string(&mut raw)
                .context("Failed to read standard input")?;
            Ok(raw)
        }
    }
}

/// A response carries at least one section marker; anything else is taken
/// as a bare pack document.
fn check_input(raw: &str) -> Result<ValidateOutput> {
    let (word_count, validated) = if raw.contains(CHAPTER_TEXT_MARK) || raw.contains(PACK_MARK) {
        let output = ChapterOutput::split(raw)?;
        (Some(output.word_count()), parse_pack_str(&output.pack_raw)?)
    } else {
        (None, parse_pack_str(raw)?)
    };

    let pack = validated.pack();
    Ok(ValidateOutput {
        ok: true,
        chapter_no: pack.chapter_no,
        word_count,
        open_loops: pack.open_loops.iter().map(|t| t.id.clone()).collect(),
        resolved_loops: pack.resolved_loops.clone(),
    })
}

/// Execute `srl validate`. Works outside a project.
///
/// # Errors
///
/// Returns the split or validation error for an invalid input, or an I/O
/// error if the input cannot be read.
pub fn run_validate(args: &ValidateArgs, output: OutputMode) -> Result<()> {
    let raw = read_input(args.file.as_ref())?;
    let result = check_input(&raw)?;

    render(output, &result, |r, w| {
        writeln!(w, "✓ Pack for chapter {} is valid", r.chapter_no)?;
        if let Some(words) = r.word_count {
            writeln!(w, "  chapter text: {words} words")?;
        }
        if !r.open_loops.is_empty() {
            writeln!(w, "  open loops:   {}", r.open_loops.join(", "))?;
        }
        if !r.resolved_loops.is_empty() {
            writeln!(w, "  resolves:     {}", r.resolved_loops.join(", "))?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serialist_core::error::{ErrorCode, classify};

    fn pack() -> serde_json::Value {
        json!({
            "chapter_no": 2,
            "chapter_word_target": 2000,
            "chapter_summary": "s",
            "timeline_updates": [],
            "character_updates": [],
            "org_updates": [],
            "new_facts": [],
            "open_loops": [{"id": "L1", "description": "the key"}],
            "resolved_loops": ["L0"],
            "next_chapter_plan": {},
            "foreshadowing_tasks": [],
            "risk_flags": [],
            "style_selfcheck": {}
        })
    }

    #[test]
    fn bare_pack_is_accepted() {
        let result = check_input(&pack().to_string()).expect("valid");
        assert_eq!(result.chapter_no, 2);
        assert_eq!(result.word_count, None);
        assert_eq!(result.open_loops, vec!["L1".to_string()]);
        assert_eq!(result.resolved_loops, vec!["L0".to_string()]);
    }

    #[test]
    fn full_response_reports_word_count() {
        let raw = format!("{CHAPTER_TEXT_MARK}\nthe gate creaked open\n{PACK_MARK}\n{}", pack());
        let result = check_input(&raw).expect("valid");
        assert_eq!(result.word_count, Some(4));
    }

    #[test]
    fn one_marker_is_malformed() {
        let raw = format!("{PACK_MARK}\n{}", pack());
        let err = check_input(&raw).expect_err("missing chapter marker");
        assert_eq!(classify(&err), Some(ErrorCode::MalformedInput));
    }

    #[test]
    fn schema_errors_are_classified() {
        let mut bad = pack();
        bad["open_loops"] = json!([{"description": "no id"}]);
        let err = check_input(&bad.to_string()).expect_err("schema");
        assert_eq!(classify(&err), Some(ErrorCode::PackSchemaError));
        assert!(err.to_string().contains("open_loops->0"));
    }
}
