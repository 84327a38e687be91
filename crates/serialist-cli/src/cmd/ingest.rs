//! `srl ingest`: store a drafted chapter and merge its pack.

use crate::output::{OutputMode, render};
use anyhow::{Context as _, Result};
use clap::Args;
use serialist_core::characters::CardAction;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Where the response text comes from.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct InputSource {
    /// Read the response from a file.
    #[arg(long)]
    pub from_file: Option<PathBuf>,

    /// Read the response from standard input (pipe a clipboard tool here).
    #[arg(long)]
    pub from_stdin: bool,
}

impl InputSource {
    /// Read the whole response as text.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or stdin cannot be read as UTF-8.
    pub fn read(&self) -> Result<String> {
        if let Some(ref path) = self.from_file {
            return std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()));
        }
        let mut raw = String::new();
        std::io::stdin()
            .lock()
            .read_to_string(&mut raw)
            .context("Failed to read standard input")?;
        Ok(raw)
    }
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Chapter number the response belongs to.
    #[arg(long)]
    pub chapter: u32,

    #[command(flatten)]
    pub source: InputSource,
}

/// Execute `srl ingest`.
///
/// # Errors
///
/// Returns an error if the input cannot be read, the response is missing a
/// section marker, the pack fails validation, or any write fails.
pub fn run_ingest(args: &IngestArgs, output: OutputMode, quiet: bool, project_root: &Path) -> Result<()> {
    let mut project = super::open_project(project_root)?;
    let raw = args.source.read()?;
    let report = project
        .ingest(args.chapter, &raw)
        .with_context(|| format!("Failed to ingest chapter {}", args.chapter))?;

    render(output, &report, |r, w| {
        writeln!(
            w,
            "✓ Ingested chapter {} ({} words, {} open loops)",
            r.chapter_no, r.word_count, r.open_loops
        )?;
        if !quiet {
            if !r.resolved.is_empty() {
                writeln!(w, "  resolved: {}", r.resolved.join(", "))?;
            }
            for card in &r.cards {
                let label = match card.action {
                    CardAction::Created => "created",
                    CardAction::Updated => "updated",
                    CardAction::Unchanged => "unchanged",
                    CardAction::Protected => "kept (principal card)",
                    CardAction::Rejected => "rejected (unsafe name)",
                };
                writeln!(w, "  card {}: {label}", card.name)?;
            }
        }
        writeln!(
            w,
            "  chapter {} request: {}",
            r.next_prompt.chapter_no,
            r.next_prompt.path.display()
        )
    })
}
