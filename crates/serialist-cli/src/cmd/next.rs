//! `srl next`: rebuild the generation request for a chapter.

use crate::output::{OutputMode, render};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use serialist_core::lifecycle::GeneratedPrompt;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct NextArgs {
    /// Chapter to build the request for (default: the next one to draft).
    #[arg(long)]
    pub chapter: Option<u32>,

    /// Print the full request instead of a short confirmation.
    #[arg(long)]
    pub print: bool,
}

#[derive(Debug, Serialize)]
struct NextOutput<'a> {
    #[serde(flatten)]
    prompt: &'a GeneratedPrompt,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

/// Execute `srl next`.
///
/// # Errors
///
/// Returns an error if the project cannot be opened or the request cannot be
/// written.
pub fn run_next(args: &NextArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    if args.chapter == Some(0) {
        anyhow::bail!("chapter numbers start at 1");
    }

    let project = super::open_project(project_root)?;
    let prompt = project.next_prompt(args.chapter)?;
    let result = NextOutput {
        prompt: &prompt,
        text: args.print.then_some(prompt.text.as_str()),
    };

    render(output, &result, |r, w| {
        if let Some(text) = r.text {
            write!(w, "{text}")?;
            if !text.ends_with('\n') {
                writeln!(w)?;
            }
            return Ok(());
        }
        writeln!(
            w,
            "✓ Chapter {} request written to {} (seed {})",
            r.prompt.chapter_no,
            r.prompt.path.display(),
            r.prompt.seed
        )?;
        if let Some(ref snapshot) = r.prompt.snapshot {
            writeln!(w, "  snapshot: {}", snapshot.display())?;
        }
        Ok(())
    })
}
