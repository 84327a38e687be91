use crate::output::{OutputMode, render};
use anyhow::Result;
use clap::Args;
use serialist_core::export::ExportFormat;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// `txt`, `markdown` or `docx` (default: `[export] default_format` in config).
    #[arg(long)]
    pub format: Option<ExportFormat>,
}

/// Execute `srl export`: concatenate every ingested chapter into
/// `exports/novel.txt`, `exports/novel.md` or `exports/novel.docx`.
///
/// # Errors
///
/// Returns an error if the project cannot be opened, a chapter cannot be
/// read, or the manuscript cannot be written.
pub fn run_export(args: &ExportArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let project = super::open_project(project_root)?;
    let report = project.export(args.format)?;

    render(output, &report, |r, w| {
        if r.chapters.is_empty() {
            writeln!(w, "No ingested chapters yet; wrote an empty {}", r.path.display())
        } else {
            writeln!(
                w,
                "✓ Exported {} chapter(s) as {} to {}",
                r.chapters.len(),
                r.format,
                r.path.display()
            )
        }
    })
}
