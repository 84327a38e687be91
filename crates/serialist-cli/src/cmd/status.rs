//! `srl status`: progress against target and the most urgent open threads.

use crate::output::{OutputMode, field, heading, render_mode, rule};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use serialist_core::lifecycle::ProjectStatus;
use serialist_core::model::PlotThread;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// How many open threads to list, most urgent first.
    #[arg(long, default_value_t = 5)]
    pub loops: usize,
}

#[derive(Debug, Serialize)]
struct StatusOutput {
    #[serde(flatten)]
    status: ProjectStatus,
    top_loops: Vec<PlotThread>,
}

fn percent(done: u64, target: u64) -> String {
    if target == 0 {
        return "-".to_string();
    }
    #[allow(clippy::cast_precision_loss)]
    let pct = done as f64 * 100.0 / target as f64;
    format!("{pct:.1}%")
}

/// Execute `srl status`.
///
/// # Errors
///
/// Returns an error if the project cannot be opened or output rendering fails.
pub fn run_status(args: &StatusArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let project = super::open_project(project_root)?;
    let result = StatusOutput {
        status: project.status(),
        top_loops: project
            .store()
            .state()
            .ranked_open_loops(args.loops)
            .into_iter()
            .cloned()
            .collect(),
    };

    render_mode(
        output,
        &result,
        |r, w| {
            let s = &r.status;
            writeln!(w, "project={}", s.slug)?;
            writeln!(w, "current_chapter={}", s.current_chapter)?;
            writeln!(w, "completed={}", s.completed)?;
            writeln!(w, "words={}/{}", s.estimated_total_words, s.target_words)?;
            writeln!(w, "phase={}", s.phase)?;
            writeln!(w, "open_loops={}", s.open_loops)?;
            for thread in &r.top_loops {
                writeln!(w, "loop {} {}", thread.id, thread.description)?;
            }
            Ok(())
        },
        |r, w| {
            let s = &r.status;
            heading(w, &format!("{} - {}", s.slug, s.topic))?;
            field(w, "Next chapter", s.current_chapter.to_string())?;
            field(w, "Completed", s.completed.to_string())?;
            field(
                w,
                "Words",
                format!(
                    "{} / {} ({})",
                    s.estimated_total_words,
                    s.target_words,
                    percent(s.estimated_total_words, s.target_words)
                ),
            )?;
            field(w, "Phase", &s.phase)?;
            field(w, "Open loops", s.open_loops.to_string())?;
            if !r.top_loops.is_empty() {
                rule(w)?;
                for thread in &r.top_loops {
                    writeln!(w, "  {:<8} {}", thread.id, thread.description)?;
                }
            }
            Ok(())
        },
    )
}
