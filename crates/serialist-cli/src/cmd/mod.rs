//! Subcommand handlers for `srl`.

pub mod completions;
pub mod export;
pub mod ingest;
pub mod init;
pub mod next;
pub mod status;
pub mod validate;

use anyhow::Result;
use serialist_core::Project;
use serialist_core::config::ProjectLayout;
use serialist_core::prompt::ProcessEnv;
use std::path::Path;

/// Open the project that contains `cwd`, walking up to its `.serialist/`.
///
/// # Errors
///
/// Returns a `NotInitializedError` when no project is found, or any error
/// from loading its config and continuity state.
pub fn open_project(cwd: &Path) -> Result<Project> {
    let layout = ProjectLayout::locate(cwd)?;
    Project::open(layout, &ProcessEnv)
}
