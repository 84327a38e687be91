use crate::output::{OutputMode, render};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use serialist_core::Project;
use serialist_core::config::{PROJECT_DIR, ProjectLayout};
use serialist_core::lifecycle::GeneratedPrompt;
use serialist_core::model::ProjectMeta;
use serialist_core::prompt::ProcessEnv;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Short project identifier (used in exports and status).
    #[arg(long)]
    pub project: String,

    /// One-line premise of the serial.
    #[arg(long)]
    pub topic: String,

    /// Target length of the whole work, in words.
    #[arg(long)]
    pub target_words: Option<u64>,

    /// Target length of a single chapter, in words.
    #[arg(long)]
    pub chapter_words: Option<u32>,

    /// Maximum number of open threads shown in each request.
    #[arg(long)]
    pub threads: Option<u32>,

    /// Re-initialize an existing project (progress restarts at chapter 1).
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    fn meta(&self) -> ProjectMeta {
        let defaults = ProjectMeta::default();
        ProjectMeta {
            slug: self.project.trim().to_string(),
            topic: self.topic.trim().to_string(),
            target_words: self.target_words.unwrap_or(defaults.target_words),
            chapter_words: self.chapter_words.unwrap_or(defaults.chapter_words),
            threads: self.threads.unwrap_or(defaults.threads),
        }
    }
}

#[derive(Debug, Serialize)]
struct InitOutput {
    slug: String,
    topic: String,
    root: PathBuf,
    prompt: GeneratedPrompt,
}

/// Execute `srl init`. Creates the project skeleton in `project_root`:
///
/// ```text
/// .serialist/config.toml
/// prompts/            chapter_prompt.md, style_rules.md (optional, user-provided)
/// bible/              bible.seed.json (optional)
/// characters/S, A/    character cards
/// notes/              global_summary.md
/// chapters/0001/      prompt_next.md
/// timeline/           continuity.json
/// exports/, outputs/prompts/
/// ```
///
/// # Errors
///
/// Returns an error if `.serialist/` already exists and `--force` is not set,
/// if the slug or topic is blank, or if any filesystem operation fails.
pub fn run_init(args: &InitArgs, output: OutputMode, quiet: bool, project_root: &Path) -> Result<()> {
    let layout = ProjectLayout::new(project_root);
    if layout.project_dir().exists() && !args.force {
        anyhow::bail!("{PROJECT_DIR}/ already exists. Use `srl init --force` to reinitialize.");
    }

    let meta = args.meta();
    if meta.slug.is_empty() || meta.topic.is_empty() {
        anyhow::bail!("--project and --topic must not be blank");
    }
    if meta.chapter_words == 0 {
        anyhow::bail!("--chapter-words must be at least 1");
    }

    let mut project = Project::open(layout, &ProcessEnv)?;
    let prompt = project.init(meta.clone(), &ProcessEnv)?;

    let result = InitOutput {
        slug: meta.slug,
        topic: meta.topic,
        root: project.layout().root().to_path_buf(),
        prompt,
    };

    render(output, &result, |r, w| {
        writeln!(w, "✓ Initialized serialist project '{}' in {}", r.slug, r.root.display())?;
        writeln!(w, "  chapter 1 request: {}", r.prompt.path.display())?;
        if let Some(ref snapshot) = r.prompt.snapshot {
            writeln!(w, "  snapshot:          {}", snapshot.display())?;
        }
        if !quiet {
            writeln!(w)?;
            writeln!(w, "Next steps:")?;
            writeln!(w, "  1. Send the request to your writing assistant.")?;
            writeln!(w, "  2. Save the full reply, both sections, to a file.")?;
            writeln!(w, "  3. srl ingest --chapter 1 --from-file reply.md")?;
        }
        Ok(())
    })
}
