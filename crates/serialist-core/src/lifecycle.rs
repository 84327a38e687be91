//! Chapter lifecycle: init, request generation, ingest and status.
//!
//! A [`Project`] owns the layout, the project config and the continuity
//! store. Per chapter it moves through
//!
//! ```text
//! awaiting draft (n) --next--> request written
//!                    --ingest--> awaiting draft (n + 1)
//! ```
//!
//! Ingest validates everything before the first write; a rejected response
//! leaves the project exactly as it was.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::Serialize;
use serde_json::Value;

use crate::characters::{self, CardOutcome};
use crate::config::{self, DEFAULT_CONFIG_TOML, ProjectConfig, ProjectLayout};
use crate::continuity::ContinuityStore;
use crate::error::ErrorCode;
use crate::export::{self, ExportFormat, ExportReport};
use crate::minify;
use crate::model::{ChapterPack, NextChapterPlan, ProjectMeta};
use crate::pack::{ChapterOutput, parse_pack_str};
use crate::prompt::{self, ChapterRequest, EnvReader, PromptSources, SnapshotSettings};
use crate::summary;

/// File written into each chapter folder with the generation request.
pub const PROMPT_FILE: &str = "prompt_next.md";
/// Stored response, both sections.
pub const OUTPUT_FILE: &str = "output.md";
/// Stored pack document, pretty-printed.
pub const PACK_FILE: &str = "summary.json";

/// A chapter's `output.md` or `summary.json` could not be written.
#[derive(Debug, thiserror::Error)]
#[error("failed to write {}: {source}", path.display())]
pub struct ChapterWriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl ChapterWriteError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::ChapterFileWriteFailed
    }
}

/// A generation request written to disk.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedPrompt {
    pub chapter_no: u32,
    pub seed: u64,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,
    #[serde(skip)]
    pub text: String,
}

/// Outcome of a successful ingest.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub chapter_no: u32,
    pub word_count: u64,
    pub open_loops: usize,
    pub resolved: Vec<String>,
    pub cards: Vec<CardOutcome>,
    pub next_prompt: GeneratedPrompt,
}

/// Progress snapshot for `srl status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectStatus {
    pub slug: String,
    pub topic: String,
    pub current_chapter: u32,
    pub completed: usize,
    pub completed_chapters: Vec<u32>,
    pub estimated_total_words: u64,
    pub target_words: u64,
    pub open_loops: usize,
    pub phase: String,
}

#[derive(Debug)]
pub struct Project {
    layout: ProjectLayout,
    config: ProjectConfig,
    store: ContinuityStore,
    snapshots: SnapshotSettings,
}

impl Project {
    /// Open the project at `layout`, reading config and continuity state.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the continuity state is
    /// corrupt (the underlying [`crate::continuity::StoreError`] stays
    /// reachable through `downcast_ref`).
    pub fn open(layout: ProjectLayout, env: &dyn EnvReader) -> Result<Self> {
        let config = config::load_project_config(layout.root())?;
        let store = ContinuityStore::load(layout.continuity_path())?;
        let snapshots = resolve_snapshots(&layout, &config, env);
        tracing::debug!(root = %layout.root().display(), "project opened");
        Ok(Self {
            layout,
            config,
            store,
            snapshots,
        })
    }

    #[must_use]
    pub const fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    #[must_use]
    pub const fn config(&self) -> &ProjectConfig {
        &self.config
    }

    #[must_use]
    pub const fn store(&self) -> &ContinuityStore {
        &self.store
    }

    /// Set up the project skeleton, record `meta`, and write the chapter 1
    /// request.
    ///
    /// Re-running on an existing project keeps config, summary and cards,
    /// but restarts progress at chapter 1.
    ///
    /// # Errors
    ///
    /// Returns an error if any directory or file cannot be written.
    pub fn init(&mut self, meta: ProjectMeta, env: &dyn EnvReader) -> Result<GeneratedPrompt> {
        self.layout.ensure_dirs()?;

        let config_path = self.layout.config_path();
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG_TOML)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
            self.config = config::load_project_config(self.layout.root())?;
            self.snapshots = resolve_snapshots(&self.layout, &self.config, env);
        }

        let summary_path = self.layout.global_summary_path();
        if !summary_path.exists() {
            fs::write(&summary_path, summary::seed_text(&meta.topic))
                .with_context(|| format!("Failed to write {}", summary_path.display()))?;
        }

        tracing::info!(slug = %meta.slug, topic = %meta.topic, "initializing project");
        self.store.update_project(meta)?;

        self.write_request(1, &NextChapterPlan::opening(), "")
    }

    /// Write the request for `chapter` (default: the next chapter to draft).
    ///
    /// # Errors
    ///
    /// Returns an error if a source file is unreadable or the request cannot
    /// be written.
    pub fn next_prompt(&self, chapter: Option<u32>) -> Result<GeneratedPrompt> {
        let chapter_no = chapter
            .unwrap_or_else(|| self.store.state().next_chapter())
            .max(1);

        let (plan, last_summary) = if chapter_no > 1 {
            self.previous_chapter(chapter_no - 1)?
        } else {
            (NextChapterPlan::opening(), String::new())
        };

        self.write_request(chapter_no, &plan, &last_summary)
    }

    /// Ingest a drafted chapter from the external response `raw`.
    ///
    /// # Errors
    ///
    /// Fails with [`crate::pack::MalformedInputError`] or
    /// [`crate::pack::PackError`] (reachable through `downcast_ref`) before
    /// anything is written. Later I/O failures are reported with context.
    pub fn ingest(&mut self, chapter_no: u32, raw: &str) -> Result<IngestReport> {
        if chapter_no == 0 {
            anyhow::bail!("chapter numbers start at 1");
        }

        let output = ChapterOutput::split(raw)?;
        let validated = parse_pack_str(&output.pack_raw)?;
        let (document, pack) = validated.into_parts();

        if pack.chapter_no != chapter_no {
            tracing::warn!(
                requested = chapter_no,
                pack = pack.chapter_no,
                "pack chapter_no differs from the ingested chapter; using the requested number"
            );
        }

        self.write_chapter_files(chapter_no, &output, &document)?;
        summary::upsert(
            &self.layout.global_summary_path(),
            chapter_no,
            &pack.chapter_summary,
        )?;
        let cards = characters::apply_updates(&self.layout.characters_dir(), &pack.character_updates)?;

        let word_count = output.word_count();
        self.store.ingest(&pack, chapter_no, word_count)?;

        let last_summary = if pack.chapter_summary.trim().is_empty() {
            output.prose.as_str()
        } else {
            pack.chapter_summary.as_str()
        };
        let next_prompt =
            self.write_request(chapter_no.saturating_add(1), &pack.next_chapter_plan, last_summary)?;

        tracing::info!(chapter = chapter_no, words = word_count, "chapter ingested");
        Ok(IngestReport {
            chapter_no,
            word_count,
            open_loops: self.store.state().open_loops.len(),
            resolved: pack.resolved_loops.clone(),
            cards,
            next_prompt,
        })
    }

    #[must_use]
    pub fn status(&self) -> ProjectStatus {
        let state = self.store.state();
        ProjectStatus {
            slug: state.project.slug.clone(),
            topic: state.project.topic.clone(),
            current_chapter: state.progress.current_chapter,
            completed: state.progress.completed_chapters.len(),
            completed_chapters: state.progress.completed_chapters.iter().copied().collect(),
            estimated_total_words: state.progress.estimated_total_words,
            target_words: state.project.target_words,
            open_loops: state.open_loops.len(),
            phase: state.progress.phase.clone(),
        }
    }

    /// Export the manuscript; `format` defaults to the configured one.
    ///
    /// # Errors
    ///
    /// Returns an error if chapters cannot be read or the export written.
    pub fn export(&self, format: Option<ExportFormat>) -> Result<ExportReport> {
        let format = format.unwrap_or(self.config.export.default_format);
        let title = self
            .config
            .export
            .title
            .clone()
            .unwrap_or_else(|| self.store.state().project.topic.clone());
        export::export(
            &self.layout.chapters_dir(),
            &self.layout.exports_dir(),
            format,
            &title,
        )
    }

    fn previous_chapter(&self, chapter_no: u32) -> Result<(NextChapterPlan, String)> {
        let folder = self.layout.chapter_dir(chapter_no);
        let pack_path = folder.join(PACK_FILE);

        let mut plan = NextChapterPlan::default();
        let mut last_summary = String::new();
        if pack_path.is_file() {
            let raw = read_text(&pack_path)?;
            match serde_json::from_str::<ChapterPack>(&raw) {
                Ok(pack) => {
                    plan = pack.next_chapter_plan;
                    last_summary = pack.chapter_summary;
                }
                Err(err) => {
                    tracing::warn!(path = %pack_path.display(), error = %err, "ignoring unreadable stored pack");
                }
            }
        }

        if last_summary.trim().is_empty() {
            let output_path = folder.join(OUTPUT_FILE);
            if output_path.is_file() {
                last_summary = ChapterOutput::prose_of(&read_text(&output_path)?);
            }
        }

        Ok((plan, last_summary))
    }

    fn write_chapter_files(&self, chapter_no: u32, output: &ChapterOutput, document: &Value) -> Result<()> {
        let folder = self.layout.chapter_dir(chapter_no);
        fs::create_dir_all(&folder).map_err(|source| ChapterWriteError {
            path: folder.clone(),
            source,
        })?;

        let output_path = folder.join(OUTPUT_FILE);
        fs::write(&output_path, output.render()).map_err(|source| ChapterWriteError {
            path: output_path,
            source,
        })?;

        let pack_path = folder.join(PACK_FILE);
        let mut body = serde_json::to_string_pretty(document)?;
        body.push('\n');
        fs::write(&pack_path, body).map_err(|source| ChapterWriteError {
            path: pack_path,
            source,
        })?;
        Ok(())
    }

    fn write_request(&self, chapter_no: u32, plan: &NextChapterPlan, last_summary: &str) -> Result<GeneratedPrompt> {
        let state = self.store.state();
        let seed = u64::from(chapter_no).wrapping_add(self.config.prompt.brief_seed_offset);

        let template = read_text_if_exists(&self.layout.template_path())?;
        let style_rules = read_text_if_exists(&self.layout.style_rules_path())?;
        let bible_mini = self.bible_digest()?;
        let continuity_mini = self.store.minify();
        let global_summary = read_text_if_exists(&self.layout.global_summary_path())?;
        let characters_dir = self.layout.characters_dir();
        let characters_s = characters::gather(&characters_dir.join(characters::PRINCIPAL_TIER))?;
        let characters_a = characters::gather(&characters_dir.join(characters::SUPPORTING_TIER))?;
        let open_loops = state.open_loops_listing();

        let sources = PromptSources {
            template: &template,
            style_rules: &style_rules,
            bible_mini: &bible_mini,
            continuity_mini: &continuity_mini,
            global_summary: global_summary.trim(),
            characters_s: &characters_s,
            characters_a: &characters_a,
        };
        let request = ChapterRequest {
            chapter_no,
            chapter_word_target: state.project.chapter_words,
            threads_limit: state.project.threads,
            plan,
            last_summary,
            open_loops: &open_loops,
            seed,
        };
        let text = prompt::build_prompt(&sources, &request);

        let folder = self.layout.chapter_dir(chapter_no);
        fs::create_dir_all(&folder)
            .with_context(|| format!("Failed to create {}", folder.display()))?;
        let path = folder.join(PROMPT_FILE);
        fs::write(&path, &text).with_context(|| format!("Failed to write {}", path.display()))?;

        let snapshot = if self.snapshots.enabled {
            match prompt::save_prompt_snapshot(&text, chapter_no, seed, &self.snapshots.dir) {
                Ok(path) => Some(path),
                Err(err) => {
                    tracing::warn!(error = %err, dir = %self.snapshots.dir.display(), "prompt snapshot failed");
                    None
                }
            }
        } else {
            None
        };

        tracing::info!(chapter = chapter_no, seed, path = %path.display(), "generation request written");
        Ok(GeneratedPrompt {
            chapter_no,
            seed,
            path,
            snapshot,
            text,
        })
    }

    fn bible_digest(&self) -> Result<String> {
        let path = self.layout.bible_path();
        if !path.is_file() {
            return Ok(String::new());
        }
        let raw = read_text(&path)?;
        let bible: Value = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(minify::minify_bible(&bible))
    }
}

fn resolve_snapshots(layout: &ProjectLayout, config: &ProjectConfig, env: &dyn EnvReader) -> SnapshotSettings {
    let configured_dir = config
        .prompt
        .snapshot_dir
        .as_ref()
        .map_or_else(|| layout.snapshots_dir(), |dir| layout.root().join(dir));
    SnapshotSettings::resolve(config.prompt.snapshot, configured_dir, env)
}

fn read_text(path: &Path) -> Result<String> {
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(raw.trim_start_matches('\u{feff}').to_string())
}

fn read_text_if_exists(path: &Path) -> Result<String> {
    if path.is_file() {
        read_text(path)
    } else {
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::{CHAPTER_TEXT_MARK, MalformedInputError, PACK_MARK, PackError};
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[derive(Default)]
    struct MockEnv {
        vars: HashMap<String, String>,
    }

    impl EnvReader for MockEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.vars.get(key).cloned()
        }
    }

    fn no_snapshots() -> MockEnv {
        let mut env = MockEnv::default();
        env.vars
            .insert(prompt::snapshot::SNAPSHOT_ENV.to_string(), "0".to_string());
        env
    }

    fn meta() -> ProjectMeta {
        ProjectMeta {
            slug: "tides".into(),
            topic: "a harbour mystery".into(),
            ..ProjectMeta::default()
        }
    }

    fn initialized(dir: &TempDir) -> Project {
        let env = no_snapshots();
        let mut project = Project::open(ProjectLayout::new(dir.path()), &env).expect("open");
        project.init(meta(), &env).expect("init");
        project
    }

    fn response(chapter: u32, prose: &str, extra: &str) -> String {
        format!(
            "{CHAPTER_TEXT_MARK}\n{prose}\n\n{PACK_MARK}\n{{\
             \"chapter_no\": {chapter}, \"chapter_word_target\": 2500,\
             \"chapter_summary\": \"summary {chapter}\", \"timeline_updates\": [],\
             \"character_updates\": [], \"org_updates\": [], \"new_facts\": [],\
             \"open_loops\": [], \"resolved_loops\": [],\
             \"next_chapter_plan\": {{\"goal\": \"goal after {chapter}\"}},\
             \"foreshadowing_tasks\": [], \"risk_flags\": [], \"style_selfcheck\": {{}}{extra}}}\n"
        )
    }

    #[test]
    fn init_writes_skeleton_and_first_request() {
        let dir = TempDir::new().expect("tempdir");
        let project = initialized(&dir);
        let layout = project.layout();

        assert!(layout.config_path().is_file());
        assert!(layout.continuity_path().is_file());
        assert!(layout.chapter_dir(1).join(PROMPT_FILE).is_file());
        let summary = fs::read_to_string(layout.global_summary_path()).expect("read");
        assert!(summary.contains("Topic: a harbour mystery"));
        assert_eq!(project.store().state().progress.current_chapter, 1);
        assert!(!layout.snapshots_dir().exists());
    }

    #[test]
    fn ingest_advances_and_writes_next_request() {
        let dir = TempDir::new().expect("tempdir");
        let mut project = initialized(&dir);

        let report = project
            .ingest(1, &response(1, "The tide came in early.", ""))
            .expect("ingest");
        assert_eq!(report.word_count, 5);
        assert_eq!(report.next_prompt.chapter_no, 2);

        let status = project.status();
        assert_eq!(status.current_chapter, 2);
        assert_eq!(status.completed_chapters, vec![1]);
        assert_eq!(status.estimated_total_words, 5);

        let next = fs::read_to_string(project.layout().chapter_dir(2).join(PROMPT_FILE)).expect("read");
        assert!(next.contains("goal after 1"));
        assert!(next.contains("summary 1"));
    }

    #[test]
    fn next_prompt_reads_previous_plan() {
        let dir = TempDir::new().expect("tempdir");
        let mut project = initialized(&dir);
        project.ingest(1, &response(1, "Prose.", "")).expect("ingest");

        let generated = project.next_prompt(None).expect("next");
        assert_eq!(generated.chapter_no, 2);
        assert_eq!(generated.seed, 2);
        assert!(generated.text.contains("- Chapter goal: goal after 1"));
    }

    #[test]
    fn malformed_response_changes_nothing() {
        let dir = TempDir::new().expect("tempdir");
        let mut project = initialized(&dir);
        let before = fs::read(project.layout().continuity_path()).expect("read");

        let err = project.ingest(1, "no markers here").expect_err("must fail");
        assert!(err.downcast_ref::<MalformedInputError>().is_some());
        assert!(!project.layout().chapter_dir(1).join(OUTPUT_FILE).exists());
        assert_eq!(fs::read(project.layout().continuity_path()).expect("read"), before);
    }

    #[test]
    fn invalid_pack_changes_nothing() {
        let dir = TempDir::new().expect("tempdir");
        let mut project = initialized(&dir);
        let before = project.store().state().clone();

        let raw = format!("{CHAPTER_TEXT_MARK}\nprose\n{PACK_MARK}\n{{\"chapter_no\": 1}}");
        let err = project.ingest(1, &raw).expect_err("must fail");
        assert!(matches!(
            err.downcast_ref::<PackError>(),
            Some(PackError::MissingFields(_))
        ));
        assert_eq!(project.store().state(), &before);
        assert!(!project.layout().chapter_dir(1).join(PACK_FILE).exists());
    }

    #[test]
    fn chapter_zero_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let mut project = initialized(&dir);
        assert!(project.ingest(0, &response(0, "x", "")).is_err());
    }

    #[test]
    fn snapshot_is_written_when_enabled() {
        let dir = TempDir::new().expect("tempdir");
        let env = MockEnv::default();
        let mut project = Project::open(ProjectLayout::new(dir.path()), &env).expect("open");
        let generated = project.init(meta(), &env).expect("init");
        let snapshot = generated.snapshot.expect("snapshot path");
        assert!(snapshot.ends_with("ch0001_seed000001.prompt.md"));
        assert_eq!(fs::read_to_string(snapshot).expect("read"), generated.text);
    }

    #[test]
    fn export_uses_configured_default() {
        let dir = TempDir::new().expect("tempdir");
        let mut project = initialized(&dir);
        project.ingest(1, &response(1, "Once upon a tide.", "")).expect("ingest");
        let report = project.export(None).expect("export");
        assert_eq!(report.format, ExportFormat::Txt);
        let text = fs::read_to_string(report.path).expect("read");
        assert_eq!(text, "# Chapter 1\n\nOnce upon a tide.\n\n");
    }
}
