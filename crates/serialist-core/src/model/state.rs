use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::model::pack::ChapterPack;

/// Format label written into every continuity document.
pub const STATE_VERSION: &str = "0.1";

/// Arc label given to a project before any phase change is recorded.
pub const INITIAL_PHASE: &str = "P1_opening";

pub const DEFAULT_TARGET_WORDS: u64 = 1_000_000;
pub const DEFAULT_CHAPTER_WORDS: u32 = 2_500;
pub const DEFAULT_THREADS_LIMIT: u32 = 3;

/// The durable narrative state of one project.
///
/// Unknown top-level keys found on disk are kept in `extra` and written back
/// unchanged, so older or hand-edited documents survive a rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContinuityState {
    pub version: String,
    pub project: ProjectMeta,
    pub progress: Progress,
    pub open_loops: Vec<PlotThread>,
    pub resolved_loops: Vec<String>,
    pub timeline: Vec<TimelineEvent>,
    pub new_facts: Vec<String>,
    pub risk_flags: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for ContinuityState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION.to_string(),
            project: ProjectMeta::default(),
            progress: Progress::default(),
            open_loops: Vec::new(),
            resolved_loops: Vec::new(),
            timeline: Vec::new(),
            new_facts: Vec::new(),
            risk_flags: Vec::new(),
            extra: BTreeMap::new(),
        }
    }
}

/// Identifying metadata recorded by `srl init`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectMeta {
    pub slug: String,
    pub topic: String,
    pub target_words: u64,
    pub chapter_words: u32,
    pub threads: u32,
}

impl Default for ProjectMeta {
    fn default() -> Self {
        Self {
            slug: String::new(),
            topic: String::new(),
            target_words: DEFAULT_TARGET_WORDS,
            chapter_words: DEFAULT_CHAPTER_WORDS,
            threads: DEFAULT_THREADS_LIMIT,
        }
    }
}

/// Chapter-level progress counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    /// Next chapter to draft.
    pub current_chapter: u32,
    /// Sorted, duplicate-free by construction.
    pub completed_chapters: BTreeSet<u32>,
    pub estimated_total_words: u64,
    pub phase: String,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            current_chapter: 0,
            completed_chapters: BTreeSet::new(),
            estimated_total_words: 0,
            phase: INITIAL_PHASE.to_string(),
        }
    }
}

/// An unresolved narrative element tracked by a stable id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlotThread {
    pub id: String,
    pub description: String,
    /// Lower is more urgent; `None` ranks after every explicit priority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

impl PlotThread {
    #[must_use]
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            priority: None,
        }
    }

    #[must_use]
    pub const fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sort key used by projections: explicit priorities ascending, then
    /// threads without one.
    #[must_use]
    pub const fn rank(&self) -> (bool, i64) {
        match self.priority {
            Some(priority) => (false, priority),
            None => (true, 0),
        }
    }
}

/// One step of the story's timeline; insertion order is narrative order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TimelineEvent {
    pub time_hint: String,
    pub event: String,
}

impl TimelineEvent {
    #[must_use]
    pub fn new(time_hint: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            time_hint: time_hint.into(),
            event: event.into(),
        }
    }
}

impl ContinuityState {
    /// Apply a validated pack to this state in memory.
    ///
    /// Steps run in a fixed order: drop resolved threads, append unseen
    /// threads, sort by id, extend the timeline, then fold in facts, risk
    /// flags and the resolution history. An id resolved by the pack is never
    /// re-added by the same pack.
    pub fn apply_pack(&mut self, pack: &ChapterPack) {
        let resolved: HashSet<&str> = pack.resolved_loops.iter().map(String::as_str).collect();

        self.open_loops
            .retain(|thread| !resolved.contains(thread.id.as_str()));

        for thread in &pack.open_loops {
            if thread.id.is_empty() || resolved.contains(thread.id.as_str()) {
                continue;
            }
            if self.open_loops.iter().any(|open| open.id == thread.id) {
                continue;
            }
            self.open_loops.push(thread.clone());
        }

        self.open_loops.sort_by(|a, b| a.id.cmp(&b.id));

        self.timeline.extend(pack.timeline_updates.iter().cloned());

        for fact in &pack.new_facts {
            push_unique(&mut self.new_facts, fact);
        }
        for flag in &pack.risk_flags {
            push_unique(&mut self.risk_flags, flag);
        }
        for id in &pack.resolved_loops {
            push_unique(&mut self.resolved_loops, id);
        }
    }

    /// Record a finished chapter.
    ///
    /// Membership is idempotent; the word total is not. Every call adds
    /// `word_count` again.
    pub fn record_completion(&mut self, chapter_no: u32, word_count: u64) {
        let progress = &mut self.progress;
        progress.completed_chapters.insert(chapter_no);
        progress.current_chapter = progress
            .current_chapter
            .max(chapter_no.saturating_add(1));
        progress.estimated_total_words = progress.estimated_total_words.saturating_add(word_count);
    }

    /// Replace project metadata and restart progress at chapter 1.
    pub fn reset_project(&mut self, meta: ProjectMeta) {
        self.project = meta;
        self.progress.current_chapter = 1;
        self.progress.completed_chapters.clear();
        self.progress.estimated_total_words = 0;
    }

    /// Open threads ranked by `(priority asc, id asc)`, threads without a
    /// priority last, truncated to `limit`.
    #[must_use]
    pub fn ranked_open_loops(&self, limit: usize) -> Vec<&PlotThread> {
        let mut ranked: Vec<&PlotThread> = self.open_loops.iter().collect();
        ranked.sort_by(|a, b| a.rank().cmp(&b.rank()).then_with(|| a.id.cmp(&b.id)));
        ranked.truncate(limit);
        ranked
    }

    /// Chapter to draft next; never below 1.
    #[must_use]
    pub fn next_chapter(&self) -> u32 {
        self.progress.current_chapter.max(1)
    }

    /// Open loops as a bullet list, in stored (id) order.
    #[must_use]
    pub fn open_loops_listing(&self) -> String {
        self.open_loops
            .iter()
            .map(|thread| format!("- {}: {}", thread.id, thread.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn push_unique(values: &mut Vec<String>, candidate: &str) {
    if !values.iter().any(|existing| existing == candidate) {
        values.push(candidate.to_string());
    }
}
