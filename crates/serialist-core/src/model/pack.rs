use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::state::{PlotThread, TimelineEvent};

/// Typed view of a chapter pack.
///
/// Bookkeeping sections the engine never interprets (`org_updates`,
/// `foreshadowing_tasks`, `style_selfcheck`, `continuity_updates`) are kept
/// as raw JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ChapterPack {
    pub chapter_no: u32,
    pub chapter_word_target: u32,
    pub chapter_summary: String,
    pub timeline_updates: Vec<TimelineEvent>,
    pub character_updates: Vec<CharacterUpdate>,
    pub org_updates: Vec<Value>,
    pub new_facts: Vec<String>,
    pub open_loops: Vec<PlotThread>,
    pub resolved_loops: Vec<String>,
    pub next_chapter_plan: NextChapterPlan,
    pub foreshadowing_tasks: Vec<Value>,
    pub risk_flags: Vec<String>,
    pub style_selfcheck: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuity_updates: Option<Value>,
}

/// Per-character delta reported by a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CharacterUpdate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_delta: Option<String>,
    pub secrets_gained: Vec<String>,
    pub relationships_delta: Vec<String>,
}

impl CharacterUpdate {
    /// Card lines this update contributes, in fixed order.
    #[must_use]
    pub fn delta_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(status) = self.status_delta.as_deref().filter(|s| !s.is_empty()) {
            lines.push(format!("Status: {status}"));
        }
        if !self.secrets_gained.is_empty() {
            lines.push(format!("Secrets: {}", self.secrets_gained.join("; ")));
        }
        if !self.relationships_delta.is_empty() {
            lines.push(format!("Relations: {}", self.relationships_delta.join("; ")));
        }
        lines
    }
}

/// The plan a pack proposes for the following chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NextChapterPlan {
    pub goal: String,
    pub conflict: String,
    pub beats: Vec<String>,
    pub pov_suggestions: Vec<String>,
    pub hook: String,
}

impl NextChapterPlan {
    /// Plan used for the very first chapter of a project.
    #[must_use]
    pub fn opening() -> Self {
        Self {
            goal: "Set the stage".to_string(),
            ..Self::default()
        }
    }
}
