//! Generation request assembly.
//!
//! A request is the project's template with every placeholder filled from
//! minified state, character cards, the previous chapter's plan and a seeded
//! editor brief. Assembly is pure; reading sources and writing snapshots is
//! the caller's job.

pub mod brief;
pub mod snapshot;
pub mod soften;
pub mod style;
pub mod template;

use std::collections::BTreeMap;

use crate::model::NextChapterPlan;

pub use brief::render_editor_brief;
pub use snapshot::{EnvReader, ProcessEnv, SnapshotSettings, save_prompt_snapshot};
pub use soften::soften_style_rules;

const EMPTY_SUMMARY: &str = "(empty)";
const NO_S_CARDS: &str = "(see S-tier cards)";
const NO_A_CARDS: &str = "(A-tier cards will be created on demand)";

/// Per-chapter parameters of a request.
#[derive(Debug, Clone, Copy)]
pub struct ChapterRequest<'a> {
    pub chapter_no: u32,
    pub chapter_word_target: u32,
    pub threads_limit: u32,
    pub plan: &'a NextChapterPlan,
    pub last_summary: &'a str,
    pub open_loops: &'a str,
    pub seed: u64,
}

/// Project-level text fed into a request.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptSources<'a> {
    /// Template text; blank selects [`template::DEFAULT_TEMPLATE`].
    pub template: &'a str,
    /// Raw style rules, softened during assembly.
    pub style_rules: &'a str,
    pub bible_mini: &'a str,
    pub continuity_mini: &'a str,
    pub global_summary: &'a str,
    pub characters_s: &'a str,
    pub characters_a: &'a str,
}

/// Assemble the full request text.
#[must_use]
pub fn build_prompt(sources: &PromptSources<'_>, request: &ChapterRequest<'_>) -> String {
    let template_text = if sources.template.trim().is_empty() {
        template::DEFAULT_TEMPLATE
    } else {
        sources.template
    };

    let editor_brief = render_editor_brief(request);
    let plan = request.plan;

    let mut vars: BTreeMap<&str, String> = BTreeMap::new();
    vars.insert("STYLE_RULES", soften_style_rules(sources.style_rules, false));
    vars.insert("BIBLE_MINI", sources.bible_mini.to_string());
    vars.insert("GLOBAL_SUMMARY", non_blank(sources.global_summary, EMPTY_SUMMARY));
    vars.insert("CONTINUITY_MINI", sources.continuity_mini.to_string());
    vars.insert("CHARACTERS_S_MINI", non_blank(sources.characters_s, NO_S_CARDS));
    vars.insert("CHARACTERS_A_MINI", non_blank(sources.characters_a, NO_A_CARDS));
    vars.insert(
        "LAST_CHAPTER_SUMMARY",
        non_blank(request.last_summary, brief::NO_PREVIOUS_CHAPTER),
    );
    vars.insert("OPEN_LOOPS", non_blank(request.open_loops, brief::NO_OPEN_LOOPS));
    vars.insert("CHAPTER_NO", request.chapter_no.to_string());
    vars.insert("CHAPTER_WORD_TARGET", request.chapter_word_target.to_string());
    vars.insert("THREADS_LIMIT", request.threads_limit.to_string());
    vars.insert("SCENE_GOAL", plan.goal.clone());
    vars.insert("PRIMARY_CONFLICT", plan.conflict.clone());
    vars.insert(
        "BEATS",
        plan.beats
            .iter()
            .map(|beat| format!("- {beat}"))
            .collect::<Vec<_>>()
            .join("\n"),
    );
    vars.insert("POV_SUGGESTIONS", plan.pov_suggestions.join(", "));
    vars.insert("HOOK_QUESTION", plan.hook.clone());

    if template::mentions(template_text, template::EDITOR_BRIEF) {
        vars.insert(template::EDITOR_BRIEF, editor_brief);
        template::render(template_text, &vars)
    } else {
        let mut prompt = template::render(template_text, &vars);
        prompt.push_str("\n\n");
        prompt.push_str(&editor_brief);
        prompt
    }
}

fn non_blank(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
