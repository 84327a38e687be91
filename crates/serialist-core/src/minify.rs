//! Deterministic text digests of the setting bible and the continuity state.
//!
//! Both functions are pure: the same input always yields the same bytes.

use serde_json::Value;

use crate::model::ContinuityState;

/// Open threads listed in a continuity digest.
pub const DIGEST_OPEN_LOOPS: usize = 5;

/// Trailing timeline events listed in a continuity digest.
pub const DIGEST_TIMELINE_EVENTS: usize = 3;

/// Phase budget entries listed in a bible digest.
pub const DIGEST_PHASES: usize = 2;

/// Project the setting bible onto a few labelled lines.
///
/// Sections absent from the bible are left out rather than rendered empty.
#[must_use]
pub fn minify_bible(bible: &Value) -> String {
    let mut lines = Vec::new();

    if let Some(meta) = bible.get("meta").filter(|m| m.is_object()) {
        if let Some(genre) = meta.get("genre").and_then(scalar_text) {
            lines.push(format!("Genre: {genre}"));
        }
        if let Some(tone) = meta.get("tone").and_then(tone_text) {
            lines.push(format!("Tone: {tone}"));
        }
        if let Some(positioning) = meta.get("positioning").and_then(scalar_text) {
            lines.push(format!("Positioning: {positioning}"));
        }
        if let Some(safety) = meta
            .get("content_safety")
            .and_then(Value::as_object)
            .filter(|s| !s.is_empty())
        {
            // Order must not depend on serde_json's `preserve_order` feature.
            let mut pairs: Vec<(&String, &Value)> = safety.iter().collect();
            pairs.sort_by(|a, b| a.0.cmp(b.0));
            let rendered: Vec<String> = pairs
                .into_iter()
                .map(|(key, value)| format!("{key}:{}", value_text(value)))
                .collect();
            lines.push(format!("Safety:{}", rendered.join("; ")));
        }
    }

    if let Some(phases) = bible
        .pointer("/scope/phase_word_budget")
        .and_then(Value::as_array)
        .filter(|p| !p.is_empty())
    {
        let rendered: Vec<String> = phases
            .iter()
            .take(DIGEST_PHASES)
            .map(|entry| {
                let phase = entry.get("phase").map(value_text).unwrap_or_default();
                let words = entry.get("words").map(value_text).unwrap_or_default();
                format!("{phase} {words}")
            })
            .collect();
        lines.push(format!("Phases:{}", rendered.join("; ")));
    }

    lines.join("\n")
}

/// Project the continuity state onto a progress line, the most urgent open
/// threads and the most recent timeline events.
#[must_use]
pub fn minify_continuity(state: &ContinuityState) -> String {
    let progress = &state.progress;
    let mut lines = vec![format!(
        "Progress: ch{} phase={}",
        progress.current_chapter, progress.phase
    )];

    let top = state.ranked_open_loops(DIGEST_OPEN_LOOPS);
    if !top.is_empty() {
        let rendered: Vec<String> = top
            .iter()
            .map(|thread| format!("{}: {}", thread.id, thread.description))
            .collect();
        lines.push(format!("Open loops:{}", rendered.join("; ")));
    }

    if !state.timeline.is_empty() {
        let skip = state.timeline.len().saturating_sub(DIGEST_TIMELINE_EVENTS);
        let rendered: Vec<String> = state.timeline[skip..]
            .iter()
            .map(|event| format!("{}:{}", event.time_hint, event.event))
            .collect();
        lines.push(format!("Recent timeline:{}", rendered.join("; ")));
    }

    lines.join("\n")
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        other => Some(value_text(other)),
    }
}

fn tone_text(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) if !items.is_empty() => {
            Some(items.iter().map(value_text).collect::<Vec<_>>().join(", "))
        }
        Value::Array(_) => None,
        other => scalar_text(other),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
