//! The editor brief: a short, seeded task sheet appended to every request.

use std::fmt::Write as _;

use crate::prompt::ChapterRequest;
use crate::prompt::style::{BANNED_FILLERS, EDITOR_DONTS, choose_strategy, sample_materials};

const GOAL_FALLBACK: &str = "(optional: let events reveal the goal)";
const CONFLICT_FALLBACK: &str = "(ground it in interests and relationships)";
const HOOK_FALLBACK: &str = "(optional: hide the hook in an action or a line)";
const BEATS_FALLBACK: &str = "- (organize beats naturally from context)";
const POV_FALLBACK: &str = "Choose as needed (keep it consistent).";

pub(crate) const NO_PREVIOUS_CHAPTER: &str = "No previous chapter.";
pub(crate) const NO_OPEN_LOOPS: &str = "None";

/// Render the brief for `request`.
///
/// The output depends only on the request; equal seeds give equal briefs.
#[must_use]
pub fn render_editor_brief(request: &ChapterRequest<'_>) -> String {
    let strategy = choose_strategy(request.seed);
    let materials = sample_materials(request.seed);
    let plan = request.plan;

    let goal = or_fallback(&plan.goal, GOAL_FALLBACK);
    let conflict = or_fallback(&plan.conflict, CONFLICT_FALLBACK);
    let hook = or_fallback(&plan.hook, HOOK_FALLBACK);
    let beats = if plan.beats.is_empty() {
        BEATS_FALLBACK.to_string()
    } else {
        bullet_list(plan.beats.iter().map(String::as_str))
    };
    let pov = if plan.pov_suggestions.is_empty() {
        POV_FALLBACK.to_string()
    } else {
        plan.pov_suggestions.join(", ")
    };
    let last_summary = or_fallback(request.last_summary, NO_PREVIOUS_CHAPTER);
    let open_loops = or_fallback(request.open_loops, NO_OPEN_LOOPS);

    let mut brief = String::from("# Editor Brief (task sheet)\n\n");

    brief.push_str("1) What must happen (events, not themes)\n");
    let _ = writeln!(brief, "- Chapter goal: {goal}");
    let _ = writeln!(brief, "- Primary conflict: {conflict}");
    let _ = writeln!(brief, "- Beats:\n{beats}\n");

    brief.push_str("2) Facts that must stay consistent\n");
    let _ = writeln!(brief, "- Last chapter summary: {last_summary}");
    let _ = writeln!(brief, "- Open loops: {open_loops}");
    let _ = writeln!(brief, "- Threads limit: {}\n", request.threads_limit);

    brief.push_str("3) Style dials (preferences, not KPIs)\n");
    let _ = writeln!(brief, "- Opening: {}", strategy.opening);
    let _ = writeln!(brief, "- Rhythm: {}", strategy.rhythm);
    let _ = writeln!(brief, "- Camera: {}", strategy.camera);
    let _ = writeln!(brief, "- Dialogue: {}", strategy.dialogue_density);
    let _ = writeln!(brief, "- POV: {pov}");
    let _ = writeln!(brief, "- Hook question: {hook}\n");

    brief.push_str("4) Material cards (use naturally; no need to use all)\n");
    let _ = writeln!(brief, "- Objects: {}", materials.objects.join(", "));
    let _ = writeln!(brief, "- Ambient sounds: {}", materials.sounds.join(", "));
    let _ = writeln!(brief, "- Smell/temperature: {}", materials.sense);
    let _ = writeln!(brief, "- Small gestures: {}", materials.gestures.join(", "));
    let _ = writeln!(
        brief,
        "- Place micro-details: {}\n",
        materials.place_details.join(", ")
    );

    brief.push_str("5) Dialogue seeds (do not copy; keep the voice human)\n");
    for line in &materials.dialogue_seeds {
        let _ = writeln!(brief, "- \"{line}\"");
    }
    brief.push('\n');

    brief.push_str("6) Don'ts (light touch)\n");
    brief.push_str(&bullet_list(EDITOR_DONTS.iter().copied()));
    let _ = writeln!(brief, "\n- Use fewer fillers like: {}\n", BANNED_FILLERS.join(", "));

    brief.push_str("7) Output\n");
    let _ = writeln!(
        brief,
        "- Target length: ~{} words (flexible)",
        request.chapter_word_target
    );
    brief.push_str("- Output the chapter body only. No explanations, no meta commentary.\n");

    brief
}

fn or_fallback<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() { fallback } else { trimmed }
}

fn bullet_list<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NextChapterPlan;

    fn request(plan: &NextChapterPlan, seed: u64) -> ChapterRequest<'_> {
        ChapterRequest {
            chapter_no: 2,
            chapter_word_target: 2500,
            threads_limit: 3,
            plan,
            last_summary: "Mara found the ledger.",
            open_loops: "- L1: who burned the warehouse",
            seed,
        }
    }

    #[test]
    fn equal_seeds_give_identical_briefs() {
        let plan = NextChapterPlan::opening();
        assert_eq!(
            render_editor_brief(&request(&plan, 11)),
            render_editor_brief(&request(&plan, 11))
        );
    }

    #[test]
    fn some_seeds_give_different_briefs() {
        let plan = NextChapterPlan::opening();
        let first = render_editor_brief(&request(&plan, 1));
        assert!((2..16).any(|seed| render_editor_brief(&request(&plan, seed)) != first));
    }

    #[test]
    fn empty_plan_uses_fallbacks() {
        let plan = NextChapterPlan::default();
        let brief = render_editor_brief(&request(&plan, 1));
        assert!(brief.contains(GOAL_FALLBACK));
        assert!(brief.contains(BEATS_FALLBACK));
        assert!(brief.contains(POV_FALLBACK));
    }

    #[test]
    fn plan_fields_are_rendered() {
        let plan = NextChapterPlan {
            goal: "Reach the pier".into(),
            conflict: "The harbourmaster wants the ledger".into(),
            beats: vec!["fog rolls in".into(), "a shot".into()],
            pov_suggestions: vec!["Mara".into(), "Ivo".into()],
            hook: "Who fired?".into(),
        };
        let brief = render_editor_brief(&request(&plan, 5));
        assert!(brief.contains("- Chapter goal: Reach the pier"));
        assert!(brief.contains("- Beats:\n- fog rolls in\n- a shot\n"));
        assert!(brief.contains("- POV: Mara, Ivo"));
        assert!(brief.contains("- Target length: ~2500 words"));
        assert!(brief.contains("- Open loops: - L1: who burned the warehouse"));
    }

    #[test]
    fn blank_summary_falls_back() {
        let plan = NextChapterPlan::default();
        let mut req = request(&plan, 1);
        req.last_summary = "   ";
        req.open_loops = "";
        let brief = render_editor_brief(&req);
        assert!(brief.contains("- Last chapter summary: No previous chapter."));
        assert!(brief.contains("- Open loops: None"));
    }
}
