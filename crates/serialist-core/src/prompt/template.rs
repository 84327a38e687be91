//! `{{NAME}}` placeholder substitution.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Placeholder that receives the editor brief.
pub const EDITOR_BRIEF: &str = "EDITOR_BRIEF";

/// Template used when a project has no `prompts/chapter_prompt.md`.
pub const DEFAULT_TEMPLATE: &str = "\
# Chapter {{CHAPTER_NO}}

## Style guidelines
{{STYLE_RULES}}

## Setting
{{BIBLE_MINI}}

## Story so far
{{GLOBAL_SUMMARY}}

## Continuity
{{CONTINUITY_MINI}}

## Principal characters
{{CHARACTERS_S_MINI}}

## Supporting characters
{{CHARACTERS_A_MINI}}

## Last chapter
{{LAST_CHAPTER_SUMMARY}}

## Open loops (at most {{THREADS_LIMIT}} active threads)
{{OPEN_LOOPS}}

## This chapter
- Target length: {{CHAPTER_WORD_TARGET}} words
- Scene goal: {{SCENE_GOAL}}
- Primary conflict: {{PRIMARY_CONFLICT}}
- POV suggestions: {{POV_SUGGESTIONS}}
- Hook question: {{HOOK_QUESTION}}

Beats:
{{BEATS}}

{{EDITOR_BRIEF}}

## Response format
Reply with the chapter prose after a line reading `===CHAPTER_TEXT===`, then a
line reading `===NEXT_CHAPTER_PACK===` followed by the chapter pack as JSON.
";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([A-Z][A-Z0-9_]*)\}\}").expect("valid placeholder regex")
});

/// Replace every known `{{NAME}}` in `template` with its value.
///
/// Substitution is a single pass, so values are never re-expanded. Unknown
/// placeholders are left verbatim.
#[must_use]
pub fn render(template: &str, vars: &BTreeMap<&str, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            vars.get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Whether `template` names `placeholder`.
#[must_use]
pub fn mentions(template: &str, placeholder: &str) -> bool {
    template.contains(&format!("{{{{{placeholder}}}}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&'static str, &str)]) -> BTreeMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, (*v).to_string())).collect()
    }

    #[test]
    fn replaces_known_placeholders() {
        let out = render(
            "Chapter {{CHAPTER_NO}}: {{SCENE_GOAL}}",
            &vars(&[("CHAPTER_NO", "3"), ("SCENE_GOAL", "escape")]),
        );
        assert_eq!(out, "Chapter 3: escape");
    }

    #[test]
    fn unknown_placeholders_survive() {
        let out = render("{{CHAPTER_NO}} {{MYSTERY}}", &vars(&[("CHAPTER_NO", "1")]));
        assert_eq!(out, "1 {{MYSTERY}}");
    }

    #[test]
    fn values_are_not_re_expanded() {
        let out = render(
            "{{GLOBAL_SUMMARY}}",
            &vars(&[("GLOBAL_SUMMARY", "{{CHAPTER_NO}}"), ("CHAPTER_NO", "9")]),
        );
        assert_eq!(out, "{{CHAPTER_NO}}");
    }

    #[test]
    fn repeated_placeholders_all_replaced() {
        let out = render("{{A}}-{{A}}", &vars(&[("A", "x")]));
        assert_eq!(out, "x-x");
    }

    #[test]
    fn default_template_carries_the_brief_slot() {
        assert!(mentions(DEFAULT_TEMPLATE, EDITOR_BRIEF));
        assert!(!mentions("no slots here", EDITOR_BRIEF));
    }
}
