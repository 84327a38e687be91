//! Rewrites imperative style rules into editor-style guidance.

use std::sync::LazyLock;

use regex::Regex;

/// Marker that identifies the guidance preface.
pub const PREFACE_MARK: &str = "[Writing guidance]";

const PREFACE: &str = "[Writing guidance] The rules below keep the voice consistent and the story on \
track. They are editorial suggestions, not hard KPIs. If one conflicts with where the plot or a \
character naturally is, follow the story.\n\n";

/// Chinese directive words, longest first so compounds win over their parts.
const CN_REPLACEMENTS: [(&str, &str); 11] = [
    ("必须要", "尽量"),
    ("一定要", "尽量"),
    ("务必", "尽量"),
    ("必须", "尽量"),
    ("不得", "尽量避免"),
    ("严禁", "尽量避免"),
    ("禁止", "尽量避免"),
    ("不可", "尽量避免"),
    ("需要", "建议"),
    ("应当", "建议"),
    ("应该", "建议"),
];

/// English directive words; case-sensitive.
const EN_REPLACEMENTS: [(&str, &str); 5] = [
    ("Hard Constraints", "Guidelines"),
    ("HARD STYLE CONSTRAINTS", "STYLE GUIDELINES"),
    ("STRICT", "Required"),
    ("Do NOT", "Avoid"),
    ("MUST", "should"),
];

static EARLY_BEAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Within the first\s*~?\s*\d+\s*words\s*:").expect("valid early-beat regex")
});

static MIDDLE_BEAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*-?[ \t]*Middle[ \t]*:[ \t]*").expect("valid middle-beat regex")
});

static LATE_BEAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*-?[ \t]*Late[ \t]*:[ \t]*").expect("valid late-beat regex")
});

/// Soften `text`.
///
/// Strips a leading BOM, normalises CRLF line endings, replaces directive
/// words, rewrites exam-style beat markers, and optionally prefixes the
/// guidance preface once. Blank input is returned unchanged.
#[must_use]
pub fn soften_style_rules(text: &str, add_preface: bool) -> String {
    if text.trim().is_empty() {
        return text.to_string();
    }

    let mut softened = text.trim_start_matches('\u{feff}').replace("\r\n", "\n");

    for (from, to) in CN_REPLACEMENTS.iter().chain(EN_REPLACEMENTS.iter()) {
        if softened.contains(from) {
            softened = softened.replace(from, to);
        }
    }

    softened = EARLY_BEAT
        .replace_all(&softened, "Early in the chapter:")
        .into_owned();
    softened = MIDDLE_BEAT
        .replace_all(&softened, "- As the chapter develops: ")
        .into_owned();
    softened = LATE_BEAT
        .replace_all(&softened, "- Toward the end: ")
        .into_owned();

    if add_preface && !softened.contains(PREFACE_MARK) {
        softened.insert_str(0, PREFACE);
    }

    softened
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_english_directive_words() {
        let out = soften_style_rules("HARD STYLE CONSTRAINTS\n- You MUST vary rhythm.\n- Do NOT moralize.", false);
        assert_eq!(out, "STYLE GUIDELINES\n- You should vary rhythm.\n- Avoid moralize.");
        assert!(!out.contains("MUST"));
    }

    #[test]
    fn replacements_are_case_sensitive() {
        assert_eq!(soften_style_rules("must Must", false), "must Must");
    }

    #[test]
    fn softens_chinese_directives() {
        let out = soften_style_rules("必须要克制；严禁说教；应该留白", false);
        assert_eq!(out, "尽量克制；尽量避免说教；建议留白");
    }

    #[test]
    fn rewrites_beat_markers() {
        let raw = "Within the first ~300 words: hook\n- Middle: twist\nLate:   payoff";
        assert_eq!(
            soften_style_rules(raw, false),
            "Early in the chapter: hook\n- As the chapter develops: twist\n- Toward the end: payoff"
        );
    }

    #[test]
    fn strips_bom_and_crlf() {
        assert_eq!(soften_style_rules("\u{feff}a\r\nb", false), "a\nb");
    }

    #[test]
    fn preface_is_added_once() {
        let once = soften_style_rules("Keep it plain.", true);
        assert!(once.starts_with(PREFACE_MARK));
        let twice = soften_style_rules(&once, true);
        assert_eq!(once, twice);
    }

    #[test]
    fn blank_input_is_untouched() {
        assert_eq!(soften_style_rules("  \n", true), "  \n");
    }
}
