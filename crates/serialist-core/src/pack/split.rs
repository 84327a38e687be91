//! Splitting a generation response into its prose and pack sections.

use crate::error::ErrorCode;

/// Marker that opens the prose section.
pub const CHAPTER_TEXT_MARK: &str = "===CHAPTER_TEXT===";

/// Marker that opens the structured pack section.
pub const PACK_MARK: &str = "===NEXT_CHAPTER_PACK===";

/// The external input did not carry both section markers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed input: missing {} marker(s)", .missing.join(" and "))]
pub struct MalformedInputError {
    pub missing: Vec<&'static str>,
}

impl MalformedInputError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::MalformedInput
    }
}

/// A response split into its two sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterOutput {
    pub prose: String,
    pub pack_raw: String,
}

impl ChapterOutput {
    /// Split `text` at the markers.
    ///
    /// The prose is everything before the pack marker with the chapter-text
    /// marker removed; the pack is everything after the first pack marker.
    /// Both are trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedInputError`] naming every absent marker.
    pub fn split(text: &str) -> Result<Self, MalformedInputError> {
        let text = text.trim_start_matches('\u{feff}');
        let mut missing = Vec::new();
        if !text.contains(CHAPTER_TEXT_MARK) {
            missing.push(CHAPTER_TEXT_MARK);
        }
        let Some((before, after)) = text.split_once(PACK_MARK) else {
            missing.push(PACK_MARK);
            return Err(MalformedInputError { missing });
        };
        if !missing.is_empty() {
            return Err(MalformedInputError { missing });
        }

        Ok(Self {
            prose: before.replace(CHAPTER_TEXT_MARK, "").trim().to_string(),
            pack_raw: after.trim().to_string(),
        })
    }

    /// Canonical on-disk form written to a chapter's `output.md`.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "{CHAPTER_TEXT_MARK}\n{}\n\n{PACK_MARK}\n{}\n",
            self.prose, self.pack_raw
        )
    }

    /// Prose section of a stored `output.md`, markers stripped.
    #[must_use]
    pub fn prose_of(stored: &str) -> String {
        let before = stored.split(PACK_MARK).next().unwrap_or_default();
        before.replace(CHAPTER_TEXT_MARK, "").trim().to_string()
    }

    #[must_use]
    pub fn word_count(&self) -> u64 {
        word_count(&self.prose)
    }
}

/// Count words in mixed-script prose.
///
/// Each CJK ideograph counts as one word. Any other run of text between
/// whitespace counts as one word if it contains an alphanumeric character.
#[must_use]
pub fn word_count(text: &str) -> u64 {
    let mut count: u64 = 0;
    for token in text.split_whitespace() {
        let mut in_word = false;
        for ch in token.chars() {
            if is_cjk(ch) {
                count += 1;
                in_word = false;
            } else if ch.is_alphanumeric() && !in_word {
                count += 1;
                in_word = true;
            }
        }
    }
    count
}

const fn is_cjk(ch: char) -> bool {
    matches!(
        ch,
        '\u{3400}'..='\u{4DBF}'
            | '\u{4E00}'..='\u{9FFF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{3040}'..='\u{30FF}'
            | '\u{AC00}'..='\u{D7AF}'
            | '\u{20000}'..='\u{2A6DF}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_prose_and_pack() {
        let raw = format!("{CHAPTER_TEXT_MARK}\nThe tide came in.\n\n{PACK_MARK}\n{{\"a\": 1}}\n");
        let out = ChapterOutput::split(&raw).expect("split");
        assert_eq!(out.prose, "The tide came in.");
        assert_eq!(out.pack_raw, "{\"a\": 1}");
    }

    #[test]
    fn pack_keeps_later_marker_occurrences() {
        let raw = format!("{CHAPTER_TEXT_MARK} prose {PACK_MARK} one {PACK_MARK} two");
        let out = ChapterOutput::split(&raw).expect("split");
        assert_eq!(out.pack_raw, format!("one {PACK_MARK} two"));
    }

    #[test]
    fn missing_pack_marker_is_malformed() {
        let err = ChapterOutput::split(&format!("{CHAPTER_TEXT_MARK}\nonly prose")).expect_err("fail");
        assert_eq!(err.missing, vec![PACK_MARK]);
        assert_eq!(err.code(), ErrorCode::MalformedInput);
    }

    #[test]
    fn missing_both_markers_names_both() {
        let err = ChapterOutput::split("plain text").expect_err("fail");
        assert_eq!(err.missing, vec![CHAPTER_TEXT_MARK, PACK_MARK]);
        assert!(err.to_string().contains(" and "));
    }

    #[test]
    fn missing_text_marker_is_malformed() {
        let err = ChapterOutput::split(&format!("prose\n{PACK_MARK}\n{{}}")).expect_err("fail");
        assert_eq!(err.missing, vec![CHAPTER_TEXT_MARK]);
    }

    #[test]
    fn render_then_prose_of_recovers_prose() {
        let out = ChapterOutput {
            prose: "Line one.\n\nLine two.".into(),
            pack_raw: "{}".into(),
        };
        assert_eq!(ChapterOutput::prose_of(&out.render()), out.prose);
    }

    #[test]
    fn word_count_handles_latin_and_cjk() {
        assert_eq!(word_count("one two  three"), 3);
        assert_eq!(word_count("他走了。"), 3);
        assert_eq!(word_count("Mara说：hello — ok"), 4);
        assert_eq!(word_count(""), 0);
    }
}
