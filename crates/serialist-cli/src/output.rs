//! How `srl` prints results and failures.
//!
//! Handlers build a serializable result and pass it to [`render`] or
//! [`render_mode`] together with the [`OutputMode`] chosen for this run.
//! JSON goes to stdout as one pretty-printed document; failures go to stderr,
//! as `{"error": {...}}` in JSON mode and as `error[E####]: ...` otherwise.
//!
//! The mode comes from, in order: `--json`, the `FORMAT` variable, `output`
//! in the user config, then pretty on a terminal and text when piped.

use serde::Serialize;
use serialist_core::config;
use serialist_core::error::classify;
use std::io::{self, Write};

/// Column width of the rule under pretty headings.
pub const RULE_WIDTH: usize = 60;

/// Heading line plus a rule of the same fixed width.
pub fn heading(w: &mut dyn Write, title: &str) -> io::Result<()> {
    writeln!(w, "{title}")?;
    rule(w)
}

pub fn rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{}", "-".repeat(RULE_WIDTH))
}

/// `label:` padded to a fixed column, then the value.
pub fn field(w: &mut dyn Write, label: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<16} {}", format!("{label}:"), value.as_ref())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Sections and aligned fields for a person at a terminal.
    Pretty,
    /// `key=value` lines for shell scripts.
    Text,
    Json,
}

impl OutputMode {
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    fn from_name(name: &str) -> Self {
        match name {
            "json" => Self::Json,
            "text" => Self::Text,
            _ => Self::Pretty,
        }
    }
}

/// Pick the output mode for this invocation.
pub fn resolve_output_mode(json_flag: bool) -> OutputMode {
    let user = config::load_user_config().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "ignoring unreadable user config");
        config::UserConfig::default()
    });
    let format_var = std::env::var("FORMAT").ok();
    let name = config::resolve_output(json_flag, user.output.as_deref(), format_var.as_deref());
    OutputMode::from_name(&name)
}

/// A failure as shown to the operator.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    /// Remediation hint for classified failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Stable `E####` code for classified failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl From<&anyhow::Error> for CliError {
    fn from(err: &anyhow::Error) -> Self {
        let code = classify(err);
        Self {
            message: format!("{err:#}"),
            suggestion: code.and_then(|c| c.hint()).map(str::to_string),
            error_code: code.map(|c| c.code().to_string()),
        }
    }
}

fn write_json<T: Serialize>(w: &mut dyn Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *w, value)?;
    writeln!(w)?;
    Ok(())
}

/// Print `value` with separate text and pretty renderers.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    match mode {
        OutputMode::Json => write_json(&mut out, value)?,
        OutputMode::Text => text(value, &mut out)?,
        OutputMode::Pretty => pretty(value, &mut out)?,
    }
    Ok(())
}

/// Print `value`; text and pretty share one renderer.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    if mode.is_json() {
        write_json(&mut out, value)
    } else {
        human(value, &mut out)?;
        Ok(())
    }
}

fn write_error(w: &mut dyn Write, mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    if mode.is_json() {
        return write_json(w, &serde_json::json!({ "error": error }));
    }
    match error.error_code.as_deref() {
        Some(code) => writeln!(w, "error[{code}]: {}", error.message)?,
        None => writeln!(w, "error: {}", error.message)?,
    }
    if let Some(hint) = error.suggestion.as_deref() {
        writeln!(w, "  suggestion: {hint}")?;
    }
    Ok(())
}

/// Print `error` to stderr.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    write_error(&mut io::stderr().lock(), mode, error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialist_core::pack::{ChapterOutput, PackError, parse_pack_str};

    fn detailed() -> CliError {
        CliError {
            message: "bad input".into(),
            suggestion: Some("try again".into()),
            error_code: Some("E2003".into()),
        }
    }

    fn written(mode: OutputMode, error: &CliError) -> String {
        let mut buf = Vec::new();
        write_error(&mut buf, mode, error).expect("write");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn only_json_mode_is_json() {
        assert!(OutputMode::Json.is_json());
        assert!(!OutputMode::Pretty.is_json());
        assert!(!OutputMode::Text.is_json());
    }

    #[test]
    fn json_flag_resolves_json() {
        assert_eq!(resolve_output_mode(true), OutputMode::Json);
    }

    #[test]
    fn names_map_to_modes() {
        assert_eq!(OutputMode::from_name("json"), OutputMode::Json);
        assert_eq!(OutputMode::from_name("text"), OutputMode::Text);
        assert_eq!(OutputMode::from_name("pretty"), OutputMode::Pretty);
    }

    #[test]
    fn classified_error_carries_code_and_hint() {
        let err = anyhow::Error::from(
            ChapterOutput::split("no markers here").expect_err("markers missing"),
        );
        let cli = CliError::from(&err);
        assert_eq!(cli.error_code.as_deref(), Some("E2003"));
        assert!(cli.suggestion.is_some());
    }

    #[test]
    fn context_is_kept_in_the_message() {
        let err = anyhow::Error::from(parse_pack_str("{nope").expect_err("bad json"))
            .context("validating chapter 3");
        let cli = CliError::from(&err);
        assert!(cli.message.starts_with("validating chapter 3: "));
        assert_eq!(cli.error_code.as_deref(), Some("E2001"));
        assert!(err.chain().any(|c| c.downcast_ref::<PackError>().is_some()));
    }

    #[test]
    fn unclassified_error_has_no_code() {
        let cli = CliError::from(&anyhow::anyhow!("plain failure"));
        assert_eq!(cli.message, "plain failure");
        assert!(cli.error_code.is_none());
        assert!(cli.suggestion.is_none());
    }

    #[test]
    fn human_error_shows_code_and_suggestion() {
        let text = written(OutputMode::Pretty, &detailed());
        assert_eq!(text, "error[E2003]: bad input\n  suggestion: try again\n");
    }

    #[test]
    fn uncoded_error_has_plain_prefix() {
        let err = CliError {
            message: "disk full".into(),
            suggestion: None,
            error_code: None,
        };
        assert_eq!(written(OutputMode::Text, &err), "error: disk full\n");
    }

    #[test]
    fn json_error_is_wrapped() {
        let value: serde_json::Value =
            serde_json::from_str(&written(OutputMode::Json, &detailed())).expect("json");
        assert_eq!(value["error"]["error_code"], "E2003");
        assert_eq!(value["error"]["message"], "bad input");
        assert_eq!(value["error"]["suggestion"], "try again");
    }

    #[test]
    fn field_pads_labels() {
        let mut buf = Vec::new();
        field(&mut buf, "Phase", "P1_opening").expect("write");
        assert_eq!(
            String::from_utf8(buf).expect("utf8"),
            format!("{:<16} P1_opening\n", "Phase:")
        );
    }
}
