use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::error::ErrorCode;
use crate::export::ExportFormat;

/// Marker directory that identifies a project root.
pub const PROJECT_DIR: &str = ".serialist";

/// Written by `srl init`.
pub const DEFAULT_CONFIG_TOML: &str = "[prompt]\n\
    snapshot = true\n\
    brief_seed_offset = 0\n\
    \n\
    [export]\n\
    default_format = \"txt\"\n";

/// No project marker between the start directory and the filesystem root.
#[derive(Debug, thiserror::Error)]
#[error("no .serialist/ directory found in {} or any parent", start.display())]
pub struct NotInitializedError {
    pub start: PathBuf,
}

impl NotInitializedError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::NotInitialized
    }
}

/// Fixed on-disk layout of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Walk up from `start` to the first directory holding [`PROJECT_DIR`].
    #[must_use]
    pub fn discover(start: &Path) -> Option<Self> {
        let mut current = start.to_path_buf();
        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Some(Self::new(current));
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Like [`Self::discover`], but a missing project is an error.
    ///
    /// # Errors
    ///
    /// Returns [`NotInitializedError`] when no ancestor holds [`PROJECT_DIR`].
    pub fn locate(start: &Path) -> std::result::Result<Self, NotInitializedError> {
        Self::discover(start).ok_or_else(|| NotInitializedError {
            start: start.to_path_buf(),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn project_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.project_dir().join("config.toml")
    }

    #[must_use]
    pub fn template_path(&self) -> PathBuf {
        self.root.join("prompts/chapter_prompt.md")
    }

    #[must_use]
    pub fn style_rules_path(&self) -> PathBuf {
        self.root.join("prompts/style_rules.md")
    }

    #[must_use]
    pub fn bible_path(&self) -> PathBuf {
        self.root.join("bible/bible.seed.json")
    }

    #[must_use]
    pub fn characters_dir(&self) -> PathBuf {
        self.root.join("characters")
    }

    #[must_use]
    pub fn notes_dir(&self) -> PathBuf {
        self.root.join("notes")
    }

    #[must_use]
    pub fn global_summary_path(&self) -> PathBuf {
        self.notes_dir().join("global_summary.md")
    }

    #[must_use]
    pub fn chapters_dir(&self) -> PathBuf {
        self.root.join("chapters")
    }

    /// `chapters/NNNN`, zero-padded to four digits.
    #[must_use]
    pub fn chapter_dir(&self, chapter_no: u32) -> PathBuf {
        self.chapters_dir().join(format!("{chapter_no:04}"))
    }

    #[must_use]
    pub fn exports_dir(&self) -> PathBuf {
        self.root.join("exports")
    }

    #[must_use]
    pub fn snapshots_dir(&self) -> PathBuf {
        self.root.join("outputs/prompts")
    }

    #[must_use]
    pub fn continuity_path(&self) -> PathBuf {
        self.root.join("timeline/continuity.json")
    }

    /// Create every directory the project writes into.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            self.project_dir(),
            self.root.join("prompts"),
            self.root.join("bible"),
            self.characters_dir().join(crate::characters::PRINCIPAL_TIER),
            self.characters_dir().join(crate::characters::SUPPORTING_TIER),
            self.notes_dir(),
            self.chapters_dir(),
            self.exports_dir(),
            self.root.join("timeline"),
        ] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default = "default_true")]
    pub snapshot: bool,
    /// Relative paths resolve against the project root.
    #[serde(default)]
    pub snapshot_dir: Option<PathBuf>,
    /// Added to the chapter number to form the brief seed.
    #[serde(default)]
    pub brief_seed_offset: u64,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            snapshot: default_true(),
            snapshot_dir: None,
            brief_seed_offset: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub default_format: ExportFormat,
    /// Heading for markdown exports; falls back to the project topic.
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

/// Load `.serialist/config.toml`, or defaults if absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(PROJECT_DIR).join("config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load `<config dir>/serialist/config.toml`, or defaults if absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("serialist/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Output mode precedence: `--json` flag, `FORMAT` env, user config, then
/// pretty on a terminal and text otherwise.
#[must_use]
pub fn resolve_output(cli_json: bool, user_output: Option<&str>, env_format: Option<&str>) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "plain" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

const fn default_true() -> bool {
    true
}
