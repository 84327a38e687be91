//! Archival copies of every generated request under `outputs/prompts/`.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Set to `0` to turn snapshots off.
pub const SNAPSHOT_ENV: &str = "SERIALIST_SNAPSHOT_PROMPT";

/// Overrides the snapshot directory.
pub const SNAPSHOT_DIR_ENV: &str = "SERIALIST_PROMPT_DIR";

const MAX_VERSION: u32 = 999;

/// Abstraction over environment access, for testability.
pub trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvReader for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Effective snapshot behaviour after config and environment are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSettings {
    pub enabled: bool,
    pub dir: PathBuf,
}

impl SnapshotSettings {
    /// Resolve settings. The environment wins over configuration.
    #[must_use]
    pub fn resolve(configured_enabled: bool, configured_dir: PathBuf, env: &dyn EnvReader) -> Self {
        let enabled = env
            .get(SNAPSHOT_ENV)
            .map_or(configured_enabled, |value| value != "0");
        let dir = env
            .get(SNAPSHOT_DIR_ENV)
            .map_or(configured_dir, PathBuf::from);
        Self { enabled, dir }
    }
}

/// File name for a chapter/seed pair, before versioning.
#[must_use]
pub fn snapshot_name(chapter_no: u32, seed: u64) -> String {
    format!("ch{chapter_no:04}_seed{seed:06}.prompt.md")
}

/// Write `prompt` into `dir`, never overwriting an earlier snapshot.
///
/// A taken name gets `_v2`, `_v3`, … inserted before `.prompt.md`.
///
/// # Errors
///
/// Returns the I/O error if the directory or file cannot be written.
pub fn save_prompt_snapshot(prompt: &str, chapter_no: u32, seed: u64, dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = next_available_path(dir, chapter_no, seed);
    fs::write(&path, prompt)?;
    tracing::debug!(path = %path.display(), "prompt snapshot written");
    Ok(path)
}

fn next_available_path(dir: &Path, chapter_no: u32, seed: u64) -> PathBuf {
    let base = dir.join(snapshot_name(chapter_no, seed));
    if !base.exists() {
        return base;
    }
    let stem = format!("ch{chapter_no:04}_seed{seed:06}");
    (2..=MAX_VERSION)
        .map(|v| dir.join(format!("{stem}_v{v}.prompt.md")))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| dir.join(format!("{stem}_v{}.prompt.md", std::process::id())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct MockEnv {
        vars: HashMap<String, String>,
    }

    impl MockEnv {
        fn new() -> Self {
            Self {
                vars: HashMap::new(),
            }
        }

        fn with(mut self, key: &str, val: &str) -> Self {
            self.vars.insert(key.to_string(), val.to_string());
            self
        }
    }

    impl EnvReader for MockEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.vars.get(key).filter(|v| !v.is_empty()).cloned()
        }
    }

    #[test]
    fn name_is_zero_padded() {
        assert_eq!(snapshot_name(3, 42), "ch0003_seed000042.prompt.md");
    }

    #[test]
    fn repeated_saves_get_version_suffixes() {
        let dir = TempDir::new().expect("tempdir");
        let first = save_prompt_snapshot("a", 1, 1, dir.path()).expect("first");
        let second = save_prompt_snapshot("b", 1, 1, dir.path()).expect("second");
        let third = save_prompt_snapshot("c", 1, 1, dir.path()).expect("third");
        assert_eq!(first.file_name().and_then(|n| n.to_str()), Some("ch0001_seed000001.prompt.md"));
        assert_eq!(second.file_name().and_then(|n| n.to_str()), Some("ch0001_seed000001_v2.prompt.md"));
        assert_eq!(third.file_name().and_then(|n| n.to_str()), Some("ch0001_seed000001_v3.prompt.md"));
        assert_eq!(fs::read_to_string(first).expect("read"), "a");
    }

    #[test]
    fn creates_missing_directory() {
        let dir = TempDir::new().expect("tempdir");
        let nested = dir.path().join("outputs/prompts");
        let path = save_prompt_snapshot("x", 2, 2, &nested).expect("save");
        assert!(path.starts_with(&nested));
    }

    #[test]
    fn env_overrides_config() {
        let env = MockEnv::new()
            .with(SNAPSHOT_ENV, "0")
            .with(SNAPSHOT_DIR_ENV, "/tmp/elsewhere");
        let settings = SnapshotSettings::resolve(true, PathBuf::from("outputs/prompts"), &env);
        assert!(!settings.enabled);
        assert_eq!(settings.dir, PathBuf::from("/tmp/elsewhere"));
    }

    #[test]
    fn config_applies_without_env() {
        let settings = SnapshotSettings::resolve(false, PathBuf::from("p"), &MockEnv::new());
        assert!(!settings.enabled);
        assert_eq!(settings.dir, PathBuf::from("p"));

        let on = SnapshotSettings::resolve(false, PathBuf::from("p"), &MockEnv::new().with(SNAPSHOT_ENV, "1"));
        assert!(on.enabled);
    }
}
