//! File-backed continuity store.
//!
//! The store owns one [`ContinuityState`] and its backing path. Every mutating
//! call works on a copy of the state, persists the whole document, and only
//! then replaces the in-memory value, so a failed write never leaves a
//! half-applied merge behind.
//!
//! A backing file that exists but does not parse is reported as
//! [`StoreError::Corrupt`]. It is never replaced by a fresh default.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ErrorCode;
use crate::minify;
use crate::model::{ChapterPack, ContinuityState, ProjectMeta};

/// Errors raised by the continuity store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing file exists but is not a readable continuity document.
    #[error("continuity state at {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize continuity state: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl StoreError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Corrupt { .. } | Self::Read { .. } => ErrorCode::CorruptState,
            Self::Write { .. } | Self::Serialize(_) => ErrorCode::StateWriteFailed,
        }
    }
}

/// The single mutable narrative-state document of a project.
#[derive(Debug, Clone)]
pub struct ContinuityStore {
    path: PathBuf,
    state: ContinuityState,
}

impl ContinuityStore {
    /// Load the document at `path`, or start from defaults if it is absent.
    ///
    /// A leading UTF-8 byte-order mark is tolerated.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] if the file exists but does not parse,
    /// or [`StoreError::Read`] if it cannot be read.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no continuity file; starting from defaults");
            return Ok(Self {
                path,
                state: ContinuityState::default(),
            });
        }

        let bytes = fs::read(&path).map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;
        let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes);
        let state: ContinuityState = match serde_json::from_slice(body) {
            Ok(state) => state,
            Err(source) => {
                tracing::error!(path = %path.display(), error = %source, "continuity state is corrupt");
                return Err(StoreError::Corrupt { path, source });
            }
        };

        Ok(Self { path, state })
    }

    /// Wrap an existing state without touching the filesystem.
    #[must_use]
    pub const fn with_state(path: PathBuf, state: ContinuityState) -> Self {
        Self { path, state }
    }

    #[must_use]
    pub const fn state(&self) -> &ContinuityState {
        &self.state
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Merge a validated pack and persist.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the document cannot be written; the
    /// in-memory state is left unchanged in that case.
    pub fn merge_pack(&mut self, pack: &ChapterPack) -> Result<(), StoreError> {
        let mut next = self.state.clone();
        next.apply_pack(pack);
        tracing::info!(
            chapter = pack.chapter_no,
            open_loops = next.open_loops.len(),
            resolved = pack.resolved_loops.len(),
            timeline = next.timeline.len(),
            "merged chapter pack"
        );
        self.commit(next)
    }

    /// Record a completed chapter and persist.
    ///
    /// Calling this twice for the same chapter adds `word_count` twice.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the document cannot be written.
    pub fn register_completion(&mut self, chapter_no: u32, word_count: u64) -> Result<(), StoreError> {
        let mut next = self.state.clone();
        next.record_completion(chapter_no, word_count);
        tracing::info!(
            chapter = chapter_no,
            words = word_count,
            total = next.progress.estimated_total_words,
            "registered chapter completion"
        );
        self.commit(next)
    }

    /// Merge a validated pack and record the chapter as completed in one
    /// write.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the document cannot be written; neither
    /// change reaches disk or memory in that case.
    pub fn ingest(
        &mut self,
        pack: &ChapterPack,
        chapter_no: u32,
        word_count: u64,
    ) -> Result<(), StoreError> {
        let mut next = self.state.clone();
        next.apply_pack(pack);
        next.record_completion(chapter_no, word_count);
        tracing::info!(
            chapter = chapter_no,
            words = word_count,
            open_loops = next.open_loops.len(),
            resolved = pack.resolved_loops.len(),
            total = next.progress.estimated_total_words,
            "ingested chapter into continuity state"
        );
        self.commit(next)
    }

    /// Replace project metadata, restart progress at chapter 1, and persist.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the document cannot be written.
    pub fn update_project(&mut self, meta: ProjectMeta) -> Result<(), StoreError> {
        let mut next = self.state.clone();
        next.reset_project(meta);
        self.commit(next)
    }

    /// Write the full document, replacing any prior contents.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if serialization or the write fails.
    pub fn save(&self) -> Result<(), StoreError> {
        write_state(&self.path, &self.state)
    }

    /// Deterministic digest of the current state.
    #[must_use]
    pub fn minify(&self) -> String {
        minify::minify_continuity(&self.state)
    }

    fn commit(&mut self, next: ContinuityState) -> Result<(), StoreError> {
        write_state(&self.path, &next)?;
        self.state = next;
        Ok(())
    }
}

fn write_state(path: &Path, state: &ContinuityState) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StoreError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut body = serde_json::to_vec_pretty(state).map_err(StoreError::Serialize)?;
    body.push(b'\n');

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, &body).map_err(|source| StoreError::Write {
        path: tmp_path.clone(),
        source,
    })?;
    fs::rename(&tmp_path, path).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), bytes = body.len(), "continuity state saved");
    Ok(())
}
