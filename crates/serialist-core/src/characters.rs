//! Character cards.
//!
//! Cards live under `characters/S/` (principal, hand-maintained) and
//! `characters/A/` (supporting, grown from chapter packs). Pack updates only
//! ever touch A-tier cards; a name that has an S-tier card is skipped.

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use serde::Serialize;

use crate::model::CharacterUpdate;

pub const PRINCIPAL_TIER: &str = "S";
pub const SUPPORTING_TIER: &str = "A";

/// What happened to one card during [`apply_updates`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardAction {
    Created,
    Updated,
    Unchanged,
    /// The character has a principal card.
    Protected,
    /// The name cannot be used as a file name.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardOutcome {
    pub name: String,
    pub action: CardAction,
}

/// Fold `updates` into A-tier cards under `characters_dir`.
///
/// Updates without a name are ignored.
///
/// # Errors
///
/// Returns an error if a card cannot be read or written.
pub fn apply_updates(characters_dir: &Path, updates: &[CharacterUpdate]) -> Result<Vec<CardOutcome>> {
    let supporting = characters_dir.join(SUPPORTING_TIER);
    let principal = characters_dir.join(PRINCIPAL_TIER);
    let mut outcomes = Vec::new();

    for update in updates {
        let name = update.name.trim();
        if name.is_empty() {
            continue;
        }
        let outcome = |action| CardOutcome {
            name: name.to_string(),
            action,
        };

        if !is_safe_card_name(name) {
            tracing::warn!(name, "skipping character update with unusable name");
            outcomes.push(outcome(CardAction::Rejected));
            continue;
        }

        let file_name = format!("{name}.md");
        if principal.join(&file_name).exists() {
            tracing::debug!(name, "principal card exists; update skipped");
            outcomes.push(outcome(CardAction::Protected));
            continue;
        }

        let card_path = supporting.join(&file_name);
        let exists = card_path.exists();
        let mut content = if exists {
            fs::read_to_string(&card_path)
                .with_context(|| format!("failed to read {}", card_path.display()))?
        } else {
            format!("# {name}\n")
        };

        let delta = update.delta_lines();
        if exists && delta.is_empty() {
            outcomes.push(outcome(CardAction::Unchanged));
            continue;
        }
        if !delta.is_empty() {
            if !content.ends_with('\n') {
                content.push('\n');
            }
            content.push_str(&delta.join("\n"));
            content.push('\n');
        }

        fs::create_dir_all(&supporting)
            .with_context(|| format!("failed to create {}", supporting.display()))?;
        fs::write(&card_path, content)
            .with_context(|| format!("failed to write {}", card_path.display()))?;
        tracing::info!(name, created = !exists, "character card written");
        outcomes.push(outcome(if exists {
            CardAction::Updated
        } else {
            CardAction::Created
        }));
    }

    Ok(outcomes)
}

/// Concatenate every `*.md` card in `tier_dir`, sorted by file name.
///
/// Each card renders as `## <stem>` followed by its trimmed body; cards are
/// separated by a blank line. A missing directory yields an empty string.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be listed, or a card
/// cannot be read.
pub fn gather(tier_dir: &Path) -> Result<String> {
    if !tier_dir.is_dir() {
        return Ok(String::new());
    }

    let mut cards: Vec<_> = fs::read_dir(tier_dir)
        .with_context(|| format!("failed to list {}", tier_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    cards.sort();

    let mut docs = Vec::with_capacity(cards.len());
    for path in cards {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let body = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        docs.push(format!("## {stem}\n{}", body.trim()));
    }
    Ok(docs.join("\n\n"))
}

fn is_safe_card_name(name: &str) -> bool {
    name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
