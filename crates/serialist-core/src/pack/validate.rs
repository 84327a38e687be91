//! Chapter pack validation.
//!
//! Validation runs in three stages and stops at the first stage that fails:
//!
//! 1. **Parse**: raw text or bytes must decode as JSON ([`PackError::Parse`]).
//! 2. **Required fields**: the root must be an object carrying every field in
//!    [`REQUIRED_FIELDS`]. All missing fields are reported together, sorted
//!    ([`PackError::MissingFields`]).
//! 3. **Schema**: the document is checked against the embedded draft-7
//!    schema. Every violation is collected, sorted by location and reported as
//!    one aggregate error ([`PackError::Schema`]).
//!
//! The validated document is passed through unchanged alongside a typed view.

use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

use crate::error::ErrorCode;
use crate::model::ChapterPack;

/// Embedded pack schema.
pub const PACK_SCHEMA: &str = include_str!("pack.schema.json");

/// The governing required-field set, in declaration order.
pub const REQUIRED_FIELDS: [&str; 13] = [
    "chapter_no",
    "chapter_word_target",
    "chapter_summary",
    "timeline_updates",
    "character_updates",
    "org_updates",
    "new_facts",
    "open_loops",
    "resolved_loops",
    "next_chapter_plan",
    "foreshadowing_tasks",
    "risk_flags",
    "style_selfcheck",
];

static COMPILED: OnceLock<Result<JSONSchema, String>> = OnceLock::new();

/// One schema violation, rendered as `location: message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Path segments joined with `->`, or `root` for the document itself.
    pub location: String,
    pub message: String,
    segments: Vec<PathSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum PathSegment {
    Index(usize),
    Key(String),
}

impl SchemaViolation {
    fn new(pointer: &str, message: impl Into<String>) -> Self {
        let segments: Vec<PathSegment> = pointer
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                let unescaped = segment.replace("~1", "/").replace("~0", "~");
                unescaped
                    .parse::<usize>()
                    .map_or(PathSegment::Key(unescaped), PathSegment::Index)
            })
            .collect();

        let location = if segments.is_empty() {
            "root".to_string()
        } else {
            segments
                .iter()
                .map(|segment| match segment {
                    PathSegment::Index(idx) => idx.to_string(),
                    PathSegment::Key(key) => key.clone(),
                })
                .collect::<Vec<_>>()
                .join("->")
        };

        Self {
            location,
            message: message.into(),
            segments,
        }
    }

    fn sort_key_cmp(&self, other: &Self) -> Ordering {
        self.segments
            .cmp(&other.segments)
            .then_with(|| self.message.cmp(&other.message))
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Errors raised while turning raw input into a trusted pack.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    /// The raw document is not decodable JSON.
    #[error("pack is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The root is an object but lacks required fields (sorted).
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// Structural violations, sorted by location.
    #[error("{}", render_violations(.0))]
    Schema(Vec<SchemaViolation>),

    /// The embedded schema failed to compile.
    #[error("pack schema unavailable: {0}")]
    SchemaUnavailable(String),
}

impl PackError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Parse(_) => ErrorCode::PackParseError,
            Self::MissingFields(_) | Self::Schema(_) => ErrorCode::PackSchemaError,
            Self::SchemaUnavailable(_) => ErrorCode::InternalUnexpected,
        }
    }
}

fn render_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A pack that passed every validation stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPack {
    document: Value,
    pack: ChapterPack,
}

impl ValidatedPack {
    /// The document exactly as supplied.
    #[must_use]
    pub const fn document(&self) -> &Value {
        &self.document
    }

    #[must_use]
    pub const fn pack(&self) -> &ChapterPack {
        &self.pack
    }

    #[must_use]
    pub fn into_parts(self) -> (Value, ChapterPack) {
        (self.document, self.pack)
    }
}

/// Validate a pack supplied as text.
///
/// # Errors
///
/// Returns [`PackError`] for the first failing validation stage.
pub fn parse_pack_str(raw: &str) -> Result<ValidatedPack, PackError> {
    let document: Value = serde_json::from_str(raw.trim_start_matches('\u{feff}'))?;
    validate_document(document)
}

/// Validate a pack supplied as bytes. A leading UTF-8 BOM is ignored.
///
/// # Errors
///
/// Returns [`PackError`] for the first failing validation stage.
pub fn parse_pack_bytes(raw: &[u8]) -> Result<ValidatedPack, PackError> {
    let body = raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw);
    let document: Value = serde_json::from_slice(body)?;
    validate_document(document)
}

/// Validate an already-parsed pack document.
///
/// # Errors
///
/// Returns [`PackError::MissingFields`] or [`PackError::Schema`] when the
/// document does not satisfy the pack schema.
pub fn validate_document(document: Value) -> Result<ValidatedPack, PackError> {
    let Some(root) = document.as_object() else {
        return Err(PackError::Schema(vec![SchemaViolation::new(
            "",
            format!("expected a JSON object, found {}", json_type_name(&document)),
        )]));
    };

    let mut missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|field| !root.contains_key(**field))
        .map(|field| (*field).to_string())
        .collect();
    if !missing.is_empty() {
        missing.sort();
        tracing::debug!(missing = ?missing, "pack rejected: missing required fields");
        return Err(PackError::MissingFields(missing));
    }

    let schema = COMPILED
        .get_or_init(compile_schema)
        .as_ref()
        .map_err(|err| PackError::SchemaUnavailable(err.clone()))?;

    if let Err(errors) = schema.validate(&document) {
        let mut violations: Vec<SchemaViolation> = errors
            .map(|error| SchemaViolation::new(&error.instance_path.to_string(), error.to_string()))
            .collect();
        violations.sort_by(SchemaViolation::sort_key_cmp);
        violations.dedup();
        tracing::debug!(count = violations.len(), "pack rejected: schema violations");
        return Err(PackError::Schema(violations));
    }

    let pack: ChapterPack = serde_json::from_value(document.clone())
        .map_err(|err| PackError::Schema(vec![SchemaViolation::new("", err.to_string())]))?;

    Ok(ValidatedPack { document, pack })
}

fn compile_schema() -> Result<JSONSchema, String> {
    let schema: Value = serde_json::from_str(PACK_SCHEMA).map_err(|err| err.to_string())?;
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema)
        .map_err(|err| err.to_string())
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
