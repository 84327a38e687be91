//! Chapter pack intake: section splitting and schema validation.

pub mod split;
pub mod validate;

pub use split::{CHAPTER_TEXT_MARK, ChapterOutput, MalformedInputError, PACK_MARK, word_count};
pub use validate::{
    PackError, REQUIRED_FIELDS, SchemaViolation, ValidatedPack, parse_pack_bytes, parse_pack_str,
    validate_document,
};
