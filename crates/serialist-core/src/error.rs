use std::fmt;

/// Machine-readable error codes for scripts and agents driving `srl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    PackParseError,
    PackSchemaError,
    MalformedInput,
    CorruptState,
    StateWriteFailed,
    ChapterFileWriteFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::PackParseError => "E2001",
            Self::PackSchemaError => "E2002",
            Self::MalformedInput => "E2003",
            Self::CorruptState => "E3001",
            Self::StateWriteFailed => "E5001",
            Self::ChapterFileWriteFailed => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Project not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::PackParseError => "Chapter pack is not valid JSON",
            Self::PackSchemaError => "Chapter pack failed schema validation",
            Self::MalformedInput => "Input is missing a section marker",
            Self::CorruptState => "Continuity state file is corrupt",
            Self::StateWriteFailed => "Continuity state write failed",
            Self::ChapterFileWriteFailed => "Chapter file write failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to the operator.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `srl init --project <slug> --topic <topic>` first."),
            Self::ConfigParseError => Some("Fix syntax in .serialist/config.toml and retry."),
            Self::PackParseError => {
                Some("Check the text after ===NEXT_CHAPTER_PACK=== is a single JSON object.")
            }
            Self::PackSchemaError => {
                Some("Correct the listed fields and re-ingest the same chapter number.")
            }
            Self::MalformedInput => Some(
                "The input needs both ===CHAPTER_TEXT=== and ===NEXT_CHAPTER_PACK=== markers.",
            ),
            Self::CorruptState => Some(
                "Restore timeline/continuity.json from version control or move it aside to start fresh.",
            ),
            Self::StateWriteFailed | Self::ChapterFileWriteFailed => {
                Some("Check disk space and write permissions.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Find the most specific code for an error anywhere in `err`'s chain.
#[must_use]
pub fn classify(err: &anyhow::Error) -> Option<ErrorCode> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<crate::pack::MalformedInputError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<crate::pack::PackError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<crate::continuity::StoreError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<crate::lifecycle::ChapterWriteError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<crate::config::NotInitializedError>() {
            Some(e.code())
        } else if cause.downcast_ref::<toml::de::Error>().is_some() {
            Some(ErrorCode::ConfigParseError)
        } else {
            None
        }
    })
}
