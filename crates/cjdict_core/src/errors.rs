use std::fmt;
use thiserror::Error;

/// Which slot table a code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CodeTable {
    Primary,
    Secondary,
}

impl fmt::Display for CodeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeTable::Primary => f.write_str("primary"),
            CodeTable::Secondary => f.write_str("secondary"),
        }
    }
}

/// Header offset fields checked against the one legal layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetField {
    Codepoints,
    Primary,
    Secondary,
    Frequency,
}

impl fmt::Display for OffsetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OffsetField::Codepoints => f.write_str("codepoints"),
            OffsetField::Primary => f.write_str("primary"),
            OffsetField::Secondary => f.write_str("secondary"),
            OffsetField::Frequency => f.write_str("frequency"),
        }
    }
}

/// Coarse classification used by callers to pick a fallback policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Build-time validation; no artifact is emitted.
    Build,
    /// Structurally invalid artifact.
    Format,
    /// Checksum or digest mismatch.
    Integrity,
    /// Caller passed a malformed lookup query.
    LookupInput,
    Io,
}

#[derive(Debug, Error)]
pub enum DictError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Persist: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Cannot encode empty dictionary")]
    EmptyDictionary,

    #[error("{table} code at index {index} must be A-Z and length 1..5")]
    InvalidCode { table: CodeTable, index: usize },

    #[error("Entry {index} has codepoint {codepoint:#x}, not a Unicode scalar value")]
    InvalidCodepoint { index: usize, codepoint: u32 },

    #[error("Dictionary layout does not fit 32-bit offsets ({entries} entries)")]
    TooLarge { entries: usize },

    #[error("Binary dictionary too small: {len} bytes")]
    TruncatedHeader { len: usize },

    #[error("Invalid binary dictionary magic: {found:?}")]
    InvalidMagic { found: [u8; 8] },

    #[error("Unsupported binary dictionary version: {major}.{minor}")]
    UnsupportedVersion { major: u16, minor: u16 },

    #[error("Invalid header size: {0}")]
    InvalidHeaderSize(u32),

    #[error("Binary dictionary payload size mismatch: header declares {declared} bytes, buffer has {actual}")]
    PayloadSizeMismatch { declared: u64, actual: usize },

    #[error("Binary dictionary CRC mismatch: expected {expected:#010x}, got {actual:#010x}")]
    Integrity { expected: u32, actual: u32 },

    #[error("Binary dictionary payload layout mismatch: tables need {expected} bytes, header declares {declared}")]
    LayoutMismatch { expected: u64, declared: u32 },

    #[error("Invalid {field} offset: expected {expected}, found {found}")]
    InvalidOffset { field: OffsetField, expected: u32, found: u32 },

    #[error("Codepoints table must be strictly increasing (index {index})")]
    UnsortedTable { index: usize },

    #[error("Stored codepoint {codepoint:#x} at index {index} is not a Unicode scalar value")]
    CorruptCodepoint { index: usize, codepoint: u32 },

    #[error("Lookup input must be exactly one Unicode character")]
    InvalidLookupInput,

    #[error("Corrupt {table} slot at index {index}: {reason}")]
    CorruptSlot { table: CodeTable, index: usize, reason: String },

    #[error("{0} input is empty")]
    EmptyInput(&'static str),

    #[error("No valid entries after validation")]
    NoValidEntries,

    #[error("Artifact digest mismatch: sidecar records {expected}, artifact hashes to {actual}")]
    DigestMismatch { expected: String, actual: String },
}

impl DictError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DictError::Io(_) | DictError::Persist(_) => ErrorCategory::Io,
            DictError::Json(_)
            | DictError::EmptyDictionary
            | DictError::InvalidCode { .. }
            | DictError::InvalidCodepoint { .. }
            | DictError::TooLarge { .. }
            | DictError::EmptyInput(_)
            | DictError::NoValidEntries => ErrorCategory::Build,
            DictError::TruncatedHeader { .. }
            | DictError::InvalidMagic { .. }
            | DictError::UnsupportedVersion { .. }
            | DictError::InvalidHeaderSize(_)
            | DictError::PayloadSizeMismatch { .. }
            | DictError::LayoutMismatch { .. }
            | DictError::InvalidOffset { .. }
            | DictError::UnsortedTable { .. }
            | DictError::CorruptCodepoint { .. }
            | DictError::CorruptSlot { .. } => ErrorCategory::Format,
            DictError::Integrity { .. } | DictError::DigestMismatch { .. } => ErrorCategory::Integrity,
            DictError::InvalidLookupInput => ErrorCategory::LookupInput,
        }
    }

    /// True when the artifact itself is unusable and the caller should switch
    /// to another source instead of retrying.
    pub fn is_fallback_worthy(&self) -> bool {
        matches!(self.category(), ErrorCategory::Format | ErrorCategory::Integrity)
    }
}

pub type Result<T> = std::result::Result<T, DictError>;
