use std::fmt;
use std::path::PathBuf;

use crate::model::EntityKind;

/// Machine-readable error codes for scripts wrapping the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    VaultMissing,
    DocumentFormat,
    ItemNotFound,
    MalformedId,
    TaskIndexOutOfRange,
    InvalidShorthand,
    MultilineText,
    DocumentEncodeFailed,
    FileIo,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::VaultMissing => "E1001",
            Self::DocumentFormat => "E2001",
            Self::ItemNotFound => "E3001",
            Self::MalformedId => "E3002",
            Self::TaskIndexOutOfRange => "E3003",
            Self::InvalidShorthand => "E3004",
            Self::MultilineText => "E3005",
            Self::DocumentEncodeFailed => "E5001",
            Self::FileIo => "E5002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::VaultMissing => "Vault not initialized",
            Self::DocumentFormat => "Malformed vault document",
            Self::ItemNotFound => "Item not found",
            Self::MalformedId => "Malformed item ID",
            Self::TaskIndexOutOfRange => "Task index out of range",
            Self::InvalidShorthand => "Invalid project shorthand",
            Self::MultilineText => "Text spans multiple lines",
            Self::DocumentEncodeFailed => "Document encode failed",
            Self::FileIo => "File read/write failed",
        }
    }

    /// Optional remediation hint that can be surfaced to the user.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::VaultMissing => Some("Run `ted init` to create the vault directories."),
            Self::DocumentFormat => {
                Some("Check that the file starts with a `---` metadata block and `# ` sections.")
            }
            Self::ItemNotFound => Some("Run `ted ls` to see the available IDs."),
            Self::MalformedId => Some("IDs carry a numeric part, e.g. T00012 or ENG003."),
            Self::TaskIndexOutOfRange => Some("Run `ted show <id> --verbose` to list task numbers."),
            Self::InvalidShorthand => Some("Use 3-8 uppercase letters, e.g. ENG."),
            Self::MultilineText => Some("Pass one line per task or info entry."),
            Self::DocumentEncodeFailed => None,
            Self::FileIo => Some("Check that the vault path exists and is writable."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Why a single document could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("missing `---` metadata block")]
    MissingMetadata,

    #[error("metadata block is not a valid mapping: {0}")]
    InvalidMetadata(String),

    #[error("metadata is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("document has no `{0}` section")]
    MissingSection(&'static str),

    #[error("unrecognized reference encoding: '{0}'")]
    UnknownReference(String),
}

/// Errors surfaced by vault operations.
#[derive(Debug, thiserror::Error)]
pub enum TedError {
    #[error("vault directory {} does not exist", .0.display())]
    VaultMissing(PathBuf),

    #[error("{}: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("malformed id '{0}': no numeric part")]
    MalformedId(String),

    #[error("task index {index} out of range (todo has {len} tasks)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid shorthand '{0}': expected 3-8 uppercase letters")]
    InvalidShorthand(String),

    #[error("{0} must be a single line")]
    MultilineText(&'static str),

    #[error("failed to encode document: {0}")]
    Encode(#[from] serde_yaml::Error),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TedError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::VaultMissing(_) => ErrorCode::VaultMissing,
            Self::Format { .. } => ErrorCode::DocumentFormat,
            Self::NotFound { .. } => ErrorCode::ItemNotFound,
            Self::MalformedId(_) => ErrorCode::MalformedId,
            Self::IndexOutOfRange { .. } => ErrorCode::TaskIndexOutOfRange,
            Self::InvalidShorthand(_) => ErrorCode::InvalidShorthand,
            Self::MultilineText(_) => ErrorCode::MultilineText,
            Self::Encode(_) => ErrorCode::DocumentEncodeFailed,
            Self::Io { .. } => ErrorCode::FileIo,
        }
    }

    /// Remediation text for the CLI error renderer.
    #[must_use]
    pub fn suggestion(&self) -> String {
        let code = self.error_code();
        code.hint().unwrap_or_else(|| code.message()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, FormatError, TedError};
    use crate::model::EntityKind;
    use std::collections::HashSet;
    use std::path::PathBuf;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::VaultMissing,
            ErrorCode::DocumentFormat,
            ErrorCode::ItemNotFound,
            ErrorCode::MalformedId,
            ErrorCode::TaskIndexOutOfRange,
            ErrorCode::InvalidShorthand,
            ErrorCode::MultilineText,
            ErrorCode::DocumentEncodeFailed,
            ErrorCode::FileIo,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::TaskIndexOutOfRange.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn not_found_message_names_kind_and_id() {
        let err = TedError::NotFound {
            kind: EntityKind::Todo,
            id: "T00042".into(),
        };
        assert_eq!(err.to_string(), "todo 'T00042' not found");
        assert_eq!(err.error_code(), ErrorCode::ItemNotFound);
    }

    #[test]
    fn format_error_carries_path() {
        let err = TedError::Format {
            path: PathBuf::from("todos/T00001_x.md"),
            source: FormatError::MissingMetadata,
        };
        assert!(err.to_string().starts_with("todos/T00001_x.md:"));
        assert!(err.to_string().contains("metadata block"));
    }

    #[test]
    fn suggestion_falls_back_to_message() {
        let err = TedError::Encode(
            serde_yaml::from_str::<serde_yaml::Value>("[unclosed").unwrap_err(),
        );
        assert_eq!(err.suggestion(), "Document encode failed");
    }
}
