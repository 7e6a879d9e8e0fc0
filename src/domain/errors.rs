// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the configuration crate.
//!
//! Every [`ConfigError`] maps onto exactly one stable [`ErrorCode`]. Codes carry a
//! fixed human-readable message and belong to an [`ErrorCategory`], which is what
//! callers use to decide whether a failure is recoverable.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Stable numeric error codes.
///
/// The numeric values and messages never change between releases; bindings and
/// log scrapers may depend on them.
///
/// # Examples
///
/// ```
/// use tiercfg::domain::errors::{ErrorCategory, ErrorCode};
///
/// assert_eq!(ErrorCode::MissingBracket as u8, 9);
/// assert_eq!(ErrorCode::MissingBracket.message(), "Missing bracket");
/// assert_eq!(ErrorCode::NoKey.category(), ErrorCategory::LookupMiss);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    /// No error.
    Success = 0,
    /// Unknown or unclassified error (invalid arguments, I/O failures).
    Error = 1,
    /// Out of memory.
    NoMemory = 2,
    /// Configuration file not found.
    NoFile = 3,
    /// Group not found.
    NoGroup = 4,
    /// Key not found.
    NoKey = 5,
    /// Key name is empty.
    EmptyKey = 6,
    /// Error creating or writing to a file.
    WriteError = 7,
    /// Generic parse or conversion error.
    ParseError = 8,
    /// Group header without closing bracket.
    MissingBracket = 9,
    /// Key line without delimiter.
    MissingDelimiter = 10,
    /// Group header with empty name.
    EmptySectionName = 11,
    /// Text after a group header.
    TextAfterSection = 12,
    /// The list of configuration directories is empty.
    FileListIsNull = 13,
    /// Value is not a boolean literal.
    WrongBooleanValue = 14,
    /// Key has no value.
    KeyHasNullValue = 15,
    /// File has the wrong owner.
    WrongOwner = 16,
    /// File has the wrong group.
    WrongGroup = 17,
    /// File has the wrong permissions.
    WrongFilePermission = 18,
    /// Parent directory has the wrong permissions.
    WrongDirPermission = 19,
    /// File is a symbolic link which is not permitted.
    FileIsSymlink = 20,
    /// The user supplied validator rejected the file.
    ParsingCallbackFailed = 21,
}

impl ErrorCode {
    /// All codes in numeric order.
    pub const ALL: [ErrorCode; 22] = [
        ErrorCode::Success,
        ErrorCode::Error,
        ErrorCode::NoMemory,
        ErrorCode::NoFile,
        ErrorCode::NoGroup,
        ErrorCode::NoKey,
        ErrorCode::EmptyKey,
        ErrorCode::WriteError,
        ErrorCode::ParseError,
        ErrorCode::MissingBracket,
        ErrorCode::MissingDelimiter,
        ErrorCode::EmptySectionName,
        ErrorCode::TextAfterSection,
        ErrorCode::FileListIsNull,
        ErrorCode::WrongBooleanValue,
        ErrorCode::KeyHasNullValue,
        ErrorCode::WrongOwner,
        ErrorCode::WrongGroup,
        ErrorCode::WrongFilePermission,
        ErrorCode::WrongDirPermission,
        ErrorCode::FileIsSymlink,
        ErrorCode::ParsingCallbackFailed,
    ];

    /// Returns the stable message for this code.
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::Success => "Success",
            ErrorCode::Error => "Unknown error",
            ErrorCode::NoMemory => "Out of memory",
            ErrorCode::NoFile => "Configuration file not found",
            ErrorCode::NoGroup => "Group not found",
            ErrorCode::NoKey => "Key not found",
            ErrorCode::EmptyKey => "Key is NULL or has empty value",
            ErrorCode::WriteError => "Error creating or writing to a file",
            ErrorCode::ParseError => "Parse error",
            ErrorCode::MissingBracket => "Missing bracket",
            ErrorCode::MissingDelimiter => "Missing delimiter",
            ErrorCode::EmptySectionName => "Empty section name",
            ErrorCode::TextAfterSection => "Text after section",
            ErrorCode::FileListIsNull => "Conf file list is NULL",
            ErrorCode::WrongBooleanValue => "Wrong boolean value (1/0 true/false yes/no)",
            ErrorCode::KeyHasNullValue => "Given key has NULL value",
            ErrorCode::WrongOwner => "File has wrong owner",
            ErrorCode::WrongGroup => "File has wrong group",
            ErrorCode::WrongFilePermission => "File has wrong file permissions",
            ErrorCode::WrongDirPermission => "File has wrong dir permissions",
            ErrorCode::FileIsSymlink => "File is a sym link which is not permitted",
            ErrorCode::ParsingCallbackFailed => "User defined parsing callback has failed",
        }
    }

    /// Returns the category this code belongs to.
    pub fn category(self) -> ErrorCategory {
        match self {
            ErrorCode::Success => ErrorCategory::Success,
            ErrorCode::Error => ErrorCategory::Other,
            ErrorCode::NoMemory | ErrorCode::WriteError | ErrorCode::FileListIsNull => {
                ErrorCategory::Resource
            }
            ErrorCode::NoFile | ErrorCode::NoGroup | ErrorCode::NoKey | ErrorCode::EmptyKey => {
                ErrorCategory::LookupMiss
            }
            ErrorCode::ParseError
            | ErrorCode::MissingBracket
            | ErrorCode::MissingDelimiter
            | ErrorCode::EmptySectionName
            | ErrorCode::TextAfterSection
            | ErrorCode::WrongBooleanValue
            | ErrorCode::KeyHasNullValue => ErrorCategory::Syntax,
            ErrorCode::WrongOwner
            | ErrorCode::WrongGroup
            | ErrorCode::WrongFilePermission
            | ErrorCode::WrongDirPermission
            | ErrorCode::FileIsSymlink => ErrorCategory::Permission,
            ErrorCode::ParsingCallbackFailed => ErrorCategory::Callback,
        }
    }

    /// Looks up a code by its numeric value.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Coarse classification of error codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// No error.
    Success,
    /// Resource exhaustion or write failures.
    Resource,
    /// A file, group or key was not there.
    LookupMiss,
    /// Grammar or value syntax errors.
    Syntax,
    /// Ownership and permission checks.
    Permission,
    /// The validator rejected a file.
    Callback,
    /// Everything else.
    Other,
}

/// A position inside a configuration source.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ErrorLocation {
    /// Source path, `None` for in-memory input.
    pub path: Option<PathBuf>,
    /// 1-based line number, `0` when the error is not tied to a line.
    pub line: u64,
}

impl ErrorLocation {
    /// Creates a location.
    pub fn new(path: Option<&Path>, line: u64) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
            line,
        }
    }
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}:{}", path.display(), self.line),
            None => write!(f, "<memory>:{}", self.line),
        }
    }
}

/// Grammar violations detected while parsing a single source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyntaxErrorKind {
    /// Anything without a dedicated code: missing key name, invalid UTF-8,
    /// rejected duplicate key.
    Generic,
    /// `[Group` without `]`.
    MissingBracket,
    /// Key line without the delimiter.
    MissingDelimiter,
    /// `[]`.
    EmptySectionName,
    /// `[Group] trailing`.
    TextAfterSection,
    /// `key =` with nothing after the delimiter.
    KeyHasNullValue,
}

impl SyntaxErrorKind {
    /// The stable code for this kind.
    pub fn code(self) -> ErrorCode {
        match self {
            SyntaxErrorKind::Generic => ErrorCode::ParseError,
            SyntaxErrorKind::MissingBracket => ErrorCode::MissingBracket,
            SyntaxErrorKind::MissingDelimiter => ErrorCode::MissingDelimiter,
            SyntaxErrorKind::EmptySectionName => ErrorCode::EmptySectionName,
            SyntaxErrorKind::TextAfterSection => ErrorCode::TextAfterSection,
            SyntaxErrorKind::KeyHasNullValue => ErrorCode::KeyHasNullValue,
        }
    }
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code().message())
    }
}

/// Ownership and permission violations reported by validators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PermissionKind {
    /// Owner uid mismatch.
    WrongOwner,
    /// Owner gid mismatch.
    WrongGroup,
    /// Forbidden file mode bits are set.
    WrongFilePermission,
    /// Forbidden mode bits are set on the parent directory.
    WrongDirPermission,
    /// The path is a symbolic link.
    FileIsSymlink,
}

impl PermissionKind {
    /// The stable code for this kind.
    pub fn code(self) -> ErrorCode {
        match self {
            PermissionKind::WrongOwner => ErrorCode::WrongOwner,
            PermissionKind::WrongGroup => ErrorCode::WrongGroup,
            PermissionKind::WrongFilePermission => ErrorCode::WrongFilePermission,
            PermissionKind::WrongDirPermission => ErrorCode::WrongDirPermission,
            PermissionKind::FileIsSymlink => ErrorCode::FileIsSymlink,
        }
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code().message())
    }
}

/// The main error type for configuration operations.
///
/// It is marked as `#[non_exhaustive]` to allow for future additions without
/// breaking backwards compatibility. Use [`ConfigError::code`] for stable
/// matching.
///
/// # Examples
///
/// ```
/// use tiercfg::domain::errors::{ConfigError, ErrorCode};
///
/// let error = ConfigError::KeyNotFound {
///     group: "Group".to_string(),
///     key: "Bla".to_string(),
/// };
/// assert_eq!(error.code(), ErrorCode::NoKey);
/// assert!(error.is_lookup_miss());
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A configuration file that had to exist was not found.
    #[error("Configuration file not found: {}", path.display())]
    FileNotFound {
        /// The missing path
        path: PathBuf,
    },

    /// The requested group does not exist.
    #[error("Group not found: [{group}]")]
    GroupNotFound {
        /// The missing group
        group: String,
    },

    /// The requested key does not exist in its group.
    #[error("Key not found: '{key}' in group [{group}]")]
    KeyNotFound {
        /// The group that was searched
        group: String,
        /// The missing key
        key: String,
    },

    /// An empty key name was supplied.
    #[error("Key is NULL or has empty value")]
    EmptyKey,

    /// Creating or writing an output file failed.
    #[error("Error creating or writing to a file: {}: {source}", path.display())]
    WriteError {
        /// The file being written
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// No configuration directories were given.
    #[error("Conf file list is NULL")]
    FileListIsNull,

    /// The source violates the key-file grammar.
    #[error("{kind} at {location}: {detail}")]
    Syntax {
        /// What went wrong
        kind: SyntaxErrorKind,
        /// Where it went wrong
        location: ErrorLocation,
        /// Offending text or explanation
        detail: String,
    },

    /// A present value could not be converted to the requested type.
    #[error("Failed to convert value '{value}' of key '{key}' to type {target_type}: {source}")]
    TypeConversion {
        /// The key being converted
        key: String,
        /// The raw text
        value: String,
        /// The target type name
        target_type: &'static str,
        /// The underlying conversion error
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A present value is not a boolean literal.
    #[error("Wrong boolean value (1/0 true/false yes/no) for key '{key}': '{value}'")]
    WrongBooleanValue {
        /// The key being converted
        key: String,
        /// The raw text
        value: String,
    },

    /// A validator refused the file because of its ownership or mode.
    #[error("{kind}: {}", path.display())]
    Permission {
        /// Which check failed
        kind: PermissionKind,
        /// The checked path
        path: PathBuf,
    },

    /// A user supplied validator returned a negative verdict.
    #[error("User defined parsing callback has failed: {}", path.display())]
    ValidatorRejected {
        /// The rejected path
        path: PathBuf,
    },

    /// An argument violates an invariant (e.g. delimiter equals comment).
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// The error message
        message: String,
    },

    /// An I/O error other than "not found" occurred while reading.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The path being accessed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Returns the stable code of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::FileNotFound { .. } => ErrorCode::NoFile,
            ConfigError::GroupNotFound { .. } => ErrorCode::NoGroup,
            ConfigError::KeyNotFound { .. } => ErrorCode::NoKey,
            ConfigError::EmptyKey => ErrorCode::EmptyKey,
            ConfigError::WriteError { .. } => ErrorCode::WriteError,
            ConfigError::FileListIsNull => ErrorCode::FileListIsNull,
            ConfigError::Syntax { kind, .. } => kind.code(),
            ConfigError::TypeConversion { .. } => ErrorCode::ParseError,
            ConfigError::WrongBooleanValue { .. } => ErrorCode::WrongBooleanValue,
            ConfigError::Permission { kind, .. } => kind.code(),
            ConfigError::ValidatorRejected { .. } => ErrorCode::ParsingCallbackFailed,
            ConfigError::InvalidArgument { .. } | ConfigError::Io { .. } => ErrorCode::Error,
        }
    }

    /// Returns the category of this error.
    pub fn category(&self) -> ErrorCategory {
        self.code().category()
    }

    /// Whether this is a group/key/file lookup miss.
    pub fn is_lookup_miss(&self) -> bool {
        self.category() == ErrorCategory::LookupMiss
    }

    /// Whether a default-value accessor may absorb this error.
    ///
    /// Only missing groups and missing keys qualify; a present but malformed
    /// value always propagates.
    pub fn is_absorbed_by_default(&self) -> bool {
        matches!(
            self,
            ConfigError::GroupNotFound { .. } | ConfigError::KeyNotFound { .. }
        )
    }

    /// Returns the source location, if the error is tied to one.
    pub fn location(&self) -> Option<ErrorLocation> {
        match self {
            ConfigError::Syntax { location, .. } => Some(location.clone()),
            ConfigError::FileNotFound { path }
            | ConfigError::Permission { path, .. }
            | ConfigError::ValidatorRejected { path }
            | ConfigError::Io { path, .. } => Some(ErrorLocation::new(Some(path), 0)),
            _ => None,
        }
    }

    /// Builds a syntax error.
    pub(crate) fn syntax(
        kind: SyntaxErrorKind,
        path: Option<&Path>,
        line: u64,
        detail: impl Into<String>,
    ) -> Self {
        ConfigError::Syntax {
            kind,
            location: ErrorLocation::new(path, line),
            detail: detail.into(),
        }
    }

    /// Builds an invalid-argument error.
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        ConfigError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Maps an I/O error on `path`, turning "not found" into [`ConfigError::FileNotFound`].
    pub(crate) fn from_io(path: &Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source: err,
            }
        }
    }
}

/// A specialized Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
