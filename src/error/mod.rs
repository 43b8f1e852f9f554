//! Error types and diagnostics for catalog decoding.
//!
//! Two layers of errors exist:
//!
//! - [`ParseError`] is raised by the pull reader when the byte stream is not
//!   a well-formed document, or when the reader is driven incorrectly. It
//!   carries the line, column, and byte offset of the failure.
//! - [`CatalogError`] is what the public decode functions return. Every
//!   reader failure, I/O failure, and encoding failure is folded into one of
//!   its three variants.
//!
//! Tolerated irregularities (skipped step types, duplicate product ids) are
//! not errors; they are reported as [`Diagnostic`]s on the decoded catalog.

use std::fmt;

use crate::encoding::EncodingError;

/// Source location within a catalog document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the decoded text.
    pub byte_offset: usize,
}

impl SourceLocation {
    /// The location of the first character of a document.
    pub const START: Self = Self {
        line: 1,
        column: 1,
        byte_offset: 0,
    };
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Classifies a [`ParseError`] so it can be mapped onto a [`CatalogError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// The document is not well-formed or does not follow the catalog schema.
    Syntax,
    /// A configured limit (depth, name, text, or document size) was exceeded.
    Limit,
    /// The reader was asked to do something its current position forbids.
    InvalidState,
}

/// The error type returned by the pull reader.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// What kind of failure this is.
    pub kind: ParseErrorKind,
    /// The primary error message.
    pub message: String,
    /// Where in the source the error occurred.
    pub location: SourceLocation,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at {}: {}", self.location, self.message)
    }
}

impl std::error::Error for ParseError {}

/// The kind of irregularity a [`Diagnostic`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A product reused an `id` already seen earlier in the catalog.
    DuplicateId,
    /// A `step` had an absent or unrecognized `type` and was skipped.
    UnknownStepType,
    /// A `step type="video"` had no `videoId` and was dropped.
    MissingVideoId,
}

/// A non-fatal warning recorded while decoding a catalog.
///
/// Diagnostics never change the decoded result; they exist so callers can
/// surface content problems in the bundled document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// What was tolerated.
    pub kind: DiagnosticKind,
    /// Human-readable description.
    pub message: String,
    /// Location of the start tag the warning refers to.
    pub location: SourceLocation,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "warning: {} at {}", self.message, self.location)
    }
}

/// The error type returned when decoding a catalog fails.
///
/// Any error aborts the whole decode; no partial catalog is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The document is not well-formed or violates the catalog schema.
    #[error("malformed catalog document at {location}: {message}")]
    Malformed {
        /// What was wrong.
        message: String,
        /// Where the problem was detected.
        location: SourceLocation,
    },

    /// The underlying stream could not be read to completion.
    #[error("failed to read catalog stream: {0}")]
    Io(#[from] std::io::Error),

    /// Any other failure surfaced during decode.
    #[error("unexpected failure while decoding catalog: {0}")]
    Unexpected(String),
}

impl CatalogError {
    /// Returns `true` for [`CatalogError::Malformed`].
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }

    /// Returns the source location for malformed-document errors.
    #[must_use]
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            Self::Malformed { location, .. } => Some(*location),
            Self::Io(_) | Self::Unexpected(_) => None,
        }
    }
}

impl From<ParseError> for CatalogError {
    fn from(err: ParseError) -> Self {
        match err.kind {
            ParseErrorKind::Syntax => Self::Malformed {
                message: err.message,
                location: err.location,
            },
            ParseErrorKind::Limit | ParseErrorKind::InvalidState => {
                Self::Unexpected(format!("{} at {}", err.message, err.location))
            }
        }
    }
}

impl From<EncodingError> for CatalogError {
    fn from(err: EncodingError) -> Self {
        Self::Malformed {
            message: err.to_string(),
            location: SourceLocation::START,
        }
    }
}
