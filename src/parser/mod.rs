//! Low-level document scanning and its configuration.
//!
//! The scanner is hand-rolled rather than built on a general XML crate
//! because the catalog decoder only needs a forward-only event stream over
//! a small, namespace-free vocabulary, and must report exact source
//! locations for every structural failure.

pub(crate) mod input;

use input::{
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_DOCUMENT_SIZE, DEFAULT_MAX_NAME_LENGTH,
    DEFAULT_MAX_TEXT_LENGTH,
};

/// Parse options controlling resource limits while decoding.
///
/// Use the builder pattern to configure options:
///
/// ```
/// use buildwell::parser::ParseOptions;
///
/// let opts = ParseOptions::default()
///     .max_depth(32)
///     .max_document_size(1024 * 1024);
/// assert_eq!(opts.max_depth, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum element nesting depth (default: 256).
    pub max_depth: u32,
    /// Maximum length in bytes of an element or attribute name (default: 50,000).
    pub max_name_length: usize,
    /// Maximum length in bytes of a single text run (default: 10 MB).
    pub max_text_length: usize,
    /// Maximum number of bytes read from the input stream (default: 64 MB).
    pub max_document_size: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
        }
    }
}

impl ParseOptions {
    /// Sets the maximum element nesting depth.
    #[must_use]
    pub fn max_depth(mut self, max: u32) -> Self {
        self.max_depth = max;
        self
    }

    /// Sets the maximum element/attribute name length in bytes.
    #[must_use]
    pub fn max_name_length(mut self, max: usize) -> Self {
        self.max_name_length = max;
        self
    }

    /// Sets the maximum text run length in bytes.
    #[must_use]
    pub fn max_text_length(mut self, max: usize) -> Self {
        self.max_text_length = max;
        self
    }

    /// Sets the maximum number of bytes accepted from the input stream.
    #[must_use]
    pub fn max_document_size(mut self, max: usize) -> Self {
        self.max_document_size = max;
        self
    }
}
