//! Encoding detection and transcoding of raw catalog bytes.
//!
//! The decoder receives a byte stream, but the reader works on UTF-8 text.
//! Bytes are converted with `encoding_rs` using this order of precedence:
//!
//! 1. A byte order mark (UTF-8, UTF-16 BE, UTF-16 LE) wins and is stripped.
//! 2. Otherwise the `encoding="..."` pseudo-attribute of the XML declaration,
//!    read from the ASCII-compatible prefix of the input.
//! 3. Otherwise UTF-8, per the XML specification.
//!
//! Malformed byte sequences are an error; nothing is replaced with U+FFFD.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};

/// How far into the input the XML declaration is searched for.
const DECLARATION_SCAN_LIMIT: usize = 256;

/// An error that occurs during encoding detection or transcoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("encoding error: {message}")]
pub struct EncodingError {
    /// A human-readable description of the encoding error.
    pub message: String,
}

impl EncodingError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Detects the encoding of a byte stream from its byte order mark.
///
/// Returns the encoding name and the number of BOM bytes to skip. Without a
/// BOM this reports UTF-8 and zero.
///
/// # Examples
///
/// ```
/// use buildwell::encoding::detect_encoding;
///
/// assert_eq!(detect_encoding(b"\xEF\xBB\xBF<products/>"), ("UTF-8", 3));
/// assert_eq!(detect_encoding(b"\xFF\xFE<\x00"), ("UTF-16LE", 2));
/// assert_eq!(detect_encoding(b"<products/>"), ("UTF-8", 0));
/// ```
#[must_use]
pub fn detect_encoding(bytes: &[u8]) -> (&'static str, usize) {
    match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => (encoding.name(), bom_len),
        None => (UTF_8.name(), 0),
    }
}

/// Decodes raw document bytes into a UTF-8 `String`.
///
/// # Errors
///
/// Returns `EncodingError` if the declared encoding is unknown or the bytes
/// are malformed for the chosen encoding.
///
/// # Examples
///
/// ```
/// use buildwell::encoding::decode_to_utf8;
///
/// let latin1 = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><name>Caf\xE9</name>";
/// assert!(decode_to_utf8(latin1).unwrap().contains("Café"));
/// ```
pub fn decode_to_utf8(bytes: &[u8]) -> Result<String, EncodingError> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return transcode(&bytes[bom_len..], encoding);
    }

    let encoding = match declared_encoding(bytes) {
        // A declaration readable as ASCII means the bytes are ASCII-compatible,
        // so a BOM-less UTF-16 label falls back to its output encoding.
        Some(label) => Encoding::for_label(label.as_bytes())
            .ok_or_else(|| EncodingError::new(format!("unsupported encoding: {label}")))?
            .output_encoding(),
        None => UTF_8,
    };
    transcode(bytes, encoding)
}

fn transcode(bytes: &[u8], encoding: &'static Encoding) -> Result<String, EncodingError> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(Cow::into_owned)
        .ok_or_else(|| {
            EncodingError::new(format!(
                "malformed byte sequence for encoding {}",
                encoding.name()
            ))
        })
}

/// Extracts the `encoding` value of a leading XML declaration.
fn declared_encoding(bytes: &[u8]) -> Option<&str> {
    let scan = &bytes[..bytes.len().min(DECLARATION_SCAN_LIMIT)];
    if !scan.starts_with(b"<?xml") {
        return None;
    }
    let decl_end = scan.windows(2).position(|w| w == b"?>")?;
    let decl = &scan[..decl_end];

    let key = decl.windows(8).position(|w| w == b"encoding")?;
    let rest = skip_ascii_whitespace(&decl[key + 8..]);
    let rest = skip_ascii_whitespace(rest.strip_prefix(b"=")?);
    let (&quote, rest) = rest.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let end = rest.iter().position(|&b| b == quote)?;
    std::str::from_utf8(&rest[..end]).ok()
}

fn skip_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[start..]
}
