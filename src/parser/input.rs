//! Byte-level cursor shared by the pull reader.
//!
//! [`ParserInput`] owns the position (line, column, byte offset) inside the
//! decoded document text and provides the scanning primitives the reader is
//! built from: peeking, advancing, names, references, quoted values, and the
//! markup constructs the catalog format tolerates but ignores (comments,
//! processing instructions, the XML declaration, and a DOCTYPE).
//!
//! Only the five predefined entities and numeric character references are
//! expanded. DTD-declared entities are rejected, so no external content is
//! ever loaded.

use crate::error::{ParseError, ParseErrorKind, SourceLocation};
use crate::parser::ParseOptions;

/// Default maximum element nesting depth.
pub(crate) const DEFAULT_MAX_DEPTH: u32 = 256;

/// Default maximum length (in bytes) of an element or attribute name.
pub(crate) const DEFAULT_MAX_NAME_LENGTH: usize = 50_000;

/// Default maximum length (in bytes) of a text run.
pub(crate) const DEFAULT_MAX_TEXT_LENGTH: usize = 10 * 1024 * 1024;

/// Default maximum number of bytes read from a catalog stream.
pub(crate) const DEFAULT_MAX_DOCUMENT_SIZE: usize = 64 * 1024 * 1024;

/// Returns `true` if `c` is a valid `Char` per XML 1.0 §2.2 `[2]`.
pub(crate) fn is_xml_char(c: char) -> bool {
    matches!(c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x0001_0000..=0x0010_FFFF
    )
}

/// Returns `true` if `c` is a valid `NameStartChar` per XML 1.0 §2.3 `[4]`.
pub(crate) fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z' |
        '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}' |
        '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' |
        '\u{200C}'..='\u{200D}' | '\u{2070}'..='\u{218F}' |
        '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}' |
        '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' |
        '\u{10000}'..='\u{EFFFF}'
    )
}

/// Returns `true` if `c` is a valid `NameChar` per XML 1.0 §2.3 `[4a]`.
pub(crate) fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' |
            '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}

/// Forward-only cursor over a UTF-8 document.
pub(crate) struct ParserInput<'a> {
    /// The document text. `pos` always sits on a char boundary.
    text: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    /// Current element nesting depth.
    depth: u32,
    max_depth: u32,
    max_name_length: usize,
    max_text_length: usize,
}

impl<'a> ParserInput<'a> {
    /// Creates a cursor at the start of `text` with default limits.
    #[cfg(test)]
    pub fn new(text: &'a str) -> Self {
        Self::with_options(text, &ParseOptions::default())
    }

    /// Creates a cursor at the start of `text` with the given limits.
    pub fn with_options(text: &'a str, options: &ParseOptions) -> Self {
        Self {
            text,
            pos: 0,
            line: 1,
            column: 1,
            depth: 0,
            max_depth: options.max_depth,
            max_name_length: options.max_name_length,
            max_text_length: options.max_text_length,
        }
    }

    // -- Depth tracking --

    /// Increments the nesting depth. Returns an error if the limit is exceeded.
    pub fn increment_depth(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.limit(format!(
                "maximum nesting depth exceeded ({})",
                self.max_depth
            )));
        }
        Ok(())
    }

    /// Decrements the nesting depth (saturating at 0).
    pub fn decrement_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Fails if a text run of `len` bytes exceeds the configured limit.
    pub fn check_text_length(&self, len: usize) -> Result<(), ParseError> {
        if len > self.max_text_length {
            return Err(self.limit(format!(
                "text length limit exceeded ({} bytes)",
                self.max_text_length
            )));
        }
        Ok(())
    }

    // -- Position queries --

    /// Returns the current source location.
    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.pos,
        }
    }

    /// Returns `true` if all input has been consumed.
    pub fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    // -- Peek operations --

    /// Returns the byte at the current position without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    /// Returns the byte at `current_position + offset` without consuming.
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.text.as_bytes().get(self.pos + offset).copied()
    }

    /// Returns the character at the current position without consuming it.
    pub fn peek_char(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    /// Returns `true` if the remaining input starts with `s`.
    pub fn looking_at(&self, s: &[u8]) -> bool {
        self.text.as_bytes()[self.pos..].starts_with(s)
    }

    /// Returns `true` if the cursor sits on `<` followed by a name start,
    /// i.e. on an element start tag.
    pub fn at_start_tag(&self) -> bool {
        self.peek() == Some(b'<')
            && self.text[self.pos + 1..]
                .chars()
                .next()
                .is_some_and(is_name_start_char)
    }

    // -- Advance operations --

    /// Advances over `count` ASCII bytes, updating line/column.
    pub fn advance(&mut self, count: usize) {
        for _ in 0..count {
            match self.peek() {
                Some(b'\n') => {
                    self.line += 1;
                    self.column = 1;
                }
                Some(_) => self.column += 1,
                None => return,
            }
            self.pos += 1;
        }
    }

    /// Consumes and returns the next byte, or returns an error at EOF.
    pub fn next_byte(&mut self) -> Result<u8, ParseError> {
        let b = self
            .peek()
            .ok_or_else(|| self.fatal("unexpected end of input"))?;
        self.advance(1);
        Ok(b)
    }

    /// Consumes and returns the next character.
    ///
    /// Line endings are normalized (`\r\n` and lone `\r` become `\n`, XML 1.0
    /// §2.11) and characters outside the `Char` production are rejected.
    pub fn next_char(&mut self) -> Result<char, ParseError> {
        let ch = self
            .peek_char()
            .ok_or_else(|| self.fatal("unexpected end of input"))?;
        if !is_xml_char(ch) {
            return Err(self.fatal(format!("invalid XML character: U+{:04X}", ch as u32)));
        }
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        if ch == '\r' {
            if self.peek() == Some(b'\n') {
                self.advance(1);
            } else {
                self.line += 1;
                self.column = 1;
            }
            return Ok('\n');
        }
        Ok(ch)
    }

    // -- Expect operations --

    /// Consumes the next byte and asserts it matches `expected`.
    pub fn expect_byte(&mut self, expected: u8) -> Result<(), ParseError> {
        match self.peek() {
            Some(b) if b == expected => {
                self.advance(1);
                Ok(())
            }
            Some(b) => Err(self.fatal(format!(
                "expected '{}', found '{}'",
                expected as char, b as char
            ))),
            None => Err(self.fatal(format!(
                "expected '{}', found end of input",
                expected as char
            ))),
        }
    }

    /// Consumes bytes and asserts they match the `expected` sequence.
    pub fn expect_str(&mut self, expected: &[u8]) -> Result<(), ParseError> {
        for &b in expected {
            self.expect_byte(b)?;
        }
        Ok(())
    }

    // -- Whitespace --

    /// Skips whitespace characters. Returns `true` if any were consumed.
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.advance(1);
        }
        self.pos > start
    }

    // -- Names and values --

    /// Parses an XML `Name` per XML 1.0 §2.3 production `[5]`.
    pub fn parse_name(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        match self.peek_char() {
            Some(c) if is_name_start_char(c) => {}
            Some(c) => {
                return Err(self.fatal(format!("invalid name start character '{c}'")));
            }
            None => return Err(self.fatal("expected name, found end of input")),
        }
        while let Some(c) = self.peek_char().filter(|&c| is_name_char(c)) {
            self.pos += c.len_utf8();
            self.column += 1;
            if self.pos - start > self.max_name_length {
                return Err(self.limit(format!(
                    "name length limit exceeded ({} bytes)",
                    self.max_name_length
                )));
            }
        }
        Ok(self.text[start..self.pos].to_string())
    }

    /// Parses an entity or character reference (`&...;`) and appends its
    /// replacement text to `out`.
    pub fn parse_reference_into(&mut self, out: &mut String) -> Result<(), ParseError> {
        self.expect_byte(b'&')?;

        if self.peek() != Some(b'#') {
            let name = self.parse_name()?;
            self.expect_byte(b';')?;
            let replacement = match name.as_str() {
                "amp" => '&',
                "lt" => '<',
                "gt" => '>',
                "apos" => '\'',
                "quot" => '"',
                _ => return Err(self.fatal(format!("unknown entity reference: &{name};"))),
            };
            out.push(replacement);
            return Ok(());
        }

        self.advance(1);
        let (digits, radix) = if self.peek() == Some(b'x') {
            self.advance(1);
            (self.take_while(|b| b.is_ascii_hexdigit()), 16)
        } else {
            (self.take_while(|b| b.is_ascii_digit()), 10)
        };
        if digits.is_empty() {
            return Err(self.fatal("empty character reference"));
        }
        let value = u32::from_str_radix(digits, radix)
            .map_err(|_| self.fatal("character reference out of range"))?;
        self.expect_byte(b';')?;

        match char::from_u32(value).filter(|&c| is_xml_char(c)) {
            Some(ch) => {
                out.push(ch);
                Ok(())
            }
            None => Err(self.fatal(format!(
                "character reference &#x{value:X}; does not refer to a valid XML character"
            ))),
        }
    }

    /// Parses a quoted attribute value, expanding references and normalizing
    /// whitespace characters to spaces (XML 1.0 §3.3.3).
    pub fn parse_attribute_value(&mut self) -> Result<String, ParseError> {
        let quote = self.next_byte()?;
        if quote != b'"' && quote != b'\'' {
            return Err(self.fatal("attribute value must be quoted"));
        }

        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.fatal("unexpected end of input in attribute value")),
                Some(b) if b == quote => {
                    self.advance(1);
                    return Ok(value);
                }
                Some(b'&') => self.parse_reference_into(&mut value)?,
                Some(b'<') => return Err(self.fatal("'<' not allowed in attribute values")),
                Some(_) => match self.next_char()? {
                    '\n' | '\t' => value.push(' '),
                    ch => value.push(ch),
                },
            }
        }
    }

    /// Skips a quoted literal without interpreting its contents.
    pub fn skip_quoted(&mut self) -> Result<(), ParseError> {
        let quote = self.next_byte()?;
        if quote != b'"' && quote != b'\'' {
            return Err(self.fatal("expected quoted value"));
        }
        while self.peek() != Some(quote) {
            self.next_char()?;
        }
        self.advance(1);
        Ok(())
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.advance(1);
        }
        let text = self.text;
        &text[start..self.pos]
    }

    // -- Error helpers --

    /// Creates a well-formedness `ParseError` at the current location.
    pub fn fatal(&self, message: impl Into<String>) -> ParseError {
        self.error(ParseErrorKind::Syntax, message)
    }

    /// Creates a resource-limit `ParseError` at the current location.
    pub fn limit(&self, message: impl Into<String>) -> ParseError {
        self.error(ParseErrorKind::Limit, message)
    }

    /// Creates a `ParseError` of the given kind at the current location.
    pub fn error(&self, kind: ParseErrorKind, message: impl Into<String>) -> ParseError {
        ParseError {
            kind,
            message: message.into(),
            location: self.location(),
        }
    }
}

// -------------------------------------------------------------------------
// Ignorable markup
// -------------------------------------------------------------------------

/// Skips a comment (`<!-- ... -->`). See XML 1.0 §2.5 production `[15]`.
pub(crate) fn skip_comment(input: &mut ParserInput<'_>) -> Result<(), ParseError> {
    input.expect_str(b"<!--")?;
    loop {
        if input.at_end() {
            return Err(input.fatal("unexpected end of input in comment"));
        }
        if input.looking_at(b"-->") {
            input.advance(3);
            return Ok(());
        }
        if input.looking_at(b"--") {
            return Err(input.fatal("'--' not allowed inside comments"));
        }
        input.next_char()?;
    }
}

/// Appends the content of a CDATA section (`<![CDATA[ ... ]]>`) to `out`.
pub(crate) fn read_cdata_into(
    input: &mut ParserInput<'_>,
    out: &mut String,
) -> Result<(), ParseError> {
    input.expect_str(b"<![CDATA[")?;
    loop {
        if input.at_end() {
            return Err(input.fatal("unexpected end of input in CDATA section"));
        }
        if input.looking_at(b"]]>") {
            input.advance(3);
            return Ok(());
        }
        out.push(input.next_char()?);
    }
}

/// Skips a processing instruction (`<?target data?>`).
///
/// The reserved `xml` target is only legal as the leading XML declaration,
/// which is handled by [`skip_xml_declaration`].
pub(crate) fn skip_processing_instruction(input: &mut ParserInput<'_>) -> Result<(), ParseError> {
    input.expect_str(b"<?")?;
    let target = input.parse_name()?;
    if target.eq_ignore_ascii_case("xml") {
        return Err(input.fatal("XML declaration allowed only at the start of the document"));
    }
    skip_until_pi_end(input)
}

/// Returns `true` if the cursor sits on an XML declaration.
pub(crate) fn at_xml_declaration(input: &ParserInput<'_>) -> bool {
    input.looking_at(b"<?xml")
        && matches!(input.peek_at(5), Some(b' ' | b'\t' | b'\r' | b'\n'))
}

/// Skips the XML declaration (`<?xml version="1.0" ...?>`).
///
/// Encoding was already handled on the raw bytes, so only the shape of the
/// declaration is checked.
pub(crate) fn skip_xml_declaration(input: &mut ParserInput<'_>) -> Result<(), ParseError> {
    input.expect_str(b"<?xml")?;
    input.skip_whitespace();
    if !input.looking_at(b"version") {
        return Err(input.fatal("XML declaration must start with a version"));
    }
    skip_until_pi_end(input)
}

fn skip_until_pi_end(input: &mut ParserInput<'_>) -> Result<(), ParseError> {
    loop {
        if input.at_end() {
            return Err(input.fatal("unexpected end of input in processing instruction"));
        }
        if input.looking_at(b"?>") {
            input.advance(2);
            return Ok(());
        }
        input.next_char()?;
    }
}

/// Skips a document type declaration, including any internal subset.
///
/// Declarations inside the subset are not interpreted.
pub(crate) fn skip_doctype(input: &mut ParserInput<'_>) -> Result<(), ParseError> {
    input.expect_str(b"<!DOCTYPE")?;
    if !input.skip_whitespace() {
        return Err(input.fatal("whitespace required after '<!DOCTYPE'"));
    }
    input.parse_name()?;

    let mut in_subset = false;
    loop {
        match input.peek() {
            None => return Err(input.fatal("unexpected end of input in DOCTYPE")),
            Some(b'"' | b'\'') => input.skip_quoted()?,
            Some(b'[') if !in_subset => {
                in_subset = true;
                input.advance(1);
            }
            Some(b']') if in_subset => {
                in_subset = false;
                input.advance(1);
            }
            Some(b'<') if in_subset && input.looking_at(b"<!--") => skip_comment(input)?,
            Some(b'>') if !in_subset => {
                input.advance(1);
                return Ok(());
            }
            Some(_) => {
                input.next_char()?;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_peek_and_advance() {
        let mut input = ParserInput::new("abc");
        assert_eq!(input.peek(), Some(b'a'));
        assert_eq!(input.peek_at(1), Some(b'b'));
        input.advance(1);
        assert_eq!(input.peek(), Some(b'b'));
        input.advance(2);
        assert!(input.at_end());
        input.advance(1);
        assert!(input.at_end());
    }

    #[test]
    fn test_line_column_tracking() {
        let mut input = ParserInput::new("ab\ncd");
        input.advance(2);
        assert_eq!(input.location().column, 3);
        input.advance(1);
        assert_eq!(input.location().line, 2);
        assert_eq!(input.location().column, 1);
        assert_eq!(input.location().byte_offset, 3);
    }

    #[test]
    fn test_next_char_line_ending_normalization() {
        let mut input = ParserInput::new("a\r\nb\rc");
        let chars: Vec<char> = (0..5).map(|_| input.next_char().unwrap()).collect();
        assert_eq!(chars, vec!['a', '\n', 'b', '\n', 'c']);
        assert_eq!(input.location().line, 3);
    }

    #[test]
    fn test_next_char_multibyte_column() {
        let mut input = ParserInput::new("éx");
        assert_eq!(input.next_char().unwrap(), 'é');
        assert_eq!(input.location().column, 2);
        assert_eq!(input.location().byte_offset, 2);
    }

    #[test]
    fn test_next_char_rejects_control_characters() {
        let mut input = ParserInput::new("\u{1}");
        let err = input.next_char().unwrap_err();
        assert_eq!(err.message, "invalid XML character: U+0001");
    }

    #[test]
    fn test_parse_name() {
        let mut input = ParserInput::new("step type");
        assert_eq!(input.parse_name().unwrap(), "step");
        assert_eq!(input.peek(), Some(b' '));
    }

    #[test]
    fn test_parse_name_rejects_digit_start() {
        let mut input = ParserInput::new("1step");
        assert!(input.parse_name().is_err());
    }

    #[test]
    fn test_parse_name_length_limit() {
        let long_name = "a".repeat(100);
        let mut input =
            ParserInput::with_options(&long_name, &ParseOptions::default().max_name_length(50));
        let err = input.parse_name().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Limit);
        assert!(err.message.contains("name length"));
    }

    #[test]
    fn test_parse_reference_builtin() {
        let mut out = String::new();
        for r in ["&amp;", "&lt;", "&gt;", "&apos;", "&quot;"] {
            ParserInput::new(r).parse_reference_into(&mut out).unwrap();
        }
        assert_eq!(out, "&<>'\"");
    }

    #[test]
    fn test_parse_reference_char_refs() {
        let mut out = String::new();
        ParserInput::new("&#65;").parse_reference_into(&mut out).unwrap();
        ParserInput::new("&#x263A;").parse_reference_into(&mut out).unwrap();
        assert_eq!(out, "A\u{263A}");
    }

    #[test]
    fn test_parse_reference_unknown_entity() {
        let err = ParserInput::new("&nbsp;")
            .parse_reference_into(&mut String::new())
            .unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Syntax);
        assert_eq!(err.message, "unknown entity reference: &nbsp;");
    }

    #[test]
    fn test_parse_reference_invalid_char() {
        assert!(ParserInput::new("&#0;")
            .parse_reference_into(&mut String::new())
            .is_err());
        assert!(ParserInput::new("&#;")
            .parse_reference_into(&mut String::new())
            .is_err());
    }

    #[test]
    fn test_parse_attribute_value() {
        let mut input = ParserInput::new("'a &amp; b\tc'");
        assert_eq!(input.parse_attribute_value().unwrap(), "a & b c");
    }

    #[test]
    fn test_parse_attribute_value_rejects_lt() {
        let mut input = ParserInput::new("\"a<b\"");
        assert!(input.parse_attribute_value().is_err());
    }

    #[test]
    fn test_parse_attribute_value_unterminated() {
        let mut input = ParserInput::new("\"abc");
        let err = input.parse_attribute_value().unwrap_err();
        assert_eq!(err.message, "unexpected end of input in attribute value");
    }

    #[test]
    fn test_depth_limit() {
        let mut input = ParserInput::with_options("", &ParseOptions::default().max_depth(2));
        input.increment_depth().unwrap();
        input.increment_depth().unwrap();
        let err = input.increment_depth().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Limit);
        input.decrement_depth();
        input.decrement_depth();
        input.increment_depth().unwrap();
    }

    #[test]
    fn test_skip_comment() {
        let mut input = ParserInput::new("<!-- note -->rest");
        skip_comment(&mut input).unwrap();
        assert!(input.looking_at(b"rest"));

        let mut input = ParserInput::new("<!-- a -- b -->");
        assert!(skip_comment(&mut input).is_err());
    }

    #[test]
    fn test_read_cdata_into() {
        let mut input = ParserInput::new("<![CDATA[<b>&amp;</b>]]>");
        let mut out = String::new();
        read_cdata_into(&mut input, &mut out).unwrap();
        assert_eq!(out, "<b>&amp;</b>");
    }

    #[test]
    fn test_skip_processing_instruction() {
        let mut input = ParserInput::new("<?render mode=\"fast\"?>x");
        skip_processing_instruction(&mut input).unwrap();
        assert!(input.looking_at(b"x"));

        let mut input = ParserInput::new("<?xml version=\"1.0\"?>");
        assert!(skip_processing_instruction(&mut input).is_err());
    }

    #[test]
    fn test_skip_xml_declaration() {
        let mut input = ParserInput::new("<?xml version=\"1.0\" encoding=\"UTF-8\"?><a/>");
        assert!(at_xml_declaration(&input));
        skip_xml_declaration(&mut input).unwrap();
        assert!(input.at_start_tag());
    }

    #[test]
    fn test_skip_doctype_with_internal_subset() {
        let mut input = ParserInput::new(
            "<!DOCTYPE products [<!ELEMENT products (product*)><!-- ] --><!ATTLIST product id CDATA \"]\">]><products/>",
        );
        skip_doctype(&mut input).unwrap();
        assert!(input.looking_at(b"<products/>"));
    }

    #[test]
    fn test_at_start_tag() {
        assert!(ParserInput::new("<a>").at_start_tag());
        assert!(!ParserInput::new("</a>").at_start_tag());
        assert!(!ParserInput::new("<!-- -->").at_start_tag());
        assert!(!ParserInput::new("<").at_start_tag());
    }
}
