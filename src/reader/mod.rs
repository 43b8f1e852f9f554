//! Pull-based streaming reader over a catalog document.
//!
//! [`XmlReader`] advances one event at a time through the document and
//! exposes the current event through accessor methods, in the style of a
//! classic XML pull parser. The event set is deliberately small:
//!
//! - [`NodeType::StartElement`] for `<tag ...>` (and for `<tag/>`),
//! - [`NodeType::EndElement`] for `</tag>` (also synthesized after `<tag/>`),
//! - [`NodeType::Text`] for character data, with CDATA sections and
//!   references merged in and comments or processing instructions dropped,
//! - [`NodeType::EndDocument`] once the root element has closed.
//!
//! The XML declaration, a DOCTYPE, comments, and processing instructions
//! are consumed silently. Names are compared literally; there is no
//! namespace processing.
//!
//! On top of [`XmlReader::read`] the reader offers the navigation helpers a
//! schema-driven decoder needs: [`next_tag`](XmlReader::next_tag),
//! [`require`](XmlReader::require), [`read_text`](XmlReader::read_text) and
//! [`skip_subtree`](XmlReader::skip_subtree).
//!
//! # Examples
//!
//! ```
//! use buildwell::reader::{NodeType, XmlReader};
//!
//! let mut reader = XmlReader::new("<product id=\"chair\"><name>Chair</name></product>");
//!
//! assert_eq!(reader.read().unwrap(), NodeType::StartElement);
//! assert_eq!(reader.name(), "product");
//! assert_eq!(reader.attribute("id"), Some("chair"));
//!
//! assert_eq!(reader.next_tag().unwrap(), NodeType::StartElement);
//! assert_eq!(reader.read_text().unwrap(), "Chair");
//!
//! assert_eq!(reader.read().unwrap(), NodeType::EndElement);
//! assert_eq!(reader.read().unwrap(), NodeType::EndDocument);
//! ```

use std::fmt;

use crate::error::{ParseError, ParseErrorKind, SourceLocation};
use crate::parser::input::{
    at_xml_declaration, read_cdata_into, skip_comment, skip_doctype, skip_processing_instruction,
    skip_xml_declaration, ParserInput,
};
use crate::parser::ParseOptions;

/// The type of event the reader is positioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// The reader has not been advanced yet.
    None,
    /// An element start tag, e.g. `<step type="text">` or `<step/>`.
    StartElement,
    /// An element end tag, e.g. `</step>`.
    EndElement,
    /// A run of character data.
    Text,
    /// The root element has closed and only trailing markup followed.
    EndDocument,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "nothing"),
            Self::StartElement => write!(f, "start tag"),
            Self::EndElement => write!(f, "end tag"),
            Self::Text => write!(f, "text"),
            Self::EndDocument => write!(f, "end of document"),
        }
    }
}

/// An attribute on the current start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Attribute {
    name: String,
    value: String,
}

/// The event the reader is positioned on.
#[derive(Debug, Clone)]
struct Node {
    node_type: NodeType,
    /// Element name for start and end tags, empty otherwise.
    name: String,
    /// Character data for text events.
    text: Option<String>,
    attributes: Vec<Attribute>,
    depth: u32,
    is_empty_element: bool,
    location: SourceLocation,
}

impl Node {
    fn new(node_type: NodeType, location: SourceLocation) -> Self {
        Self {
            node_type,
            name: String::new(),
            text: None,
            attributes: Vec::new(),
            depth: 0,
            is_empty_element: false,
            location,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Before the root element.
    Prolog,
    /// Inside the root element.
    Content,
    /// After the root element closed.
    Epilog,
    Finished,
}

/// A pull-based streaming reader.
///
/// Any structural problem (mismatched or missing end tags, end of input
/// inside an open element, stray text outside the root) is reported as a
/// [`ParseError`] from the call that encounters it.
pub struct XmlReader<'a> {
    input: ParserInput<'a>,
    current: Node,
    /// End event owed for a self-closing start tag.
    pending_end: Option<Node>,
    /// Names of the currently open elements.
    open_elements: Vec<String>,
    state: State,
}

impl<'a> XmlReader<'a> {
    /// Creates a reader over `text` with default options.
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        Self::with_options(text, &ParseOptions::default())
    }

    /// Creates a reader over `text` with the given resource limits.
    #[must_use]
    pub fn with_options(text: &'a str, options: &ParseOptions) -> Self {
        Self {
            input: ParserInput::with_options(text, options),
            current: Node::new(NodeType::None, SourceLocation::START),
            pending_end: None,
            open_elements: Vec::new(),
            state: State::Prolog,
        }
    }

    // === Public API: reading ===

    /// Advances to the next event and returns its type.
    ///
    /// Once [`NodeType::EndDocument`] is reached, further calls keep
    /// returning it.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the document is not well-formed at the point
    /// being read, or if a configured limit is exceeded.
    pub fn read(&mut self) -> Result<NodeType, ParseError> {
        if let Some(end) = self.pending_end.take() {
            self.current = end;
            return Ok(NodeType::EndElement);
        }

        let node = match self.state {
            State::Prolog => self.read_prolog()?,
            State::Content => self.read_content()?,
            State::Epilog => self.read_epilog()?,
            State::Finished => Node::new(NodeType::EndDocument, self.input.location()),
        };
        self.current = node;
        Ok(self.current.node_type)
    }

    /// Advances to the next start or end tag, skipping whitespace-only text.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if non-whitespace text or the end of the document
    /// is found instead of a tag.
    pub fn next_tag(&mut self) -> Result<NodeType, ParseError> {
        let mut node_type = self.read()?;
        if node_type == NodeType::Text && self.is_whitespace() {
            node_type = self.read()?;
        }
        match node_type {
            NodeType::StartElement | NodeType::EndElement => Ok(node_type),
            other => Err(self.error_at_current(
                ParseErrorKind::Syntax,
                format!("expected start or end tag, found {other}"),
            )),
        }
    }

    /// Checks that the reader is positioned on an event of `node_type` and,
    /// when `name` is given, that the element has that name.
    ///
    /// # Errors
    ///
    /// Returns a syntax `ParseError` describing the mismatch.
    pub fn require(&self, node_type: NodeType, name: Option<&str>) -> Result<(), ParseError> {
        let type_ok = self.current.node_type == node_type;
        let name_ok = name.map_or(true, |n| self.current.name == n);
        if type_ok && name_ok {
            return Ok(());
        }
        let expected = match name {
            Some(n) => format!("{node_type} <{n}>"),
            None => node_type.to_string(),
        };
        Err(self.error_at_current(
            ParseErrorKind::Syntax,
            format!("expected {expected}, found {}", self.describe_current()),
        ))
    }

    /// Reads the text content of the element the reader is on.
    ///
    /// The reader must be on a start tag. The character data immediately
    /// following it is returned verbatim (an element with no text yields an
    /// empty string), and the reader is left on the matching end tag.
    ///
    /// # Errors
    ///
    /// Returns a syntax `ParseError` if the element contains child elements,
    /// or an invalid-state error if the reader is not on a start tag.
    pub fn read_text(&mut self) -> Result<String, ParseError> {
        if self.current.node_type != NodeType::StartElement {
            return Err(self.error_at_current(
                ParseErrorKind::InvalidState,
                format!("read_text called on {}", self.describe_current()),
            ));
        }
        let name = self.current.name.clone();
        let mut text = String::new();
        if self.read()? == NodeType::Text {
            text = self.current.text.take().unwrap_or_default();
            self.read()?;
        }
        self.require(NodeType::EndElement, Some(&name))?;
        Ok(text)
    }

    /// Skips the element the reader is on together with its whole subtree.
    ///
    /// The reader must be on a start tag and is left on its matching end tag.
    ///
    /// # Errors
    ///
    /// Returns an invalid-state `ParseError` if the reader is not on a start
    /// tag, or any error raised while reading the subtree.
    pub fn skip_subtree(&mut self) -> Result<(), ParseError> {
        if self.current.node_type != NodeType::StartElement {
            return Err(self.error_at_current(
                ParseErrorKind::InvalidState,
                format!("skip_subtree called on {}", self.describe_current()),
            ));
        }
        let mut depth: u32 = 1;
        while depth != 0 {
            match self.read()? {
                NodeType::StartElement => depth += 1,
                NodeType::EndElement => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    /// Consumes the rest of the document, checking that nothing but
    /// comments, processing instructions, and whitespace follow the root.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` for any malformed trailing content.
    pub fn finish(&mut self) -> Result<(), ParseError> {
        while self.read()? != NodeType::EndDocument {}
        Ok(())
    }

    // === Public API: current event ===

    /// Returns the type of the current event.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        self.current.node_type
    }

    /// Returns the element name for start and end tags, or `""`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.current.name
    }

    /// Returns the character data of a text event.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.current.text.as_deref()
    }

    /// Returns the value of the named attribute on the current start tag.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.current
            .attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Returns the number of attributes on the current start tag.
    #[must_use]
    pub fn attribute_count(&self) -> usize {
        self.current.attributes.len()
    }

    /// Returns the depth of the current event. The root element is at depth 0.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.current.depth
    }

    /// Returns whether the current start tag was self-closing (`<tag/>`).
    #[must_use]
    pub fn is_empty_element(&self) -> bool {
        self.current.is_empty_element
    }

    /// Returns where the current event starts in the source.
    #[must_use]
    pub fn location(&self) -> SourceLocation {
        self.current.location
    }

    /// Returns `true` if the current event is text made only of XML whitespace.
    #[must_use]
    pub fn is_whitespace(&self) -> bool {
        self.current
            .text
            .as_deref()
            .is_some_and(|t| t.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r')))
    }

    // === Internal: state dispatch ===

    fn read_prolog(&mut self) -> Result<Node, ParseError> {
        if at_xml_declaration(&self.input) {
            skip_xml_declaration(&mut self.input)?;
        }
        loop {
            self.input.skip_whitespace();
            if self.input.at_end() {
                return Err(self.input.fatal("document has no root element"));
            }
            if self.input.looking_at(b"<!--") {
                skip_comment(&mut self.input)?;
            } else if self.input.looking_at(b"<!DOCTYPE") {
                skip_doctype(&mut self.input)?;
            } else if self.input.looking_at(b"<?") {
                skip_processing_instruction(&mut self.input)?;
            } else if self.input.at_start_tag() {
                self.state = State::Content;
                return self.read_start_tag();
            } else {
                return Err(self.input.fatal("expected root element"));
            }
        }
    }

    fn read_content(&mut self) -> Result<Node, ParseError> {
        loop {
            if self.input.at_end() {
                let open = self.open_elements.last().map_or("", String::as_str);
                return Err(self
                    .input
                    .fatal(format!("unexpected end of input inside <{open}>")));
            }
            if self.input.looking_at(b"</") {
                return self.read_end_tag();
            }
            if self.input.at_start_tag() {
                return self.read_start_tag();
            }
            if self.input.peek() == Some(b'<')
                && !self.input.looking_at(b"<![CDATA[")
                && !self.input.looking_at(b"<!--")
                && !self.input.looking_at(b"<?")
            {
                return Err(self.input.fatal("invalid markup in element content"));
            }
            if let Some(node) = self.read_char_data()? {
                return Ok(node);
            }
        }
    }

    fn read_epilog(&mut self) -> Result<Node, ParseError> {
        loop {
            self.input.skip_whitespace();
            if self.input.at_end() {
                self.state = State::Finished;
                return Ok(Node::new(NodeType::EndDocument, self.input.location()));
            }
            if self.input.looking_at(b"<!--") {
                skip_comment(&mut self.input)?;
            } else if self.input.looking_at(b"<?") {
                skip_processing_instruction(&mut self.input)?;
            } else {
                return Err(self.input.fatal("content after document element"));
            }
        }
    }

    // === Internal: individual constructs ===

    fn read_start_tag(&mut self) -> Result<Node, ParseError> {
        let location = self.input.location();
        self.input.increment_depth()?;
        self.input.expect_byte(b'<')?;
        let name = self.input.parse_name()?;

        let mut attributes: Vec<Attribute> = Vec::new();
        loop {
            let had_ws = self.input.skip_whitespace();
            if self.input.peek() == Some(b'>') || self.input.looking_at(b"/>") {
                break;
            }
            if self.input.at_end() {
                return Err(self
                    .input
                    .fatal(format!("unexpected end of input in start tag <{name}>")));
            }
            if !had_ws {
                return Err(self.input.fatal("whitespace required between attributes"));
            }
            let attr_location = self.input.location();
            let attr_name = self.input.parse_name()?;
            self.input.skip_whitespace();
            self.input.expect_byte(b'=')?;
            self.input.skip_whitespace();
            let value = self.input.parse_attribute_value()?;
            if attributes.iter().any(|a| a.name == attr_name) {
                return Err(ParseError {
                    kind: ParseErrorKind::Syntax,
                    message: format!("duplicate attribute '{attr_name}' on <{name}>"),
                    location: attr_location,
                });
            }
            attributes.push(Attribute {
                name: attr_name,
                value,
            });
        }

        let is_empty = self.input.looking_at(b"/>");
        self.input.advance(if is_empty { 2 } else { 1 });

        let depth = u32::try_from(self.open_elements.len()).unwrap_or(u32::MAX);
        let mut node = Node::new(NodeType::StartElement, location);
        node.name = name;
        node.attributes = attributes;
        node.depth = depth;
        node.is_empty_element = is_empty;

        if is_empty {
            self.input.decrement_depth();
            let mut end = Node::new(NodeType::EndElement, self.input.location());
            end.name = node.name.clone();
            end.depth = depth;
            if self.open_elements.is_empty() {
                self.state = State::Epilog;
            }
            self.pending_end = Some(end);
        } else {
            self.open_elements.push(node.name.clone());
        }
        Ok(node)
    }

    fn read_end_tag(&mut self) -> Result<Node, ParseError> {
        let location = self.input.location();
        self.input.expect_str(b"</")?;
        let name = self.input.parse_name()?;
        self.input.skip_whitespace();
        self.input.expect_byte(b'>')?;

        match self.open_elements.last() {
            Some(expected) if *expected == name => {}
            Some(expected) => {
                return Err(ParseError {
                    kind: ParseErrorKind::Syntax,
                    message: format!("mismatched end tag: expected </{expected}>, found </{name}>"),
                    location,
                });
            }
            None => {
                return Err(ParseError {
                    kind: ParseErrorKind::Syntax,
                    message: format!("unexpected end tag </{name}>"),
                    location,
                });
            }
        }

        self.open_elements.pop();
        self.input.decrement_depth();
        if self.open_elements.is_empty() {
            self.state = State::Epilog;
        }

        let mut node = Node::new(NodeType::EndElement, location);
        node.name = name;
        node.depth = u32::try_from(self.open_elements.len()).unwrap_or(u32::MAX);
        Ok(node)
    }

    /// Reads character data up to the next tag. Returns `None` when only
    /// comments or processing instructions were found.
    fn read_char_data(&mut self) -> Result<Option<Node>, ParseError> {
        let location = self.input.location();
        let mut text = String::new();
        loop {
            if self.input.looking_at(b"<![CDATA[") {
                read_cdata_into(&mut self.input, &mut text)?;
            } else if self.input.looking_at(b"<!--") {
                skip_comment(&mut self.input)?;
            } else if self.input.looking_at(b"<?") {
                skip_processing_instruction(&mut self.input)?;
            } else {
                match self.input.peek() {
                    None | Some(b'<') => break,
                    Some(b'&') => self.input.parse_reference_into(&mut text)?,
                    Some(_) => {
                        if self.input.looking_at(b"]]>") {
                            return Err(self.input.fatal("']]>' not allowed in character data"));
                        }
                        text.push(self.input.next_char()?);
                    }
                }
            }
            self.input.check_text_length(text.len())?;
        }

        if text.is_empty() {
            return Ok(None);
        }
        let mut node = Node::new(NodeType::Text, location);
        node.text = Some(text);
        node.depth = u32::try_from(self.open_elements.len()).unwrap_or(u32::MAX);
        Ok(Some(node))
    }

    // === Internal: error helpers ===

    fn describe_current(&self) -> String {
        match self.current.node_type {
            NodeType::StartElement => format!("start tag <{}>", self.current.name),
            NodeType::EndElement => format!("end tag </{}>", self.current.name),
            other => other.to_string(),
        }
    }

    fn error_at_current(&self, kind: ParseErrorKind, message: String) -> ParseError {
        ParseError {
            kind,
            message,
            location: self.current.location,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn read_all(input: &str) -> Vec<(NodeType, String)> {
        let mut reader = XmlReader::new(input);
        let mut events = Vec::new();
        loop {
            let node_type = reader.read().unwrap();
            if node_type == NodeType::EndDocument {
                return events;
            }
            let label = match node_type {
                NodeType::Text => reader.text().unwrap_or_default().to_string(),
                _ => reader.name().to_string(),
            };
            events.push((node_type, label));
        }
    }

    fn read_error(input: &str) -> ParseError {
        let mut reader = XmlReader::new(input);
        loop {
            match reader.read() {
                Ok(NodeType::EndDocument) => panic!("expected an error for {input:?}"),
                Ok(_) => {}
                Err(e) => return e,
            }
        }
    }

    #[test]
    fn test_read_element_with_text() {
        assert_eq!(
            read_all("<name>Chair</name>"),
            vec![
                (NodeType::StartElement, "name".to_string()),
                (NodeType::Text, "Chair".to_string()),
                (NodeType::EndElement, "name".to_string()),
            ]
        );
    }

    #[test]
    fn test_self_closing_element_emits_end() {
        let mut reader = XmlReader::new("<products><product id=\"x\"/></products>");
        assert_eq!(reader.read().unwrap(), NodeType::StartElement);
        assert_eq!(reader.read().unwrap(), NodeType::StartElement);
        assert!(reader.is_empty_element());
        assert_eq!(reader.attribute("id"), Some("x"));
        assert_eq!(reader.depth(), 1);
        assert_eq!(reader.read().unwrap(), NodeType::EndElement);
        assert_eq!(reader.name(), "product");
        assert_eq!(reader.depth(), 1);
        assert_eq!(reader.read().unwrap(), NodeType::EndElement);
        assert_eq!(reader.name(), "products");
        assert_eq!(reader.read().unwrap(), NodeType::EndDocument);
        assert_eq!(reader.read().unwrap(), NodeType::EndDocument);
    }

    #[test]
    fn test_self_closing_root() {
        assert_eq!(
            read_all("<products/>"),
            vec![
                (NodeType::StartElement, "products".to_string()),
                (NodeType::EndElement, "products".to_string()),
            ]
        );
    }

    #[test]
    fn test_depth_tracking() {
        let mut reader = XmlReader::new("<a><b>t</b></a>");
        let mut depths = Vec::new();
        while reader.read().unwrap() != NodeType::EndDocument {
            depths.push(reader.depth());
        }
        assert_eq!(depths, vec![0, 1, 2, 1, 0]);
    }

    #[test]
    fn test_prolog_and_epilog_are_skipped() {
        let doc = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                   <!DOCTYPE products>\n\
                   <!-- bundled catalog -->\n\
                   <?editor tabs?>\n\
                   <products/>\n\
                   <!-- end -->\n";
        assert_eq!(
            read_all(doc),
            vec![
                (NodeType::StartElement, "products".to_string()),
                (NodeType::EndElement, "products".to_string()),
            ]
        );
    }

    #[test]
    fn test_text_merges_cdata_references_and_comments() {
        assert_eq!(
            read_all("<step>a &amp; <![CDATA[<b>]]><!-- c -->d&#33;</step>"),
            vec![
                (NodeType::StartElement, "step".to_string()),
                (NodeType::Text, "a & <b>d!".to_string()),
                (NodeType::EndElement, "step".to_string()),
            ]
        );
    }

    #[test]
    fn test_comment_only_content_yields_no_text() {
        assert_eq!(
            read_all("<name><!-- none --></name>"),
            vec![
                (NodeType::StartElement, "name".to_string()),
                (NodeType::EndElement, "name".to_string()),
            ]
        );
    }

    #[test]
    fn test_whitespace_text_is_reported() {
        let mut reader = XmlReader::new("<a>\n  <b/>\n</a>");
        reader.read().unwrap();
        assert_eq!(reader.read().unwrap(), NodeType::Text);
        assert!(reader.is_whitespace());
        assert_eq!(reader.text(), Some("\n  "));
    }

    #[test]
    fn test_next_tag_skips_whitespace() {
        let mut reader = XmlReader::new("<a>\n  <b/>\n</a>");
        assert_eq!(reader.next_tag().unwrap(), NodeType::StartElement);
        assert_eq!(reader.next_tag().unwrap(), NodeType::StartElement);
        assert_eq!(reader.name(), "b");
        assert_eq!(reader.next_tag().unwrap(), NodeType::EndElement);
        assert_eq!(reader.next_tag().unwrap(), NodeType::EndElement);
        assert_eq!(reader.name(), "a");
    }

    #[test]
    fn test_next_tag_rejects_text() {
        let mut reader = XmlReader::new("<a>words<b/></a>");
        reader.next_tag().unwrap();
        let err = reader.next_tag().unwrap_err();
        assert_eq!(err.message, "expected start or end tag, found text");
    }

    #[test]
    fn test_require() {
        let mut reader = XmlReader::new("<product/>");
        reader.next_tag().unwrap();
        assert!(reader.require(NodeType::StartElement, Some("product")).is_ok());
        assert!(reader.require(NodeType::StartElement, None).is_ok());
        let err = reader
            .require(NodeType::StartElement, Some("products"))
            .unwrap_err();
        assert_eq!(
            err.message,
            "expected start tag <products>, found start tag <product>"
        );
        assert_eq!(err.location, SourceLocation::START);
    }

    #[test]
    fn test_read_text_returns_verbatim_content() {
        let mut reader = XmlReader::new("<name>  Coffee Machine \n</name>");
        reader.next_tag().unwrap();
        assert_eq!(reader.read_text().unwrap(), "  Coffee Machine \n");
        assert_eq!(reader.node_type(), NodeType::EndElement);
        assert_eq!(reader.name(), "name");
    }

    #[test]
    fn test_read_text_of_empty_elements() {
        let mut reader = XmlReader::new("<r><name></name><name/></r>");
        reader.next_tag().unwrap();
        reader.next_tag().unwrap();
        assert_eq!(reader.read_text().unwrap(), "");
        reader.next_tag().unwrap();
        assert_eq!(reader.read_text().unwrap(), "");
        assert_eq!(reader.node_type(), NodeType::EndElement);
    }

    #[test]
    fn test_read_text_rejects_child_elements() {
        let mut reader = XmlReader::new("<name>Big <b>Chair</b></name>");
        reader.next_tag().unwrap();
        let err = reader.read_text().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Syntax);
        assert_eq!(err.message, "expected end tag <name>, found start tag <b>");
    }

    #[test]
    fn test_read_text_requires_start_tag() {
        let mut reader = XmlReader::new("<a>x</a>");
        let err = reader.read_text().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidState);
    }

    #[test]
    fn test_skip_subtree() {
        let mut reader = XmlReader::new("<r><skip><a><b/></a>text</skip><keep/></r>");
        reader.next_tag().unwrap();
        reader.next_tag().unwrap();
        assert_eq!(reader.name(), "skip");
        reader.skip_subtree().unwrap();
        assert_eq!(reader.node_type(), NodeType::EndElement);
        assert_eq!(reader.name(), "skip");
        reader.next_tag().unwrap();
        assert_eq!(reader.name(), "keep");
    }

    #[test]
    fn test_skip_subtree_requires_start_tag() {
        let mut reader = XmlReader::new("<r/>");
        let err = reader.skip_subtree().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidState);
        assert_eq!(err.message, "skip_subtree called on nothing");
    }

    #[test]
    fn test_attributes() {
        let mut reader = XmlReader::new("<step type='video' videoId=\"a&amp;b\"/>");
        reader.read().unwrap();
        assert_eq!(reader.attribute_count(), 2);
        assert_eq!(reader.attribute("type"), Some("video"));
        assert_eq!(reader.attribute("videoId"), Some("a&b"));
        assert_eq!(reader.attribute("missing"), None);
    }

    #[test]
    fn test_location_of_events() {
        let mut reader = XmlReader::new("<products>\n  <product/>\n</products>");
        reader.next_tag().unwrap();
        reader.next_tag().unwrap();
        assert_eq!(reader.location().line, 2);
        assert_eq!(reader.location().column, 3);
    }

    #[test]
    fn test_error_mismatched_tags() {
        let err = read_error("<a><b></a></b>");
        assert_eq!(err.message, "mismatched end tag: expected </b>, found </a>");
        assert_eq!(err.location.column, 7);
    }

    #[test]
    fn test_error_truncated_document() {
        let err = read_error("<products><product id=\"chair\"><name>Ch");
        assert_eq!(err.kind, ParseErrorKind::Syntax);
        assert_eq!(err.message, "unexpected end of input inside <name>");
    }

    #[test]
    fn test_error_truncated_start_tag() {
        let err = read_error("<products><product id=\"chair\"");
        assert_eq!(err.message, "unexpected end of input in start tag <product>");
    }

    #[test]
    fn test_error_empty_input() {
        assert_eq!(read_error("").message, "document has no root element");
        assert_eq!(read_error("  \n").message, "document has no root element");
    }

    #[test]
    fn test_error_text_before_root() {
        assert_eq!(read_error("hello<a/>").message, "expected root element");
    }

    #[test]
    fn test_error_content_after_root() {
        assert_eq!(
            read_error("<a/><b/>").message,
            "content after document element"
        );
    }

    #[test]
    fn test_error_duplicate_attribute() {
        let err = read_error("<step type=\"a\" type=\"b\"/>");
        assert_eq!(err.message, "duplicate attribute 'type' on <step>");
    }

    #[test]
    fn test_error_missing_attribute_whitespace() {
        let err = read_error("<step type=\"a\"videoId=\"b\"/>");
        assert_eq!(err.message, "whitespace required between attributes");
    }

    #[test]
    fn test_error_invalid_markup() {
        assert_eq!(
            read_error("<a>x< b/></a>").message,
            "invalid markup in element content"
        );
    }

    #[test]
    fn test_error_cdata_end_in_text() {
        let err = read_error("<a>x]]>y</a>");
        assert_eq!(err.message, "']]>' not allowed in character data");
    }

    #[test]
    fn test_depth_limit() {
        let doc = "<a>".repeat(10) + &"</a>".repeat(10);
        let mut reader = XmlReader::with_options(&doc, &ParseOptions::default().max_depth(4));
        let err = loop {
            if let Err(e) = reader.read() {
                break e;
            }
        };
        assert_eq!(err.kind, ParseErrorKind::Limit);
    }

    #[test]
    fn test_text_length_limit() {
        let doc = format!("<a>{}</a>", "x".repeat(100));
        let mut reader =
            XmlReader::with_options(&doc, &ParseOptions::default().max_text_length(10));
        reader.read().unwrap();
        let err = reader.read().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Limit);
    }

    #[test]
    fn test_node_type_display() {
        assert_eq!(NodeType::StartElement.to_string(), "start tag");
        assert_eq!(NodeType::EndDocument.to_string(), "end of document");
    }
}
