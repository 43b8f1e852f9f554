//! Catalog serializer.
//!
//! Writes a [`Catalog`] back out as a catalog document that decodes to the
//! same products. Strings holding characters XML cannot carry (C0 controls
//! other than tab, newline and carriage return, `U+FFFE`, `U+FFFF`) are
//! refused with an [`EncodeError`] instead of producing a document the
//! decoder would reject.

use crate::catalog::Catalog;
use crate::model::{Product, Step};
use crate::parser::input::is_xml_char;

/// Options controlling catalog serialization output.
///
/// # Examples
///
/// ```
/// use buildwell::catalog::decode_str;
/// use buildwell::serial::{encode_with_options, SerializeOptions};
///
/// let catalog = decode_str("<products><product id=\"a\"><name>A</name></product></products>").unwrap();
/// let xml = encode_with_options(&catalog, &SerializeOptions::default().indent(true)).unwrap();
/// assert!(xml.contains("\n    <name>A</name>"));
/// ```
#[derive(Debug, Clone)]
pub struct SerializeOptions {
    /// Whether to produce indented (pretty-printed) output.
    /// Defaults to `false`.
    pub indent: bool,
    /// The indentation string used for each level when `indent` is `true`.
    /// Defaults to two spaces.
    pub indent_str: String,
    /// Whether to start the output with an XML declaration.
    /// Defaults to `true`.
    pub declaration: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            indent: false,
            indent_str: "  ".to_string(),
            declaration: true,
        }
    }
}

impl SerializeOptions {
    /// Enables or disables indented (pretty-printed) output.
    ///
    /// Elements are placed on their own lines. Text content is never
    /// touched, so indentation does not change what the output decodes to.
    #[must_use]
    pub fn indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    /// Sets the indentation string used for each nesting level.
    ///
    /// Only takes effect when [`indent`](Self::indent) is enabled.
    #[must_use]
    pub fn indent_str(mut self, s: &str) -> Self {
        self.indent_str = s.to_string();
        self
    }

    /// Enables or disables the leading `<?xml ...?>` declaration.
    #[must_use]
    pub fn declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }
}

/// An error raised when a catalog holds a character XML 1.0 cannot represent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot encode {character:?} in {field} of product '{product_id}'")]
pub struct EncodeError {
    /// The offending character.
    pub character: char,
    /// Which part of the product held it, e.g. `"name"` or `"step text"`.
    pub field: &'static str,
    /// Id of the product being written.
    pub product_id: String,
}

/// Serializes a catalog to a compact XML string.
///
/// # Errors
///
/// Returns `EncodeError` if a product holds a character that is not a valid
/// XML character.
///
/// # Examples
///
/// ```
/// use buildwell::catalog::Catalog;
/// use buildwell::model::{Product, Step};
/// use buildwell::serial::encode;
///
/// let catalog = Catalog::from(vec![Product::new("chair", "Chair", vec![Step::video("abc123")])]);
/// assert_eq!(
///     encode(&catalog).unwrap(),
///     "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
///      <products><product id=\"chair\"><name>Chair</name><instructions>\
///      <step type=\"video\" videoId=\"abc123\"/></instructions></product></products>\n"
/// );
/// ```
pub fn encode(catalog: &Catalog) -> Result<String, EncodeError> {
    encode_with_options(catalog, &SerializeOptions::default())
}

/// Serializes a slice of products to a compact XML string.
///
/// # Errors
///
/// See [`encode`].
pub fn encode_products(products: &[Product]) -> Result<String, EncodeError> {
    write_document(products, &SerializeOptions::default())
}

/// Serializes a catalog to an XML string with the given options.
///
/// # Errors
///
/// See [`encode`].
pub fn encode_with_options(
    catalog: &Catalog,
    options: &SerializeOptions,
) -> Result<String, EncodeError> {
    write_document(catalog.products(), options)
}

fn write_document(products: &[Product], options: &SerializeOptions) -> Result<String, EncodeError> {
    let mut out = String::new();
    if options.declaration {
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    }

    if products.is_empty() {
        out.push_str("<products/>\n");
        return Ok(out);
    }

    out.push_str("<products>");
    for product in products {
        ProductWriter {
            out: &mut out,
            options,
            product_id: product.id(),
        }
        .write(product)?;
    }
    newline(&mut out, options, 0);
    out.push_str("</products>\n");
    Ok(out)
}

/// Writes one product, tagging any encoding failure with its id.
struct ProductWriter<'a> {
    out: &'a mut String,
    options: &'a SerializeOptions,
    product_id: &'a str,
}

impl ProductWriter<'_> {
    fn write(&mut self, product: &Product) -> Result<(), EncodeError> {
        self.newline(1);
        self.out.push_str("<product id=\"");
        self.escaped_attr(product.id(), "id")?;
        self.out.push_str("\">");

        self.newline(2);
        self.text_element("name", &[], product.name(), "name")?;

        self.newline(2);
        if product.steps().is_empty() {
            self.out.push_str("<instructions/>");
        } else {
            self.out.push_str("<instructions>");
            for step in product.steps() {
                self.newline(3);
                self.step(step)?;
            }
            self.newline(2);
            self.out.push_str("</instructions>");
        }

        self.newline(1);
        self.out.push_str("</product>");
        Ok(())
    }

    fn step(&mut self, step: &Step) -> Result<(), EncodeError> {
        let kind = step.kind().as_str();
        match step {
            Step::Text { body } => self.text_element("step", &[("type", kind)], body, "step text"),
            Step::Title { heading } => {
                self.text_element("step", &[("type", kind)], heading, "step title")
            }
            Step::Video { video_id } => self.text_element(
                "step",
                &[("type", kind), ("videoId", video_id)],
                "",
                "video id",
            ),
        }
    }

    /// Writes `<name attrs>text</name>`, or `<name attrs/>` when `text` is
    /// empty. `field` names what the text and attribute values hold.
    fn text_element(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
        text: &str,
        field: &'static str,
    ) -> Result<(), EncodeError> {
        self.out.push('<');
        self.out.push_str(name);
        for (attr, value) in attrs {
            self.out.push(' ');
            self.out.push_str(attr);
            self.out.push_str("=\"");
            self.escaped_attr(value, field)?;
            self.out.push('"');
        }
        if text.is_empty() {
            self.out.push_str("/>");
            return Ok(());
        }
        self.out.push('>');
        self.check(text, field)?;
        write_escaped_text(self.out, text);
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
        Ok(())
    }

    fn escaped_attr(&mut self, value: &str, field: &'static str) -> Result<(), EncodeError> {
        self.check(value, field)?;
        write_escaped_attr(self.out, value);
        Ok(())
    }

    fn check(&self, s: &str, field: &'static str) -> Result<(), EncodeError> {
        match s.chars().find(|&c| !is_xml_char(c)) {
            Some(character) => Err(EncodeError {
                character,
                field,
                product_id: self.product_id.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn newline(&mut self, level: usize) {
        newline(self.out, self.options, level);
    }
}

fn newline(out: &mut String, options: &SerializeOptions, level: usize) {
    if options.indent {
        out.push('\n');
        for _ in 0..level {
            out.push_str(&options.indent_str);
        }
    }
}

/// Escapes text content. Input must already be checked with `is_xml_char`.
///
/// - `<`, `>`, `&` are escaped with named entity references
/// - `\r` is encoded as `&#13;` so it survives line-ending normalization
/// - `\t` and `\n` are passed through
fn write_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(ch),
        }
    }
}

/// Escapes attribute values. Input must already be checked with
/// `is_xml_char`.
///
/// Whitespace other than the space character is written as a character
/// reference, since attribute-value normalization would turn it into a
/// space on the way back in.
fn write_escaped_attr(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(ch),
        }
    }
}
