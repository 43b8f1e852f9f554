//! Decoding of product catalog documents.
//!
//! A catalog document lists products together with their assembly
//! instructions:
//!
//! ```xml
//! <products>
//!   <product id="chair">
//!     <name>Chair</name>
//!     <instructions>
//!       <step type="title">Setup</step>
//!       <step type="text">Attach legs</step>
//!       <step type="video" videoId="abc123"/>
//!     </instructions>
//!   </product>
//! </products>
//! ```
//!
//! Decoding is a single forward pass over an [`XmlReader`]; no document
//! tree is built. Elements the decoder does not know are skipped together
//! with their subtree, so a document may carry extra markup. Any structural
//! failure aborts the decode and no partial catalog is returned.
//!
//! # Examples
//!
//! ```
//! use buildwell::catalog::decode_str;
//! use buildwell::model::Step;
//!
//! let catalog = decode_str(
//!     r#"<products>
//!          <product id="chair">
//!            <name>Chair</name>
//!            <instructions><step type="text">Attach legs</step></instructions>
//!          </product>
//!        </products>"#,
//! ).unwrap();
//!
//! let chair = catalog.find_by_id("chair").unwrap();
//! assert_eq!(chair.name(), "Chair");
//! assert_eq!(chair.steps(), [Step::text("Attach legs")]);
//! assert!(catalog.find_by_id("table").is_none());
//! ```

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::encoding::decode_to_utf8;
use crate::error::{CatalogError, Diagnostic, DiagnosticKind, SourceLocation};
use crate::model::{Product, Step, StepKind};
use crate::parser::ParseOptions;
use crate::reader::{NodeType, XmlReader};

const PRODUCTS: &str = "products";
const PRODUCT: &str = "product";
const NAME: &str = "name";
const INSTRUCTIONS: &str = "instructions";
const STEP: &str = "step";

const ATTR_ID: &str = "id";
const ATTR_TYPE: &str = "type";
const ATTR_VIDEO_ID: &str = "videoId";

/// A decoded catalog: the products in document order plus any warnings
/// raised while decoding them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    products: Vec<Product>,
    diagnostics: Vec<Diagnostic>,
}

impl Catalog {
    /// Creates an empty catalog.
    ///
    /// # Examples
    ///
    /// ```
    /// use buildwell::catalog::Catalog;
    ///
    /// let catalog = Catalog::new();
    /// assert!(catalog.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the first product whose id equals `id`.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<&Product> {
        find_by_id(&self.products, id)
    }

    /// Returns the product ids in document order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.products.iter().map(Product::id)
    }

    /// Returns the number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Returns `true` if the catalog has no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Returns an iterator over the products in document order.
    pub fn iter(&self) -> std::slice::Iter<'_, Product> {
        self.products.iter()
    }

    /// Returns the products in document order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Returns the warnings recorded while decoding.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consumes the catalog, returning its products.
    #[must_use]
    pub fn into_products(self) -> Vec<Product> {
        self.products
    }
}

impl From<Vec<Product>> for Catalog {
    fn from(products: Vec<Product>) -> Self {
        Self {
            products,
            diagnostics: Vec::new(),
        }
    }
}

impl FromIterator<Product> for Catalog {
    fn from_iter<I: IntoIterator<Item = Product>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl IntoIterator for Catalog {
    type Item = Product;
    type IntoIter = std::vec::IntoIter<Product>;

    fn into_iter(self) -> Self::IntoIter {
        self.products.into_iter()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Product;
    type IntoIter = std::slice::Iter<'a, Product>;

    fn into_iter(self) -> Self::IntoIter {
        self.products.iter()
    }
}

/// Returns the first product in `products` whose id equals `id`.
///
/// This is a linear scan; with duplicate ids the earliest product wins.
#[must_use]
pub fn find_by_id<'a>(products: &'a [Product], id: &str) -> Option<&'a Product> {
    products.iter().find(|product| product.id() == id)
}

/// Decodes a catalog from a byte stream with default options.
///
/// The stream is consumed and dropped before this function returns, on
/// success and on failure alike.
///
/// # Errors
///
/// - [`CatalogError::Malformed`] if the document is not well-formed, is not
///   valid in its encoding, or does not follow the catalog schema.
/// - [`CatalogError::Io`] if the stream cannot be read to the end.
/// - [`CatalogError::Unexpected`] if a resource limit is exceeded.
pub fn decode<R: Read>(input: R) -> Result<Catalog, CatalogError> {
    decode_with_options(input, &ParseOptions::default())
}

/// Decodes a catalog from a byte stream with the given options.
///
/// # Errors
///
/// See [`decode`].
pub fn decode_with_options<R: Read>(
    input: R,
    options: &ParseOptions,
) -> Result<Catalog, CatalogError> {
    let bytes = read_limited(input, options.max_document_size)?;
    let text = decode_to_utf8(&bytes)?;
    decode_text(&text, options)
}

/// Decodes a catalog from an in-memory string with default options.
///
/// # Errors
///
/// See [`decode`]. No I/O happens, so [`CatalogError::Io`] is never returned.
pub fn decode_str(text: &str) -> Result<Catalog, CatalogError> {
    let options = ParseOptions::default();
    check_document_size(text.len(), options.max_document_size)?;
    decode_text(text.strip_prefix('\u{FEFF}').unwrap_or(text), &options)
}

/// Opens the file at `path` and decodes it with default options.
///
/// # Errors
///
/// Returns [`CatalogError::Io`] if the file cannot be opened or read, and
/// otherwise behaves like [`decode`].
pub fn decode_file(path: impl AsRef<Path>) -> Result<Catalog, CatalogError> {
    let file = File::open(path)?;
    decode(file)
}

fn read_limited<R: Read>(input: R, max: usize) -> Result<Vec<u8>, CatalogError> {
    let mut bytes = Vec::new();
    let cap = u64::try_from(max).unwrap_or(u64::MAX).saturating_add(1);
    input.take(cap).read_to_end(&mut bytes)?;
    check_document_size(bytes.len(), max)?;
    Ok(bytes)
}

fn check_document_size(len: usize, max: usize) -> Result<(), CatalogError> {
    if len > max {
        return Err(CatalogError::Unexpected(format!(
            "document size limit exceeded ({max} bytes)"
        )));
    }
    Ok(())
}

fn decode_text(text: &str, options: &ParseOptions) -> Result<Catalog, CatalogError> {
    CatalogDecoder::new(XmlReader::with_options(text, options)).run()
}

/// Drives the reader through the catalog schema.
struct CatalogDecoder<'a> {
    reader: XmlReader<'a>,
    diagnostics: Vec<Diagnostic>,
    seen_ids: HashSet<String>,
}

impl<'a> CatalogDecoder<'a> {
    fn new(reader: XmlReader<'a>) -> Self {
        Self {
            reader,
            diagnostics: Vec::new(),
            seen_ids: HashSet::new(),
        }
    }

    fn run(mut self) -> Result<Catalog, CatalogError> {
        self.reader.next_tag()?;
        self.reader.require(NodeType::StartElement, Some(PRODUCTS))?;

        let mut products = Vec::new();
        while self.next_child()? {
            if self.reader.name() == PRODUCT {
                products.push(self.read_product()?);
            } else {
                self.reader.skip_subtree()?;
            }
        }
        self.reader.require(NodeType::EndElement, Some(PRODUCTS))?;
        self.reader.finish()?;

        Ok(Catalog {
            products,
            diagnostics: self.diagnostics,
        })
    }

    /// Advances to the next child start tag of the current element.
    ///
    /// Returns `false` once the current element's end tag is reached. Text
    /// between children is ignored.
    fn next_child(&mut self) -> Result<bool, CatalogError> {
        loop {
            match self.reader.read()? {
                NodeType::StartElement => return Ok(true),
                NodeType::EndElement => return Ok(false),
                NodeType::Text => {}
                NodeType::None | NodeType::EndDocument => {
                    return Err(CatalogError::Malformed {
                        message: "unexpected end of document".to_string(),
                        location: self.reader.location(),
                    });
                }
            }
        }
    }

    fn read_product(&mut self) -> Result<Product, CatalogError> {
        let location = self.reader.location();
        let id = self.reader.attribute(ATTR_ID).unwrap_or_default().to_string();
        self.note_id(&id, location);

        let mut name = String::new();
        let mut steps = Vec::new();
        while self.next_child()? {
            match self.reader.name() {
                NAME => name = self.reader.read_text()?,
                INSTRUCTIONS => steps = self.read_instructions()?,
                _ => self.reader.skip_subtree()?,
            }
        }
        self.reader.require(NodeType::EndElement, Some(PRODUCT))?;
        Ok(Product::new(id, name, steps))
    }

    fn read_instructions(&mut self) -> Result<Vec<Step>, CatalogError> {
        let mut steps = Vec::new();
        while self.next_child()? {
            if self.reader.name() == STEP {
                if let Some(step) = self.read_step()? {
                    steps.push(step);
                }
            } else {
                self.reader.skip_subtree()?;
            }
        }
        self.reader.require(NodeType::EndElement, Some(INSTRUCTIONS))?;
        Ok(steps)
    }

    /// Reads one `step` element. Returns `None` for steps that are skipped.
    fn read_step(&mut self) -> Result<Option<Step>, CatalogError> {
        let location = self.reader.location();
        let step_type = self.reader.attribute(ATTR_TYPE).map(str::to_string);
        let video_id = self.reader.attribute(ATTR_VIDEO_ID).map(str::to_string);

        let Some(kind) = step_type.as_deref().and_then(StepKind::from_type_attribute) else {
            let message = match step_type {
                Some(t) => format!("step with unknown type '{t}' skipped"),
                None => "step without type skipped".to_string(),
            };
            self.warn(DiagnosticKind::UnknownStepType, message, location);
            self.reader.skip_subtree()?;
            return Ok(None);
        };

        let text = self.reader.read_text()?;
        let step = match kind {
            StepKind::Text => Some(Step::text(text)),
            StepKind::Title => Some(Step::title(text)),
            StepKind::Video => match video_id {
                Some(id) => Some(Step::video(id)),
                None => {
                    self.warn(
                        DiagnosticKind::MissingVideoId,
                        "video step without videoId dropped".to_string(),
                        location,
                    );
                    None
                }
            },
        };
        Ok(step)
    }

    fn note_id(&mut self, id: &str, location: SourceLocation) {
        if !self.seen_ids.insert(id.to_string()) {
            self.warn(
                DiagnosticKind::DuplicateId,
                format!("duplicate product id '{id}'"),
                location,
            );
        }
    }

    fn warn(&mut self, kind: DiagnosticKind, message: String, location: SourceLocation) {
        self.diagnostics.push(Diagnostic {
            kind,
            message,
            location,
        });
    }
}
