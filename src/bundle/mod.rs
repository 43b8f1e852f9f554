//! The product catalog shipped with the crate.
//!
//! The document is compiled into the binary, so opening it cannot fail.
//! [`open`] hands out a fresh stream over it for callers that want to drive
//! the decoder themselves; [`load`] decodes it in one step.

use std::io::Cursor;

use crate::catalog::{decode, Catalog};
use crate::error::CatalogError;

/// Raw bytes of the bundled `products.xml`.
pub const PRODUCTS_XML: &[u8] = include_bytes!("../../data/products.xml");

/// Opens a new stream over the bundled catalog document.
#[must_use]
pub fn open() -> Cursor<&'static [u8]> {
    Cursor::new(PRODUCTS_XML)
}

/// Decodes the bundled catalog.
///
/// # Errors
///
/// Returns `CatalogError` if the bundled document fails to decode.
pub fn load() -> Result<Catalog, CatalogError> {
    decode(open())
}
