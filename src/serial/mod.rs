//! Catalog serialization.
//!
//! This module writes a decoded catalog back to document text. Output
//! follows the catalog schema exactly, so encoding and then decoding yields
//! the same products.

pub mod xml;

pub use xml::{encode, encode_products, encode_with_options, EncodeError, SerializeOptions};
