//! # buildwell
//!
//! Decoder for product assembly-instruction catalogs.
//!
//! A catalog document lists products, each with a name and an ordered
//! sequence of steps: paragraphs of text, section titles, and embedded
//! videos identified by an opaque id. The decoder makes one forward pass
//! over the document with a pull reader and returns the products in
//! document order.
//!
//! ## Quick Start
//!
//! ```
//! use buildwell::{bundle, Step};
//!
//! let catalog = bundle::load().unwrap();
//! let chair = catalog.find_by_id("chair").unwrap();
//! assert_eq!(chair.name(), "Chair");
//!
//! for step in chair.steps() {
//!     match step {
//!         Step::Title { heading } => println!("## {heading}"),
//!         Step::Text { body } => println!("{body}"),
//!         Step::Video { video_id } => println!("(video {video_id})"),
//!     }
//! }
//! ```

pub mod bundle;
pub mod catalog;
pub mod encoding;
pub mod error;
pub mod model;
pub mod parser;
pub mod reader;
pub mod serial;

// Re-export primary types at the crate root for convenience.
pub use catalog::{decode, decode_file, decode_str, decode_with_options, find_by_id, Catalog};
pub use error::{CatalogError, Diagnostic, DiagnosticKind, SourceLocation};
pub use model::{Product, Step, StepKind};
pub use parser::ParseOptions;
