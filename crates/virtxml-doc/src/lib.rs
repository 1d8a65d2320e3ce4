//! Local XML documents as mutable trees with a temp-file backing store.
//!
//! A [`XmlDocument`] pairs an owned [`Element`] tree with a named temporary
//! file holding its serialized form. Lookup uses bounded `/`-separated tag
//! paths, never a general XPath engine, and element creation is restricted
//! to the final path segment.

use thiserror::Error;

mod document;
mod element;

pub use document::XmlDocument;
pub use element::{parse, serialize, Element};

/// Error type produced by document parsing, lookup, and persistence.
#[derive(Debug, Error)]
pub enum XmlError {
    /// The input text is not well-formed XML.
    #[error("xml: {0}")]
    Parse(String),
    /// Reading or writing the backing file failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    /// A path segment other than the last one does not exist.
    #[error("path not found: {0}")]
    PathNotFound(String),
}
