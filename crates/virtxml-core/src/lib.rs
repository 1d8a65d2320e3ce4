//! Declarative binding between XML documents and typed properties.
//!
//! Each property of an entity is described once by a static
//! [`PropertySchema`] naming its location in the tree and its accessor
//! kind; a single generic dispatcher ([`XmlEntity`]) turns that table into
//! a uniform get/set/delete contract. The per-kind bindings in
//! [`accessors`] can also be used directly when a caller knows the
//! location it wants.
//!
//! Every successful mutation is write-through: the owning document is
//! persisted to its backing file before the call returns.

use std::collections::HashMap;

use bitflags::bitflags;
use thiserror::Error;
use virtxml_doc::XmlError;

pub mod accessors;
pub mod entity;
pub mod schema;
pub mod validate;

pub use accessors::{
    AttributeValue, ElementDict, ElementInt, ElementList, ElementNest, ElementText, MarshalPair,
    Radix,
};
pub use entity::{XmlBase, XmlEntity};
pub use schema::{PropertySchema, PropertyValue, SchemaKind};
pub use validate::Validator;

/// Attribute name/value map handed to and from dict and list accessors.
pub type AttrDict = HashMap<String, String>;

bitflags! {
    /// Accessor operations, used as a forbidden-operation mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Ops: u8 {
        const GET = 0b001;
        const SET = 0b010;
        const DEL = 0b100;
    }
}

/// Error type produced by accessor and entity operations.
#[derive(Debug, Error)]
pub enum BindError {
    /// Strict, non-creating lookup found nothing at the bound location.
    #[error("{operation} on '{property}': {what} not present")]
    NotFound {
        operation: &'static str,
        property: String,
        what: String,
    },
    /// A setter value does not satisfy the accessor kind's type contract.
    #[error("type mismatch for '{property}': expected {expected}")]
    TypeMismatch {
        property: String,
        expected: &'static str,
    },
    /// The operation is not permitted for this property in its current state.
    #[error("{operation} on '{property}' forbidden")]
    Forbidden {
        operation: &'static str,
        property: String,
    },
    /// Stored text cannot be parsed per the declared semantics.
    #[error("malformed value for '{property}' at '{parent}/{tag}': {text:?} does not parse with radix {radix}")]
    Malformed {
        property: String,
        parent: String,
        tag: String,
        text: String,
        radix: u32,
    },
    /// A required ancestor cannot be located or created under the
    /// restricted single-segment creation rule.
    #[error("{operation} on '{property}': {detail}")]
    Structural {
        operation: &'static str,
        property: String,
        detail: String,
    },
    /// The entity has no document loaded.
    #[error("no xml document loaded")]
    NotLoaded,
    /// The property name is not part of the entity's schema.
    #[error("unknown property: {0}")]
    UnknownProperty(String),
    /// The external schema validator could not be run.
    #[error("validator: {0}")]
    Validator(String),
    /// Underlying document failure.
    #[error(transparent)]
    Doc(#[from] XmlError),
}
