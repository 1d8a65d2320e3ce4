//! Device entities for libvirt-style documents.
//!
//! Devices compose a [`virtxml_core::XmlBase`] document handle with a
//! small capability surface instead of inheriting behavior: an
//! [`UntypedDevice`] is a tag plus a document, a [`TypedDevice`] adds the
//! `type` attribute, and [`Address`] is the discriminated union whose
//! legal attribute set follows its discriminant at runtime. The
//! [`librarian`] registry resolves device tags to classes so
//! heterogeneous device collections can be rebuilt polymorphically.

use thiserror::Error;
use virtxml_core::BindError;

pub mod address;
pub mod base;
pub mod character;
pub mod librarian;

pub use address::{Address, AddressType};
pub use base::{TypedDevice, UntypedDevice};
pub use character::Character;
pub use librarian::{parse_device_list, Device, DeviceClass};

/// Error type produced by device construction and variant operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Underlying accessor failure.
    #[error(transparent)]
    Bind(#[from] BindError),
    /// The discriminant value names no known address variant.
    #[error("address type '{given}' is not one of {known:?}")]
    UnknownDiscriminant {
        given: String,
        known: &'static [&'static str],
    },
    /// The librarian has no class registered for the name.
    #[error("no device support for '{0}'")]
    NotSupported(String),
    /// An element was offered to a device with a different tag.
    #[error("device tag mismatch: expected '{expected}', element has '{actual}'")]
    TagMismatch { expected: String, actual: String },
}

impl DeviceError {
    /// True when the underlying failure is a capability rejection.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, DeviceError::Bind(BindError::Forbidden { .. }))
    }

    /// True when the underlying failure is a strict-get miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DeviceError::Bind(BindError::NotFound { .. }))
    }
}
