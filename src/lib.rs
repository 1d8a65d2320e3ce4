//! High level facade re-exporting the virtxml workspace crates.
//!
//! The workspace binds libvirt-style XML documents to typed, mutable
//! objects: [`doc`] owns the tree-and-temp-file document layer,
//! [`binding`] the schema-driven accessors and entity base, and
//! [`devices`] the typed device variants and the librarian registry.
//!
//! ```rust
//! use virtxml_rs::devices::{Address, AddressType};
//!
//! # fn run() -> Result<(), virtxml_rs::devices::DeviceError> {
//! let mut address = Address::with_type(AddressType::Pci)?;
//! address.set_attr("domain", "0x0000")?;
//! address.set_attr("slot", "0x0a")?;
//! let xml = address.to_xml_string()?;
//! let reloaded = Address::from_xml(&xml)?;
//! assert_eq!(reloaded.get_attr("slot")?, "0x0a");
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```
//!
//! ```rust
//! use virtxml_rs::devices::librarian;
//!
//! # fn run() -> Result<(), virtxml_rs::devices::DeviceError> {
//! let devices_el = virtxml_rs::doc::parse(
//!     "<devices><disk type='file'/><interface type='bridge'/></devices>",
//! ).map_err(virtxml_rs::binding::BindError::from)?;
//! let devices = librarian::parse_device_list(&devices_el)?;
//! assert_eq!(devices.len(), 2);
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```

pub use virtxml_core as binding;
pub use virtxml_devices as devices;
pub use virtxml_doc as doc;

pub use virtxml_core::{BindError, PropertySchema, PropertyValue, XmlBase, XmlEntity};
pub use virtxml_devices::{Address, AddressType, Device, DeviceError};
pub use virtxml_doc::{Element, XmlDocument};
