//! Device address: a discriminated union over the `type` attribute.
//!
//! Each address type legalizes its own subset of a fixed attribute
//! universe. The legal sets are static data; what changes at runtime is
//! the capability map consulted before every attribute operation, rebuilt
//! whenever the discriminant changes. Switching the discriminant purges
//! previously stored attribute data, so no stale value ever survives a
//! variant change.

use std::collections::HashMap;

use tracing::debug;
use virtxml_core::accessors::AttributeValue;
use virtxml_core::{BindError, Ops};
use virtxml_doc::Element;

use crate::base::UntypedDevice;
use crate::DeviceError;

/// Every attribute any address variant may carry.
pub const ATTRIBUTE_UNIVERSE: &[&str] = &[
    "domain",
    "bus",
    "slot",
    "function",
    "multifunction",
    "controller",
    "target",
    "unit",
    "port",
    "reg",
    "cssid",
    "ssid",
    "devno",
];

/// Known address discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressType {
    Pci,
    Drive,
    VirtioSerial,
    Ccid,
    Usb,
    SpaprVio,
    Ccw,
}

impl AddressType {
    pub const ALL: [AddressType; 7] = [
        AddressType::Pci,
        AddressType::Drive,
        AddressType::VirtioSerial,
        AddressType::Ccid,
        AddressType::Usb,
        AddressType::SpaprVio,
        AddressType::Ccw,
    ];

    /// The value written to the `type` attribute.
    pub fn name(self) -> &'static str {
        match self {
            AddressType::Pci => "pci",
            AddressType::Drive => "drive",
            AddressType::VirtioSerial => "virtio-serial",
            AddressType::Ccid => "ccid",
            AddressType::Usb => "usb",
            AddressType::SpaprVio => "spapr-vio",
            AddressType::Ccw => "ccw",
        }
    }

    pub fn from_name(name: &str) -> Option<AddressType> {
        AddressType::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// The attributes legal under this discriminant.
    pub fn attrs(self) -> &'static [&'static str] {
        match self {
            AddressType::Pci => &["domain", "bus", "slot", "function", "multifunction"],
            AddressType::Drive => &["controller", "bus", "target", "unit"],
            AddressType::VirtioSerial => &["controller", "bus", "slot"],
            AddressType::Ccid => &["bus", "slot"],
            AddressType::Usb => &["bus", "port"],
            AddressType::SpaprVio => &["reg"],
            AddressType::Ccw => &["cssid", "ssid", "devno"],
        }
    }

    pub fn can_have(self, attr: &str) -> bool {
        self.attrs().contains(&attr)
    }

    pub const KNOWN_NAMES: &'static [&'static str] = &[
        "pci",
        "drive",
        "virtio-serial",
        "ccid",
        "usb",
        "spapr-vio",
        "ccw",
    ];
}

fn capabilities(state: Option<AddressType>) -> HashMap<&'static str, Ops> {
    let mut caps = HashMap::with_capacity(ATTRIBUTE_UNIVERSE.len());
    for attr in ATTRIBUTE_UNIVERSE {
        caps.insert(*attr, Ops::empty());
    }
    if let Some(current) = state {
        for attr in current.attrs() {
            caps.insert(attr, Ops::all());
        }
    }
    caps
}

/// `<address/>` device entity.
///
/// Unbound (no discriminant) every attribute operation is forbidden;
/// bound, exactly the attributes legal under the current discriminant are
/// accessible.
#[derive(Debug)]
pub struct Address {
    inner: UntypedDevice,
    state: Option<AddressType>,
    caps: HashMap<&'static str, Ops>,
}

impl Address {
    /// A fresh `<address/>` with no discriminant bound.
    pub fn new() -> Result<Self, DeviceError> {
        Ok(Address {
            inner: UntypedDevice::new("address")?,
            state: None,
            caps: capabilities(None),
        })
    }

    /// A fresh address bound to the given discriminant.
    pub fn with_type(address_type: AddressType) -> Result<Self, DeviceError> {
        let mut address = Address::new()?;
        address.set_discriminant(address_type)?;
        Ok(address)
    }

    /// Adopt an existing `<address …/>` element, reading the discriminant
    /// from its `type` attribute. Stored attribute data is preserved.
    pub fn from_element(element: &Element) -> Result<Self, DeviceError> {
        let state = match element.attr("type") {
            Some(name) => Some(AddressType::from_name(name).ok_or_else(|| {
                DeviceError::UnknownDiscriminant {
                    given: name.to_string(),
                    known: AddressType::KNOWN_NAMES,
                }
            })?),
            None => None,
        };
        Ok(Address {
            inner: UntypedDevice::from_element("address", element)?,
            caps: capabilities(state),
            state,
        })
    }

    /// Reload an address from serialized XML text.
    pub fn from_xml(xml: &str) -> Result<Self, DeviceError> {
        let root = virtxml_doc::parse(xml).map_err(BindError::from)?;
        Address::from_element(&root)
    }

    pub fn discriminant(&self) -> Option<AddressType> {
        self.state
    }

    pub fn device(&self) -> &UntypedDevice {
        &self.inner
    }

    /// Bind (or rebind) the discriminant.
    ///
    /// A rebind purges every universe attribute from the document before
    /// the new capability set takes effect, so data stored under the old
    /// discriminant never leaks into the new one. Rebinding to the
    /// current discriminant is a no-op.
    pub fn set_discriminant(&mut self, address_type: AddressType) -> Result<(), DeviceError> {
        if self.state == Some(address_type) {
            return Ok(());
        }
        let doc = self.inner.base_mut().document_mut()?;
        let root = doc.root_mut();
        let mut purged = 0usize;
        for attr in ATTRIBUTE_UNIVERSE {
            if root.remove_attr(attr).is_some() {
                purged += 1;
            }
        }
        root.set_attr("type", address_type.name());
        doc.write().map_err(BindError::from)?;
        self.caps = capabilities(Some(address_type));
        self.state = Some(address_type);
        debug!(
            discriminant = address_type.name(),
            purged, "bound address discriminant"
        );
        Ok(())
    }

    /// Bind the discriminant from its string form.
    pub fn set_discriminant_name(&mut self, name: &str) -> Result<(), DeviceError> {
        let address_type =
            AddressType::from_name(name).ok_or_else(|| DeviceError::UnknownDiscriminant {
                given: name.to_string(),
                known: AddressType::KNOWN_NAMES,
            })?;
        self.set_discriminant(address_type)
    }

    /// Unbind the discriminant: purge every universe attribute and the
    /// `type` attribute itself; all attribute operations become forbidden.
    pub fn del_discriminant(&mut self) -> Result<(), DeviceError> {
        let doc = self.inner.base_mut().document_mut()?;
        let root = doc.root_mut();
        for attr in ATTRIBUTE_UNIVERSE {
            root.remove_attr(attr);
        }
        root.remove_attr("type");
        doc.write().map_err(BindError::from)?;
        self.caps = capabilities(None);
        self.state = None;
        debug!("unbound address discriminant");
        Ok(())
    }

    fn capability(&self, attr: &str, op: Ops, operation: &'static str) -> Result<(), DeviceError> {
        let allowed = self.caps.get(attr).copied().unwrap_or(Ops::empty());
        if !allowed.contains(op) {
            return Err(DeviceError::Bind(BindError::Forbidden {
                operation,
                property: attr.to_string(),
            }));
        }
        Ok(())
    }

    pub fn get_attr(&self, attr: &str) -> Result<String, DeviceError> {
        self.capability(attr, Ops::GET, "get")?;
        let doc = self.inner.base().document()?;
        Ok(AttributeValue::new(attr, "/", "address", attr).get(doc)?)
    }

    pub fn set_attr(&mut self, attr: &str, value: &str) -> Result<(), DeviceError> {
        self.capability(attr, Ops::SET, "set")?;
        let doc = self.inner.base_mut().document_mut()?;
        AttributeValue::new(attr, "/", "address", attr).set(doc, value)?;
        Ok(())
    }

    pub fn del_attr(&mut self, attr: &str) -> Result<(), DeviceError> {
        self.capability(attr, Ops::DEL, "del")?;
        let doc = self.inner.base_mut().document_mut()?;
        AttributeValue::new(attr, "/", "address", attr).del(doc)?;
        Ok(())
    }

    pub fn to_xml_string(&self) -> Result<String, DeviceError> {
        self.inner.to_xml_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pci_address() -> Address {
        let mut address = Address::with_type(AddressType::Pci).expect("pci address");
        address.set_attr("domain", "0x0000").expect("domain");
        address.set_attr("bus", "0x00").expect("bus");
        address.set_attr("slot", "0x0a").expect("slot");
        address.set_attr("function", "0x0").expect("function");
        address
    }

    #[test]
    fn unbound_address_forbids_everything() {
        let mut address = Address::new().expect("new address");
        for attr in ATTRIBUTE_UNIVERSE {
            assert!(address.get_attr(attr).unwrap_err().is_forbidden());
            assert!(address.set_attr(attr, "1").unwrap_err().is_forbidden());
            assert!(address.del_attr(attr).unwrap_err().is_forbidden());
        }
    }

    #[test]
    fn pci_roundtrip_through_serialized_text() {
        let address = pci_address();
        let xml = address.to_xml_string().expect("serialize");
        let reloaded = Address::from_xml(&xml).expect("reload");
        assert_eq!(reloaded.discriminant(), Some(AddressType::Pci));
        assert_eq!(reloaded.get_attr("domain").expect("domain"), "0x0000");
        assert_eq!(reloaded.get_attr("slot").expect("slot"), "0x0a");
    }

    #[test]
    fn discriminant_exclusivity() {
        let mut address = pci_address();
        address
            .set_discriminant(AddressType::Usb)
            .expect("switch to usb");
        assert!(address.get_attr("domain").unwrap_err().is_forbidden());
        assert!(address.set_attr("slot", "0x1").unwrap_err().is_forbidden());
        address.set_attr("port", "1").expect("usb port is legal");
        assert_eq!(address.get_attr("port").expect("port"), "1");
        // Legal-but-unset attributes miss with NotFound, not Forbidden.
        assert!(address.get_attr("bus").unwrap_err().is_not_found());
    }

    #[test]
    fn discriminant_switch_purges_state() {
        let mut address = pci_address();
        address
            .set_discriminant(AddressType::Usb)
            .expect("switch away");
        address
            .set_discriminant(AddressType::Pci)
            .expect("switch back");
        // Legal again, but freshly unset rather than the stored value.
        let err = address.get_attr("slot").unwrap_err();
        assert!(err.is_not_found());
        // Shared attribute names do not leak across variants either.
        let err = address.get_attr("bus").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn rebinding_same_discriminant_is_a_noop() {
        let mut address = pci_address();
        address
            .set_discriminant(AddressType::Pci)
            .expect("same discriminant");
        assert_eq!(address.get_attr("domain").expect("kept"), "0x0000");
    }

    #[test]
    fn delete_discriminant_unbinds() {
        let mut address = pci_address();
        address.del_discriminant().expect("unbind");
        assert_eq!(address.discriminant(), None);
        assert!(address.get_attr("domain").unwrap_err().is_forbidden());
        let xml = address.to_xml_string().expect("serialize");
        assert!(!xml.contains("type="), "type attribute purged");
        assert!(!xml.contains("domain"), "stored attributes purged");
    }

    #[test]
    fn forbidden_set_leaves_document_untouched() {
        let mut address = pci_address();
        address.set_discriminant(AddressType::Usb).expect("usb");
        let before = address.to_xml_string().expect("before");
        assert!(address
            .set_attr("domain", "0x0001")
            .unwrap_err()
            .is_forbidden());
        let after = address.to_xml_string().expect("after");
        assert_eq!(before, after);
    }

    #[test]
    fn unknown_discriminant_names_are_rejected() {
        let mut address = Address::new().expect("new address");
        let err = address.set_discriminant_name("isa").unwrap_err();
        assert!(matches!(err, DeviceError::UnknownDiscriminant { .. }));
        let err = Address::from_xml("<address type='mmio'/>").unwrap_err();
        assert!(matches!(err, DeviceError::UnknownDiscriminant { .. }));
    }

    #[test]
    fn adopting_an_element_preserves_attributes() {
        let root =
            virtxml_doc::parse("<address type='ccw' cssid='0xfe' ssid='0x0' devno='0x0001'/>")
                .expect("parse ccw");
        let address = Address::from_element(&root).expect("adopt");
        assert_eq!(address.discriminant(), Some(AddressType::Ccw));
        assert_eq!(address.get_attr("devno").expect("devno"), "0x0001");
        assert!(address.get_attr("slot").unwrap_err().is_forbidden());
    }
}
