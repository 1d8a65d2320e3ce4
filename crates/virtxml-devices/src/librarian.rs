//! Tag-to-class registry for polymorphic device collections.

use tracing::debug;
use virtxml_doc::Element;

use crate::address::Address;
use crate::base::UntypedDevice;
use crate::character::{Character, CHARACTER_TAGS};
use crate::DeviceError;

/// Names that can never name a device class.
const RESERVED: &[&str] = &["base", "librarian"];

/// Device tags with a registered class.
const KNOWN_TAGS: &[&str] = &[
    "address",
    "channel",
    "console",
    "controller",
    "disk",
    "emulator",
    "filesystem",
    "graphics",
    "hostdev",
    "hub",
    "input",
    "interface",
    "memballoon",
    "memory",
    "parallel",
    "redirdev",
    "rng",
    "serial",
    "smartcard",
    "sound",
    "video",
    "watchdog",
];

/// The concrete class a device tag resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceClass {
    tag: &'static str,
}

impl DeviceClass {
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// A fresh, empty device of this class.
    pub fn instantiate(&self) -> Result<Device, DeviceError> {
        if self.tag == "address" {
            return Ok(Device::Address(Address::new()?));
        }
        if CHARACTER_TAGS.contains(&self.tag) {
            return Ok(Device::Character(Character::new(self.tag)?));
        }
        Ok(Device::Untyped(UntypedDevice::new(self.tag)?))
    }

    /// A device of this class adopting an existing element.
    pub fn from_element(&self, element: &Element) -> Result<Device, DeviceError> {
        if self.tag == "address" {
            return Ok(Device::Address(Address::from_element(element)?));
        }
        if CHARACTER_TAGS.contains(&self.tag) {
            return Ok(Device::Character(Character::from_element(self.tag, element)?));
        }
        Ok(Device::Untyped(UntypedDevice::from_element(self.tag, element)?))
    }
}

/// Resolve a device-tag string to its implementing class.
///
/// Unknown tags, reserved names, and strings that cannot be element tags
/// at all are rejected with [`DeviceError::NotSupported`].
pub fn get(name: &str) -> Result<DeviceClass, DeviceError> {
    let looks_like_tag = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !looks_like_tag || RESERVED.contains(&name) {
        return Err(DeviceError::NotSupported(name.to_string()));
    }
    KNOWN_TAGS
        .iter()
        .copied()
        .find(|tag| *tag == name)
        .map(|tag| DeviceClass { tag })
        .ok_or_else(|| DeviceError::NotSupported(name.to_string()))
}

/// One device of any registered class.
#[derive(Debug)]
pub enum Device {
    Address(Address),
    Character(Character),
    Untyped(UntypedDevice),
}

impl Device {
    pub fn device_tag(&self) -> &str {
        match self {
            Device::Address(_) => "address",
            Device::Character(character) => character.device_tag(),
            Device::Untyped(device) => device.device_tag(),
        }
    }

    pub fn to_element(&self) -> Result<Element, DeviceError> {
        match self {
            Device::Address(address) => address.device().to_element(),
            Device::Character(character) => character.typed().device().to_element(),
            Device::Untyped(device) => device.to_element(),
        }
    }

    pub fn to_xml_string(&self) -> Result<String, DeviceError> {
        match self {
            Device::Address(address) => address.to_xml_string(),
            Device::Character(character) => character.to_xml_string(),
            Device::Untyped(device) => device.to_xml_string(),
        }
    }
}

/// Rebuild a heterogeneous device collection from a parent element
/// (typically `<devices>`), in document order.
pub fn parse_device_list(parent: &Element) -> Result<Vec<Device>, DeviceError> {
    let mut devices = Vec::with_capacity(parent.children().len());
    for child in parent.children() {
        let class = get(child.tag())?;
        devices.push(class.from_element(child)?);
    }
    debug!(count = devices.len(), "rebuilt device collection");
    Ok(devices)
}
