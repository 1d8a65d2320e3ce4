//! Untyped and typed device building blocks.

use virtxml_core::accessors::AttributeValue;
use virtxml_core::{BindError, XmlBase};
use virtxml_doc::{serialize, Element};

use crate::DeviceError;

/// A device with a fixed tag and no `type` discriminant: a document
/// handle rooted at `<tag/>`.
#[derive(Debug)]
pub struct UntypedDevice {
    device_tag: String,
    base: XmlBase,
}

impl UntypedDevice {
    /// A fresh `<tag/>` document.
    pub fn new(device_tag: &str) -> Result<Self, DeviceError> {
        let mut base = XmlBase::new();
        base.set_xml(&format!("<{device_tag}/>"))?;
        Ok(UntypedDevice {
            device_tag: device_tag.to_string(),
            base,
        })
    }

    /// Adopt an existing element as this device's document.
    pub fn from_element(device_tag: &str, element: &Element) -> Result<Self, DeviceError> {
        if element.tag() != device_tag {
            return Err(DeviceError::TagMismatch {
                expected: device_tag.to_string(),
                actual: element.tag().to_string(),
            });
        }
        let xml = serialize(element).map_err(BindError::from)?;
        let mut base = XmlBase::new();
        base.set_xml(&xml)?;
        Ok(UntypedDevice {
            device_tag: device_tag.to_string(),
            base,
        })
    }

    pub fn device_tag(&self) -> &str {
        &self.device_tag
    }

    pub fn base(&self) -> &XmlBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut XmlBase {
        &mut self.base
    }

    /// Detached copy of the device's root element, for embedding into a
    /// parent document.
    pub fn to_element(&self) -> Result<Element, DeviceError> {
        Ok(self.base.document()?.root().clone())
    }

    pub fn to_xml_string(&self) -> Result<String, DeviceError> {
        Ok(self.base.to_xml_string()?)
    }
}

/// A device whose root carries a plain `type` attribute (serial
/// type='pty', interface type='bridge', …) with no variant gating.
#[derive(Debug)]
pub struct TypedDevice {
    inner: UntypedDevice,
}

impl TypedDevice {
    pub fn new(device_tag: &str) -> Result<Self, DeviceError> {
        Ok(TypedDevice {
            inner: UntypedDevice::new(device_tag)?,
        })
    }

    /// A fresh device with the `type` attribute already bound.
    pub fn with_type(device_tag: &str, type_name: &str) -> Result<Self, DeviceError> {
        let mut device = TypedDevice::new(device_tag)?;
        device.set_type_name(type_name)?;
        Ok(device)
    }

    pub fn from_element(device_tag: &str, element: &Element) -> Result<Self, DeviceError> {
        Ok(TypedDevice {
            inner: UntypedDevice::from_element(device_tag, element)?,
        })
    }

    fn binding(&self) -> AttributeValue<'_> {
        AttributeValue::new("type_name", "/", &self.inner.device_tag, "type")
    }

    pub fn type_name(&self) -> Result<String, DeviceError> {
        Ok(self.binding().get(self.inner.base.document()?)?)
    }

    pub fn set_type_name(&mut self, value: &str) -> Result<(), DeviceError> {
        let binding = AttributeValue::new("type_name", "/", &self.inner.device_tag, "type");
        Ok(binding.set(self.inner.base.document_mut()?, value)?)
    }

    pub fn del_type_name(&mut self) -> Result<(), DeviceError> {
        let binding = AttributeValue::new("type_name", "/", &self.inner.device_tag, "type");
        Ok(binding.del(self.inner.base.document_mut()?)?)
    }

    pub fn device(&self) -> &UntypedDevice {
        &self.inner
    }

    pub fn device_mut(&mut self) -> &mut UntypedDevice {
        &mut self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use virtxml_doc::parse;

    #[test]
    fn untyped_device_starts_empty() {
        let device = UntypedDevice::new("emulator").expect("new device");
        assert_eq!(device.device_tag(), "emulator");
        let xml = device.to_xml_string().expect("serialize");
        assert!(xml.contains("<emulator/>"));
    }

    #[test]
    fn from_element_requires_matching_tag() {
        let element = parse("<disk type='file'/>").expect("parse disk");
        let device = UntypedDevice::from_element("disk", &element).expect("adopt disk");
        assert_eq!(device.to_element().expect("element").attr("type"), Some("file"));

        let err = UntypedDevice::from_element("interface", &element).unwrap_err();
        assert!(matches!(err, DeviceError::TagMismatch { .. }));
    }

    #[test]
    fn typed_device_type_attribute() {
        let mut serial = TypedDevice::with_type("serial", "pty").expect("serial");
        assert_eq!(serial.type_name().expect("type"), "pty");
        serial.set_type_name("tcp").expect("retype");
        assert_eq!(serial.type_name().expect("type"), "tcp");
        serial.del_type_name().expect("delete type");
        let err = serial.type_name().unwrap_err();
        assert!(err.is_not_found());
    }
}
