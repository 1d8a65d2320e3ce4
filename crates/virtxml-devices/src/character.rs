//! Character devices: serial, parallel, channel, and console.
//!
//! All four share the same shape: a `type` attribute on the root plus
//! ordered `<source>` and `<target>` child lists, bound here through the
//! marshal-pair list accessor.

use virtxml_core::accessors::{ElementList, MarshalPair};
use virtxml_core::{AttrDict, BindError};
use virtxml_doc::Element;

use crate::base::TypedDevice;
use crate::DeviceError;

/// Tags a character device may carry.
pub const CHARACTER_TAGS: &[&str] = &["serial", "parallel", "channel", "console"];

fn source_from_native(item: &AttrDict, _index: usize) -> (String, AttrDict) {
    ("source".to_string(), item.clone())
}

fn target_from_native(item: &AttrDict, _index: usize) -> (String, AttrDict) {
    ("target".to_string(), item.clone())
}

fn attrs_to_native(_tag: &str, attrs: &AttrDict, _index: usize) -> Option<AttrDict> {
    Some(attrs.clone())
}

const SOURCES: MarshalPair = MarshalPair {
    from_native: source_from_native,
    to_native: attrs_to_native,
};

const TARGETS: MarshalPair = MarshalPair {
    from_native: target_from_native,
    to_native: attrs_to_native,
};

fn list(property: &'static str, tag: &'static str, marshal: MarshalPair) -> ElementList<'static> {
    ElementList::new(property, "/", tag, marshal)
}

/// One character device of any of the four tags.
#[derive(Debug)]
pub struct Character {
    inner: TypedDevice,
}

impl Character {
    pub fn new(device_tag: &str) -> Result<Self, DeviceError> {
        if !CHARACTER_TAGS.contains(&device_tag) {
            return Err(DeviceError::NotSupported(device_tag.to_string()));
        }
        Ok(Character {
            inner: TypedDevice::new(device_tag)?,
        })
    }

    /// A fresh device with the `type` attribute bound (e.g. serial "pty").
    pub fn with_type(device_tag: &str, type_name: &str) -> Result<Self, DeviceError> {
        let mut device = Character::new(device_tag)?;
        device.set_type_name(type_name)?;
        Ok(device)
    }

    pub fn from_element(device_tag: &str, element: &Element) -> Result<Self, DeviceError> {
        if !CHARACTER_TAGS.contains(&device_tag) {
            return Err(DeviceError::NotSupported(device_tag.to_string()));
        }
        Ok(Character {
            inner: TypedDevice::from_element(device_tag, element)?,
        })
    }

    pub fn device_tag(&self) -> &str {
        self.inner.device().device_tag()
    }

    pub fn type_name(&self) -> Result<String, DeviceError> {
        self.inner.type_name()
    }

    pub fn set_type_name(&mut self, value: &str) -> Result<(), DeviceError> {
        self.inner.set_type_name(value)
    }

    pub fn typed(&self) -> &TypedDevice {
        &self.inner
    }

    pub fn sources(&self) -> Result<Vec<AttrDict>, DeviceError> {
        let doc = self.inner.device().base().document()?;
        Ok(list("sources", "source", SOURCES).get(doc)?)
    }

    pub fn set_sources(&mut self, items: &[AttrDict]) -> Result<(), DeviceError> {
        let doc = self.inner.device_mut().base_mut().document_mut()?;
        Ok(list("sources", "source", SOURCES).set(doc, items)?)
    }

    pub fn del_sources(&mut self) -> Result<(), DeviceError> {
        let doc = self.inner.device_mut().base_mut().document_mut()?;
        Ok(list("sources", "source", SOURCES).del(doc)?)
    }

    pub fn targets(&self) -> Result<Vec<AttrDict>, DeviceError> {
        let doc = self.inner.device().base().document()?;
        Ok(list("targets", "target", TARGETS).get(doc)?)
    }

    pub fn set_targets(&mut self, items: &[AttrDict]) -> Result<(), DeviceError> {
        let doc = self.inner.device_mut().base_mut().document_mut()?;
        Ok(list("targets", "target", TARGETS).set(doc, items)?)
    }

    pub fn del_targets(&mut self) -> Result<(), DeviceError> {
        let doc = self.inner.device_mut().base_mut().document_mut()?;
        Ok(list("targets", "target", TARGETS).del(doc)?)
    }

    /// Append one source to the list.
    pub fn add_source(&mut self, attrs: AttrDict) -> Result<(), DeviceError> {
        let mut items = self.sources()?;
        items.push(attrs);
        self.set_sources(&items)
    }

    /// Merge attributes into the source at `index`.
    pub fn update_source(&mut self, index: usize, attrs: AttrDict) -> Result<(), DeviceError> {
        let mut items = self.sources()?;
        let item = items
            .get_mut(index)
            .ok_or_else(|| missing_item("sources", index))?;
        item.extend(attrs);
        self.set_sources(&items)
    }

    /// Append one target to the list.
    pub fn add_target(&mut self, attrs: AttrDict) -> Result<(), DeviceError> {
        let mut items = self.targets()?;
        items.push(attrs);
        self.set_targets(&items)
    }

    /// Merge attributes into the target at `index`.
    pub fn update_target(&mut self, index: usize, attrs: AttrDict) -> Result<(), DeviceError> {
        let mut items = self.targets()?;
        let item = items
            .get_mut(index)
            .ok_or_else(|| missing_item("targets", index))?;
        item.extend(attrs);
        self.set_targets(&items)
    }

    pub fn to_xml_string(&self) -> Result<String, DeviceError> {
        self.inner.device().to_xml_string()
    }
}

fn missing_item(property: &'static str, index: usize) -> DeviceError {
    DeviceError::Bind(BindError::NotFound {
        operation: "set",
        property: property.to_string(),
        what: format!("item at index {index}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(pairs: &[(&str, &str)]) -> AttrDict {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn only_character_tags_are_accepted() {
        assert!(Character::new("serial").is_ok());
        assert!(Character::new("console").is_ok());
        let err = Character::new("disk").unwrap_err();
        assert!(matches!(err, DeviceError::NotSupported(_)));
    }

    #[test]
    fn sources_roundtrip_in_order() {
        let mut channel = Character::with_type("channel", "unix").expect("channel");
        let items = vec![dict(&[("a", "1")]), dict(&[("b", "2")])];
        channel.set_sources(&items).expect("set sources");
        assert_eq!(channel.sources().expect("read back"), items);

        let xml = channel.to_xml_string().expect("serialize");
        assert_eq!(xml.matches("<source").count(), 2, "exactly two source elements");
        let first = xml.find("a=\"1\"").expect("first item present");
        let second = xml.find("b=\"2\"").expect("second item present");
        assert!(first < second, "document order matches caller order");
    }

    #[test]
    fn add_and_update_source() {
        let mut serial = Character::with_type("serial", "tcp").expect("serial");
        serial
            .add_source(dict(&[("mode", "connect"), ("host", "0.0.0.0")]))
            .expect("first source");
        serial
            .add_source(dict(&[("mode", "bind")]))
            .expect("second source");
        serial
            .update_source(0, dict(&[("service", "2445")]))
            .expect("merge into first");

        let sources = serial.sources().expect("sources");
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].get("service").map(String::as_str), Some("2445"));
        assert_eq!(sources[0].get("mode").map(String::as_str), Some("connect"));
        assert_eq!(sources[1].get("mode").map(String::as_str), Some("bind"));

        let err = serial.update_source(5, dict(&[("x", "y")])).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn targets_are_independent_of_sources() {
        let mut console = Character::with_type("console", "pty").expect("console");
        console
            .set_targets(&[dict(&[("type", "serial"), ("port", "0")])])
            .expect("set targets");
        console
            .set_sources(&[dict(&[("path", "/dev/pts/3")])])
            .expect("set sources");
        assert_eq!(console.targets().expect("targets").len(), 1);
        console.del_sources().expect("drop sources");
        assert!(console.sources().expect("sources now empty").is_empty());
        assert_eq!(console.targets().expect("targets survive").len(), 1);
    }
}
