//! Per-kind accessor bindings operating on one tree location.
//!
//! Each binding carries `(property, parent_path, tag_name[, …])` and offers
//! the get/set/delete triple for its kind. Getters are strict: nothing is
//! created on read. Setters create the bound element on demand under an
//! already-existing parent and persist the document before returning.
//! Deleters succeed silently when the location is already absent.

use tracing::debug;
use virtxml_doc::{Element, XmlDocument};

use crate::{AttrDict, BindError};

/// Declared radix for integer-valued element text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    /// Sniff a `0x`/`0o`/`0b` prefix, otherwise decimal.
    Auto,
    Bin,
    Oct,
    Dec,
    Hex,
}

impl Radix {
    /// The conventional numeric radix value (0 for [`Radix::Auto`]).
    pub fn value(self) -> u32 {
        match self {
            Radix::Auto => 0,
            Radix::Bin => 2,
            Radix::Oct => 8,
            Radix::Dec => 10,
            Radix::Hex => 16,
        }
    }
}

fn is_root_path(path: &str) -> bool {
    path.split('/').all(|seg| seg.is_empty() || seg == ".")
}

/// One bound tree location shared by the accessor kinds.
#[derive(Debug, Clone, Copy)]
struct Location<'a> {
    property: &'a str,
    parent_path: &'a str,
    tag_name: &'a str,
}

impl Location<'_> {
    /// The bound element is the document root itself when the parent path
    /// addresses the root and the root already carries the bound tag.
    fn targets_root(&self, doc: &XmlDocument) -> bool {
        is_root_path(self.parent_path) && doc.root().tag() == self.tag_name
    }

    fn not_found(&self, operation: &'static str) -> BindError {
        BindError::NotFound {
            operation,
            property: self.property.to_string(),
            what: format!(
                "element '{}' under '{}'",
                self.tag_name, self.parent_path
            ),
        }
    }

    fn no_parent(&self, operation: &'static str) -> BindError {
        BindError::Structural {
            operation,
            property: self.property.to_string(),
            detail: format!("parent path '{}' not present", self.parent_path),
        }
    }

    /// Strict lookup: nothing is created, absence is an error.
    fn strict<'d>(
        &self,
        doc: &'d XmlDocument,
        operation: &'static str,
    ) -> Result<&'d Element, BindError> {
        if self.targets_root(doc) {
            return Ok(doc.root());
        }
        let parent = doc
            .find(self.parent_path)
            .ok_or_else(|| self.no_parent(operation))?;
        parent
            .find_child(self.tag_name)
            .ok_or_else(|| self.not_found(operation))
    }

    /// Lookup for mutation, creating the bound element if missing. The
    /// parent itself must already exist (restricted creation rule).
    fn ensure<'d>(
        &self,
        doc: &'d mut XmlDocument,
        operation: &'static str,
    ) -> Result<&'d mut Element, BindError> {
        if self.targets_root(doc) {
            return Ok(doc.root_mut());
        }
        if doc.find(self.parent_path).is_none() {
            return Err(self.no_parent(operation));
        }
        let parent = doc.find_mut(self.parent_path).expect("parent just found");
        if parent.child_position(self.tag_name).is_none() {
            debug!(
                property = self.property,
                parent = self.parent_path,
                tag = self.tag_name,
                "created bound element"
            );
            parent.push_child(Element::new(self.tag_name));
        }
        Ok(parent
            .find_child_mut(self.tag_name)
            .expect("child just ensured"))
    }

    /// Mutable lookup that treats absence as `None` rather than an error,
    /// for idempotent deletes.
    fn optional_mut<'d>(&self, doc: &'d mut XmlDocument) -> Option<&'d mut Element> {
        if self.targets_root(doc) {
            return Some(doc.root_mut());
        }
        doc.find_mut(self.parent_path)?.find_child_mut(self.tag_name)
    }

    /// Remove the bound element if present. Removing the document root is
    /// rejected; a missing parent or element is a silent no-op.
    fn remove(&self, doc: &mut XmlDocument, operation: &'static str) -> Result<bool, BindError> {
        if self.targets_root(doc) {
            return Err(BindError::Structural {
                operation,
                property: self.property.to_string(),
                detail: "cannot remove the document root".to_string(),
            });
        }
        match doc.find_mut(self.parent_path) {
            None => Ok(false),
            Some(parent) => Ok(parent.remove_child(self.tag_name).is_some()),
        }
    }
}

/// Accessor for the text of one element.
#[derive(Debug, Clone, Copy)]
pub struct ElementText<'a> {
    property: &'a str,
    parent_path: &'a str,
    tag_name: &'a str,
}

impl<'a> ElementText<'a> {
    pub fn new(property: &'a str, parent_path: &'a str, tag_name: &'a str) -> Self {
        ElementText {
            property,
            parent_path,
            tag_name,
        }
    }

    fn location(&self) -> Location<'a> {
        Location {
            property: self.property,
            parent_path: self.parent_path,
            tag_name: self.tag_name,
        }
    }

    pub fn get(&self, doc: &XmlDocument) -> Result<String, BindError> {
        let element = self.location().strict(doc, "get")?;
        Ok(element.text().unwrap_or_default().to_string())
    }

    pub fn set(&self, doc: &mut XmlDocument, value: &str) -> Result<(), BindError> {
        let element = self.location().ensure(doc, "set")?;
        element.set_text(value);
        doc.write()?;
        debug!(property = self.property, value, "set element text");
        Ok(())
    }

    pub fn del(&self, doc: &mut XmlDocument) -> Result<(), BindError> {
        if self.location().remove(doc, "del")? {
            doc.write()?;
            debug!(property = self.property, "removed element");
        }
        Ok(())
    }
}

/// Accessor for integer-valued element text with a declared radix.
#[derive(Debug, Clone, Copy)]
pub struct ElementInt<'a> {
    property: &'a str,
    parent_path: &'a str,
    tag_name: &'a str,
    radix: Radix,
}

impl<'a> ElementInt<'a> {
    pub fn new(property: &'a str, parent_path: &'a str, tag_name: &'a str, radix: Radix) -> Self {
        ElementInt {
            property,
            parent_path,
            tag_name,
            radix,
        }
    }

    fn location(&self) -> Location<'a> {
        Location {
            property: self.property,
            parent_path: self.parent_path,
            tag_name: self.tag_name,
        }
    }

    fn malformed(&self, text: &str) -> BindError {
        BindError::Malformed {
            property: self.property.to_string(),
            parent: self.parent_path.to_string(),
            tag: self.tag_name.to_string(),
            text: text.to_string(),
            radix: self.radix.value(),
        }
    }

    pub fn get(&self, doc: &XmlDocument) -> Result<i64, BindError> {
        let element = self.location().strict(doc, "get")?;
        let raw = element.text().unwrap_or_default();
        self.parse(raw).ok_or_else(|| self.malformed(raw))
    }

    fn parse(&self, raw: &str) -> Option<i64> {
        let trimmed = raw.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (digits, radix) = match self.radix {
            Radix::Auto => {
                if let Some(rest) = strip_prefix_ci(body, "0x") {
                    (rest, 16)
                } else if let Some(rest) = strip_prefix_ci(body, "0o") {
                    (rest, 8)
                } else if let Some(rest) = strip_prefix_ci(body, "0b") {
                    (rest, 2)
                } else {
                    (body, 10)
                }
            }
            Radix::Bin => (strip_prefix_ci(body, "0b").unwrap_or(body), 2),
            Radix::Oct => (strip_prefix_ci(body, "0o").unwrap_or(body), 8),
            Radix::Dec => (body, 10),
            Radix::Hex => (strip_prefix_ci(body, "0x").unwrap_or(body), 16),
        };
        let magnitude = i64::from_str_radix(digits, radix).ok()?;
        if negative {
            magnitude.checked_neg()
        } else {
            Some(magnitude)
        }
    }

    fn format(&self, value: i64) -> String {
        let sign = if value < 0 { "-" } else { "" };
        let magnitude = value.unsigned_abs();
        match self.radix {
            Radix::Auto | Radix::Dec => format!("{value}"),
            Radix::Bin => format!("{sign}0b{magnitude:b}"),
            Radix::Oct => format!("{sign}0o{magnitude:o}"),
            Radix::Hex => format!("{sign}0x{magnitude:x}"),
        }
    }

    pub fn set(&self, doc: &mut XmlDocument, value: i64) -> Result<(), BindError> {
        let text = self.format(value);
        let element = self.location().ensure(doc, "set")?;
        element.set_text(text.as_str());
        doc.write()?;
        debug!(property = self.property, value, text = text.as_str(), "set element int");
        Ok(())
    }

    pub fn del(&self, doc: &mut XmlDocument) -> Result<(), BindError> {
        if self.location().remove(doc, "del")? {
            doc.write()?;
            debug!(property = self.property, "removed element");
        }
        Ok(())
    }
}

fn strip_prefix_ci<'t>(text: &'t str, prefix: &str) -> Option<&'t str> {
    let bytes = text.as_bytes();
    let prefix = prefix.as_bytes();
    if bytes.len() >= prefix.len() && bytes[..prefix.len()].eq_ignore_ascii_case(prefix) {
        // The matched prefix is pure ASCII, so the split is a char boundary.
        Some(&text[prefix.len()..])
    } else {
        None
    }
}

/// Accessor for one attribute of one element.
#[derive(Debug, Clone, Copy)]
pub struct AttributeValue<'a> {
    property: &'a str,
    parent_path: &'a str,
    tag_name: &'a str,
    attribute: &'a str,
}

impl<'a> AttributeValue<'a> {
    pub fn new(
        property: &'a str,
        parent_path: &'a str,
        tag_name: &'a str,
        attribute: &'a str,
    ) -> Self {
        AttributeValue {
            property,
            parent_path,
            tag_name,
            attribute,
        }
    }

    fn location(&self) -> Location<'a> {
        Location {
            property: self.property,
            parent_path: self.parent_path,
            tag_name: self.tag_name,
        }
    }

    pub fn get(&self, doc: &XmlDocument) -> Result<String, BindError> {
        let element = self.location().strict(doc, "get")?;
        element
            .attr(self.attribute)
            .map(str::to_string)
            .ok_or_else(|| BindError::NotFound {
                operation: "get",
                property: self.property.to_string(),
                what: format!(
                    "attribute '{}' on element '{}'",
                    self.attribute, self.tag_name
                ),
            })
    }

    pub fn set(&self, doc: &mut XmlDocument, value: &str) -> Result<(), BindError> {
        let element = self.location().ensure(doc, "set")?;
        element.set_attr(self.attribute, value);
        doc.write()?;
        debug!(
            property = self.property,
            attribute = self.attribute,
            value,
            "set attribute"
        );
        Ok(())
    }

    pub fn del(&self, doc: &mut XmlDocument) -> Result<(), BindError> {
        let Some(element) = self.location().optional_mut(doc) else {
            return Ok(());
        };
        if element.remove_attr(self.attribute).is_some() {
            doc.write()?;
            debug!(
                property = self.property,
                attribute = self.attribute,
                "removed attribute"
            );
        }
        Ok(())
    }
}

/// Accessor treating one element's full attribute set as a dict.
#[derive(Debug, Clone, Copy)]
pub struct ElementDict<'a> {
    property: &'a str,
    parent_path: &'a str,
    tag_name: &'a str,
}

impl<'a> ElementDict<'a> {
    pub fn new(property: &'a str, parent_path: &'a str, tag_name: &'a str) -> Self {
        ElementDict {
            property,
            parent_path,
            tag_name,
        }
    }

    fn location(&self) -> Location<'a> {
        Location {
            property: self.property,
            parent_path: self.parent_path,
            tag_name: self.tag_name,
        }
    }

    /// Returns a copy; mutating the result never touches the document.
    pub fn get(&self, doc: &XmlDocument) -> Result<AttrDict, BindError> {
        Ok(self.location().strict(doc, "get")?.attr_map())
    }

    /// Replaces the full attribute set, never merges. Attributes are
    /// written in sorted key order so serialized output is deterministic.
    pub fn set(&self, doc: &mut XmlDocument, value: &AttrDict) -> Result<(), BindError> {
        let element = self.location().ensure(doc, "set")?;
        element.clear_attrs();
        let mut keys: Vec<&String> = value.keys().collect();
        keys.sort();
        for key in keys {
            element.set_attr(key.as_str(), value[key].as_str());
        }
        doc.write()?;
        debug!(
            property = self.property,
            attrs = value.len(),
            "replaced attribute dict"
        );
        Ok(())
    }

    pub fn del(&self, doc: &mut XmlDocument) -> Result<(), BindError> {
        if self.location().remove(doc, "del")? {
            doc.write()?;
            debug!(property = self.property, "removed element");
        }
        Ok(())
    }
}

/// Marshal pair converting between one native item and one XML element.
///
/// Both functions are pure: `from_native` maps an item to the `(tag,
/// attributes)` of the element to append, `to_native` maps a matching
/// element back to an item, or `None` to skip it.
#[derive(Debug, Clone, Copy)]
pub struct MarshalPair {
    pub from_native: fn(&AttrDict, usize) -> (String, AttrDict),
    pub to_native: fn(&str, &AttrDict, usize) -> Option<AttrDict>,
}

/// Accessor for an ordered list of same-tagged sibling elements.
#[derive(Debug, Clone, Copy)]
pub struct ElementList<'a> {
    property: &'a str,
    parent_path: &'a str,
    tag_name: &'a str,
    marshal: MarshalPair,
}

impl<'a> ElementList<'a> {
    pub fn new(
        property: &'a str,
        parent_path: &'a str,
        tag_name: &'a str,
        marshal: MarshalPair,
    ) -> Self {
        ElementList {
            property,
            parent_path,
            tag_name,
            marshal,
        }
    }

    /// All matching children of the parent, in document order.
    pub fn get(&self, doc: &XmlDocument) -> Result<Vec<AttrDict>, BindError> {
        let parent = doc
            .find(self.parent_path)
            .ok_or_else(|| BindError::NotFound {
                operation: "get",
                property: self.property.to_string(),
                what: format!("parent '{}'", self.parent_path),
            })?;
        let items = parent
            .children()
            .iter()
            .filter(|child| child.tag() == self.tag_name)
            .enumerate()
            .filter_map(|(index, child)| {
                (self.marshal.to_native)(child.tag(), &child.attr_map(), index)
            })
            .collect();
        Ok(items)
    }

    /// Total replacement: every existing matching child is removed, then
    /// one element is appended per item in caller order.
    pub fn set(&self, doc: &mut XmlDocument, items: &[AttrDict]) -> Result<(), BindError> {
        let property = self.property.to_string();
        let parent = doc
            .create_by_xpath(self.parent_path)
            .map_err(|err| BindError::Structural {
                operation: "set",
                property,
                detail: err.to_string(),
            })?;
        parent.remove_children(self.tag_name);
        for (index, item) in items.iter().enumerate() {
            let (tag, attrs) = (self.marshal.from_native)(item, index);
            let mut element = Element::new(tag);
            let mut keys: Vec<&String> = attrs.keys().collect();
            keys.sort();
            for key in keys {
                element.set_attr(key.as_str(), attrs[key].as_str());
            }
            parent.push_child(element);
        }
        doc.write()?;
        debug!(
            property = self.property,
            items = items.len(),
            "replaced element list"
        );
        Ok(())
    }

    pub fn del(&self, doc: &mut XmlDocument) -> Result<(), BindError> {
        let Some(parent) = doc.find_mut(self.parent_path) else {
            return Ok(());
        };
        if parent.remove_children(self.tag_name) > 0 {
            doc.write()?;
            debug!(property = self.property, "removed element list");
        }
        Ok(())
    }
}

/// Accessor for a nested sub-document.
#[derive(Debug, Clone, Copy)]
pub struct ElementNest<'a> {
    property: &'a str,
    parent_path: &'a str,
    tag_name: &'a str,
}

impl<'a> ElementNest<'a> {
    pub fn new(property: &'a str, parent_path: &'a str, tag_name: &'a str) -> Self {
        ElementNest {
            property,
            parent_path,
            tag_name,
        }
    }

    fn location(&self) -> Location<'a> {
        Location {
            property: self.property,
            parent_path: self.parent_path,
            tag_name: self.tag_name,
        }
    }

    /// Detached copy of the subtree, backed by its own temp file.
    /// Mutating it does not affect the owner until [`ElementNest::set`].
    pub fn get(&self, doc: &XmlDocument) -> Result<XmlDocument, BindError> {
        let element = self.location().strict(doc, "get")?;
        Ok(XmlDocument::from_root(element.clone())?)
    }

    /// Replace (or insert) the corresponding child with the value's root.
    pub fn set(&self, doc: &mut XmlDocument, value: &XmlDocument) -> Result<(), BindError> {
        if value.root().tag() != self.tag_name {
            return Err(BindError::TypeMismatch {
                property: self.property.to_string(),
                expected: "sub-document rooted at the bound tag",
            });
        }
        let replacement = value.root().clone();
        let location = self.location();
        if location.targets_root(doc) {
            *doc.root_mut() = replacement;
        } else {
            let parent = doc
                .find_mut(self.parent_path)
                .ok_or_else(|| location.no_parent("set"))?;
            match parent.child_position(self.tag_name) {
                Some(index) => parent.children_mut()[index] = replacement,
                None => parent.push_child(replacement),
            }
        }
        doc.write()?;
        debug!(property = self.property, "replaced nested sub-document");
        Ok(())
    }

    pub fn del(&self, doc: &mut XmlDocument) -> Result<(), BindError> {
        if self.location().remove(doc, "del")? {
            doc.write()?;
            debug!(property = self.property, "removed nested sub-document");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: &str = r#"
        <domain type='kvm'>
            <name>demo</name>
            <os>
                <type arch='x86_64'>hvm</type>
            </os>
        </domain>
    "#;

    fn domain() -> XmlDocument {
        XmlDocument::from_xml(DOMAIN).expect("load fixture")
    }

    fn dict(pairs: &[(&str, &str)]) -> AttrDict {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn attr_items(item: &AttrDict, _index: usize) -> (String, AttrDict) {
        ("source".to_string(), item.clone())
    }

    fn items_attrs(_tag: &str, attrs: &AttrDict, _index: usize) -> Option<AttrDict> {
        Some(attrs.clone())
    }

    const SOURCES: MarshalPair = MarshalPair {
        from_native: attr_items,
        to_native: items_attrs,
    };

    #[test]
    fn text_roundtrip_and_strict_get() {
        let mut doc = domain();
        let name = ElementText::new("vm_name", "/", "name");
        assert_eq!(name.get(&doc).expect("existing text"), "demo");
        name.set(&mut doc, "renamed").expect("set name");
        assert_eq!(name.get(&doc).expect("updated text"), "renamed");

        let title = ElementText::new("title", "/", "title");
        assert!(matches!(title.get(&doc), Err(BindError::NotFound { .. })));
        title.set(&mut doc, "spawned").expect("create on set");
        assert_eq!(title.get(&doc).expect("created text"), "spawned");
    }

    #[test]
    fn set_rejects_missing_parent() {
        let mut doc = domain();
        let label = ElementText::new("label", "seclabel", "label");
        let err = label.set(&mut doc, "system_u").unwrap_err();
        assert!(matches!(err, BindError::Structural { .. }));
    }

    #[test]
    fn delete_is_idempotent() {
        let mut doc = domain();
        let name = ElementText::new("vm_name", "/", "name");
        name.del(&mut doc).expect("first delete");
        assert!(matches!(name.get(&doc), Err(BindError::NotFound { .. })));
        name.del(&mut doc).expect("second delete is silent");
    }

    #[test]
    fn int_radix_parsing() {
        let mut doc = domain();
        let vcpu = ElementInt::new("vcpu", "/", "vcpu", Radix::Dec);
        vcpu.set(&mut doc, 4).expect("set vcpu");
        assert_eq!(vcpu.get(&doc).expect("decimal"), 4);

        let slot = ElementInt::new("slot", "/", "slot", Radix::Hex);
        slot.set(&mut doc, 10).expect("set slot");
        assert_eq!(
            doc.find("slot").and_then(Element::text),
            Some("0xa"),
            "hex values carry the 0x prefix"
        );
        assert_eq!(slot.get(&doc).expect("hex"), 10);

        let auto = ElementInt::new("slot", "/", "slot", Radix::Auto);
        assert_eq!(auto.get(&doc).expect("auto sniffs 0x"), 10);
    }

    #[test]
    fn int_malformed_cites_location_and_text() {
        let mut doc = domain();
        let name_text = ElementText::new("vcpu", "/", "vcpu");
        name_text.set(&mut doc, "all").expect("set non-numeric");
        let vcpu = ElementInt::new("vcpu", "/", "vcpu", Radix::Dec);
        match vcpu.get(&doc).unwrap_err() {
            BindError::Malformed {
                property,
                tag,
                text,
                radix,
                ..
            } => {
                assert_eq!(property, "vcpu");
                assert_eq!(tag, "vcpu");
                assert_eq!(text, "all");
                assert_eq!(radix, 10);
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn attribute_on_root_element() {
        let mut doc = domain();
        let hypervisor = AttributeValue::new("hypervisor_type", "/", "domain", "type");
        assert_eq!(hypervisor.get(&doc).expect("root attribute"), "kvm");
        hypervisor.set(&mut doc, "qemu").expect("set root attribute");
        assert_eq!(doc.root().attr("type"), Some("qemu"));
    }

    #[test]
    fn missing_attribute_is_not_found() {
        let doc = domain();
        let arch = AttributeValue::new("machine", "os", "type", "machine");
        assert!(matches!(arch.get(&doc), Err(BindError::NotFound { .. })));
        let arch = AttributeValue::new("arch", "os", "type", "arch");
        assert_eq!(arch.get(&doc).expect("existing attribute"), "x86_64");
    }

    #[test]
    fn attribute_delete_is_idempotent() {
        let mut doc = domain();
        let arch = AttributeValue::new("arch", "os", "type", "arch");
        arch.del(&mut doc).expect("remove attribute");
        arch.del(&mut doc).expect("silent on absent attribute");
        let gone = AttributeValue::new("gone", "os/missing", "type", "x");
        gone.del(&mut doc).expect("silent on absent element");
    }

    #[test]
    fn dict_replaces_instead_of_merging() {
        let mut doc = domain();
        let bridge = ElementDict::new("bridge", "/", "bridge");
        bridge
            .set(&mut doc, &dict(&[("name", "virbr0"), ("stp", "on")]))
            .expect("initial dict");
        bridge
            .set(&mut doc, &dict(&[("delay", "0")]))
            .expect("replacement dict");
        let current = bridge.get(&doc).expect("read back");
        assert_eq!(current, dict(&[("delay", "0")]), "old keys are gone");
    }

    #[test]
    fn dict_get_returns_detached_copy() {
        let mut doc = domain();
        let bridge = ElementDict::new("bridge", "/", "bridge");
        bridge
            .set(&mut doc, &dict(&[("name", "virbr0")]))
            .expect("set dict");
        let mut copy = bridge.get(&doc).expect("get dict");
        copy.insert("stp".to_string(), "on".to_string());
        assert_eq!(
            bridge.get(&doc).expect("unchanged"),
            dict(&[("name", "virbr0")])
        );
    }

    #[test]
    fn list_preserves_order_on_roundtrip() {
        let mut doc = domain();
        let sources = ElementList::new("sources", "/", "source", SOURCES);
        let items = vec![
            dict(&[("mode", "bind"), ("path", "/tmp/a")]),
            dict(&[("mode", "connect")]),
            dict(&[("path", "/tmp/c")]),
        ];
        sources.set(&mut doc, &items).expect("set list");
        assert_eq!(sources.get(&doc).expect("read back"), items);

        let serialized = doc.to_xml_string().expect("serialize");
        assert_eq!(serialized.matches("<source").count(), 3);
    }

    #[test]
    fn list_set_is_total_replacement() {
        let mut doc = domain();
        let sources = ElementList::new("sources", "/", "source", SOURCES);
        sources
            .set(&mut doc, &[dict(&[("a", "1")]), dict(&[("b", "2")])])
            .expect("initial list");
        sources
            .set(&mut doc, &[dict(&[("c", "3")])])
            .expect("replacement list");
        let current = sources.get(&doc).expect("read back");
        assert_eq!(current, vec![dict(&[("c", "3")])]);
        let serialized = doc.to_xml_string().expect("serialize");
        assert_eq!(serialized.matches("<source").count(), 1);
    }

    #[test]
    fn nested_get_is_detached() {
        let doc = XmlDocument::from_xml(
            "<memory><target><size>1024</size></target></memory>",
        )
        .expect("load memory");
        let target = ElementNest::new("target", "/", "target");
        let mut sub = target.get(&doc).expect("nested copy");
        assert_ne!(sub.path(), doc.path());
        sub.find_mut("size").expect("size element").set_text("2048");
        // Owner untouched until set() writes the copy back.
        assert_eq!(
            doc.find("target/size").and_then(Element::text),
            Some("1024")
        );
    }

    #[test]
    fn nested_set_writes_back() {
        let mut doc = XmlDocument::from_xml(
            "<memory><target><size>1024</size></target></memory>",
        )
        .expect("load memory");
        let target = ElementNest::new("target", "/", "target");
        let mut sub = target.get(&doc).expect("nested copy");
        sub.find_mut("size").expect("size element").set_text("2048");
        target.set(&mut doc, &sub).expect("write back");
        assert_eq!(
            doc.find("target/size").and_then(Element::text),
            Some("2048")
        );
    }

    #[test]
    fn nested_set_rejects_foreign_root() {
        let mut doc = XmlDocument::from_xml("<memory><target/></memory>").expect("load");
        let target = ElementNest::new("target", "/", "target");
        let foreign = XmlDocument::from_xml("<source/>").expect("foreign");
        let err = target.set(&mut doc, &foreign).unwrap_err();
        assert!(matches!(err, BindError::TypeMismatch { .. }));
    }
}
