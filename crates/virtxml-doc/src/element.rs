//! Owned element tree plus quick-xml based parse/serialize.

use std::collections::HashMap;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::XmlError;

/// One node of the document tree: tag, ordered attributes, optional text,
/// ordered children.
///
/// Attribute order and child order are preserved exactly as parsed so a
/// document round-trips without reshuffling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    /// Create an empty element with the given tag.
    pub fn new<S: Into<String>>(tag: S) -> Self {
        Element {
            tag: tag.into(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Look up an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing an existing one in place so its position
    /// in the serialized output is stable.
    pub fn set_attr<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Remove an attribute, returning its previous value if present.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(index).1)
    }

    pub fn clear_attrs(&mut self) {
        self.attributes.clear();
    }

    /// Iterate attributes in document order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Copy the attribute set into a map. Mutating the result never touches
    /// the element.
    pub fn attr_map(&self) -> HashMap<String, String> {
        self.attributes.iter().cloned().collect()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn set_text<S: Into<String>>(&mut self, text: S) {
        self.text = Some(text.into());
    }

    pub fn clear_text(&mut self) {
        self.text = None;
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Element> {
        &mut self.children
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// First child with the given tag.
    pub fn find_child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.tag == tag)
    }

    pub fn find_child_mut(&mut self, tag: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|child| child.tag == tag)
    }

    /// Index of the first child with the given tag.
    pub fn child_position(&self, tag: &str) -> Option<usize> {
        self.children.iter().position(|child| child.tag == tag)
    }

    /// Remove the first child with the given tag.
    pub fn remove_child(&mut self, tag: &str) -> Option<Element> {
        let index = self.child_position(tag)?;
        Some(self.children.remove(index))
    }

    /// Remove every child with the given tag, returning how many went away.
    pub fn remove_children(&mut self, tag: &str) -> usize {
        let before = self.children.len();
        self.children.retain(|child| child.tag != tag);
        before - self.children.len()
    }
}

/// Parse a complete XML document into its root [`Element`].
///
/// Whitespace-only text nodes are dropped and text values are trimmed;
/// comments and processing instructions are ignored.
pub fn parse(xml: &str) -> Result<Element, XmlError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(event)) => {
                if root.is_some() && stack.is_empty() {
                    return Err(XmlError::Parse("multiple root elements".into()));
                }
                stack.push(element_from_start(&event)?);
            }
            Ok(Event::Empty(event)) => {
                if root.is_some() && stack.is_empty() {
                    return Err(XmlError::Parse("multiple root elements".into()));
                }
                let element = element_from_start(&event)?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::Text(event)) => {
                let text = event
                    .unescape()
                    .map_err(|err| XmlError::Parse(err.to_string()))?;
                if let Some(current) = stack.last_mut() {
                    if current.children.is_empty() && current.text.is_none() {
                        current.text = Some(text.into_owned());
                    }
                }
            }
            Ok(Event::CData(event)) => {
                let text = String::from_utf8_lossy(&event).into_owned();
                if let Some(current) = stack.last_mut() {
                    if current.children.is_empty() && current.text.is_none() {
                        current.text = Some(text);
                    }
                }
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| XmlError::Parse("unbalanced end tag".into()))?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(XmlError::Parse(err.to_string())),
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(XmlError::Parse("unclosed element".into()));
    }
    root.ok_or_else(|| XmlError::Parse("no root element".into()))
}

fn element_from_start(event: &BytesStart<'_>) -> Result<Element, XmlError> {
    let tag = String::from_utf8_lossy(event.name().as_ref()).into_owned();
    let mut element = Element::new(tag);
    for attr in event.attributes() {
        let attr = attr.map_err(|err| XmlError::Parse(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| XmlError::Parse(err.to_string()))?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(stack: &mut Vec<Element>, root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

/// Serialize an element tree to indented XML text.
pub fn serialize(root: &Element) -> Result<String, XmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    write_element(&mut writer, root)?;
    String::from_utf8(writer.into_inner()).map_err(|err| XmlError::Parse(err.to_string()))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), XmlError> {
    let mut start = BytesStart::new(element.tag());
    for (key, value) in element.attrs() {
        start.push_attribute((key, value));
    }
    if element.children.is_empty() && element.text.is_none() {
        writer
            .write_event(Event::Empty(start))
            .map_err(|err| XmlError::Parse(err.to_string()))?;
        return Ok(());
    }
    writer
        .write_event(Event::Start(start))
        .map_err(|err| XmlError::Parse(err.to_string()))?;
    if let Some(text) = element.text() {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(|err| XmlError::Parse(err.to_string()))?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.tag())))
        .map_err(|err| XmlError::Parse(err.to_string()))
}
