//! Temp-file backed XML documents with bounded path lookup.

use std::fs;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::element::{parse, serialize, Element};
use crate::XmlError;

/// An in-memory element tree plus the named temporary file holding its
/// serialized form.
///
/// Each document owns its backing file exclusively; cloning via
/// [`XmlDocument::try_clone`] produces an independent tree with a fresh
/// file. The file is removed when the document is dropped.
#[derive(Debug)]
pub struct XmlDocument {
    root: Element,
    backing: NamedTempFile,
}

/// Split a bounded path into its plain tag segments.
///
/// Leading/trailing slashes and `.` segments are ignored, so `""`, `"/"`
/// and `"."` all address the root.
fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|seg| !seg.is_empty() && *seg != ".")
}

impl XmlDocument {
    /// Parse a document from XML text and persist it to a new backing file.
    pub fn from_xml(xml: &str) -> Result<Self, XmlError> {
        Self::from_root(parse(xml)?)
    }

    /// Load a document from an existing file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, XmlError> {
        let text = fs::read_to_string(path)?;
        Self::from_xml(&text)
    }

    /// Wrap an already-built tree, persisting it to a new backing file.
    pub fn from_root(root: Element) -> Result<Self, XmlError> {
        let backing = tempfile::Builder::new()
            .prefix("virtxml-")
            .suffix(".xml")
            .tempfile()?;
        let doc = XmlDocument { root, backing };
        doc.write()?;
        Ok(doc)
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Path of the backing temp file.
    pub fn path(&self) -> &Path {
        self.backing.path()
    }

    /// Resolve a bounded path to an element, first match per segment.
    pub fn find(&self, path: &str) -> Option<&Element> {
        let mut current = &self.root;
        for seg in segments(path) {
            current = current.find_child(seg)?;
        }
        Some(current)
    }

    pub fn find_mut(&mut self, path: &str) -> Option<&mut Element> {
        let mut current = &mut self.root;
        for seg in segments(path) {
            current = current.find_child_mut(seg)?;
        }
        Some(current)
    }

    /// All children matching the final path segment, in document order.
    ///
    /// Intermediate segments resolve first-match; an unresolvable parent
    /// yields an empty list. An empty path yields the root alone.
    pub fn findall(&self, path: &str) -> Vec<&Element> {
        let segs: Vec<&str> = segments(path).collect();
        let Some((last, head)) = segs.split_last() else {
            return vec![&self.root];
        };
        let mut current = &self.root;
        for seg in head {
            match current.find_child(seg) {
                Some(child) => current = child,
                None => return Vec::new(),
            }
        }
        current
            .children()
            .iter()
            .filter(|child| child.tag() == *last)
            .collect()
    }

    /// Resolve a path, creating only the final segment if missing.
    ///
    /// Every segment but the last must already exist; a missing intermediate
    /// segment is a [`XmlError::PathNotFound`] rather than a deep create.
    pub fn create_by_xpath(&mut self, path: &str) -> Result<&mut Element, XmlError> {
        let segs: Vec<&str> = segments(path).collect();
        let Some((last, head)) = segs.split_last() else {
            return Ok(&mut self.root);
        };
        let mut current = &mut self.root;
        for seg in head {
            current = current
                .find_child_mut(seg)
                .ok_or_else(|| XmlError::PathNotFound(path.to_string()))?;
        }
        if current.child_position(last).is_none() {
            debug!(path, tag = *last, "created element");
            current.push_child(Element::new(*last));
        }
        let index = current.child_position(last).expect("child just ensured");
        Ok(&mut current.children_mut()[index])
    }

    /// Serialize the tree to text.
    pub fn to_xml_string(&self) -> Result<String, XmlError> {
        serialize(&self.root)
    }

    /// Persist the tree to the backing file, atomically: the serialized
    /// form lands in a sibling file first and is renamed over the target.
    pub fn write(&self) -> Result<(), XmlError> {
        let xml = serialize(&self.root)?;
        let path = self.backing.path();
        let staged = path.with_extension("xml.tmp");
        fs::write(&staged, xml.as_bytes())?;
        fs::rename(&staged, path)?;
        debug!(path = %path.display(), bytes = xml.len(), "wrote document");
        Ok(())
    }

    /// Deep copy: an independent tree persisted to a fresh backing file.
    pub fn try_clone(&self) -> Result<Self, XmlError> {
        Self::from_root(self.root.clone())
    }
}
