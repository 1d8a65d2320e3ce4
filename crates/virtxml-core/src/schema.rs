//! Static property schema tables and the values they carry.

use virtxml_doc::XmlDocument;

use crate::accessors::{MarshalPair, Radix};
use crate::{AttrDict, Ops};

/// Accessor kind for one declared property.
#[derive(Debug, Clone, Copy)]
pub enum SchemaKind {
    /// Element text as a string.
    Text,
    /// Element text parsed as an integer with the declared radix.
    Int(Radix),
    /// One named attribute of the bound element.
    Attribute(&'static str),
    /// The bound element's full attribute set as a dict.
    AttrDict,
    /// Ordered same-tagged siblings through a marshal pair.
    List(MarshalPair),
    /// An embedded sub-document with detached-copy reads.
    Nested,
    /// A declared property with no legal operation at all.
    Forbidden,
}

/// One row of an entity's schema: a property name bound to a tree
/// location and an accessor kind, fixed per entity type.
#[derive(Debug, Clone, Copy)]
pub struct PropertySchema {
    pub name: &'static str,
    pub parent_path: &'static str,
    pub tag_name: &'static str,
    pub kind: SchemaKind,
    /// Operations rejected with `Forbidden` regardless of document state.
    pub forbidden: Ops,
}

impl PropertySchema {
    pub const fn text(
        name: &'static str,
        parent_path: &'static str,
        tag_name: &'static str,
    ) -> Self {
        PropertySchema {
            name,
            parent_path,
            tag_name,
            kind: SchemaKind::Text,
            forbidden: Ops::empty(),
        }
    }

    pub const fn int(
        name: &'static str,
        parent_path: &'static str,
        tag_name: &'static str,
        radix: Radix,
    ) -> Self {
        PropertySchema {
            name,
            parent_path,
            tag_name,
            kind: SchemaKind::Int(radix),
            forbidden: Ops::empty(),
        }
    }

    pub const fn attribute(
        name: &'static str,
        parent_path: &'static str,
        tag_name: &'static str,
        attribute: &'static str,
    ) -> Self {
        PropertySchema {
            name,
            parent_path,
            tag_name,
            kind: SchemaKind::Attribute(attribute),
            forbidden: Ops::empty(),
        }
    }

    pub const fn attr_dict(
        name: &'static str,
        parent_path: &'static str,
        tag_name: &'static str,
    ) -> Self {
        PropertySchema {
            name,
            parent_path,
            tag_name,
            kind: SchemaKind::AttrDict,
            forbidden: Ops::empty(),
        }
    }

    pub const fn list(
        name: &'static str,
        parent_path: &'static str,
        tag_name: &'static str,
        marshal: MarshalPair,
    ) -> Self {
        PropertySchema {
            name,
            parent_path,
            tag_name,
            kind: SchemaKind::List(marshal),
            forbidden: Ops::empty(),
        }
    }

    pub const fn nested(
        name: &'static str,
        parent_path: &'static str,
        tag_name: &'static str,
    ) -> Self {
        PropertySchema {
            name,
            parent_path,
            tag_name,
            kind: SchemaKind::Nested,
            forbidden: Ops::empty(),
        }
    }

    /// A property whose every operation raises `Forbidden`.
    pub const fn all_forbidden(name: &'static str) -> Self {
        PropertySchema {
            name,
            parent_path: "",
            tag_name: "",
            kind: SchemaKind::Forbidden,
            forbidden: Ops::all(),
        }
    }

    /// Mark additional operations forbidden for this property.
    pub const fn forbid(mut self, ops: Ops) -> Self {
        self.forbidden = self.forbidden.union(ops);
        self
    }
}

/// A value travelling through the generic get/set/delete dispatcher.
#[derive(Debug)]
pub enum PropertyValue {
    Text(String),
    Int(i64),
    Attrs(AttrDict),
    List(Vec<AttrDict>),
    Nested(XmlDocument),
}

impl PropertyValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            PropertyValue::Text(_) => "string",
            PropertyValue::Int(_) => "integer",
            PropertyValue::Attrs(_) => "attribute dict",
            PropertyValue::List(_) => "list of attribute dicts",
            PropertyValue::Nested(_) => "sub-document",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_attrs(&self) -> Option<&AttrDict> {
        match self {
            PropertyValue::Attrs(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttrDict]> {
        match self {
            PropertyValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_nested(&self) -> Option<&XmlDocument> {
        match self {
            PropertyValue::Nested(doc) => Some(doc),
            _ => None,
        }
    }
}
