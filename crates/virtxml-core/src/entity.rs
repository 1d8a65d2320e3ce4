//! Entity base: document ownership plus the generic schema dispatcher.

use std::path::Path;

use tracing::debug;
use virtxml_doc::XmlDocument;

use crate::accessors::{
    AttributeValue, ElementDict, ElementInt, ElementList, ElementNest, ElementText,
};
use crate::schema::{PropertySchema, PropertyValue, SchemaKind};
use crate::validate::Validator;
use crate::{BindError, Ops};

/// Shared state of every XML-backed entity: one exclusively-owned
/// document and the validator collaborator.
///
/// The backing temp file lives exactly as long as the loaded document;
/// [`XmlBase::delete_xml`] (or dropping the entity) releases it.
#[derive(Debug, Default)]
pub struct XmlBase {
    doc: Option<XmlDocument>,
    validator: Validator,
}

impl XmlBase {
    /// An entity with no document loaded yet.
    pub fn new() -> Self {
        XmlBase::default()
    }

    /// An entity loaded from XML text.
    pub fn from_xml(xml: &str) -> Result<Self, BindError> {
        let mut base = XmlBase::new();
        base.set_xml(xml)?;
        Ok(base)
    }

    /// Load (or replace) the document from XML text. A previously loaded
    /// document and its temp file are released first.
    pub fn set_xml(&mut self, xml: &str) -> Result<(), BindError> {
        self.doc = Some(XmlDocument::from_xml(xml)?);
        Ok(())
    }

    /// Load (or replace) the document from an existing file.
    pub fn set_xml_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), BindError> {
        self.doc = Some(XmlDocument::from_file(path)?);
        Ok(())
    }

    /// Release the document and unlink its backing temp file.
    pub fn delete_xml(&mut self) {
        if self.doc.take().is_some() {
            debug!("released document and backing file");
        }
    }

    pub fn document(&self) -> Result<&XmlDocument, BindError> {
        self.doc.as_ref().ok_or(BindError::NotLoaded)
    }

    pub fn document_mut(&mut self) -> Result<&mut XmlDocument, BindError> {
        self.doc.as_mut().ok_or(BindError::NotLoaded)
    }

    /// Filename of the backing temp file.
    pub fn xml_path(&self) -> Result<&Path, BindError> {
        Ok(self.document()?.path())
    }

    pub fn to_xml_string(&self) -> Result<String, BindError> {
        Ok(self.document()?.to_xml_string()?)
    }

    /// Deep copy sharing nothing with the original: a fresh document
    /// backed by a new temp file.
    pub fn copy(&self) -> Result<Self, BindError> {
        let doc = match &self.doc {
            Some(doc) => Some(doc.try_clone()?),
            None => None,
        };
        Ok(XmlBase {
            doc,
            validator: self.validator.clone(),
        })
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn set_validator(&mut self, validator: Validator) {
        self.validator = validator;
    }

    /// Run the external schema validator against the backing file.
    pub fn validates(&self, schema_name: &str) -> Result<bool, BindError> {
        self.validator.validate(self.xml_path()?, schema_name)
    }
}

fn ensure_allowed(
    schema: &PropertySchema,
    op: Ops,
    operation: &'static str,
) -> Result<(), BindError> {
    if schema.forbidden.contains(op) {
        return Err(BindError::Forbidden {
            operation,
            property: schema.name.to_string(),
        });
    }
    Ok(())
}

fn mismatch(schema: &PropertySchema, expected: &'static str) -> BindError {
    BindError::TypeMismatch {
        property: schema.name.to_string(),
        expected,
    }
}

/// An XML-backed entity with a static property schema.
///
/// Implementors supply the schema table and access to their [`XmlBase`];
/// the provided methods are the one generic dispatcher consulted for
/// every property operation.
pub trait XmlEntity {
    const SCHEMA: &'static [PropertySchema];

    fn base(&self) -> &XmlBase;

    fn base_mut(&mut self) -> &mut XmlBase;

    fn schema_for(name: &str) -> Result<&'static PropertySchema, BindError> {
        Self::SCHEMA
            .iter()
            .find(|schema| schema.name == name)
            .ok_or_else(|| BindError::UnknownProperty(name.to_string()))
    }

    fn get_prop(&self, name: &str) -> Result<PropertyValue, BindError> {
        let schema = Self::schema_for(name)?;
        ensure_allowed(schema, Ops::GET, "get")?;
        let doc = self.base().document()?;
        match schema.kind {
            SchemaKind::Text => ElementText::new(schema.name, schema.parent_path, schema.tag_name)
                .get(doc)
                .map(PropertyValue::Text),
            SchemaKind::Int(radix) => {
                ElementInt::new(schema.name, schema.parent_path, schema.tag_name, radix)
                    .get(doc)
                    .map(PropertyValue::Int)
            }
            SchemaKind::Attribute(attribute) => {
                AttributeValue::new(schema.name, schema.parent_path, schema.tag_name, attribute)
                    .get(doc)
                    .map(PropertyValue::Text)
            }
            SchemaKind::AttrDict => {
                ElementDict::new(schema.name, schema.parent_path, schema.tag_name)
                    .get(doc)
                    .map(PropertyValue::Attrs)
            }
            SchemaKind::List(marshal) => {
                ElementList::new(schema.name, schema.parent_path, schema.tag_name, marshal)
                    .get(doc)
                    .map(PropertyValue::List)
            }
            SchemaKind::Nested => {
                ElementNest::new(schema.name, schema.parent_path, schema.tag_name)
                    .get(doc)
                    .map(PropertyValue::Nested)
            }
            SchemaKind::Forbidden => Err(BindError::Forbidden {
                operation: "get",
                property: schema.name.to_string(),
            }),
        }
    }

    fn set_prop(&mut self, name: &str, value: &PropertyValue) -> Result<(), BindError> {
        let schema = Self::schema_for(name)?;
        ensure_allowed(schema, Ops::SET, "set")?;
        let doc = self.base_mut().document_mut()?;
        match schema.kind {
            SchemaKind::Text => {
                let text = value.as_text().ok_or_else(|| mismatch(schema, "string"))?;
                ElementText::new(schema.name, schema.parent_path, schema.tag_name).set(doc, text)
            }
            SchemaKind::Int(radix) => {
                let number = value.as_int().ok_or_else(|| mismatch(schema, "integer"))?;
                ElementInt::new(schema.name, schema.parent_path, schema.tag_name, radix)
                    .set(doc, number)
            }
            SchemaKind::Attribute(attribute) => {
                let text = value.as_text().ok_or_else(|| mismatch(schema, "string"))?;
                AttributeValue::new(schema.name, schema.parent_path, schema.tag_name, attribute)
                    .set(doc, text)
            }
            SchemaKind::AttrDict => {
                let attrs = value
                    .as_attrs()
                    .ok_or_else(|| mismatch(schema, "attribute dict"))?;
                ElementDict::new(schema.name, schema.parent_path, schema.tag_name).set(doc, attrs)
            }
            SchemaKind::List(marshal) => {
                let items = value
                    .as_list()
                    .ok_or_else(|| mismatch(schema, "list of attribute dicts"))?;
                ElementList::new(schema.name, schema.parent_path, schema.tag_name, marshal)
                    .set(doc, items)
            }
            SchemaKind::Nested => {
                let sub = value
                    .as_nested()
                    .ok_or_else(|| mismatch(schema, "sub-document"))?;
                ElementNest::new(schema.name, schema.parent_path, schema.tag_name).set(doc, sub)
            }
            SchemaKind::Forbidden => Err(BindError::Forbidden {
                operation: "set",
                property: schema.name.to_string(),
            }),
        }
    }

    fn del_prop(&mut self, name: &str) -> Result<(), BindError> {
        let schema = Self::schema_for(name)?;
        ensure_allowed(schema, Ops::DEL, "del")?;
        let doc = self.base_mut().document_mut()?;
        match schema.kind {
            SchemaKind::Text => {
                ElementText::new(schema.name, schema.parent_path, schema.tag_name).del(doc)
            }
            SchemaKind::Int(radix) => {
                ElementInt::new(schema.name, schema.parent_path, schema.tag_name, radix).del(doc)
            }
            SchemaKind::Attribute(attribute) => {
                AttributeValue::new(schema.name, schema.parent_path, schema.tag_name, attribute)
                    .del(doc)
            }
            SchemaKind::AttrDict => {
                ElementDict::new(schema.name, schema.parent_path, schema.tag_name).del(doc)
            }
            SchemaKind::List(marshal) => {
                ElementList::new(schema.name, schema.parent_path, schema.tag_name, marshal).del(doc)
            }
            SchemaKind::Nested => {
                ElementNest::new(schema.name, schema.parent_path, schema.tag_name).del(doc)
            }
            SchemaKind::Forbidden => Err(BindError::Forbidden {
                operation: "del",
                property: schema.name.to_string(),
            }),
        }
    }
}
