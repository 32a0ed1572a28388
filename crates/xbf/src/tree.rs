//! Object tree reconstructed from the node stream.

use crate::ids::{PropertyId, StringId, TypeId, XmlNamespaceId};
use crate::value::Value;

/// Source location of a node in the original markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineInfo {
    pub line: u32,
    pub position: u32,
}

/// An object element.
#[derive(Debug, Clone, PartialEq)]
pub struct XamlObject {
    pub type_id: TypeId,
    pub flags: u8,
    pub line_info: LineInfo,
    /// Properties in stream order.
    pub properties: Vec<XamlProperty>,
}

impl XamlObject {
    pub fn new(type_id: TypeId, flags: u8, line_info: LineInfo) -> Self {
        Self {
            type_id,
            flags,
            line_info,
            properties: Vec::new(),
        }
    }

    /// First property with the given ID.
    pub fn property(&self, id: PropertyId) -> Option<&XamlProperty> {
        self.properties.iter().find(|p| p.property_id == id)
    }

    /// Number of objects in this subtree, including this one.
    pub fn object_count(&self) -> usize {
        1 + self
            .properties
            .iter()
            .flat_map(XamlProperty::objects)
            .map(XamlObject::object_count)
            .sum::<usize>()
    }
}

/// A property of an object, holding one or more values.
#[derive(Debug, Clone, PartialEq)]
pub struct XamlProperty {
    pub property_id: PropertyId,
    pub flags: u8,
    pub line_info: LineInfo,
    pub values: Vec<XamlValue>,
}

impl XamlProperty {
    pub fn new(property_id: PropertyId, flags: u8, line_info: LineInfo) -> Self {
        Self {
            property_id,
            flags,
            line_info,
            values: Vec::new(),
        }
    }

    /// The single scalar value, if this property can be written as an attribute.
    pub fn simple_value(&self) -> Option<&XamlValue> {
        match self.values.as_slice() {
            [value] if !value.is_object() => Some(value),
            _ => None,
        }
    }

    /// Whether any value is a nested object.
    pub fn is_complex(&self) -> bool {
        self.values.iter().any(XamlValue::is_object)
    }

    /// Nested objects, in order.
    pub fn objects(&self) -> impl Iterator<Item = &XamlObject> {
        self.values.iter().filter_map(|value| match value {
            XamlValue::Object(object) => Some(object),
            _ => None,
        })
    }
}

/// Text that refers into the string table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextValue {
    pub string_id: StringId,
    pub flags: u8,
}

/// One value of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum XamlValue {
    Object(XamlObject),
    Text(TextValue),
    Value(Value),
}

impl XamlValue {
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }
}

/// An `xmlns` declaration seen in the node stream.
///
/// Declarations are kept beside the tree, not inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDeclaration {
    pub namespace_id: XmlNamespaceId,
    pub flags: u8,
    pub uri: String,
    pub line_info: LineInfo,
}
