use indexmap::IndexMap;

use crate::types::ValueKind;

/// A single-column attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicAttribute {
    pub column: String,
    /// kind the application works with
    pub kind: ValueKind,
    /// explicitly named converter
    pub converter: Option<String>,
    /// opt out of auto-applied converters
    pub disable_conversion: bool,
}

impl BasicAttribute {
    pub fn new(column: &str, kind: ValueKind) -> Self {
        Self { column: column.to_string(), kind, converter: None, disable_conversion: false }
    }

    pub fn converted_by(mut self, converter: &str) -> Self {
        self.converter = Some(converter.to_string());
        self
    }

    pub fn without_conversion(mut self) -> Self {
        self.disable_conversion = true;
        self
    }
}

/// A value object whose attributes are stored in the owner's table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddedAttribute {
    pub attributes: IndexMap<String, AttributeMapping>,
}

impl EmbeddedAttribute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn basic(mut self, name: &str, column: &str, kind: ValueKind) -> Self {
        self.attributes.insert(name.to_string(), AttributeMapping::Basic(BasicAttribute::new(column, kind)));
        self
    }

    pub fn attribute(mut self, name: &str, mapping: AttributeMapping) -> Self {
        self.attributes.insert(name.to_string(), mapping);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeMapping {
    Basic(BasicAttribute),
    Embedded(EmbeddedAttribute),
    /// Part of the domain shape but never stored; reads back as null.
    Transient { kind: ValueKind },
}

impl AttributeMapping {
    pub fn as_basic(&self) -> Option<&BasicAttribute> {
        match self {
            AttributeMapping::Basic(b) => Some(b),
            _ => None,
        }
    }
}
