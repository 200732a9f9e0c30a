//! Declared value types of component properties
//!
//! Written as strings in schema files: `i32`, `i64`, `string`,
//! `component:com.example.IAddress`, `list<component:com.example.IWheel>`,
//! bare `list` / `set` for collections without a declared element type.

use crate::component::ComponentType;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Collection-like container shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionShape {
    List,
    Set,
}

impl CollectionShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionShape::List => "list",
            CollectionShape::Set => "set",
        }
    }
}

/// Declared type of a property value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Int32,
    Int64,
    Float64,
    Decimal,
    Text,
    Bool,
    Timestamp,
    Bytes,
    /// Generic element type with no further refinement
    Any,
    /// Another component (association target)
    Component(ComponentType),
    /// Collection; `element` is `None` when the element type is not declared
    Collection {
        shape: CollectionShape,
        element: Option<Box<ValueType>>,
    },
    /// Opaque application type (value objects, enums, ids)
    Named(String),
}

impl ValueType {
    pub fn list_of(element: ValueType) -> Self {
        ValueType::Collection { shape: CollectionShape::List, element: Some(Box::new(element)) }
    }

    pub fn set_of(element: ValueType) -> Self {
        ValueType::Collection { shape: CollectionShape::Set, element: Some(Box::new(element)) }
    }

    pub fn component(component: &ComponentType) -> Self {
        ValueType::Component(component.clone())
    }

    /// 32 or 64 bit integer
    pub fn is_integer(&self) -> bool {
        matches!(self, ValueType::Int32 | ValueType::Int64)
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, ValueType::Collection { .. })
    }

    pub fn as_component(&self) -> Option<&ComponentType> {
        match self {
            ValueType::Component(component) => Some(component),
            _ => None,
        }
    }
}

fn strip_generic<'a>(s: &'a str, shape: &str) -> Option<&'a str> {
    s.strip_prefix(shape)?.strip_prefix('<')?.strip_suffix('>')
}

impl FromStr for ValueType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();

        if let Some(name) = s.strip_prefix("component:") {
            return Ok(ValueType::Component(ComponentType::new(name)?));
        }
        for shape in [CollectionShape::List, CollectionShape::Set] {
            if let Some(inner) = strip_generic(s, shape.as_str()) {
                let element = inner.parse()?;
                return Ok(ValueType::Collection { shape, element: Some(Box::new(element)) });
            }
        }

        let value_type = match s {
            "i32" | "int" | "integer" => ValueType::Int32,
            "i64" | "long" => ValueType::Int64,
            "f64" | "double" | "float" => ValueType::Float64,
            "decimal" => ValueType::Decimal,
            "string" | "text" => ValueType::Text,
            "bool" | "boolean" => ValueType::Bool,
            "timestamp" | "datetime" => ValueType::Timestamp,
            "bytes" | "blob" => ValueType::Bytes,
            "any" => ValueType::Any,
            "list" => ValueType::Collection { shape: CollectionShape::List, element: None },
            "set" => ValueType::Collection { shape: CollectionShape::Set, element: None },
            "" => return Err(Error::config("Empty value type")),
            other if other.contains(['<', '>', ' ']) => {
                return Err(Error::config(format!("Invalid value type '{}'", other)));
            }
            other => ValueType::Named(other.to_string()),
        };
        Ok(value_type)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Int32 => f.write_str("i32"),
            ValueType::Int64 => f.write_str("i64"),
            ValueType::Float64 => f.write_str("f64"),
            ValueType::Decimal => f.write_str("decimal"),
            ValueType::Text => f.write_str("string"),
            ValueType::Bool => f.write_str("bool"),
            ValueType::Timestamp => f.write_str("timestamp"),
            ValueType::Bytes => f.write_str("bytes"),
            ValueType::Any => f.write_str("any"),
            ValueType::Component(component) => write!(f, "component:{}", component),
            ValueType::Collection { shape, element: Some(element) } => {
                write!(f, "{}<{}>", shape.as_str(), element)
            }
            ValueType::Collection { shape, element: None } => f.write_str(shape.as_str()),
            ValueType::Named(name) => f.write_str(name),
        }
    }
}

impl Serialize for ValueType {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ValueType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
