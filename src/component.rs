//! Component identity - type names, identifiers and property paths
//!
//! Format of a component type: `<ident>(.<ident>)*`, for example
//! `com.example.ITrain` or `com.example.IWagon$IWheel`.
//!
//! A property path walks single-valued associations: `address.city`.

use crate::key::grammar::{check_identifier, check_type_name};
use crate::key::DecodeError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque identifier of an entity or sub-entity kind.
///
/// Equality is by name. The name is validated on construction so that it
/// can always be embedded in a statement key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentType(String);

impl ComponentType {
    /// Parse and validate a component type name
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        check_type_name(&name)?;
        Ok(Self(name))
    }

    pub(crate) fn decode(token: &str) -> std::result::Result<Self, DecodeError> {
        check_type_name(token)?;
        Ok(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last dotted segment of the name (`com.example.ITrain` -> `ITrain`)
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ComponentType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl Serialize for ComponentType {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ComponentType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ComponentType::new(s).map_err(serde::de::Error::custom)
    }
}

/// A single validated name token: property name, join table or join column
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        check_identifier(&name)?;
        Ok(Self(name))
    }

    pub(crate) fn parse(token: &str) -> std::result::Result<Self, DecodeError> {
        check_identifier(token)?;
        Ok(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Dotted sequence of property names (`a.b.c`).
///
/// Every non-final segment must name a single-valued association on the
/// component reached so far; that rule is checked by the metadata resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    segments: Vec<Identifier>,
}

impl PropertyPath {
    /// Parse a dotted path, validating every segment
    pub fn parse(path: &str) -> Result<Self> {
        Ok(Self::decode(path)?)
    }

    pub(crate) fn decode(path: &str) -> std::result::Result<Self, DecodeError> {
        let segments = path
            .split('.')
            .map(Identifier::parse)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    /// Path made of one property
    pub fn single(name: Identifier) -> Self {
        Self { segments: vec![name] }
    }

    pub fn segments(&self) -> &[Identifier] {
        &self.segments
    }

    /// Segments that must resolve to associations
    pub fn parents(&self) -> &[Identifier] {
        &self.segments[..self.segments.len() - 1]
    }

    /// Final property of the path
    pub fn leaf(&self) -> &Identifier {
        &self.segments[self.segments.len() - 1]
    }

    pub fn is_simple(&self) -> bool {
        self.segments.len() == 1
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment.as_str())?;
        }
        Ok(())
    }
}

impl FromStr for PropertyPath {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_type() {
        let ty = ComponentType::new("com.example.ITrain").unwrap();
        assert_eq!(ty.as_str(), "com.example.ITrain");
        assert_eq!(ty.simple_name(), "ITrain");
        assert_eq!(ty.to_string(), "com.example.ITrain");

        let bare = ComponentType::new("T").unwrap();
        assert_eq!(bare.simple_name(), "T");
    }

    #[test]
    fn test_invalid_component_type() {
        assert!(ComponentType::new("").is_err());
        assert!(ComponentType::new("com/example").is_err());
        assert!(ComponentType::new("a.b,c").is_err());
        assert!(ComponentType::new("1Train").is_err());
    }

    #[test]
    fn test_component_type_serde() {
        let ty = ComponentType::new("com.example.T").unwrap();
        let json = serde_json::to_string(&ty).unwrap();
        assert_eq!(json, "\"com.example.T\"");
        let back: ComponentType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ty);
        assert!(serde_json::from_str::<ComponentType>("\"a;b\"").is_err());
    }

    #[test]
    fn test_property_path() {
        let path = PropertyPath::parse("address.city").unwrap();
        assert_eq!(path.segments().len(), 2);
        assert_eq!(path.parents()[0].as_str(), "address");
        assert_eq!(path.leaf().as_str(), "city");
        assert!(!path.is_simple());
        assert_eq!(path.to_string(), "address.city");

        let simple = PropertyPath::parse("name").unwrap();
        assert!(simple.is_simple());
        assert!(simple.parents().is_empty());
    }

    #[test]
    fn test_invalid_property_path() {
        assert!(PropertyPath::parse("").is_err());
        assert!(PropertyPath::parse("a..b").is_err());
        assert!(PropertyPath::parse("a.").is_err());
        assert!(matches!(
            PropertyPath::decode("na;me"),
            Err(DecodeError::ReservedCharacter { ch: ';', .. })
        ));
    }
}
