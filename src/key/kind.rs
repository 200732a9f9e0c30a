//! Statement kinds - the operation part of a statement key

use super::grammar::split_head;
use super::DecodeError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Operation kinds understood by the built-in statement factories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementKind {
    /// Select one entity by its identity
    FindEntityById,
    /// Select components matching property values
    FindComponentsBy,
    /// Select components reached from a source component through join tables
    FindComponentsByJoinTable,
    /// Insert one component
    Insert,
    /// Update one entity by identity (and version)
    Update,
    /// Delete one entity by identity (and version)
    Delete,
    /// Delete one entity by identity only
    DeleteEntityById,
    /// Delete components matching property values
    DeleteComponentsBy,
    /// Select the value of one localized column
    FindNlsColumn,
}

impl StatementKind {
    /// Operation name as written in a key
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::FindEntityById => "findEntityById",
            StatementKind::FindComponentsBy => "findComponentsBy",
            StatementKind::FindComponentsByJoinTable => "findComponentsByJoinTable",
            StatementKind::Insert => "insert",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
            StatementKind::DeleteEntityById => "deleteEntityById",
            StatementKind::DeleteComponentsBy => "deleteComponentsBy",
            StatementKind::FindNlsColumn => "findNlsColumn",
        }
    }

    /// Get all statement kinds
    pub fn all() -> &'static [StatementKind] {
        &[
            StatementKind::FindEntityById,
            StatementKind::FindComponentsBy,
            StatementKind::FindComponentsByJoinTable,
            StatementKind::Insert,
            StatementKind::Update,
            StatementKind::Delete,
            StatementKind::DeleteEntityById,
            StatementKind::DeleteComponentsBy,
            StatementKind::FindNlsColumn,
        ]
    }

    /// Check if statements of this kind modify rows
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            StatementKind::Insert
                | StatementKind::Update
                | StatementKind::Delete
                | StatementKind::DeleteEntityById
                | StatementKind::DeleteComponentsBy
        )
    }

    /// Identify the kind of a raw key from its head alone.
    ///
    /// Only the `Type/operation` prefix is inspected; the parameters are left
    /// to the kind-specific decoder.
    pub fn sniff(key: &str) -> Option<StatementKind> {
        let head = split_head(key).ok()?;
        head.operation.parse().ok()
    }
}

impl FromStr for StatementKind {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatementKind::all()
            .iter()
            .find(|kind| kind.as_str() == s)
            .copied()
            .ok_or_else(|| DecodeError::UnknownOperation(s.to_string()))
    }
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in StatementKind::all() {
            let parsed: StatementKind = kind.as_str().parse().unwrap();
            assert_eq!(*kind, parsed);
        }
    }

    #[test]
    fn test_operation_names_are_case_sensitive() {
        assert!("Insert".parse::<StatementKind>().is_err());
        assert!("findentitybyid".parse::<StatementKind>().is_err());
    }

    #[test]
    fn test_sniff() {
        assert_eq!(StatementKind::sniff("T/insert"), Some(StatementKind::Insert));
        assert_eq!(
            StatementKind::sniff("a.b.T/findComponentsBy?properties=x"),
            Some(StatementKind::FindComponentsBy)
        );
        // the head is enough, malformed parameters are the decoder's business
        assert_eq!(
            StatementKind::sniff("T/update?nlsProperties=a;b"),
            Some(StatementKind::Update)
        );
        assert_eq!(StatementKind::sniff("T/frobnicate"), None);
        assert_eq!(StatementKind::sniff("insert"), None);
    }

    #[test]
    fn test_write_kinds() {
        assert!(StatementKind::Insert.is_write());
        assert!(StatementKind::DeleteComponentsBy.is_write());
        assert!(!StatementKind::FindEntityById.is_write());
        assert!(!StatementKind::FindNlsColumn.is_write());
    }
}
