//! Statement factory framework
//!
//! Defines the trait every statement factory implements and the ordered
//! registry that dispatches raw keys to them.

use super::StatementDefinition;
use crate::configuration::ComponentConfiguration;
use crate::key::grammar::split_head;
use crate::key::{decode, StatementKey, StatementKind};
use crate::{Error, Result};

/// Trait for statement factories
///
/// A factory claims one or more operation kinds. Acceptance only looks at
/// the `Type/operation` head of the key; the parameters are decoded once the
/// factory has been chosen.
pub trait StatementFactory: Send + Sync {
    /// Get the factory name (for logs and display)
    fn name(&self) -> &str;

    /// Operation kinds this factory compiles
    fn kinds(&self) -> &[StatementKind];

    /// Check if this factory handles a key
    fn accept_key(&self, key: &str) -> bool {
        StatementKind::sniff(key).is_some_and(|kind| self.kinds().contains(&kind))
    }

    /// Compile an accepted key
    fn create_statement(&self, configuration: &ComponentConfiguration, key: &str) -> Result<StatementDefinition>;
}

/// Decode a key for a factory claiming `kinds`
pub fn decode_accepted(key: &str, kinds: &[StatementKind]) -> Result<StatementKey> {
    let kind = StatementKind::sniff(key)
        .filter(|kind| kinds.contains(kind))
        .ok_or_else(|| Error::NotFound(key.to_string()))?;
    Ok(decode(key, kind)?)
}

/// Registry of statement factories, consulted in registration order
#[derive(Default)]
pub struct StatementRegistry {
    factories: Vec<Box<dyn StatementFactory>>,
}

impl StatementRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory after the ones already registered
    pub fn register(&mut self, factory: impl StatementFactory + 'static) {
        self.factories.push(Box::new(factory));
    }

    /// First factory accepting the key
    pub fn find_factory(&self, key: &str) -> Option<&dyn StatementFactory> {
        self.factories
            .iter()
            .find(|f| f.accept_key(key))
            .map(|f| f.as_ref())
    }

    /// Get all registered factories
    pub fn factories(&self) -> &[Box<dyn StatementFactory>] {
        &self.factories
    }

    /// Compile a raw key.
    ///
    /// A key without a well-formed `Type/operation` head is a decode error;
    /// a well-formed key no factory accepts is `NotFound`.
    pub fn resolve(&self, configuration: &ComponentConfiguration, key: &str) -> Result<StatementDefinition> {
        split_head(key)?;

        match self.find_factory(key) {
            Some(factory) => {
                tracing::debug!("Factory {} accepts {}", factory.name(), key);
                factory.create_statement(configuration, key)
            }
            None => {
                tracing::warn!("No statement factory accepts {}", key);
                Err(Error::NotFound(key.to_string()))
            }
        }
    }

    /// Compile a structured key through its canonical string
    pub fn resolve_key(&self, configuration: &ComponentConfiguration, key: &StatementKey) -> Result<StatementDefinition> {
        self.resolve(configuration, &key.encode())
    }
}

/// Create a default registry with all built-in factories.
///
/// Order: insert, update, deletes, finders, localized column.
pub fn default_registry() -> StatementRegistry {
    let mut registry = StatementRegistry::new();
    registry.register(super::insert::InsertStatementFactory);
    registry.register(super::update::UpdateStatementFactory);
    registry.register(super::delete::DeleteStatementFactory);
    registry.register(super::select::FindStatementFactory);
    registry.register(super::nls::NlsColumnStatementFactory);
    registry
}
