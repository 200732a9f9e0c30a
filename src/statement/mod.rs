//! Compiled statements and the factories producing them
//!
//! A [`StatementDefinition`] is fully resolved: SQL text with positional
//! placeholders, one typed binding per placeholder, the result shape of
//! reads, the key generator of inserts and the cache wiring.

pub mod columns;
pub mod delete;
pub mod factory;
pub mod insert;
pub mod nls;
pub mod select;
pub mod update;

pub use columns::{Bindings, ColumnRef};
pub use delete::DeleteStatementFactory;
pub use factory::{default_registry, StatementFactory, StatementRegistry};
pub use insert::InsertStatementFactory;
pub use nls::NlsColumnStatementFactory;
pub use select::FindStatementFactory;
pub use update::UpdateStatementFactory;

use crate::cache::{cache_key, CacheHandle};
use crate::component::ComponentType;
use crate::configuration::ComponentConfiguration;
use crate::keygen::KeyGenerator;
use crate::metadata::ValueType;
use crate::Result;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// SQL command of a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlCommand {
    Select,
    Insert,
    Update,
    Delete,
}

/// Typed binding of one `?n` placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterBinding {
    /// 1-based placeholder index
    pub index: usize,
    /// Property (or dotted path) the value is read from
    pub property: String,
    pub value_type: ValueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_handler: Option<String>,
}

/// One selected column and the property it maps to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultColumn {
    pub column: String,
    pub property: String,
    pub localized: bool,
}

/// Row shape of a read statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultShape {
    pub component: ComponentType,
    pub columns: Vec<ResultColumn>,
    /// Some component reachable from the result uses localized columns
    pub localized: bool,
}

/// Key generator attached to an insert
#[derive(Clone, Serialize)]
pub struct KeyGeneration {
    pub property: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(serialize_with = "serialize_generator")]
    pub generator: Arc<dyn KeyGenerator>,
    /// Database sequence backing the generator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<String>,
    /// Query run before the insert to fetch the identity value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select_key: Option<String>,
}

fn serialize_generator<S>(generator: &Arc<dyn KeyGenerator>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(generator.class_name())
}

impl fmt::Debug for KeyGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyGeneration")
            .field("property", &self.property)
            .field("column", &self.column)
            .field("generator", &self.generator.class_name())
            .field("sequence", &self.sequence)
            .field("select_key", &self.select_key)
            .finish()
    }
}

/// Cache flags and the cache a statement is bound to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheParticipation {
    pub use_cache: bool,
    pub flush_cache_required: bool,
    pub cache: Option<CacheHandle>,
    /// Components whose changes invalidate results of this statement
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub invalidated_by: BTreeSet<ComponentType>,
}

impl CacheParticipation {
    /// Writes use and flush the target's cache
    pub fn write(configuration: &ComponentConfiguration, component: &ComponentType) -> Self {
        Self {
            use_cache: true,
            flush_cache_required: true,
            cache: configuration.caches().cache_for(&cache_key(component)),
            invalidated_by: BTreeSet::new(),
        }
    }

    /// Reads use the target's cache and are invalidated by its link closure
    pub fn read(configuration: &ComponentConfiguration, component: &ComponentType) -> Result<Self> {
        Ok(Self {
            use_cache: true,
            flush_cache_required: false,
            cache: configuration.caches().cache_for(&cache_key(component)),
            invalidated_by: configuration.walker().link_closure(component)?,
        })
    }
}

/// A compiled statement
#[derive(Debug, Clone, Serialize)]
pub struct StatementDefinition {
    /// The statement key this was compiled from
    pub id: String,
    pub command: SqlCommand,
    pub sql: String,
    pub parameters: Vec<ParameterBinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultShape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_generator: Option<KeyGeneration>,
    pub cache: CacheParticipation,
}

impl StatementDefinition {
    pub fn is_write(&self) -> bool {
        self.command != SqlCommand::Select
    }

    /// Property names bound to the placeholders, in placeholder order
    pub fn parameter_properties(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.property.as_str()).collect()
    }
}
