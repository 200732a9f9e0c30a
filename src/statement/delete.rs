//! Delete statements
//!
//! - `delete`: by identity, plus version when the component has one
//! - `deleteEntityById`: by identity only
//! - `deleteComponentsBy`: by the named properties

use super::columns::{identity_columns, resolve_column, version_column, Bindings};
use super::factory::{decode_accepted, StatementFactory};
use super::{CacheParticipation, SqlCommand, StatementDefinition};
use crate::configuration::ComponentConfiguration;
use crate::key::{KeyParams, StatementKind};
use crate::{Error, Result};

pub struct DeleteStatementFactory;

impl StatementFactory for DeleteStatementFactory {
    fn name(&self) -> &str {
        "delete"
    }

    fn kinds(&self) -> &[StatementKind] {
        &[StatementKind::Delete, StatementKind::DeleteEntityById, StatementKind::DeleteComponentsBy]
    }

    fn create_statement(&self, configuration: &ComponentConfiguration, key: &str) -> Result<StatementDefinition> {
        let statement_key = decode_accepted(key, self.kinds())?;
        let component = statement_key.component();
        tracing::debug!("Create {} for {}", statement_key.kind(), component);

        let metadata = configuration.metadata();
        let descriptor = metadata.descriptor(component)?;
        let table = descriptor.table()?;

        let mut bindings = Bindings::new();
        let mut predicates = Vec::new();

        match statement_key.params() {
            KeyParams::Delete | KeyParams::DeleteEntityById => {
                for column in identity_columns(descriptor)? {
                    predicates.push(bindings.equals(column.property.name.clone(), &column, None));
                }
                if matches!(statement_key.params(), KeyParams::Delete) {
                    if let Some(version) = version_column(descriptor)? {
                        predicates.push(bindings.equals(version.property.name.clone(), &version, None));
                    }
                }
            }
            KeyParams::DeleteComponentsBy { properties } => {
                for path in properties {
                    let column = resolve_column(metadata, component, path)?;
                    predicates.push(bindings.equals(path.to_string(), &column, None));
                }
            }
            _ => return Err(Error::NotFound(key.to_string())),
        }

        let sql = format!("DELETE FROM {} WHERE {}", table, predicates.join(" AND "));

        Ok(StatementDefinition {
            id: key.to_string(),
            command: SqlCommand::Delete,
            sql,
            parameters: bindings.into_parameters(),
            result: None,
            key_generator: None,
            cache: CacheParticipation::write(configuration, component),
        })
    }
}
