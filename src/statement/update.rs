//! Update statements
//!
//! ```text
//! UPDATE T_TABLE SET CODE = ?1, LABEL = ?2, VERSION = VERSION + 1
//! WHERE ID = ?3 AND VERSION = ?4
//! ```
//!
//! Localized columns are only written when named in `nlsProperties`.

use super::columns::{column_of, identity_columns, localized_column_of, version_column, Bindings};
use super::factory::{decode_accepted, StatementFactory};
use super::{CacheParticipation, SqlCommand, StatementDefinition};
use crate::configuration::ComponentConfiguration;
use crate::key::{KeyParams, StatementKind};
use crate::{Error, Result};

pub struct UpdateStatementFactory;

impl StatementFactory for UpdateStatementFactory {
    fn name(&self) -> &str {
        "update"
    }

    fn kinds(&self) -> &[StatementKind] {
        &[StatementKind::Update]
    }

    fn create_statement(&self, configuration: &ComponentConfiguration, key: &str) -> Result<StatementDefinition> {
        let statement_key = decode_accepted(key, self.kinds())?;
        let component = statement_key.component();
        let KeyParams::Update { nls_properties } = statement_key.params() else {
            return Err(Error::NotFound(key.to_string()));
        };
        tracing::debug!("Create update for {}", component);

        let descriptor = configuration.metadata().descriptor(component)?;
        let table = descriptor.table()?;
        let identities = identity_columns(descriptor)?;
        let version = version_column(descriptor)?;

        let mut bindings = Bindings::new();
        let mut assignments = Vec::new();

        for property in &descriptor.properties {
            if property.is_identity() || property.version {
                continue;
            }
            if let Some(column) = column_of(descriptor, property)? {
                assignments.push(bindings.equals(property.name.clone(), &column, None));
            }
        }

        for name in nls_properties.iter().flatten() {
            let property = descriptor.property(name.as_str())?;
            let column = localized_column_of(descriptor, property)?.ok_or_else(|| {
                Error::config(format!(
                    "Not found localized column for component={} with property={}",
                    component, name
                ))
            })?;
            assignments.push(bindings.equals(name.to_string(), &column, None));
        }

        if let Some(version) = &version {
            assignments.push(format!("{0} = {0} + 1", version.name()));
        }
        if assignments.is_empty() {
            return Err(Error::config(format!("Not found column to update for component={}", component)));
        }

        let mut predicates: Vec<String> = identities
            .iter()
            .map(|column| bindings.equals(column.property.name.clone(), column, None))
            .collect();
        if let Some(version) = &version {
            predicates.push(bindings.equals(version.property.name.clone(), version, None));
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            table,
            assignments.join(", "),
            predicates.join(" AND ")
        );

        Ok(StatementDefinition {
            id: key.to_string(),
            command: SqlCommand::Update,
            sql,
            parameters: bindings.into_parameters(),
            result: None,
            key_generator: None,
            cache: CacheParticipation::write(configuration, component),
        })
    }
}
