//! Localized column lookup
//!
//! `SELECT t.LABEL FROM T_TABLE t WHERE t.ID = ?1` for one property declared
//! with a localized column.

use super::columns::{identity_columns, localized_column_of, Bindings, TARGET_ALIAS};
use super::factory::{decode_accepted, StatementFactory};
use super::{CacheParticipation, ResultShape, SqlCommand, StatementDefinition};
use crate::configuration::ComponentConfiguration;
use crate::key::{KeyParams, StatementKind};
use crate::{Error, Result};

pub struct NlsColumnStatementFactory;

impl StatementFactory for NlsColumnStatementFactory {
    fn name(&self) -> &str {
        "findNlsColumn"
    }

    fn kinds(&self) -> &[StatementKind] {
        &[StatementKind::FindNlsColumn]
    }

    fn create_statement(&self, configuration: &ComponentConfiguration, key: &str) -> Result<StatementDefinition> {
        let statement_key = decode_accepted(key, self.kinds())?;
        let component = statement_key.component();
        let KeyParams::FindNlsColumn { property } = statement_key.params() else {
            return Err(Error::NotFound(key.to_string()));
        };
        tracing::debug!("Create findNlsColumn {} for {}", property, component);

        let descriptor = configuration.metadata().descriptor(component)?;
        let table = descriptor.table()?;
        let property = descriptor.property(property.as_str())?;
        let column = localized_column_of(descriptor, property)?.ok_or_else(|| {
            Error::config(format!(
                "Not found localized column for component={} with property={}",
                component, property.name
            ))
        })?;

        let mut bindings = Bindings::new();
        let predicates: Vec<String> = identity_columns(descriptor)?
            .iter()
            .map(|id| bindings.equals(id.property.name.clone(), id, Some(TARGET_ALIAS)))
            .collect();

        let sql = format!(
            "SELECT {} FROM {} {} WHERE {}",
            column.qualified(Some(TARGET_ALIAS)),
            table,
            TARGET_ALIAS,
            predicates.join(" AND ")
        );

        Ok(StatementDefinition {
            id: key.to_string(),
            command: SqlCommand::Select,
            sql,
            parameters: bindings.into_parameters(),
            result: Some(ResultShape {
                component: component.clone(),
                columns: vec![column.result_column()],
                localized: true,
            }),
            key_generator: None,
            cache: CacheParticipation::read(configuration, component)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentType;
    use crate::metadata::{ComponentDescriptor, MetadataRegistry, PropertyDescriptor, ValueType};
    use std::sync::Arc;

    fn configuration() -> ComponentConfiguration {
        let country = ComponentDescriptor::new(ComponentType::new("a.ICountry").unwrap())
            .with_table("T_COUNTRY")
            .with_property(PropertyDescriptor::new("id", ValueType::Text).with_column("CODE").as_identity())
            .with_property(PropertyDescriptor::new("name", ValueType::Text).with_localized_column("NAME"))
            .with_property(PropertyDescriptor::new("population", ValueType::Int64).with_column("POPULATION"));
        ComponentConfiguration::new(Arc::new(MetadataRegistry::new().with(country).unwrap()))
    }

    #[test]
    fn test_find_nls_column() {
        let statement = NlsColumnStatementFactory
            .create_statement(&configuration(), "a.ICountry/findNlsColumn?property=name")
            .unwrap();
        assert_eq!(statement.sql, "SELECT t.NAME FROM T_COUNTRY t WHERE t.CODE = ?1");
        assert_eq!(statement.parameter_properties(), vec!["id"]);

        let result = statement.result.unwrap();
        assert_eq!(result.columns[0].property, "name");
        assert!(result.columns[0].localized);
        assert!(!statement.cache.flush_cache_required);
    }

    #[test]
    fn test_property_must_be_localized() {
        let configuration = configuration();
        assert!(NlsColumnStatementFactory
            .create_statement(&configuration, "a.ICountry/findNlsColumn?property=population")
            .unwrap_err()
            .is_configuration());
        assert!(NlsColumnStatementFactory
            .create_statement(&configuration, "a.ICountry/findNlsColumn?property=capital")
            .unwrap_err()
            .is_configuration());
    }
}
