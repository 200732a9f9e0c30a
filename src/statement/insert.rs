//! Insert statements
//!
//! `INSERT INTO T_TABLE (ID, CODE, ...) VALUES (?1, ?2, ...)` over every
//! mapped column, with the identity's key generator attached.

use super::columns::{column_of, mapped_columns, Bindings};
use super::factory::{decode_accepted, StatementFactory};
use super::{CacheParticipation, KeyGeneration, SqlCommand, StatementDefinition};
use crate::component::ComponentType;
use crate::configuration::ComponentConfiguration;
use crate::key::StatementKind;
use crate::keygen::{build_key_generator, GeneratorContext};
use crate::metadata::ComponentDescriptor;
use crate::{Error, Result};

pub struct InsertStatementFactory;

impl StatementFactory for InsertStatementFactory {
    fn name(&self) -> &str {
        "insert"
    }

    fn kinds(&self) -> &[StatementKind] {
        &[StatementKind::Insert]
    }

    fn create_statement(&self, configuration: &ComponentConfiguration, key: &str) -> Result<StatementDefinition> {
        let statement_key = decode_accepted(key, self.kinds())?;
        let component = statement_key.component();
        tracing::debug!("Create insert for {}", component);

        let descriptor = configuration.metadata().descriptor(component)?;
        let table = descriptor.table()?;

        let mut bindings = Bindings::new();
        let mut columns = Vec::new();
        let mut values = Vec::new();
        for column in mapped_columns(descriptor)? {
            columns.push(column.name().to_string());
            values.push(bindings.bind(column.property.name.clone(), &column));
        }
        if columns.is_empty() {
            return Err(Error::config(format!("Not found column for component={}", component)));
        }

        let sql = format!("INSERT INTO {} ({}) VALUES ({})", table, columns.join(", "), values.join(", "));

        Ok(StatementDefinition {
            id: key.to_string(),
            command: SqlCommand::Insert,
            sql,
            parameters: bindings.into_parameters(),
            result: None,
            key_generator: key_generation(configuration, key, component, descriptor)?,
            cache: CacheParticipation::write(configuration, component),
        })
    }
}

/// Key generator of the first identity property, if any.
///
/// A generator id must name a registered generator; otherwise a generator
/// class is instantiated. An identity declaring neither gets no generator.
fn key_generation(
    configuration: &ComponentConfiguration,
    key: &str,
    component: &ComponentType,
    descriptor: &ComponentDescriptor,
) -> Result<Option<KeyGeneration>> {
    let Some(property) = descriptor.identity_properties().into_iter().next() else {
        return Ok(None);
    };
    let Some(identity) = &property.identity else {
        return Ok(None);
    };

    let generator = match (&identity.generator_id, &identity.generator_class) {
        (Some(id), _) if !id.trim().is_empty() => configuration.caches().key_generator_for(id).ok_or_else(|| {
            Error::config(format!(
                "Not found key generator {} for component={} for id={}",
                id, component, property.name
            ))
        })?,
        (_, Some(class)) if !class.trim().is_empty() => {
            let context = GeneratorContext { configuration, key, component, property: &property.name };
            build_key_generator(&context, class)?
        }
        _ => return Ok(None),
    };

    Ok(Some(KeyGeneration {
        property: property.name.clone(),
        column: column_of(descriptor, property)?.map(|c| c.name().to_string()),
        sequence: generator.sequence().map(str::to_string),
        select_key: generator.select_key_sql(),
        generator,
    }))
}
