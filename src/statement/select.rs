//! Finder statements
//!
//! All finders select every mapped column of the target component under the
//! alias `t`:
//!
//! ```text
//! findEntityById             SELECT ... FROM T_TABLE t WHERE t.ID = ?1
//! findComponentsBy           SELECT ... FROM T_TABLE t WHERE t.A = ?1 [AND cancel] [ORDER BY ...]
//! findComponentsByJoinTable  SELECT ... FROM S_TABLE s
//!                              INNER JOIN J1 j1 ON j1.SRC = s.ID
//!                              INNER JOIN T_TABLE t ON t.ID = j1.TGT
//!                            WHERE s.ID = ?1 [AND cancel] [ORDER BY ...]
//! ```

use super::columns::{
    cancel_clause, identity_columns, mapped_columns, order_clause, resolve_column, Bindings, ColumnRef,
    SOURCE_ALIAS, TARGET_ALIAS,
};
use super::factory::{decode_accepted, StatementFactory};
use super::{CacheParticipation, ResultShape, SqlCommand, StatementDefinition};
use crate::component::{ComponentType, PropertyPath};
use crate::configuration::ComponentConfiguration;
use crate::key::{JoinSpec, KeyParams, OrderSpec, StatementKind};
use crate::metadata::{ComponentDescriptor, MetadataResolver};
use crate::{Error, Result};

pub struct FindStatementFactory;

impl StatementFactory for FindStatementFactory {
    fn name(&self) -> &str {
        "find"
    }

    fn kinds(&self) -> &[StatementKind] {
        &[
            StatementKind::FindEntityById,
            StatementKind::FindComponentsBy,
            StatementKind::FindComponentsByJoinTable,
        ]
    }

    fn create_statement(&self, configuration: &ComponentConfiguration, key: &str) -> Result<StatementDefinition> {
        let statement_key = decode_accepted(key, self.kinds())?;
        let component = statement_key.component();
        tracing::debug!("Create {} for {}", statement_key.kind(), component);

        let metadata = configuration.metadata();
        let descriptor = metadata.descriptor(component)?;
        let mut bindings = Bindings::new();
        let mut cache = CacheParticipation::read(configuration, component)?;

        let no_order: &[OrderSpec] = &[];
        let (from, mut predicates, order_by, ignore_cancel) = match statement_key.params() {
            KeyParams::FindEntityById => {
                let predicates: Vec<String> = identity_columns(descriptor)?
                    .iter()
                    .map(|column| bindings.equals(column.property.name.clone(), column, Some(TARGET_ALIAS)))
                    .collect();
                (target_from(descriptor)?, predicates, no_order, false)
            }
            KeyParams::FindComponentsBy { properties, order_by, ignore_cancel } => {
                let predicates = property_predicates(metadata, component, properties, TARGET_ALIAS, &mut bindings)?;
                (target_from(descriptor)?, predicates, order_by.as_slice(), *ignore_cancel)
            }
            KeyParams::FindComponentsByJoinTable {
                source,
                source_properties,
                target_properties,
                joins,
                order_by,
                ignore_cancel,
            } => {
                let from = join_from(metadata, descriptor, source, source_properties, target_properties, joins)?;
                let predicates = property_predicates(metadata, source, source_properties, SOURCE_ALIAS, &mut bindings)?;
                if source != component {
                    cache.invalidated_by.insert(source.clone());
                }
                (from, predicates, order_by.as_slice(), *ignore_cancel)
            }
            _ => return Err(Error::NotFound(key.to_string())),
        };

        if ignore_cancel {
            predicates.push(cancel_clause(descriptor, Some(TARGET_ALIAS))?);
        }

        let (select_list, result) = result_shape(configuration, descriptor)?;
        let mut sql = format!("SELECT {} FROM {}", select_list, from);
        if !predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&predicates.join(" AND "));
        }
        if let Some(order) = order_clause(metadata, component, order_by, Some(TARGET_ALIAS))? {
            sql.push(' ');
            sql.push_str(&order);
        }

        Ok(StatementDefinition {
            id: key.to_string(),
            command: SqlCommand::Select,
            sql,
            parameters: bindings.into_parameters(),
            result: Some(result),
            key_generator: None,
            cache,
        })
    }
}

fn target_from(descriptor: &ComponentDescriptor) -> Result<String> {
    Ok(format!("{} {}", descriptor.table()?, TARGET_ALIAS))
}

fn property_predicates(
    metadata: &dyn MetadataResolver,
    component: &ComponentType,
    properties: &[PropertyPath],
    alias: &str,
    bindings: &mut Bindings,
) -> Result<Vec<String>> {
    properties
        .iter()
        .map(|path| {
            let column = resolve_column(metadata, component, path)?;
            Ok(bindings.equals(path.to_string(), &column, Some(alias)))
        })
        .collect()
}

/// Selected columns and the matching result shape
fn result_shape(
    configuration: &ComponentConfiguration,
    descriptor: &ComponentDescriptor,
) -> Result<(String, ResultShape)> {
    let columns = mapped_columns(descriptor)?;
    if columns.is_empty() {
        return Err(Error::config(format!("Not found column for component={}", descriptor.component)));
    }
    let select_list = columns
        .iter()
        .map(|c| c.qualified(Some(TARGET_ALIAS)))
        .collect::<Vec<_>>()
        .join(", ");
    let shape = ResultShape {
        component: descriptor.component.clone(),
        columns: columns.iter().map(ColumnRef::result_column).collect(),
        localized: configuration.walker().uses_localized_column(&descriptor.component)?,
    };
    Ok((select_list, shape))
}

/// `FROM` clause chaining the source table through every join step to the
/// target table
fn join_from(
    metadata: &dyn MetadataResolver,
    target: &ComponentDescriptor,
    source: &ComponentType,
    source_properties: &[PropertyPath],
    target_properties: &[PropertyPath],
    joins: &[JoinSpec],
) -> Result<String> {
    let source_descriptor = metadata.descriptor(source)?;
    let source_table = source_descriptor.table()?;
    let target_table = target.table()?;

    let mut previous_alias = SOURCE_ALIAS.to_string();
    let mut previous_columns = source_properties
        .iter()
        .map(|path| Ok(resolve_column(metadata, source, path)?.name().to_string()))
        .collect::<Result<Vec<_>>>()?;

    let mut from = format!("{} {}", source_table, SOURCE_ALIAS);
    for (i, join) in joins.iter().enumerate() {
        let alias = format!("j{}", i + 1);
        let conditions = pair_columns(
            join.source_columns().iter().map(|c| c.as_str()),
            &previous_columns,
            &alias,
            &previous_alias,
            || format!("join step {} ({})", i + 1, join.table()),
        )?;
        from.push_str(&format!(" INNER JOIN {} {} ON {}", join.table(), alias, conditions));

        previous_alias = alias;
        previous_columns = join.target_columns().iter().map(|c| c.to_string()).collect();
    }

    let target_columns = target_properties
        .iter()
        .map(|path| Ok(resolve_column(metadata, &target.component, path)?.name().to_string()))
        .collect::<Result<Vec<_>>>()?;
    let conditions = pair_columns(
        target_columns.iter().map(String::as_str),
        &previous_columns,
        TARGET_ALIAS,
        &previous_alias,
        || format!("target {}", target.component),
    )?;
    from.push_str(&format!(" INNER JOIN {} {} ON {}", target_table, TARGET_ALIAS, conditions));

    Ok(from)
}

/// `alias.A = previous.X AND alias.B = previous.Y`, columns paired by position
fn pair_columns<'a>(
    columns: impl ExactSizeIterator<Item = &'a str>,
    previous: &[String],
    alias: &str,
    previous_alias: &str,
    step: impl Fn() -> String,
) -> Result<String> {
    if columns.len() != previous.len() {
        return Err(Error::config(format!(
            "Column count mismatch in {}: {} columns joined to {}",
            step(),
            columns.len(),
            previous.len()
        )));
    }
    Ok(columns
        .zip(previous)
        .map(|(column, prev)| format!("{}.{} = {}.{}", alias, column, previous_alias, prev))
        .collect::<Vec<_>>()
        .join(" AND "))
}
