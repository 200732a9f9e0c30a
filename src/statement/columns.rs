//! Column resolution and placeholder bindings shared by the factories

use super::{ParameterBinding, ResultColumn};
use crate::component::{ComponentType, PropertyPath};
use crate::key::OrderSpec;
use crate::metadata::{ColumnDecl, ComponentDescriptor, MetadataResolver, PropertyDescriptor, ValueType};
use crate::{Error, Result};

/// Alias of the target table in reads
pub const TARGET_ALIAS: &str = "t";
/// Alias of the source table in join-table reads
pub const SOURCE_ALIAS: &str = "s";

/// A property mapped to a column or localized column
#[derive(Debug, Clone, Copy)]
pub struct ColumnRef<'a> {
    pub property: &'a PropertyDescriptor,
    pub decl: &'a ColumnDecl,
    pub localized: bool,
}

impl<'a> ColumnRef<'a> {
    pub fn name(&self) -> &'a str {
        &self.decl.name
    }

    /// `alias.COLUMN`, or the bare column without an alias
    pub fn qualified(&self, alias: Option<&str>) -> String {
        match alias {
            Some(alias) => format!("{}.{}", alias, self.decl.name),
            None => self.decl.name.clone(),
        }
    }

    /// Bound type: the column override, else the declared property type
    pub fn value_type(&self) -> &'a ValueType {
        self.decl.type_override.as_ref().unwrap_or(&self.property.value_type)
    }

    pub fn result_column(&self) -> ResultColumn {
        ResultColumn {
            column: self.decl.name.clone(),
            property: self.property.name.clone(),
            localized: self.localized,
        }
    }
}

fn checked<'a>(
    owner: &ComponentDescriptor,
    property: &'a PropertyDescriptor,
    decl: Option<&'a ColumnDecl>,
    localized: bool,
) -> Result<Option<ColumnRef<'a>>> {
    let Some(decl) = decl else {
        return Ok(None);
    };
    if decl.name.trim().is_empty() {
        let what = if localized { "localized column" } else { "column" };
        return Err(Error::config(format!(
            "Not name in {} for component={} with property={}",
            what, owner.component, property.name
        )));
    }
    Ok(Some(ColumnRef { property, decl, localized }))
}

/// Plain column of a property, if declared
pub fn column_of<'a>(owner: &ComponentDescriptor, property: &'a PropertyDescriptor) -> Result<Option<ColumnRef<'a>>> {
    checked(owner, property, property.column.as_ref(), false)
}

/// Localized column of a property, if declared
pub fn localized_column_of<'a>(
    owner: &ComponentDescriptor,
    property: &'a PropertyDescriptor,
) -> Result<Option<ColumnRef<'a>>> {
    checked(owner, property, property.localized_column.as_ref(), true)
}

/// Column of a property used in a predicate or order-by: the plain column,
/// else the localized one
pub fn required_column<'a>(owner: &ComponentDescriptor, property: &'a PropertyDescriptor) -> Result<ColumnRef<'a>> {
    if let Some(column) = column_of(owner, property)? {
        return Ok(column);
    }
    localized_column_of(owner, property)?.ok_or_else(|| {
        Error::config(format!(
            "Not found column for component={} with property={}",
            owner.component, property.name
        ))
    })
}

/// Resolve a possibly dotted property path of `component` to its column
pub fn resolve_column<'a>(
    metadata: &'a dyn MetadataResolver,
    component: &ComponentType,
    path: &PropertyPath,
) -> Result<ColumnRef<'a>> {
    let resolved = metadata.resolve_path(component, path)?;
    required_column(resolved.owner, resolved.property)
}

/// Identity columns; a component without identity cannot be addressed by id
pub fn identity_columns(descriptor: &ComponentDescriptor) -> Result<Vec<ColumnRef<'_>>> {
    let identities = descriptor.identity_properties();
    if identities.is_empty() {
        return Err(Error::config(format!("Not found identity for component={}", descriptor.component)));
    }
    identities
        .into_iter()
        .map(|property| required_column(descriptor, property))
        .collect()
}

pub fn version_column(descriptor: &ComponentDescriptor) -> Result<Option<ColumnRef<'_>>> {
    match descriptor.version_property()? {
        Some(property) => Ok(Some(required_column(descriptor, property)?)),
        None => Ok(None),
    }
}

/// Every mapped column of a component in declaration order, plain column
/// before localized column
pub fn mapped_columns(descriptor: &ComponentDescriptor) -> Result<Vec<ColumnRef<'_>>> {
    let mut columns = Vec::new();
    for property in &descriptor.properties {
        columns.extend(column_of(descriptor, property)?);
        columns.extend(localized_column_of(descriptor, property)?);
    }
    Ok(columns)
}

/// `(t.CANCELED IS NULL OR t.CANCELED = 0)` for the cancellation flag
pub fn cancel_clause(descriptor: &ComponentDescriptor, alias: Option<&str>) -> Result<String> {
    let property = descriptor.cancel_property().ok_or_else(|| {
        Error::config(format!("Not found cancel flag for component={}", descriptor.component))
    })?;
    let column = required_column(descriptor, property)?.qualified(alias);
    Ok(format!("({} IS NULL OR {} = 0)", column, column))
}

/// `ORDER BY ...` clause, `None` when there is nothing to order by
pub fn order_clause(
    metadata: &dyn MetadataResolver,
    component: &ComponentType,
    order_by: &[OrderSpec],
    alias: Option<&str>,
) -> Result<Option<String>> {
    if order_by.is_empty() {
        return Ok(None);
    }
    let mut entries = Vec::with_capacity(order_by.len());
    for order in order_by {
        let column = resolve_column(metadata, component, &order.property)?;
        entries.push(format!("{} {}", column.qualified(alias), order.direction.sql()));
    }
    Ok(Some(format!("ORDER BY {}", entries.join(", "))))
}

/// Placeholders allocated in SQL text order
#[derive(Debug, Default)]
pub struct Bindings {
    parameters: Vec<ParameterBinding>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next placeholder for a column value read from `property`
    pub fn bind(&mut self, property: impl Into<String>, column: &ColumnRef<'_>) -> String {
        let index = self.parameters.len() + 1;
        self.parameters.push(ParameterBinding {
            index,
            property: property.into(),
            value_type: column.value_type().clone(),
            sql_type: column.decl.sql_type.clone(),
            type_handler: column.decl.type_handler.clone(),
        });
        format!("?{}", index)
    }

    /// `COL = ?n` for a column compared with a property value
    pub fn equals(&mut self, property: impl Into<String>, column: &ColumnRef<'_>, alias: Option<&str>) -> String {
        let placeholder = self.bind(property, column);
        format!("{} = {}", column.qualified(alias), placeholder)
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn into_parameters(self) -> Vec<ParameterBinding> {
        self.parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetadataRegistry;

    fn ty(name: &str) -> ComponentType {
        ComponentType::new(name).unwrap()
    }

    fn person() -> ComponentDescriptor {
        ComponentDescriptor::new(ty("a.IPerson"))
            .with_table("T_PERSON")
            .with_property(PropertyDescriptor::new("id", ValueType::Int64).with_column("ID").as_identity())
            .with_property(
                PropertyDescriptor::new("name", ValueType::Text)
                    .with_column_decl(ColumnDecl::new("NAME").with_sql_type("VARCHAR")),
            )
            .with_property(PropertyDescriptor::new("label", ValueType::Text).with_localized_column("LABEL"))
            .with_property(PropertyDescriptor::new("version", ValueType::Int32).with_column("VERSION").as_version())
            .with_property(PropertyDescriptor::new("canceled", ValueType::Bool).with_column("CANCELED").as_cancel_flag())
            .with_property(PropertyDescriptor::new("nickname", ValueType::Text))
    }

    #[test]
    fn test_mapped_columns_order() {
        let person = person();
        let names: Vec<_> = mapped_columns(&person).unwrap().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["ID", "NAME", "LABEL", "VERSION", "CANCELED"]);
    }

    #[test]
    fn test_blank_column_name() {
        let component = ComponentDescriptor::new(ty("a.T"))
            .with_property(PropertyDescriptor::new("code", ValueType::Text).with_column(" "));
        assert!(mapped_columns(&component).unwrap_err().is_configuration());
    }

    #[test]
    fn test_required_column() {
        let person = person();
        assert_eq!(required_column(&person, person.property("label").unwrap()).unwrap().name(), "LABEL");
        assert!(required_column(&person, person.property("nickname").unwrap()).is_err());
    }

    #[test]
    fn test_identity_and_version() {
        let person = person();
        assert_eq!(identity_columns(&person).unwrap()[0].name(), "ID");
        assert_eq!(version_column(&person).unwrap().unwrap().name(), "VERSION");

        let bare = ComponentDescriptor::new(ty("a.T")).with_table("T");
        assert!(identity_columns(&bare).unwrap_err().is_configuration());
        assert!(version_column(&bare).unwrap().is_none());
    }

    #[test]
    fn test_cancel_clause() {
        assert_eq!(
            cancel_clause(&person(), Some("t")).unwrap(),
            "(t.CANCELED IS NULL OR t.CANCELED = 0)"
        );
        let bare = ComponentDescriptor::new(ty("a.T"));
        assert!(cancel_clause(&bare, None).is_err());
    }

    #[test]
    fn test_bindings_are_sequential() {
        let person = person();
        let id = required_column(&person, person.property("id").unwrap()).unwrap();
        let name = required_column(&person, person.property("name").unwrap()).unwrap();

        let mut bindings = Bindings::new();
        assert_eq!(bindings.equals("id", &id, Some("t")), "t.ID = ?1");
        assert_eq!(bindings.equals("name", &name, None), "NAME = ?2");

        let parameters = bindings.into_parameters();
        assert_eq!(parameters[0].index, 1);
        assert_eq!(parameters[0].value_type, ValueType::Int64);
        assert_eq!(parameters[1].sql_type.as_deref(), Some("VARCHAR"));
    }

    #[test]
    fn test_order_clause_with_path() {
        let address = ComponentDescriptor::new(ty("a.IAddress"))
            .with_property(PropertyDescriptor::new("city", ValueType::Text).with_column("CITY"));
        let person = person().with_property(
            PropertyDescriptor::new("address", ValueType::component(&ty("a.IAddress"))).as_association(),
        );
        let registry = MetadataRegistry::new().with(person).unwrap().with(address).unwrap();

        let clause = order_clause(
            &registry,
            &ty("a.IPerson"),
            &[
                OrderSpec::asc(PropertyPath::parse("address.city").unwrap()),
                OrderSpec::desc(PropertyPath::parse("name").unwrap()),
            ],
            Some("t"),
        )
        .unwrap();
        assert_eq!(clause.as_deref(), Some("ORDER BY t.CITY ASC, t.NAME DESC"));
        assert_eq!(order_clause(&registry, &ty("a.IPerson"), &[], None).unwrap(), None);
    }
}
