//! Component and property descriptors
//!
//! A descriptor is the structured form of the per-property declarations a
//! component carries: column mapping, localized column, identity, version,
//! association, collection and cancellation flag.

use super::value_type::ValueType;
use crate::component::ComponentType;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Column mapping of a property (plain or localized)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDecl {
    /// Column name in the component's table
    pub name: String,
    /// Stored type when it differs from the property's declared type
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_override: Option<ValueType>,
    /// SQL type used when binding a null value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_type: Option<String>,
    /// Name of a custom value conversion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_handler: Option<String>,
}

impl ColumnDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), type_override: None, sql_type: None, type_handler: None }
    }

    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.type_override = Some(value_type);
        self
    }

    pub fn with_sql_type(mut self, sql_type: impl Into<String>) -> Self {
        self.sql_type = Some(sql_type.into());
        self
    }

    pub fn with_type_handler(mut self, handler: impl Into<String>) -> Self {
        self.type_handler = Some(handler.into());
        self
    }
}

/// Identity declaration and how its value is generated on insert
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityDecl {
    /// Id of a pre-registered key generator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator_id: Option<String>,
    /// Registered key generator class to instantiate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator_class: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationDecl {
    /// Target component when it differs from the declared type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ComponentType>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDecl {
    /// Element component, overriding inference from the declared type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ComponentType>,
    /// Collection type when it differs from the declared type
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_override: Option<ValueType>,
}

/// One declared property of a component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<ColumnDecl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localized_column: Option<ColumnDecl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityDecl>,
    #[serde(default)]
    pub version: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub association: Option<AssociationDecl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<CollectionDecl>,
    #[serde(default)]
    pub cancel_flag: bool,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            column: None,
            localized_column: None,
            identity: None,
            version: false,
            association: None,
            collection: None,
            cancel_flag: false,
        }
    }

    pub fn with_column(self, name: impl Into<String>) -> Self {
        self.with_column_decl(ColumnDecl::new(name))
    }

    pub fn with_column_decl(mut self, column: ColumnDecl) -> Self {
        self.column = Some(column);
        self
    }

    pub fn with_localized_column(mut self, name: impl Into<String>) -> Self {
        self.localized_column = Some(ColumnDecl::new(name));
        self
    }

    pub fn as_identity(self) -> Self {
        self.with_identity(IdentityDecl::default())
    }

    pub fn with_identity(mut self, identity: IdentityDecl) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_generator_class(self, class: impl Into<String>) -> Self {
        self.with_identity(IdentityDecl { generator_id: None, generator_class: Some(class.into()) })
    }

    pub fn with_generator_id(self, id: impl Into<String>) -> Self {
        self.with_identity(IdentityDecl { generator_id: Some(id.into()), generator_class: None })
    }

    pub fn as_version(mut self) -> Self {
        self.version = true;
        self
    }

    pub fn as_association(mut self) -> Self {
        self.association = Some(AssociationDecl::default());
        self
    }

    pub fn with_association_to(mut self, target: ComponentType) -> Self {
        self.association = Some(AssociationDecl { target: Some(target) });
        self
    }

    pub fn as_collection(self) -> Self {
        self.with_collection(CollectionDecl::default())
    }

    pub fn with_collection_of(self, element: ComponentType) -> Self {
        self.with_collection(CollectionDecl { element: Some(element), type_override: None })
    }

    pub fn with_collection(mut self, collection: CollectionDecl) -> Self {
        self.collection = Some(collection);
        self
    }

    pub fn as_cancel_flag(mut self) -> Self {
        self.cancel_flag = true;
        self
    }

    pub fn is_identity(&self) -> bool {
        self.identity.is_some()
    }

    /// Type stored in the column: the column's override, else the declared type
    pub fn stored_type(&self) -> &ValueType {
        self.column
            .as_ref()
            .or(self.localized_column.as_ref())
            .and_then(|c| c.type_override.as_ref())
            .unwrap_or(&self.value_type)
    }

    /// Declared target of an association, if this property is one
    pub fn association_type(&self) -> Option<&ComponentType> {
        let association = self.association.as_ref()?;
        association.target.as_ref().or_else(|| self.value_type.as_component())
    }

    /// Element type of a collection property.
    ///
    /// The explicit element override wins, then the declared element type;
    /// a collection without an element type yields [`ValueType::Any`].
    /// Returns `Ok(None)` when the property is not a collection and fails
    /// when the declared type is not collection-like.
    pub fn collection_element(&self, owner: &ComponentType) -> Result<Option<ValueType>> {
        let Some(collection) = &self.collection else {
            return Ok(None);
        };

        let declared = collection.type_override.as_ref().unwrap_or(&self.value_type);
        let ValueType::Collection { element, .. } = declared else {
            return Err(Error::config(format!(
                "Not accept type for collection for component={} with property={} type={}",
                owner, self.name, declared
            )));
        };

        if let Some(element) = &collection.element {
            return Ok(Some(ValueType::Component(element.clone())));
        }
        Ok(Some(element.as_deref().cloned().unwrap_or(ValueType::Any)))
    }
}

/// Declarations of one component type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    #[serde(rename = "name")]
    pub component: ComponentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// Components whose caches are linked to this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cache_links: Vec<ComponentType>,
    #[serde(default, rename = "property")]
    pub properties: Vec<PropertyDescriptor>,
}

impl ComponentDescriptor {
    pub fn new(component: ComponentType) -> Self {
        Self { component, table: None, cache_links: Vec::new(), properties: Vec::new() }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_cache_link(mut self, component: ComponentType) -> Self {
        self.cache_links.push(component);
        self
    }

    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    pub fn find_property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Look up a property, failing on unknown names
    pub fn property(&self, name: &str) -> Result<&PropertyDescriptor> {
        self.find_property(name).ok_or_else(|| {
            Error::config(format!("Unknown property {} for component {}", name, self.component))
        })
    }

    /// Table name; a component without one cannot be compiled to SQL
    pub fn table(&self) -> Result<&str> {
        match self.table.as_deref() {
            Some(table) if !table.trim().is_empty() => Ok(table),
            _ => Err(Error::config(format!("Not found table name for component {}", self.component))),
        }
    }

    pub fn identity_properties(&self) -> Vec<&PropertyDescriptor> {
        self.properties.iter().filter(|p| p.is_identity()).collect()
    }

    /// Version property, checked to be stored as a 32 or 64 bit integer
    pub fn version_property(&self) -> Result<Option<&PropertyDescriptor>> {
        let Some(version) = self.properties.iter().find(|p| p.version) else {
            return Ok(None);
        };
        if !version.stored_type().is_integer() {
            return Err(Error::config(format!(
                "Not int or long type of version for component={} with property={}",
                self.component, version.name
            )));
        }
        Ok(Some(version))
    }

    pub fn cancel_property(&self) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.cancel_flag)
    }

    pub fn localized_properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.iter().filter(|p| p.localized_column.is_some())
    }

    /// Check if this component itself declares a localized column
    pub fn declares_localized_column(&self) -> bool {
        self.localized_properties().next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(name: &str) -> ComponentType {
        ComponentType::new(name).unwrap()
    }

    fn person() -> ComponentDescriptor {
        ComponentDescriptor::new(ty("a.IPerson"))
            .with_table("T_PERSON")
            .with_property(PropertyDescriptor::new("id", ValueType::Int64).with_column("ID").as_identity())
            .with_property(PropertyDescriptor::new("version", ValueType::Int32).with_column("VERSION").as_version())
            .with_property(PropertyDescriptor::new("label", ValueType::Text).with_localized_column("LABEL"))
            .with_property(PropertyDescriptor::new("canceled", ValueType::Bool).with_column("CANCELED").as_cancel_flag())
    }

    #[test]
    fn test_lookup_properties() {
        let person = person();
        assert_eq!(person.property("id").unwrap().name, "id");
        assert!(person.property("missing").unwrap_err().is_configuration());
        assert_eq!(person.identity_properties().len(), 1);
        assert_eq!(person.version_property().unwrap().unwrap().name, "version");
        assert_eq!(person.cancel_property().unwrap().name, "canceled");
        assert!(person.declares_localized_column());
        assert_eq!(person.table().unwrap(), "T_PERSON");
    }

    #[test]
    fn test_missing_table() {
        let bare = ComponentDescriptor::new(ty("a.IBare"));
        assert!(bare.table().unwrap_err().is_configuration());
        let blank = ComponentDescriptor::new(ty("a.IBare")).with_table("  ");
        assert!(blank.table().is_err());
    }

    #[test]
    fn test_version_must_be_integer() {
        let component = ComponentDescriptor::new(ty("a.IDoc"))
            .with_property(PropertyDescriptor::new("version", ValueType::Text).with_column("VERSION").as_version());
        assert!(component.version_property().unwrap_err().is_configuration());

        let overridden = ComponentDescriptor::new(ty("a.IDoc")).with_property(
            PropertyDescriptor::new("version", ValueType::Named("a.Revision".into()))
                .with_column_decl(ColumnDecl::new("VERSION").with_type(ValueType::Int64))
                .as_version(),
        );
        assert!(overridden.version_property().unwrap().is_some());
    }

    #[test]
    fn test_association_type() {
        let address = ty("a.IAddress");
        let declared = PropertyDescriptor::new("address", ValueType::component(&address)).as_association();
        assert_eq!(declared.association_type(), Some(&address));

        let overridden = PropertyDescriptor::new("address", ValueType::Named("a.IAddressLike".into()))
            .with_association_to(address.clone());
        assert_eq!(overridden.association_type(), Some(&address));

        let plain = PropertyDescriptor::new("address", ValueType::component(&address));
        assert_eq!(plain.association_type(), None);
    }

    #[test]
    fn test_collection_element() {
        let owner = ty("a.IWagon");
        let wheel = ty("a.IWheel");

        let inferred = PropertyDescriptor::new("wheels", ValueType::list_of(ValueType::component(&wheel))).as_collection();
        assert_eq!(inferred.collection_element(&owner).unwrap(), Some(ValueType::component(&wheel)));

        let raw = PropertyDescriptor::new("wheels", "list".parse().unwrap()).as_collection();
        assert_eq!(raw.collection_element(&owner).unwrap(), Some(ValueType::Any));

        let overridden = PropertyDescriptor::new("wheels", "list".parse().unwrap()).with_collection_of(wheel.clone());
        assert_eq!(overridden.collection_element(&owner).unwrap(), Some(ValueType::component(&wheel)));

        let not_a_collection = PropertyDescriptor::new("wheels", ValueType::Text).as_collection();
        assert!(not_a_collection.collection_element(&owner).unwrap_err().is_configuration());

        let plain = PropertyDescriptor::new("code", ValueType::Text);
        assert_eq!(plain.collection_element(&owner).unwrap(), None);
    }
}
