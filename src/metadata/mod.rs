//! Component metadata
//!
//! The resolver is the boundary between the statement compiler and whatever
//! describes components: a TOML schema, builder calls, or generated tables.
//! Lookups of unknown types or properties fail; absent declarations on a
//! known property are `None`.

pub mod descriptor;
pub mod registry;
pub mod value_type;

pub use descriptor::{
    AssociationDecl, CollectionDecl, ColumnDecl, ComponentDescriptor, IdentityDecl, PropertyDescriptor,
};
pub use registry::MetadataRegistry;
pub use value_type::{CollectionShape, ValueType};

use crate::component::{ComponentType, PropertyPath};
use crate::{Error, Result};

/// A property path resolved down to its leaf
#[derive(Debug, Clone, Copy)]
pub struct ResolvedProperty<'a> {
    /// Component declaring the leaf property
    pub owner: &'a ComponentDescriptor,
    pub property: &'a PropertyDescriptor,
}

/// Lookup interface for component metadata
pub trait MetadataResolver: Send + Sync {
    /// Get the descriptor of a component type
    fn descriptor(&self, component: &ComponentType) -> Result<&ComponentDescriptor>;

    /// Check if a type is a registered component
    fn is_component(&self, component: &ComponentType) -> bool;

    /// Declared properties in declaration order
    fn properties_of(&self, component: &ComponentType) -> Result<&[PropertyDescriptor]> {
        Ok(&self.descriptor(component)?.properties)
    }

    fn property(&self, component: &ComponentType, name: &str) -> Result<&PropertyDescriptor> {
        self.descriptor(component)?.property(name)
    }

    /// Resolve a dotted path through single-valued associations.
    ///
    /// Every non-final segment must be an association whose target is a
    /// registered component; collections are rejected.
    fn resolve_path(&self, component: &ComponentType, path: &PropertyPath) -> Result<ResolvedProperty<'_>> {
        let mut owner = self.descriptor(component)?;
        for segment in path.parents() {
            let property = owner.property(segment.as_str())?;
            let target = match property.association_type() {
                Some(target) if property.collection.is_none() && self.is_component(target) => target,
                _ => {
                    return Err(Error::config(format!(
                        "Property {} not accepted in path {} of component {}, not a component association",
                        segment, path, component
                    )));
                }
            };
            owner = self.descriptor(target)?;
        }
        let property = owner.property(path.leaf().as_str())?;
        Ok(ResolvedProperty { owner, property })
    }
}
