//! Link graph walker
//!
//! Components link to each other through declared cache links, association
//! targets and collection element types. The walker derives the closure of
//! those links for cache invalidation and checks whether any reachable
//! component carries a localized column.
//!
//! Visited sets are local to each call; the walker holds no state of its own.

use crate::component::ComponentType;
use crate::metadata::{ComponentDescriptor, MetadataResolver, ValueType};
use crate::Result;
use std::collections::{BTreeSet, HashSet};

/// Walks component links through a metadata resolver
pub struct LinkWalker<'a> {
    metadata: &'a dyn MetadataResolver,
}

impl<'a> LinkWalker<'a> {
    pub fn new(metadata: &'a dyn MetadataResolver) -> Self {
        Self { metadata }
    }

    /// Components linked to `component` in one step.
    ///
    /// Cache links come first, then association targets and collection
    /// element types in property order. Targets that are not registered
    /// components are skipped.
    pub fn direct_links(&self, component: &ComponentType) -> Result<Vec<ComponentType>> {
        let descriptor = self.metadata.descriptor(component)?;
        let mut links = descriptor.cache_links.clone();
        for target in self.component_targets(descriptor)? {
            if !links.contains(&target) {
                links.push(target);
            }
        }
        Ok(links)
    }

    /// Transitive closure of [`direct_links`](Self::direct_links).
    ///
    /// The root is never part of its own closure, even when a cycle leads
    /// back to it: with `A -> B -> A` the closure of `A` is `{B}`.
    pub fn link_closure(&self, root: &ComponentType) -> Result<BTreeSet<ComponentType>> {
        let mut closure = BTreeSet::new();
        let mut stack = vec![root.clone()];

        while let Some(current) = stack.pop() {
            for link in self.direct_links(&current)? {
                if &link != root && closure.insert(link.clone()) {
                    stack.push(link);
                }
            }
        }

        tracing::debug!("Link closure of {} has {} components", root, closure.len());
        Ok(closure)
    }

    /// Check if `root` or any component reachable through associations and
    /// collections declares a localized column
    pub fn uses_localized_column(&self, root: &ComponentType) -> Result<bool> {
        let mut deja_vu = HashSet::new();
        self.visit_localized(root, &mut deja_vu)
    }

    fn visit_localized(&self, component: &ComponentType, deja_vu: &mut HashSet<ComponentType>) -> Result<bool> {
        deja_vu.insert(component.clone());
        tracing::trace!("Checking localized columns of {}", component);

        let descriptor = self.metadata.descriptor(component)?;
        for property in &descriptor.properties {
            if property.localized_column.is_some() {
                return Ok(true);
            }

            let target = if property.association.is_some() {
                property.association_type().cloned()
            } else {
                element_component(property.collection_element(&descriptor.component)?)
            };

            if let Some(target) = target {
                if self.metadata.is_component(&target)
                    && !deja_vu.contains(&target)
                    && self.visit_localized(&target, deja_vu)?
                {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Names of the properties of `component` that carry a localized column
    pub fn localized_properties(&self, component: &ComponentType) -> Result<BTreeSet<String>> {
        let descriptor = self.metadata.descriptor(component)?;
        Ok(descriptor.localized_properties().map(|p| p.name.clone()).collect())
    }

    fn component_targets(&self, descriptor: &ComponentDescriptor) -> Result<Vec<ComponentType>> {
        let mut targets = Vec::new();
        for property in &descriptor.properties {
            let target = if property.association.is_some() {
                property.association_type().cloned()
            } else {
                element_component(property.collection_element(&descriptor.component)?)
            };
            if let Some(target) = target.filter(|t| self.metadata.is_component(t)) {
                targets.push(target);
            }
        }
        Ok(targets)
    }
}

fn element_component(element: Option<ValueType>) -> Option<ComponentType> {
    match element? {
        ValueType::Component(component) => Some(component),
        _ => None,
    }
}
