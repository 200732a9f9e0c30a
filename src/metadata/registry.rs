//! In-memory metadata registry
//!
//! Components are registered with the builder API or loaded from a TOML
//! schema:
//!
//! ```toml
//! [[component]]
//! name = "com.example.ITrain"
//! table = "T_TRAIN"
//!
//! [[component.property]]
//! name = "id"
//! type = "i64"
//! column = { name = "ID" }
//! identity = { generator_class = "counter" }
//! ```

use super::{ComponentDescriptor, MetadataResolver};
use crate::component::ComponentType;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Default, Serialize, Deserialize)]
struct SchemaFile {
    #[serde(default, rename = "component")]
    components: Vec<ComponentDescriptor>,
}

/// Component descriptors keyed by type
#[derive(Debug, Default, Clone)]
pub struct MetadataRegistry {
    components: HashMap<ComponentType, ComponentDescriptor>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component, refusing a second descriptor for the same type
    pub fn register(&mut self, descriptor: ComponentDescriptor) -> Result<()> {
        if self.components.contains_key(&descriptor.component) {
            return Err(Error::config(format!("Component {} already registered", descriptor.component)));
        }
        tracing::trace!("Registering component {}", descriptor.component);
        self.components.insert(descriptor.component.clone(), descriptor);
        Ok(())
    }

    /// Builder form of [`register`](Self::register)
    pub fn with(mut self, descriptor: ComponentDescriptor) -> Result<Self> {
        self.register(descriptor)?;
        Ok(self)
    }

    /// Parse a TOML schema
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let schema: SchemaFile = toml::from_str(contents)?;
        let mut registry = Self::new();
        for descriptor in schema.components {
            registry.register(descriptor)?;
        }
        Ok(registry)
    }

    /// Load a TOML schema file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let registry = Self::from_toml_str(&contents)?;
        tracing::debug!("Loaded {} components from {}", registry.len(), path.display());
        Ok(registry)
    }

    /// Registered types, sorted by name
    pub fn component_types(&self) -> Vec<ComponentType> {
        let mut types: Vec<_> = self.components.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl MetadataResolver for MetadataRegistry {
    fn descriptor(&self, component: &ComponentType) -> Result<&ComponentDescriptor> {
        self.components
            .get(component)
            .ok_or_else(|| Error::config(format!("Unknown component {}", component)))
    }

    fn is_component(&self, component: &ComponentType) -> bool {
        self.components.contains_key(component)
    }
}
