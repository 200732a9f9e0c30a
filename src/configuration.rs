//! Runtime environment of the statement factories
//!
//! Everything a factory consults besides the key itself: component metadata,
//! registered caches and key generators, and the generator classes. All of
//! it is passed in explicitly; nothing is process-wide.

use crate::cache::{CacheRegistry, InMemoryCaches};
use crate::config::{CacheSelection, CompsqlConfig};
use crate::keygen::KeyGeneratorClasses;
use crate::links::LinkWalker;
use crate::metadata::{MetadataRegistry, MetadataResolver};
use crate::{Error, Result};
use std::path::Path;
use std::sync::Arc;

pub struct ComponentConfiguration {
    metadata: Arc<dyn MetadataResolver>,
    caches: Box<dyn CacheRegistry>,
    generator_classes: KeyGeneratorClasses,
}

impl ComponentConfiguration {
    /// Configuration with no caches and the built-in generator classes
    pub fn new(metadata: Arc<dyn MetadataResolver>) -> Self {
        Self {
            metadata,
            caches: Box::new(InMemoryCaches::new()),
            generator_classes: KeyGeneratorClasses::with_builtins(),
        }
    }

    pub fn with_caches(mut self, caches: impl CacheRegistry + 'static) -> Self {
        self.caches = Box::new(caches);
        self
    }

    pub fn with_generator_classes(mut self, classes: KeyGeneratorClasses) -> Self {
        self.generator_classes = classes;
        self
    }

    pub fn metadata(&self) -> &dyn MetadataResolver {
        self.metadata.as_ref()
    }

    pub fn caches(&self) -> &dyn CacheRegistry {
        self.caches.as_ref()
    }

    pub fn generator_classes(&self) -> &KeyGeneratorClasses {
        &self.generator_classes
    }

    /// Link walker over this configuration's metadata
    pub fn walker(&self) -> LinkWalker<'_> {
        LinkWalker::new(self.metadata.as_ref())
    }

    /// Build the environment described by a config file.
    ///
    /// The schema path is resolved against `base_dir`. Named key generators
    /// are instantiated through their class's no-argument constructor.
    pub fn from_config(config: &CompsqlConfig, base_dir: &Path) -> Result<Self> {
        let metadata = MetadataRegistry::load(&base_dir.join(&config.schema))?;
        let classes = KeyGeneratorClasses::with_builtins();

        let mut caches = InMemoryCaches::new();
        match &config.caches {
            CacheSelection::All => {
                for component in metadata.component_types() {
                    caches.add_cache(&component);
                }
            }
            CacheSelection::Only(components) => {
                for component in components {
                    if !metadata.is_component(component) {
                        return Err(Error::config(format!("Cache for unknown component {}", component)));
                    }
                    caches.add_cache(component);
                }
            }
        }

        for (id, class) in &config.key_generators {
            caches.add_key_generator(id.clone(), classes.instantiate_default(class)?);
        }

        tracing::debug!(
            "Configuration ready: {} components, {} caches, {} key generators",
            metadata.len(),
            caches.cache_count(),
            config.key_generators.len()
        );

        Ok(Self::new(Arc::new(metadata)).with_caches(caches).with_generator_classes(classes))
    }
}

impl std::fmt::Debug for ComponentConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentConfiguration")
            .field("generator_classes", &self.generator_classes)
            .finish_non_exhaustive()
    }
}
