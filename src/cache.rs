//! Cache registry boundary
//!
//! Statements only reference caches by identity; storage and eviction are
//! the business of whoever executes them.

use crate::component::ComponentType;
use crate::keygen::KeyGenerator;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Identity of a registered cache
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CacheHandle {
    id: String,
}

impl CacheHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for CacheHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Cache key of a component type (its type name)
pub fn cache_key(component: &ComponentType) -> String {
    component.as_str().to_string()
}

/// Lookup of caches and named key generators
pub trait CacheRegistry: Send + Sync {
    fn cache_for(&self, cache_key: &str) -> Option<CacheHandle>;

    fn key_generator_for(&self, id: &str) -> Option<Arc<dyn KeyGenerator>>;
}

/// Caches and key generators registered up front
#[derive(Debug, Default)]
pub struct InMemoryCaches {
    caches: HashMap<String, CacheHandle>,
    key_generators: HashMap<String, Arc<dyn KeyGenerator>>,
}

impl InMemoryCaches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the cache of a component
    pub fn add_cache(&mut self, component: &ComponentType) {
        let key = cache_key(component);
        self.caches.insert(key.clone(), CacheHandle::new(key));
    }

    pub fn add_key_generator(&mut self, id: impl Into<String>, generator: Arc<dyn KeyGenerator>) {
        self.key_generators.insert(id.into(), generator);
    }

    pub fn with_cache(mut self, component: &ComponentType) -> Self {
        self.add_cache(component);
        self
    }

    pub fn with_key_generator(mut self, id: impl Into<String>, generator: Arc<dyn KeyGenerator>) -> Self {
        self.add_key_generator(id, generator);
        self
    }

    pub fn cache_count(&self) -> usize {
        self.caches.len()
    }
}

impl CacheRegistry for InMemoryCaches {
    fn cache_for(&self, cache_key: &str) -> Option<CacheHandle> {
        self.caches.get(cache_key).cloned()
    }

    fn key_generator_for(&self, id: &str) -> Option<Arc<dyn KeyGenerator>> {
        self.key_generators.get(id).cloned()
    }
}
