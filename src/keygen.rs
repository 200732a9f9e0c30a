//! Key generators
//!
//! An insert statement carries a key generator when the component's identity
//! declares one, either by id (a generator registered on the configuration)
//! or by class (a constructor registered in [`KeyGeneratorClasses`]).
//!
//! A class may provide a contextual constructor, receiving the configuration,
//! the statement key, the component type and the identity property, and/or a
//! no-argument constructor. The contextual one is preferred.

use crate::component::ComponentType;
use crate::configuration::ComponentConfiguration;
use crate::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// A generated identity value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum KeyValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Int(value) => write!(f, "{}", value),
            KeyValue::Text(value) => f.write_str(value),
        }
    }
}

/// Strategy producing identity values for new rows
pub trait KeyGenerator: Send + Sync + fmt::Debug {
    /// Name of the class this generator was built from
    fn class_name(&self) -> &str;

    /// Produce the next identity value
    fn next_key(&self) -> KeyValue;

    /// Database sequence the identity is drawn from, if any
    fn sequence(&self) -> Option<&str> {
        None
    }

    /// Query fetching the next identity from the database before the insert
    fn select_key_sql(&self) -> Option<String> {
        self.sequence().map(|sequence| format!("SELECT NEXT VALUE FOR {}", sequence))
    }
}

/// Monotonically increasing integers starting at 1
#[derive(Debug)]
pub struct CounterKeyGenerator {
    next: AtomicI64,
}

impl CounterKeyGenerator {
    pub const CLASS: &'static str = "counter";

    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: i64) -> Self {
        Self { next: AtomicI64::new(first) }
    }
}

impl Default for CounterKeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyGenerator for CounterKeyGenerator {
    fn class_name(&self) -> &str {
        Self::CLASS
    }

    fn next_key(&self) -> KeyValue {
        KeyValue::Int(self.next.fetch_add(1, Ordering::SeqCst))
    }
}

/// Per-table sequence named `SEQ_<TABLE>`.
///
/// Statements carry `SELECT NEXT VALUE FOR SEQ_<TABLE>` as their select-key
/// query; `next_key` numbers rows locally when no database is involved.
#[derive(Debug)]
pub struct SequenceKeyGenerator {
    sequence: String,
    next: AtomicI64,
}

impl SequenceKeyGenerator {
    pub const CLASS: &'static str = "sequence";

    /// Derive the sequence from the component's table
    pub fn for_context(context: &GeneratorContext<'_>) -> Result<Self> {
        let descriptor = context.configuration.metadata().descriptor(context.component)?;
        let table = descriptor.table()?;
        Ok(Self::named(format!("SEQ_{}", table)))
    }

    pub fn named(sequence: impl Into<String>) -> Self {
        Self { sequence: sequence.into(), next: AtomicI64::new(1) }
    }

    pub fn sequence_name(&self) -> &str {
        &self.sequence
    }
}

impl KeyGenerator for SequenceKeyGenerator {
    fn class_name(&self) -> &str {
        Self::CLASS
    }

    fn next_key(&self) -> KeyValue {
        KeyValue::Int(self.next.fetch_add(1, Ordering::SeqCst))
    }

    fn sequence(&self) -> Option<&str> {
        Some(&self.sequence)
    }
}

/// Arguments of a contextual generator constructor
pub struct GeneratorContext<'a> {
    pub configuration: &'a ComponentConfiguration,
    pub key: &'a str,
    pub component: &'a ComponentType,
    pub property: &'a str,
}

type ContextualConstructor = Box<dyn Fn(&GeneratorContext<'_>) -> Result<Arc<dyn KeyGenerator>> + Send + Sync>;
type DefaultConstructor = Box<dyn Fn() -> Arc<dyn KeyGenerator> + Send + Sync>;

/// A named generator class and the constructors it supports
pub struct GeneratorClass {
    name: String,
    contextual: Option<ContextualConstructor>,
    default: Option<DefaultConstructor>,
}

impl GeneratorClass {
    /// Class with no constructor yet
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), contextual: None, default: None }
    }

    pub fn with_contextual<F>(mut self, constructor: F) -> Self
    where
        F: Fn(&GeneratorContext<'_>) -> Result<Arc<dyn KeyGenerator>> + Send + Sync + 'static,
    {
        self.contextual = Some(Box::new(constructor));
        self
    }

    pub fn with_default<F>(mut self, constructor: F) -> Self
    where
        F: Fn() -> Arc<dyn KeyGenerator> + Send + Sync + 'static,
    {
        self.default = Some(Box::new(constructor));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_contextual(&self) -> bool {
        self.contextual.is_some()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Build an instance: contextual constructor first, then the
    /// no-argument one. A failing contextual constructor is final.
    pub fn instantiate(&self, context: &GeneratorContext<'_>) -> Result<Arc<dyn KeyGenerator>> {
        let failure = || {
            Error::config(format!(
                "Not instancy key generator {} for component={} for id={}",
                self.name, context.component, context.property
            ))
        };

        if let Some(constructor) = &self.contextual {
            return constructor(context).map_err(|e| {
                tracing::warn!("Key generator {} failed for {}: {}", self.name, context.component, e);
                failure()
            });
        }
        match &self.default {
            Some(constructor) => Ok(constructor()),
            None => Err(failure()),
        }
    }
}

impl fmt::Debug for GeneratorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorClass")
            .field("name", &self.name)
            .field("contextual", &self.has_contextual())
            .field("default", &self.has_default())
            .finish()
    }
}

/// Generator classes available to a configuration
#[derive(Debug, Default)]
pub struct KeyGeneratorClasses {
    classes: HashMap<String, GeneratorClass>,
}

impl KeyGeneratorClasses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `counter` and `sequence` classes
    pub fn with_builtins() -> Self {
        let mut classes = Self::new();
        classes.register(
            GeneratorClass::new(CounterKeyGenerator::CLASS)
                .with_default(|| Arc::new(CounterKeyGenerator::new()) as Arc<dyn KeyGenerator>),
        );
        classes.register(GeneratorClass::new(SequenceKeyGenerator::CLASS).with_contextual(|context| {
            Ok(Arc::new(SequenceKeyGenerator::for_context(context)?) as Arc<dyn KeyGenerator>)
        }));
        classes
    }

    /// Register a class, replacing any class with the same name
    pub fn register(&mut self, class: GeneratorClass) {
        self.classes.insert(class.name.clone(), class);
    }

    pub fn get(&self, name: &str) -> Option<&GeneratorClass> {
        self.classes.get(name)
    }

    /// Instantiate a class through its no-argument constructor, used for
    /// generators registered by id ahead of any statement
    pub fn instantiate_default(&self, name: &str) -> Result<Arc<dyn KeyGenerator>> {
        let class = self
            .get(name)
            .ok_or_else(|| Error::config(format!("Unknown key generator class {}", name)))?;
        match &class.default {
            Some(constructor) => Ok(constructor()),
            None => Err(Error::config(format!("Key generator class {} has no default constructor", name))),
        }
    }
}

/// Resolve a generator class by name and instantiate it for an identity
pub fn build_key_generator(context: &GeneratorContext<'_>, class_name: &str) -> Result<Arc<dyn KeyGenerator>> {
    let class = context.configuration.generator_classes().get(class_name).ok_or_else(|| {
        Error::config(format!(
            "Not found key generator class {} for component={} for id={}",
            class_name, context.component, context.property
        ))
    })?;
    class.instantiate(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ComponentDescriptor, MetadataRegistry, PropertyDescriptor, ValueType};

    fn ty(name: &str) -> ComponentType {
        ComponentType::new(name).unwrap()
    }

    fn configuration(classes: KeyGeneratorClasses) -> ComponentConfiguration {
        let metadata = MetadataRegistry::new()
            .with(
                ComponentDescriptor::new(ty("a.T"))
                    .with_table("T_THING")
                    .with_property(PropertyDescriptor::new("id", ValueType::Int64).with_column("ID").as_identity()),
            )
            .unwrap();
        ComponentConfiguration::new(Arc::new(metadata)).with_generator_classes(classes)
    }

    fn context<'a>(configuration: &'a ComponentConfiguration, component: &'a ComponentType) -> GeneratorContext<'a> {
        GeneratorContext { configuration, key: "a.T/insert", component, property: "id" }
    }

    #[test]
    fn test_counter_increments() {
        let counter = CounterKeyGenerator::new();
        assert_eq!(counter.next_key(), KeyValue::Int(1));
        assert_eq!(counter.next_key(), KeyValue::Int(2));
        assert_eq!(counter.class_name(), "counter");
    }

    #[test]
    fn test_contextual_constructor_is_preferred() {
        let mut classes = KeyGeneratorClasses::new();
        classes.register(
            GeneratorClass::new("both")
                .with_contextual(|_| Ok(Arc::new(SequenceKeyGenerator::named("CTX")) as Arc<dyn KeyGenerator>))
                .with_default(|| Arc::new(CounterKeyGenerator::new()) as Arc<dyn KeyGenerator>),
        );
        let configuration = configuration(classes);
        let component = ty("a.T");
        let generator = build_key_generator(&context(&configuration, &component), "both").unwrap();
        assert_eq!(generator.class_name(), "sequence");
    }

    #[test]
    fn test_default_constructor_fallback() {
        let configuration = configuration(KeyGeneratorClasses::with_builtins());
        let component = ty("a.T");
        let generator = build_key_generator(&context(&configuration, &component), "counter").unwrap();
        assert_eq!(generator.class_name(), "counter");
    }

    #[test]
    fn test_sequence_uses_table() {
        let configuration = configuration(KeyGeneratorClasses::with_builtins());
        let component = ty("a.T");
        let generator = build_key_generator(&context(&configuration, &component), "sequence").unwrap();
        assert_eq!(generator.class_name(), "sequence");
        assert_eq!(generator.sequence(), Some("SEQ_T_THING"));
        assert_eq!(generator.select_key_sql().as_deref(), Some("SELECT NEXT VALUE FOR SEQ_T_THING"));
    }

    #[test]
    fn test_counter_has_no_sequence() {
        let counter = CounterKeyGenerator::new();
        assert!(counter.sequence().is_none());
        assert!(counter.select_key_sql().is_none());
    }

    #[test]
    fn test_no_constructor_fails() {
        let mut classes = KeyGeneratorClasses::new();
        classes.register(GeneratorClass::new("abstract"));
        let configuration = configuration(classes);
        let component = ty("a.T");
        let err = build_key_generator(&context(&configuration, &component), "abstract").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("a.T"));
        assert!(err.to_string().contains("id"));
    }

    #[test]
    fn test_failing_contextual_constructor_does_not_fall_back() {
        let mut classes = KeyGeneratorClasses::new();
        classes.register(
            GeneratorClass::new("broken")
                .with_contextual(|_| Err(Error::config("no sequence")))
                .with_default(|| Arc::new(CounterKeyGenerator::new()) as Arc<dyn KeyGenerator>),
        );
        let configuration = configuration(classes);
        let component = ty("a.T");
        assert!(build_key_generator(&context(&configuration, &component), "broken").is_err());
    }

    #[test]
    fn test_unknown_class() {
        let configuration = configuration(KeyGeneratorClasses::with_builtins());
        let component = ty("a.T");
        assert!(build_key_generator(&context(&configuration, &component), "uuid").unwrap_err().is_configuration());
        assert!(KeyGeneratorClasses::with_builtins().instantiate_default("sequence").is_err());
        assert!(KeyGeneratorClasses::with_builtins().instantiate_default("counter").is_ok());
    }
}
