//! # Compsql - Component statement compiler
//!
//! Compiles compact statement keys into SQL statement definitions for typed
//! components (entities and embedded sub-entities).
//!
//! Compsql provides:
//! - A canonical key grammar (`Type/operation?param=value&...`) with a strict codec
//! - An ordered registry of statement factories, one per operation kind
//! - Identity, version, cancellation and localized-column handling
//! - Key generator resolution (named generators or registered generator classes)
//! - A cycle-safe link graph walker used for cache invalidation

pub mod component;
pub mod metadata;
pub mod key;
pub mod links;
pub mod keygen;
pub mod cache;
pub mod configuration;
pub mod statement;
pub mod config;
pub mod output;

// Re-exports for convenient access
pub use component::{ComponentType, Identifier, PropertyPath};
pub use key::{DecodeError, Direction, JoinSpec, KeyParams, OrderSpec, StatementKey, StatementKind};
pub use metadata::{ComponentDescriptor, MetadataRegistry, MetadataResolver, PropertyDescriptor, ValueType};
pub use links::LinkWalker;
pub use cache::{CacheHandle, CacheRegistry, InMemoryCaches};
pub use configuration::ComponentConfiguration;
pub use statement::{StatementDefinition, StatementFactory, StatementRegistry, default_registry};

/// Result type alias for Compsql operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Compsql operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No statement factory accepts key: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema error: {0}")]
    Schema(#[from] toml::de::Error),
}

impl Error {
    /// Build a configuration error from a message
    pub fn config(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Error::Decode(_))
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
