//! Shared railway schema for the integration tests

#![allow(dead_code)]

use compsql::{ComponentConfiguration, ComponentType, InMemoryCaches, MetadataRegistry};
use std::sync::Arc;

pub const SCHEMA: &str = r#"
[[component]]
name = "rail.ITrain"
table = "T_TRAIN"

[[component.property]]
name = "id"
type = "i64"
column = { name = "ID" }
identity = { generator_class = "counter" }

[[component.property]]
name = "code"
type = "string"
column = { name = "CODE" }

[[component.property]]
name = "version"
type = "i64"
column = { name = "VERSION" }
version = true

[[component.property]]
name = "wagons"
type = "list<component:rail.IWagon>"
collection = {}

[[component]]
name = "rail.IWagon"
table = "T_WAGON"

[[component.property]]
name = "id"
type = "i64"
column = { name = "ID" }
identity = {}

[[component.property]]
name = "position"
type = "i32"
column = { name = "POSITION" }

[[component.property]]
name = "label"
type = "string"
localized_column = { name = "LABEL" }

[[component.property]]
name = "canceled"
type = "bool"
column = { name = "CANCELED" }
cancel_flag = true

[[component]]
name = "rail.ICountry"
table = "T_COUNTRY"

[[component.property]]
name = "code"
type = "string"
column = { name = "CODE" }
identity = {}

[[component.property]]
name = "name"
type = "string"
localized_column = { name = "NAME" }

[[component]]
name = "rail.IStation"
table = "T_STATION"
cache_links = ["rail.ITrain"]

[[component.property]]
name = "id"
type = "i64"
column = { name = "ID" }
identity = {}

[[component.property]]
name = "country"
type = "component:rail.ICountry"
association = {}
"#;

/// DDL matching [`SCHEMA`]
pub const DDL: &str = "
CREATE TABLE T_TRAIN (ID INTEGER PRIMARY KEY, CODE TEXT, VERSION INTEGER NOT NULL);
CREATE TABLE T_WAGON (ID INTEGER PRIMARY KEY, POSITION INTEGER, LABEL TEXT, CANCELED INTEGER);
CREATE TABLE T_TRAIN_WAGON (TRAIN_ID INTEGER NOT NULL, WAGON_ID INTEGER NOT NULL);
CREATE TABLE T_COUNTRY (CODE TEXT PRIMARY KEY, NAME TEXT);
";

pub fn ty(name: &str) -> ComponentType {
    ComponentType::new(name).unwrap()
}

pub fn metadata() -> MetadataRegistry {
    MetadataRegistry::from_toml_str(SCHEMA).unwrap()
}

/// Configuration with a cache for every component
pub fn configuration() -> ComponentConfiguration {
    let metadata = metadata();
    let mut caches = InMemoryCaches::new();
    for component in metadata.component_types() {
        caches.add_cache(&component);
    }
    ComponentConfiguration::new(Arc::new(metadata)).with_caches(caches)
}
