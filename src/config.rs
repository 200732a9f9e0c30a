use crate::component::ComponentType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Caches to register: every component of the schema, or a fixed list
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawCaches", into = "RawCaches")]
pub enum CacheSelection {
    #[default]
    All,
    Only(Vec<ComponentType>),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawCaches {
    Wildcard(String),
    List(Vec<ComponentType>),
}

impl TryFrom<RawCaches> for CacheSelection {
    type Error = String;

    fn try_from(raw: RawCaches) -> Result<Self, Self::Error> {
        match raw {
            RawCaches::Wildcard(s) if s == "*" => Ok(CacheSelection::All),
            RawCaches::Wildcard(s) => Err(format!("expected \"*\" or a list of components, got \"{}\"", s)),
            RawCaches::List(list) => Ok(CacheSelection::Only(list)),
        }
    }
}

impl From<CacheSelection> for RawCaches {
    fn from(selection: CacheSelection) -> Self {
        match selection {
            CacheSelection::All => RawCaches::Wildcard("*".to_string()),
            CacheSelection::Only(list) => RawCaches::List(list),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompsqlConfig {
    /// Schema file, relative to the config file
    pub schema: String,
    #[serde(default)]
    pub caches: CacheSelection,
    /// Named key generators: id -> generator class
    #[serde(default)]
    pub key_generators: BTreeMap<String, String>,
}

impl Default for CompsqlConfig {
    fn default() -> Self {
        Self {
            schema: "schema.toml".to_string(),
            caches: CacheSelection::All,
            key_generators: BTreeMap::new(),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("compsql.toml")
}

/// Directory schema paths are resolved against
pub fn config_base_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<CompsqlConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: CompsqlConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &CompsqlConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cache_selection() {
        let config: CompsqlConfig = toml::from_str("schema = \"s.toml\"\ncaches = \"*\"\n").unwrap();
        assert_eq!(config.caches, CacheSelection::All);

        let config: CompsqlConfig = toml::from_str("schema = \"s.toml\"\ncaches = [\"a.T\", \"a.U\"]\n").unwrap();
        assert_eq!(
            config.caches,
            CacheSelection::Only(vec![ComponentType::new("a.T").unwrap(), ComponentType::new("a.U").unwrap()])
        );

        assert!(toml::from_str::<CompsqlConfig>("schema = \"s.toml\"\ncaches = \"some\"\n").is_err());
    }

    #[test]
    fn test_defaults() {
        let config: CompsqlConfig = toml::from_str("schema = \"s.toml\"\n").unwrap();
        assert_eq!(config.caches, CacheSelection::All);
        assert!(config.key_generators.is_empty());
    }

    #[test]
    fn test_default_config_serializes() {
        let contents = toml::to_string_pretty(&CompsqlConfig::default()).unwrap();
        assert!(contents.contains("schema = \"schema.toml\""));
        assert!(contents.contains("caches = \"*\""));
        let back: CompsqlConfig = toml::from_str(&contents).unwrap();
        assert_eq!(back.caches, CacheSelection::All);
    }

    #[test]
    fn test_base_dir() {
        assert_eq!(config_base_dir(Path::new("compsql.toml")), PathBuf::from("."));
        assert_eq!(config_base_dir(Path::new("conf/compsql.toml")), PathBuf::from("conf"));
    }
}
