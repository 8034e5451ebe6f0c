//! Project configuration file
//!
//! The project file is a small YAML document describing where dependencies
//! are resolved from, where artifacts are deployed to, and how Gradle should
//! be invoked. It is flattened into dotted keys (`deployer.repo`,
//! `resolver.serverId`, ...) so the resolver can treat it as a plain
//! key/value source.

use super::ConfigError;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Section holding deployment settings
pub const DEPLOYER_SECTION: &str = "deployer";

/// Flattened key/value view over a project configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectConfig {
    values: BTreeMap<String, String>,
}

impl ProjectConfig {
    /// Reads and flattens the YAML file at `path`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                ConfigError::ProjectFileNotFound(path.to_path_buf())
            } else {
                ConfigError::InvalidProjectFile {
                    path: path.to_path_buf(),
                    message: err.to_string(),
                }
            }
        })?;

        Self::from_yaml(&content).map_err(|message| ConfigError::InvalidProjectFile {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parses YAML text into a flattened configuration
    pub fn from_yaml(content: &str) -> Result<Self, String> {
        let root: Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;

        let mut values = BTreeMap::new();
        match root {
            Value::Null => {}
            Value::Mapping(_) => flatten("", &root, &mut values),
            _ => return Err("top level of the project file must be a mapping".to_string()),
        }

        Ok(Self { values })
    }

    /// Builds a configuration directly from dotted keys
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// True when any key lives under `section`
    pub fn is_set(&self, section: &str) -> bool {
        let prefix = format!("{}.", section.to_ascii_lowercase());
        self.values.keys().any(|k| {
            let k = k.to_ascii_lowercase();
            k == section.to_ascii_lowercase() || k.starts_with(&prefix)
        })
    }

    /// Case-insensitive lookup
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str).or_else(|| {
            self.values
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.as_str())
        })
    }

    /// Empty values count as unset
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// Overrides a key, replacing any case variant of it
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.retain(|k, _| !k.eq_ignore_ascii_case(key));
        self.values.insert(key.to_string(), value.into());
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub(crate) fn into_values(self) -> BTreeMap<String, String> {
        self.values
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut BTreeMap<String, String>) {
    match value {
        Value::Mapping(map) => {
            for (key, child) in map {
                let key = match key {
                    Value::String(s) => s.clone(),
                    Value::Bool(b) => b.to_string(),
                    Value::Number(n) => n.to_string(),
                    _ => continue,
                };
                let full = if prefix.is_empty() {
                    key
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&full, child, out);
            }
        }
        Value::Sequence(items) => {
            let joined = items
                .iter()
                .filter_map(scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix.to_string(), joined);
        }
        other => {
            if let Some(s) = scalar_to_string(other) {
                out.insert(prefix.to_string(), s);
            }
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}
