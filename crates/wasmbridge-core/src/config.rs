//! Generator configuration.
//!
//! A [`GeneratorConfig`] is the raw, user-facing form: comma-separated lists
//! and toggles, loaded from a JSON file and/or a protoc plugin parameter
//! string. [`crate::criteria::FilterCriteria::from_config`] validates it and
//! produces the immutable criteria the filters read.

use crate::error::ConfigError;
use crate::resolve::ExternalTypeMapping;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Comma-separated service allow-list. Empty means every service.
    pub services: String,
    /// Comma-separated glob patterns a method must match (if any are given).
    pub method_include: String,
    /// Comma-separated glob patterns that exclude a method.
    pub method_exclude: String,
    /// Comma-separated `Original:Custom` JS name pairs.
    pub method_rename: String,
    pub exclude_annotation_packages: bool,
    pub exclude_empty_packages: bool,
    pub exclude_map_entries: bool,
    pub exclude_nested_messages: bool,
    pub exclude_nested_enums: bool,
    /// Extra (or overriding) mappings for external well-known types.
    pub type_mappings: BTreeMap<String, ExternalTypeMapping>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            services: String::new(),
            method_include: String::new(),
            method_exclude: String::new(),
            method_rename: String::new(),
            exclude_annotation_packages: true,
            exclude_empty_packages: true,
            exclude_map_entries: true,
            exclude_nested_messages: false,
            exclude_nested_enums: false,
            type_mappings: BTreeMap::new(),
        }
    }
}

const LIST_KEYS: &[&str] = &["services", "method_include", "method_exclude", "method_rename"];

impl GeneratorConfig {
    pub fn from_json_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text, &path.display().to_string())
    }

    /// Apply a protoc plugin parameter string on top of this config.
    ///
    /// Entries are `key=value`, separated by commas. An entry without `=`
    /// continues the list of the preceding key, so
    /// `services=A,B,method_exclude=*Internal` sets two services. The first
    /// occurrence of a list key replaces the existing value; later ones append.
    pub fn apply_parameter(&mut self, parameter: &str) -> Result<(), ConfigError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut current: Option<String> = None;

        for entry in parameter.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match entry.split_once('=') {
                Some((key, value)) => {
                    let key = key.trim();
                    if key.is_empty() {
                        return Err(ConfigError::MissingKey(entry.to_string()));
                    }
                    let append = !seen.insert(key.to_string());
                    self.set(key, value.trim(), append)?;
                    current = Some(key.to_string());
                }
                None => match current.as_deref() {
                    Some(key) if LIST_KEYS.contains(&key) => self.set(key, entry, true)?,
                    Some(key) => {
                        return Err(ConfigError::InvalidValue {
                            key: key.to_string(),
                            value: entry.to_string(),
                        })
                    }
                    None => return Err(ConfigError::MissingKey(entry.to_string())),
                },
            }
        }
        Ok(())
    }

    fn set(&mut self, key: &str, value: &str, append: bool) -> Result<(), ConfigError> {
        let list = match key {
            "services" => &mut self.services,
            "method_include" => &mut self.method_include,
            "method_exclude" => &mut self.method_exclude,
            "method_rename" => &mut self.method_rename,
            _ => {
                let slot = self.flag_mut(key)?;
                *slot = value.parse::<bool>().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                })?;
                return Ok(());
            }
        };
        if append && !list.is_empty() {
            list.push(',');
            list.push_str(value);
        } else {
            *list = value.to_string();
        }
        Ok(())
    }

    fn flag_mut(&mut self, key: &str) -> Result<&mut bool, ConfigError> {
        Ok(match key {
            "exclude_annotation_packages" => &mut self.exclude_annotation_packages,
            "exclude_empty_packages" => &mut self.exclude_empty_packages,
            "exclude_map_entries" => &mut self.exclude_map_entries,
            "exclude_nested_messages" => &mut self.exclude_nested_messages,
            "exclude_nested_enums" => &mut self.exclude_nested_enums,
            other => return Err(ConfigError::UnknownParameter(other.to_string())),
        })
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
