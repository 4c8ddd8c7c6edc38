//! Immutable filtering criteria for one generation run.

use crate::config::{split_list, GeneratorConfig};
use crate::error::ConfigError;
use crate::resolve::ExternalTypeMappings;
use std::collections::{BTreeMap, BTreeSet};

/// Services to generate.
///
/// `Unrestricted` (the default) lets every service through; an allow-list is
/// never empty. There is no way to say "restrict to nothing".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ServiceAllowList {
    #[default]
    Unrestricted,
    Only(BTreeSet<String>),
}

impl ServiceAllowList {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        if set.is_empty() {
            ServiceAllowList::Unrestricted
        } else {
            ServiceAllowList::Only(set)
        }
    }

    pub fn is_restricted(&self) -> bool {
        matches!(self, ServiceAllowList::Only(_))
    }

    pub fn permits(&self, service: &str) -> bool {
        match self {
            ServiceAllowList::Unrestricted => true,
            ServiceAllowList::Only(set) => set.contains(service),
        }
    }
}

/// A compiled method-name glob.
#[derive(Debug, Clone)]
pub struct MethodPattern {
    source: String,
    compiled: glob::Pattern,
}

impl MethodPattern {
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let compiled = glob::Pattern::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            source: pattern.to_string(),
            compiled,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, method_name: &str) -> bool {
        self.compiled.matches(method_name)
    }
}

/// Check that every pattern compiles, before any filtering starts.
pub fn validate_method_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<(), ConfigError> {
    for pattern in patterns {
        MethodPattern::new(pattern.as_ref())?;
    }
    Ok(())
}

/// Parse `Old:New` pairs; a missing colon or empty side is an error.
pub fn parse_method_renames(list: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut renames = BTreeMap::new();
    for entry in split_list(list) {
        let Some((from, to)) = entry.split_once(':') else {
            return Err(ConfigError::MalformedRename {
                entry: entry.clone(),
                reason: "expected `Original:Custom`",
            });
        };
        let (from, to) = (from.trim(), to.trim());
        if from.is_empty() || to.is_empty() {
            return Err(ConfigError::MalformedRename {
                entry: entry.clone(),
                reason: "both sides of the rename must be non-empty",
            });
        }
        renames.insert(from.to_string(), to.to_string());
    }
    Ok(renames)
}

#[derive(Debug, Clone)]
pub struct FilterCriteria {
    pub services: ServiceAllowList,
    pub method_include: Vec<MethodPattern>,
    pub method_exclude: Vec<MethodPattern>,
    pub method_renames: BTreeMap<String, String>,
    pub exclude_annotation_packages: bool,
    pub exclude_empty_packages: bool,
    pub exclude_map_entries: bool,
    pub exclude_nested_messages: bool,
    pub exclude_nested_enums: bool,
    pub type_mappings: ExternalTypeMappings,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        let config = GeneratorConfig::default();
        Self {
            services: ServiceAllowList::Unrestricted,
            method_include: Vec::new(),
            method_exclude: Vec::new(),
            method_renames: BTreeMap::new(),
            exclude_annotation_packages: config.exclude_annotation_packages,
            exclude_empty_packages: config.exclude_empty_packages,
            exclude_map_entries: config.exclude_map_entries,
            exclude_nested_messages: config.exclude_nested_messages,
            exclude_nested_enums: config.exclude_nested_enums,
            type_mappings: ExternalTypeMappings::default(),
        }
    }
}

impl FilterCriteria {
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, ConfigError> {
        let include = split_list(&config.method_include);
        let exclude = split_list(&config.method_exclude);
        validate_method_patterns(&include)?;
        validate_method_patterns(&exclude)?;

        let mut type_mappings = ExternalTypeMappings::default();
        for (type_name, mapping) in &config.type_mappings {
            type_mappings.insert(type_name, mapping.clone());
        }

        Ok(Self {
            services: ServiceAllowList::from_names(split_list(&config.services)),
            method_include: include
                .iter()
                .map(|p| MethodPattern::new(p))
                .collect::<Result<_, _>>()?,
            method_exclude: exclude
                .iter()
                .map(|p| MethodPattern::new(p))
                .collect::<Result<_, _>>()?,
            method_renames: parse_method_renames(&config.method_rename)?,
            exclude_annotation_packages: config.exclude_annotation_packages,
            exclude_empty_packages: config.exclude_empty_packages,
            exclude_map_entries: config.exclude_map_entries,
            exclude_nested_messages: config.exclude_nested_messages,
            exclude_nested_enums: config.exclude_nested_enums,
            type_mappings,
        })
    }

    /// Configured JS name for `method`, or the name itself when unmapped.
    pub fn method_rename<'a>(&'a self, method: &'a str) -> &'a str {
        self.method_renames
            .get(method)
            .map(String::as_str)
            .unwrap_or(method)
    }
}
