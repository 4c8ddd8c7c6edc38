//! Cross-package reference resolution.
//!
//! Walks the fields of a package's collected messages and sorts every type
//! reference into one of: local (ignored), annotation package (ignored),
//! external well-known type with a configured mapping, or a reference into
//! another project package. The last kind yields an import and, for messages,
//! a factory dependency.

use crate::analyzer;
use crate::collect::{FieldInfo, MessageInfo};
use crate::descriptor::{annotation, qualify, TypeIndex, TypeKind};
use crate::names;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::warn;

/// How an external well-known type surfaces in generated TypeScript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalTypeMapping {
    pub ts_type: String,
    /// Module to import from; ignored for native types.
    #[serde(default)]
    pub import_source: String,
    /// A built-in of the JS runtime (no import needed).
    #[serde(default)]
    pub is_native: bool,
}

impl ExternalTypeMapping {
    pub fn native(ts_type: &str) -> Self {
        Self {
            ts_type: ts_type.to_string(),
            import_source: String::new(),
            is_native: true,
        }
    }

    pub fn library(ts_type: &str, import_source: &str) -> Self {
        Self {
            ts_type: ts_type.to_string(),
            import_source: import_source.to_string(),
            is_native: false,
        }
    }
}

const WKT_IMPORT_SOURCE: &str = "@bufbuild/protobuf/wkt";

/// Mapping table keyed by fully-qualified proto type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTypeMappings {
    mappings: BTreeMap<String, ExternalTypeMapping>,
}

impl Default for ExternalTypeMappings {
    fn default() -> Self {
        let mut mappings = BTreeMap::new();
        mappings.insert(
            "google.protobuf.Timestamp".to_string(),
            ExternalTypeMapping::native("Date"),
        );
        for name in ["Duration", "Any", "Struct", "Value", "FieldMask", "Empty"] {
            mappings.insert(
                format!("google.protobuf.{name}"),
                ExternalTypeMapping::library(name, WKT_IMPORT_SOURCE),
            );
        }
        Self { mappings }
    }
}

impl ExternalTypeMappings {
    /// A table without the built-in defaults.
    pub fn empty() -> Self {
        Self {
            mappings: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, type_name: &str, mapping: ExternalTypeMapping) {
        self.mappings
            .insert(type_name.trim_start_matches('.').to_string(), mapping);
    }

    pub fn get(&self, type_name: &str) -> Option<&ExternalTypeMapping> {
        self.mappings.get(type_name.trim_start_matches('.'))
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalImport {
    pub proto_type: String,
    pub ts_type: String,
    pub import_source: String,
    pub is_native: bool,
}

/// Types imported from one other package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossPackageImport {
    pub package_name: String,
    pub import_path: String,
    /// Flattened type names.
    pub types: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactoryDependency {
    pub package_name: String,
    pub factory_name: String,
    pub import_path: String,
    pub instance_name: String,
}

/// Everything a package pulls in from outside itself, sorted by package or
/// type name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageReferences {
    pub imports: Vec<CrossPackageImport>,
    pub external_imports: Vec<ExternalImport>,
    pub factory_dependencies: Vec<FactoryDependency>,
    /// Fully-qualified (flattened) names of referenced foreign messages.
    #[serde(skip)]
    pub foreign_messages: BTreeSet<String>,
}

/// Owning package and flattened name of a referenced type.
struct Owner {
    package: String,
    flattened: String,
    kind: TypeKind,
}

fn owner_of(type_name: &str, index: &TypeIndex<'_>) -> Owner {
    match index.get(type_name) {
        Some(entry) => Owner {
            package: entry.package.clone(),
            flattened: entry.flattened_name(),
            kind: entry.kind,
        },
        None => {
            let package = analyzer::extract_package_name(type_name);
            warn!(
                type_name,
                package = %package,
                "referenced type not in descriptor set, guessing package from its name"
            );
            Owner {
                package,
                flattened: analyzer::extract_message_name(type_name),
                kind: TypeKind::Message,
            }
        }
    }
}

/// The type a field points at: the value type for map fields.
fn referenced_type(field: &FieldInfo) -> Option<&str> {
    if field.is_map {
        field.map_value_reference.as_deref()
    } else {
        field.type_reference.as_deref()
    }
}

pub fn resolve_package_references(
    current_package: &str,
    messages: &[MessageInfo],
    index: &TypeIndex<'_>,
    mappings: &ExternalTypeMappings,
) -> PackageReferences {
    let mut external: BTreeMap<String, ExternalImport> = BTreeMap::new();
    let mut imports: BTreeMap<String, CrossPackageImport> = BTreeMap::new();
    let mut dependency_packages: BTreeSet<String> = BTreeSet::new();
    let mut foreign_messages = BTreeSet::new();

    for field in messages.iter().flat_map(|m| &m.fields) {
        let Some(reference) = referenced_type(field) else {
            continue;
        };

        if let Some(mapping) = mappings.get(reference) {
            external
                .entry(reference.to_string())
                .or_insert_with(|| ExternalImport {
                    proto_type: reference.to_string(),
                    ts_type: mapping.ts_type.clone(),
                    import_source: mapping.import_source.clone(),
                    is_native: mapping.is_native,
                });
            continue;
        }

        let owner = owner_of(reference, index);
        if owner.package == current_package || owner.package == annotation::PACKAGE {
            continue;
        }

        imports
            .entry(owner.package.clone())
            .or_insert_with(|| CrossPackageImport {
                package_name: owner.package.clone(),
                import_path: paths::build_cross_package_import_path(current_package, &owner.package),
                types: BTreeSet::new(),
            })
            .types
            .insert(owner.flattened.clone());

        if owner.kind == TypeKind::Message {
            foreign_messages.insert(qualify(&owner.package, &owner.flattened));
            dependency_packages.insert(owner.package);
        }
    }

    PackageReferences {
        imports: imports.into_values().collect(),
        external_imports: external.into_values().collect(),
        factory_dependencies: factory_dependencies(current_package, &dependency_packages),
        foreign_messages,
    }
}

/// One dependency per package, with distinct instance names.
fn factory_dependencies(current_package: &str, packages: &BTreeSet<String>) -> Vec<FactoryDependency> {
    let mut taken: HashSet<String> = HashSet::new();
    packages
        .iter()
        .map(|package| {
            let factory_name = names::to_factory_name(package);
            let last = package.rsplit('.').next().unwrap_or(package);
            let mut instance_name = names::to_camel_case(last) + "Factory";
            if taken.contains(&instance_name) {
                instance_name = names::to_camel_case(&factory_name);
            }
            let base = instance_name.clone();
            let mut suffix = 2;
            while taken.contains(&instance_name) {
                instance_name = format!("{base}{suffix}");
                suffix += 1;
            }
            taken.insert(instance_name.clone());
            FactoryDependency {
                package_name: package.clone(),
                import_path: paths::get_factory_import_path(package, current_package),
                factory_name,
                instance_name,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::collect_messages;
    use crate::criteria::FilterCriteria;
    use crate::descriptor::{DescriptorSet, FileDescriptor};
    use serde_json::json;

    fn set() -> DescriptorSet {
        DescriptorSet::from_value(json!({
            "file": [
                {
                    "name": "library/v1/library.proto",
                    "package": "library.v1",
                    "messageType": [
                        { "name": "Book", "field": [
                            { "name": "author", "number": 1, "type": "TYPE_MESSAGE",
                              "typeName": ".common.v1.Person" },
                            { "name": "published", "number": 2, "type": "TYPE_MESSAGE",
                              "typeName": ".google.protobuf.Timestamp" },
                            { "name": "shelf", "number": 3, "type": "TYPE_MESSAGE",
                              "typeName": ".library.v1.Shelf" },
                            { "name": "address", "number": 4, "type": "TYPE_MESSAGE",
                              "typeName": ".common.v1.Person.Address" },
                            { "name": "tags", "number": 5, "label": "LABEL_REPEATED",
                              "type": "TYPE_MESSAGE", "typeName": ".library.v1.Book.TagsEntry" },
                            { "name": "status", "number": 6, "type": "TYPE_ENUM",
                              "typeName": ".common.v1.Status" },
                            { "name": "opts", "number": 7, "type": "TYPE_MESSAGE",
                              "typeName": ".wasmjs.v1.AsyncMethodOptions" },
                            { "name": "ttl", "number": 8, "type": "TYPE_MESSAGE",
                              "typeName": ".google.protobuf.Duration" }
                        ], "nestedType": [{
                            "name": "TagsEntry",
                            "field": [
                                { "name": "key", "number": 1, "type": "TYPE_STRING" },
                                { "name": "value", "number": 2, "type": "TYPE_MESSAGE",
                                  "typeName": ".catalog.v1.Tag" }
                            ],
                            "options": { "mapEntry": true }
                        }] },
                        { "name": "Shelf" }
                    ]
                },
                {
                    "name": "common/v1/common.proto",
                    "package": "common.v1",
                    "messageType": [{ "name": "Person", "nestedType": [{ "name": "Address" }] }],
                    "enumType": [{ "name": "Status" }]
                },
                { "name": "catalog/v1/catalog.proto", "package": "catalog.v1",
                  "messageType": [{ "name": "Tag" }] },
                { "name": "wasmjs/v1/annotations.proto", "package": "wasmjs.v1",
                  "messageType": [{ "name": "AsyncMethodOptions" }] }
            ]
        }))
        .unwrap()
    }

    fn resolve(set: &DescriptorSet) -> PackageReferences {
        let index = TypeIndex::build(set);
        let files: Vec<&FileDescriptor> = set.file.iter().take(1).collect();
        let messages = collect_messages(&files, &FilterCriteria::default(), &index);
        resolve_package_references(
            "library.v1",
            &messages.items,
            &index,
            &ExternalTypeMappings::default(),
        )
    }

    #[test]
    fn default_mappings() {
        let mappings = ExternalTypeMappings::default();
        let timestamp = mappings.get(".google.protobuf.Timestamp").unwrap();
        assert!(timestamp.is_native);
        assert_eq!(timestamp.ts_type, "Date");
        let any = mappings.get("google.protobuf.Any").unwrap();
        assert_eq!(any.import_source, "@bufbuild/protobuf/wkt");
        assert_eq!(mappings.len(), 7);
        assert!(ExternalTypeMappings::empty().is_empty());
    }

    #[test]
    fn sorts_references() {
        let set = set();
        let refs = resolve(&set);

        let external: Vec<&str> = refs.external_imports.iter().map(|e| e.proto_type.as_str()).collect();
        assert_eq!(external, vec!["google.protobuf.Duration", "google.protobuf.Timestamp"]);

        let packages: Vec<&str> = refs.imports.iter().map(|i| i.package_name.as_str()).collect();
        assert_eq!(packages, vec!["catalog.v1", "common.v1"]);

        let common = &refs.imports[1];
        assert_eq!(common.import_path, "../../common_v1");
        let types: Vec<&str> = common.types.iter().map(String::as_str).collect();
        assert_eq!(types, vec!["Person", "Person_Address", "Status"]);
    }

    #[test]
    fn one_dependency_per_package() {
        let set = set();
        let refs = resolve(&set);
        assert_eq!(refs.factory_dependencies.len(), 2);

        let common = &refs.factory_dependencies[1];
        assert_eq!(common.package_name, "common.v1");
        assert_eq!(common.factory_name, "CommonV1Factory");
        assert_eq!(common.import_path, "../../common_v1/factory");
        // the second `v1` package falls back to the factory name
        assert_eq!(common.instance_name, "commonV1Factory");
        assert_eq!(refs.factory_dependencies[0].instance_name, "v1Factory");
        assert!(refs.foreign_messages.contains("catalog.v1.Tag"));
        assert!(refs.foreign_messages.contains("common.v1.Person_Address"));
        assert!(!refs.foreign_messages.contains("common.v1.Status"));
    }

    #[test]
    fn instance_name_collisions() {
        let packages: BTreeSet<String> = ["catalog.v1", "common.v1", "media"]
            .into_iter()
            .map(str::to_string)
            .collect();
        let deps = factory_dependencies("library.v1", &packages);
        let instances: Vec<&str> = deps.iter().map(|d| d.instance_name.as_str()).collect();
        assert_eq!(instances, vec!["v1Factory", "commonV1Factory", "mediaFactory"]);
    }

    #[test]
    fn instance_names_stay_distinct_when_fallback_is_taken() {
        let packages: BTreeSet<String> = ["a.commonV1", "b.v1", "common.v1"]
            .into_iter()
            .map(str::to_string)
            .collect();
        let deps = factory_dependencies("library.v1", &packages);
        let instances: Vec<&str> = deps.iter().map(|d| d.instance_name.as_str()).collect();
        assert_eq!(instances, vec!["commonV1Factory", "v1Factory", "commonV1Factory2"]);

        let distinct: HashSet<&str> = instances.iter().copied().collect();
        assert_eq!(distinct.len(), deps.len());
    }

    #[test]
    fn unknown_types_fall_back_to_name_split() {
        let set = DescriptorSet::from_value(json!({
            "file": [{ "name": "a.proto", "package": "a.v1", "messageType": [{
                "name": "Holder",
                "field": [{ "name": "x", "number": 1, "type": "TYPE_MESSAGE",
                            "typeName": ".missing.v1.Thing" }]
            }] }]
        }))
        .unwrap();
        let index = TypeIndex::build(&set);
        let files: Vec<&FileDescriptor> = set.file.iter().collect();
        let messages = collect_messages(&files, &FilterCriteria::default(), &index);
        let refs = resolve_package_references("a.v1", &messages.items, &index, &ExternalTypeMappings::default());
        assert_eq!(refs.imports[0].package_name, "missing.v1");
        assert_eq!(refs.factory_dependencies[0].factory_name, "MissingV1Factory");
    }
}
