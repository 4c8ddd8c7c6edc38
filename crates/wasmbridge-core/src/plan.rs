//! Generation plan: the per-package view handed to template rendering.
//!
//! [`build_generation_plan`] runs the whole pipeline over one descriptor set:
//! package grouping and filtering, service and method filtering, message and
//! enum collection, reference resolution, and a construction check through
//! the factory chain. The result is plain data and serialises to JSON.

use crate::analyzer;
use crate::collect::{self, EnumInfo, MessageInfo};
use crate::criteria::FilterCriteria;
use crate::descriptor::{DescriptorSet, FileDescriptor, ServiceDescriptor, TypeIndex};
use crate::error::Result;
use crate::factory::{self, PackageFactory};
use crate::filter::{self, FilterResult, FilterStats, PackageGroup};
use crate::names;
use crate::paths;
use crate::resolve::{self, CrossPackageImport, ExternalImport, FactoryDependency};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize)]
pub struct GenerationPlan {
    pub packages: Vec<PackagePlan>,
    pub stats: FilterStats,
}

impl GenerationPlan {
    pub fn package(&self, name: &str) -> Option<&PackagePlan> {
        self.packages.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PackagePlan {
    pub name: String,
    pub path: String,
    pub js_namespace: String,
    pub factory_name: String,
    pub deserializer_name: String,
    pub schema_registry_name: String,
    pub filter: FilterResult,
    /// Every in-scope file of the package is a `ts_factory_file`.
    pub factory_only: bool,
    pub services: Vec<ServicePlan>,
    pub messages: Vec<MessageInfo>,
    pub enums: Vec<EnumInfo>,
    pub imports: Vec<CrossPackageImport>,
    pub external_imports: Vec<ExternalImport>,
    pub factory_dependencies: Vec<FactoryDependency>,
    pub factory_methods: Vec<String>,
    pub counts: TypeCounts,
}

/// Found vs kept types of one package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeCounts {
    pub messages_found: usize,
    pub messages_kept: usize,
    pub enums_found: usize,
    pub enums_kept: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServicePlan {
    pub name: String,
    pub js_name: String,
    pub file_path: String,
    pub browser_provided: bool,
    pub comment: Option<String>,
    pub methods: Vec<MethodPlan>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodPlan {
    pub name: String,
    pub js_name: String,
    pub input_type: String,
    pub output_type: String,
    pub is_async: bool,
    pub server_streaming: bool,
    pub comment: Option<String>,
}

pub fn build_generation_plan(set: &DescriptorSet, criteria: &FilterCriteria) -> Result<GenerationPlan> {
    let index = TypeIndex::build(set);
    let outcome = filter::filter_packages(&set.file, criteria);

    // factories of every package in the set, including dependencies outside
    // the request, so cross-package construction can be checked
    let all_files: Vec<&FileDescriptor> = set.file.iter().collect();
    let factories: BTreeMap<String, Arc<PackageFactory<Value>>> =
        collect::collect_messages_by_package(&all_files, criteria, &index)
            .into_iter()
            .map(|(package, messages)| {
                let factory = factory::json_factory(&package, &messages.items);
                (package, Arc::new(factory))
            })
            .collect();

    let mut stats = outcome.stats;
    let mut packages = Vec::with_capacity(outcome.packages.len());
    for group in &outcome.packages {
        let (plan, package_stats) = plan_package(group, criteria, &index, &factories)?;
        info!(
            package = %plan.name,
            services = plan.services.len(),
            messages = plan.messages.len(),
            enums = plan.enums.len(),
            dependencies = plan.factory_dependencies.len(),
            "planned package"
        );
        stats += package_stats;
        packages.push(plan);
    }

    info!("{}", stats.summary());
    Ok(GenerationPlan { packages, stats })
}

fn plan_package(
    group: &PackageGroup<'_>,
    criteria: &FilterCriteria,
    index: &TypeIndex<'_>,
    factories: &BTreeMap<String, Arc<PackageFactory<Value>>>,
) -> Result<(PackagePlan, FilterStats)> {
    let mut stats = FilterStats::default();

    let mut services = Vec::new();
    for file in &group.files {
        for (i, service) in file.service.iter().enumerate() {
            if let Some(plan) = plan_service(file, service, i, criteria, &mut stats) {
                services.push(plan);
            }
        }
    }

    let messages = collect::collect_messages(&group.files, criteria, index);
    let enums = collect::collect_enums(&group.files, criteria);
    stats.add_collection_stats(messages.items.len(), enums.items.len());

    let references =
        resolve::resolve_package_references(&group.name, &messages.items, index, &criteria.type_mappings);

    let mut factory = factory::json_factory(&group.name, &messages.items);
    for dependency in &references.factory_dependencies {
        if let Some(dep) = factories.get(&dependency.package_name) {
            factory.add_dependency(Arc::clone(dep));
        }
    }
    for type_name in &references.foreign_messages {
        factory.create(type_name)?;
        debug!(package = %group.name, type_name = %type_name, "cross-package construction ok");
    }

    let plan = PackagePlan {
        name: group.name.clone(),
        path: paths::build_package_path(&group.name),
        js_namespace: names::to_js_namespace(&group.name),
        factory_name: names::to_factory_name(&group.name),
        deserializer_name: names::to_deserializer_name(&group.name),
        schema_registry_name: names::to_schema_registry_name(&group.name),
        filter: FilterResult::from(&group.result),
        factory_only: !group.files.is_empty() && group.files.iter().all(|f| analyzer::is_factory_file(f)),
        services,
        counts: TypeCounts {
            messages_found: messages.total_found,
            messages_kept: messages.items.len(),
            enums_found: enums.total_found,
            enums_kept: enums.items.len(),
        },
        factory_methods: factory.method_names(),
        messages: messages.items,
        enums: enums.items,
        imports: references.imports,
        external_imports: references.external_imports,
        factory_dependencies: references.factory_dependencies,
    };
    Ok((plan, stats))
}

/// Methods of excluded services are not evaluated and do not count.
fn plan_service(
    file: &FileDescriptor,
    service: &ServiceDescriptor,
    service_index: usize,
    criteria: &FilterCriteria,
    stats: &mut FilterStats,
) -> Option<ServicePlan> {
    let result = filter::should_include_service(service, criteria);
    stats.add_service_result(&result);
    if !result.include {
        return None;
    }

    let service_path = [6, service_index as i32];
    let methods = service
        .method
        .iter()
        .enumerate()
        .filter_map(|(j, method)| {
            let result = filter::should_include_method(method, criteria);
            stats.add_method_result(&result);
            if !result.include {
                return None;
            }
            Some(MethodPlan {
                name: method.name.clone(),
                js_name: filter::method_js_name(method, criteria),
                input_type: method.input_type.trim_start_matches('.').to_string(),
                output_type: method.output_type.trim_start_matches('.').to_string(),
                is_async: result.is_async,
                server_streaming: result.server_streaming,
                comment: file
                    .comment(&[6, service_index as i32, 2, j as i32])
                    .map(str::to_string),
            })
        })
        .collect();

    Some(ServicePlan {
        name: service.name.clone(),
        js_name: filter::service_js_name(service),
        file_path: file.name.clone(),
        browser_provided: result.browser_provided,
        comment: file.comment(&service_path).map(str::to_string),
        methods,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ResolveError};
    use serde_json::json;

    fn set() -> DescriptorSet {
        DescriptorSet::from_value(json!({
            "fileToGenerate": ["library/v1/library.proto", "library/v1/service.proto"],
            "file": [
                { "name": "common/v1/common.proto", "package": "common.v1",
                  "messageType": [{ "name": "Person" }] },
                { "name": "library/v1/library.proto", "package": "library.v1",
                  "dependency": ["common/v1/common.proto"],
                  "messageType": [{ "name": "Book", "field": [
                      { "name": "author", "number": 1, "type": "TYPE_MESSAGE",
                        "typeName": ".common.v1.Person" }
                  ] }] },
                { "name": "library/v1/service.proto", "package": "library.v1",
                  "service": [{
                      "name": "LibraryService",
                      "method": [
                          { "name": "GetBook", "inputType": ".library.v1.Book",
                            "outputType": ".library.v1.Book" },
                          { "name": "UploadBooks", "inputType": ".library.v1.Book",
                            "outputType": ".library.v1.Book", "clientStreaming": true }
                      ]
                  }],
                  "sourceCodeInfo": { "location": [
                      { "path": [6, 0], "leadingComments": " Books.\n" },
                      { "path": [6, 0, 2, 0], "leadingComments": " Fetch one.\n" }
                  ] } }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn plans_the_requested_packages() -> Result<()> {
        let plan = build_generation_plan(&set(), &FilterCriteria::default())?;
        assert_eq!(plan.packages.len(), 1);

        let library = plan.package("library.v1").unwrap();
        assert_eq!(library.path, "library/v1");
        assert_eq!(library.factory_name, "LibraryV1Factory");
        assert_eq!(library.factory_methods, vec!["newBook"]);
        assert!(!library.factory_only);

        let service = &library.services[0];
        assert_eq!(service.comment.as_deref(), Some("Books."));
        assert_eq!(service.methods.len(), 1);
        assert_eq!(service.methods[0].js_name, "getBook");
        assert_eq!(service.methods[0].input_type, "library.v1.Book");
        assert_eq!(service.methods[0].comment.as_deref(), Some("Fetch one."));

        assert_eq!(library.factory_dependencies[0].package_name, "common.v1");
        assert_eq!(
            plan.stats.summary(),
            "Filtering Summary: 1/1 services, 1/2 methods, 1 messages, 0 enums from 1 packages"
        );
        Ok(())
    }

    #[test]
    fn missing_foreign_type_is_a_hard_error() {
        let set = DescriptorSet::from_value(json!({
            "file": [
                { "name": "common.proto", "package": "common.v1" },
                { "name": "library.proto", "package": "library.v1",
                  "messageType": [{ "name": "Book", "field": [
                      { "name": "author", "number": 1, "type": "TYPE_MESSAGE",
                        "typeName": ".common.v1.Person" }
                  ] }] }
            ]
        }))
        .unwrap();
        let err = build_generation_plan(&set, &FilterCriteria::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::Resolve(ResolveError::UnknownType { ref type_name, ref method, .. })
                if type_name == "common.v1.Person" && method == "newPerson"
        ));
    }

    #[test]
    fn factory_only_packages() -> Result<()> {
        let set = DescriptorSet::from_value(json!({
            "file": [{ "name": "f.proto", "package": "factories.v1",
                       "options": { "[wasmjs.v1.ts_factory_file]": true },
                       "messageType": [{ "name": "Made" }] }]
        }))
        .unwrap();
        let plan = build_generation_plan(&set, &FilterCriteria::default())?;
        assert!(plan.packages[0].factory_only);
        Ok(())
    }

    #[test]
    fn serialises_to_json() -> anyhow::Result<()> {
        let plan = build_generation_plan(&set(), &FilterCriteria::default())?;
        let value = serde_json::to_value(&plan)?;
        assert_eq!(value["packages"][0]["js_namespace"], "library_v1");
        assert_eq!(value["stats"]["included_methods"], 1);
        Ok(())
    }
}
