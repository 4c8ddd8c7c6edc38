//! Package grouping and inclusion.

use super::result::PackageFilterResult;
use super::service::should_include_service;
use super::stats::FilterStats;
use crate::collect;
use crate::criteria::FilterCriteria;
use crate::descriptor::{annotation, FileDescriptor};
use std::collections::BTreeMap;
use tracing::debug;

/// Packages that only carry annotation or well-known-type definitions.
const INFRASTRUCTURE_PACKAGES: &[&str] = &[annotation::PACKAGE, "google.protobuf"];

pub fn is_infrastructure_package(package: &str) -> bool {
    INFRASTRUCTURE_PACKAGES.contains(&package)
}

/// The in-scope files of one proto package.
#[derive(Debug, Clone)]
pub struct PackageGroup<'a> {
    pub name: String,
    pub files: Vec<&'a FileDescriptor>,
    pub result: PackageFilterResult,
}

/// Surviving package groups (sorted by name) and the package tallies.
#[derive(Debug, Clone, Default)]
pub struct PackageFilterOutcome<'a> {
    pub packages: Vec<PackageGroup<'a>>,
    pub stats: FilterStats,
}

pub fn should_include_package(
    package: &str,
    files: &[&FileDescriptor],
    criteria: &FilterCriteria,
) -> PackageFilterResult {
    if criteria.exclude_annotation_packages && is_infrastructure_package(package) {
        return PackageFilterResult {
            include: false,
            reason: "annotation package excluded".to_string(),
            has_services: false,
            has_messages: false,
            has_enums: false,
        };
    }

    let has_services = files
        .iter()
        .flat_map(|f| &f.service)
        .any(|s| should_include_service(s, criteria).include);
    let has_messages = collect::has_any_messages(files, criteria);
    let has_enums = collect::has_any_enums(files, criteria);

    let mut present = Vec::new();
    if has_services {
        present.push("services");
    }
    if has_messages {
        present.push("messages");
    }
    if has_enums {
        present.push("enums");
    }

    let (include, reason) = match (present.is_empty(), criteria.exclude_empty_packages) {
        (true, true) => (false, "package has no services, messages, or enums".to_string()),
        (true, false) => (
            true,
            "package included despite having no services, messages, or enums".to_string(),
        ),
        (false, _) => (true, format!("package has {}", present.join(", "))),
    };

    PackageFilterResult {
        include,
        reason,
        has_services,
        has_messages,
        has_enums,
    }
}

/// Group in-scope files by package and keep the packages that pass.
///
/// Files outside the generation request never reach a filter.
pub fn filter_packages<'a>(
    files: &'a [FileDescriptor],
    criteria: &FilterCriteria,
) -> PackageFilterOutcome<'a> {
    let mut grouped: BTreeMap<&str, Vec<&'a FileDescriptor>> = BTreeMap::new();
    for file in files.iter().filter(|f| f.generate) {
        grouped.entry(file.package.as_str()).or_default().push(file);
    }

    let mut outcome = PackageFilterOutcome::default();
    for (name, files) in grouped {
        let result = should_include_package(name, &files, criteria);
        debug!(
            package = name,
            include = result.include,
            reason = %result.reason,
            "package filter"
        );
        outcome.stats.add_package_result(&result);
        if result.include {
            outcome.packages.push(PackageGroup {
                name: name.to_string(),
                files,
                result,
            });
        }
    }
    outcome
}
