//! Service inclusion.

use super::result::ServiceFilterResult;
use crate::analyzer;
use crate::criteria::FilterCriteria;
use crate::descriptor::ServiceDescriptor;
use tracing::debug;

/// Decide whether `service` is generated.
///
/// Precedence: the exclusion annotation, then the configured allow-list,
/// then include by default. Browser-provided services are included like any
/// other; the flag only travels along as metadata.
pub fn should_include_service(
    service: &ServiceDescriptor,
    criteria: &FilterCriteria,
) -> ServiceFilterResult {
    let result = evaluate(service, criteria);
    debug!(
        service = %service.name,
        include = result.include,
        reason = %result.reason,
        "service filter"
    );
    result
}

fn evaluate(service: &ServiceDescriptor, criteria: &FilterCriteria) -> ServiceFilterResult {
    if analyzer::is_service_excluded(service) {
        return ServiceFilterResult::excluded("excluded by wasm_service_exclude annotation");
    }

    let reason = if criteria.services.is_restricted() {
        if !criteria.services.permits(&service.name) {
            return ServiceFilterResult::excluded("service not in configured services list");
        }
        "service in configured services list"
    } else {
        "included by default"
    };

    ServiceFilterResult {
        include: true,
        reason: reason.to_string(),
        custom_name: analyzer::custom_service_name(service).map(str::to_string),
        browser_provided: analyzer::is_browser_provided_service(service),
    }
}

/// JS-facing service name: the custom name annotation or the proto name.
pub fn service_js_name(service: &ServiceDescriptor) -> String {
    analyzer::custom_service_name(service)
        .unwrap_or(&service.name)
        .to_string()
}
