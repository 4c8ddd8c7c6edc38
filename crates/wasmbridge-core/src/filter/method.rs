//! Method inclusion and JS naming.

use super::result::MethodFilterResult;
use crate::analyzer;
use crate::criteria::FilterCriteria;
use crate::descriptor::MethodDescriptor;
use crate::names;
use tracing::debug;

/// Decide whether `method` is generated.
///
/// Precedence: exclusion annotation, client streaming (never supported by
/// the runtime), exclude patterns, include patterns (only when configured),
/// then include by default.
pub fn should_include_method(
    method: &MethodDescriptor,
    criteria: &FilterCriteria,
) -> MethodFilterResult {
    let result = evaluate(method, criteria);
    debug!(
        method = %method.name,
        include = result.include,
        reason = %result.reason,
        "method filter"
    );
    result
}

fn evaluate(method: &MethodDescriptor, criteria: &FilterCriteria) -> MethodFilterResult {
    if analyzer::is_method_excluded(method) {
        return MethodFilterResult::excluded("excluded by wasm_method_exclude annotation");
    }
    if method.client_streaming {
        return MethodFilterResult::excluded("client streaming methods are not supported");
    }
    if let Some(pattern) = criteria
        .method_exclude
        .iter()
        .find(|p| p.matches(&method.name))
    {
        return MethodFilterResult::excluded(format!(
            "matches exclude pattern `{}`",
            pattern.as_str()
        ));
    }

    let reason = if criteria.method_include.is_empty() {
        "included by default".to_string()
    } else {
        match criteria
            .method_include
            .iter()
            .find(|p| p.matches(&method.name))
        {
            Some(pattern) => format!("matches include pattern `{}`", pattern.as_str()),
            None => {
                return MethodFilterResult::excluded("doesn't match any include patterns");
            }
        }
    };

    let custom_name = analyzer::custom_method_name(method)
        .or_else(|| criteria.method_renames.get(&method.name).map(String::as_str))
        .map(str::to_string);

    MethodFilterResult {
        include: true,
        reason,
        custom_name,
        is_async: analyzer::is_async_method(method),
        server_streaming: method.server_streaming,
    }
}

/// JS name: annotation, then configured rename, then camelCase.
pub fn method_js_name(method: &MethodDescriptor, criteria: &FilterCriteria) -> String {
    if let Some(custom) = analyzer::custom_method_name(method) {
        return custom.to_string();
    }
    match criteria.method_renames.get(&method.name) {
        Some(renamed) => renamed.clone(),
        None => names::to_camel_case(&method.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::descriptor::MethodAnnotations;

    fn method(name: &str) -> MethodDescriptor {
        MethodDescriptor {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn criteria(include: &str, exclude: &str, rename: &str) -> FilterCriteria {
        FilterCriteria::from_config(&GeneratorConfig {
            method_include: include.to_string(),
            method_exclude: exclude.to_string(),
            method_rename: rename.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn exclude_patterns_then_default() {
        let criteria = criteria("", "*Internal", "");
        let internal = should_include_method(&method("DoInternal"), &criteria);
        assert!(!internal.include);
        assert_eq!(internal.reason, "matches exclude pattern `*Internal`");

        let public = should_include_method(&method("DoPublic"), &criteria);
        assert!(public.include);
        assert_eq!(public.reason, "included by default");
    }

    #[test]
    fn include_patterns_gate_when_configured() {
        let criteria = criteria("Get*,List?ooks", "", "");
        assert!(should_include_method(&method("GetBook"), &criteria).include);
        assert!(should_include_method(&method("ListBooks"), &criteria).include);
        let other = should_include_method(&method("DeleteBook"), &criteria);
        assert!(!other.include);
        assert_eq!(other.reason, "doesn't match any include patterns");
    }

    #[test]
    fn exclude_beats_include() {
        let criteria = criteria("Get*", "GetSecret*", "");
        assert!(!should_include_method(&method("GetSecretKey"), &criteria).include);
        assert!(should_include_method(&method("GetBook"), &criteria).include);
    }

    #[test]
    fn client_streaming_is_never_generated() {
        let criteria = FilterCriteria::default();
        let upload = MethodDescriptor {
            client_streaming: true,
            ..method("Upload")
        };
        let result = should_include_method(&upload, &criteria);
        assert!(!result.include);
        assert_eq!(result.reason, "client streaming methods are not supported");

        let watch = MethodDescriptor {
            server_streaming: true,
            ..method("Watch")
        };
        let result = should_include_method(&watch, &criteria);
        assert!(result.include);
        assert!(result.server_streaming);
    }

    #[test]
    fn annotation_exclusion_comes_first() {
        let criteria = criteria("Get*", "", "");
        let m = MethodDescriptor {
            annotations: MethodAnnotations {
                excluded: true,
                ..Default::default()
            },
            ..method("GetBook")
        };
        let result = should_include_method(&m, &criteria);
        assert!(!result.include);
        assert_eq!(result.reason, "excluded by wasm_method_exclude annotation");
    }

    #[test]
    fn js_name_resolution_order() {
        let criteria = criteria("", "", "GetBook:fetchBook,ListBooks:listAll");
        let annotated = MethodDescriptor {
            annotations: MethodAnnotations {
                custom_name: Some("loadBook".to_string()),
                is_async: true,
                ..Default::default()
            },
            ..method("GetBook")
        };
        assert_eq!(method_js_name(&annotated, &criteria), "loadBook");
        assert_eq!(method_js_name(&method("ListBooks"), &criteria), "listAll");
        assert_eq!(method_js_name(&method("DeleteBook"), &criteria), "deleteBook");

        let result = should_include_method(&annotated, &criteria);
        assert_eq!(result.custom_name.as_deref(), Some("loadBook"));
        assert!(result.is_async);

        let renamed = should_include_method(&method("ListBooks"), &criteria);
        assert_eq!(renamed.custom_name.as_deref(), Some("listAll"));
    }
}
