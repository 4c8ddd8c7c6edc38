//! Generation filters.
//!
//! Each filter is a pure function of an entity and the [`FilterCriteria`]
//! returning a typed result that carries its reason. Nothing here keeps
//! state between calls.
//!
//! [`FilterCriteria`]: crate::criteria::FilterCriteria

pub mod method;
pub mod package;
pub mod result;
pub mod service;
pub mod stats;

pub use method::{method_js_name, should_include_method};
pub use package::{filter_packages, is_infrastructure_package, should_include_package, PackageGroup};
pub use result::{FilterResult, MethodFilterResult, PackageFilterResult, ServiceFilterResult};
pub use service::{service_js_name, should_include_service};
pub use stats::FilterStats;
