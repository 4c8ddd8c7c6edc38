//! Filter outcomes.
//!
//! Metadata on an excluded result (custom name, flags) is left at its
//! default and carries no meaning.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterResult {
    pub include: bool,
    pub reason: String,
}

impl FilterResult {
    pub fn included(reason: impl Into<String>) -> Self {
        Self {
            include: true,
            reason: reason.into(),
        }
    }

    pub fn excluded(reason: impl Into<String>) -> Self {
        Self {
            include: false,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceFilterResult {
    pub include: bool,
    pub reason: String,
    pub custom_name: Option<String>,
    pub browser_provided: bool,
}

impl ServiceFilterResult {
    pub fn excluded(reason: impl Into<String>) -> Self {
        Self {
            include: false,
            reason: reason.into(),
            custom_name: None,
            browser_provided: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodFilterResult {
    pub include: bool,
    pub reason: String,
    pub custom_name: Option<String>,
    pub is_async: bool,
    pub server_streaming: bool,
}

impl MethodFilterResult {
    pub fn excluded(reason: impl Into<String>) -> Self {
        Self {
            include: false,
            reason: reason.into(),
            custom_name: None,
            is_async: false,
            server_streaming: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageFilterResult {
    pub include: bool,
    pub reason: String,
    pub has_services: bool,
    pub has_messages: bool,
    pub has_enums: bool,
}

impl From<&ServiceFilterResult> for FilterResult {
    fn from(r: &ServiceFilterResult) -> Self {
        Self {
            include: r.include,
            reason: r.reason.clone(),
        }
    }
}

impl From<&MethodFilterResult> for FilterResult {
    fn from(r: &MethodFilterResult) -> Self {
        Self {
            include: r.include,
            reason: r.reason.clone(),
        }
    }
}

impl From<&PackageFilterResult> for FilterResult {
    fn from(r: &PackageFilterResult) -> Self {
        Self {
            include: r.include,
            reason: r.reason.clone(),
        }
    }
}
