//! Running totals of one generation run.

use super::result::{MethodFilterResult, PackageFilterResult, ServiceFilterResult};
use serde::Serialize;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Purely additive; per-package tallies are summed into the run total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    pub total_services: usize,
    pub included_services: usize,
    pub excluded_services: usize,
    pub total_methods: usize,
    pub included_methods: usize,
    pub excluded_methods: usize,
    pub total_messages: usize,
    pub total_enums: usize,
    pub total_packages: usize,
    pub included_packages: usize,
}

impl FilterStats {
    pub fn add_service_result(&mut self, result: &ServiceFilterResult) {
        self.total_services += 1;
        if result.include {
            self.included_services += 1;
        } else {
            self.excluded_services += 1;
        }
    }

    pub fn add_method_result(&mut self, result: &MethodFilterResult) {
        self.total_methods += 1;
        if result.include {
            self.included_methods += 1;
        } else {
            self.excluded_methods += 1;
        }
    }

    pub fn add_collection_stats(&mut self, messages: usize, enums: usize) {
        self.total_messages += messages;
        self.total_enums += enums;
    }

    pub fn add_package_result(&mut self, result: &PackageFilterResult) {
        self.total_packages += 1;
        if result.include {
            self.included_packages += 1;
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Filtering Summary: {}/{} services, {}/{} methods, {} messages, {} enums from {} packages",
            self.included_services,
            self.total_services,
            self.included_methods,
            self.total_methods,
            self.total_messages,
            self.total_enums,
            self.included_packages,
        )
    }
}

impl fmt::Display for FilterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl AddAssign for FilterStats {
    fn add_assign(&mut self, other: Self) {
        self.total_services += other.total_services;
        self.included_services += other.included_services;
        self.excluded_services += other.excluded_services;
        self.total_methods += other.total_methods;
        self.included_methods += other.included_methods;
        self.excluded_methods += other.excluded_methods;
        self.total_messages += other.total_messages;
        self.total_enums += other.total_enums;
        self.total_packages += other.total_packages;
        self.included_packages += other.included_packages;
    }
}

impl Add for FilterStats {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

impl Sum for FilterStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(FilterStats::default(), Add::add)
    }
}
