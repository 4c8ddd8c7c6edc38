//! Core of the `wasmbridge` protoc plugin (descriptor set → generation plan).
//!
//! The plugin turns proto packages into TypeScript clients for services
//! compiled to WebAssembly. This crate is the part that decides *what* gets
//! generated:
//!
//! - which packages, services and methods pass the configured filters
//! - which messages and enums each package contributes
//! - how generated packages import and construct each other's types
//!
//! Rendering is out of scope; the output is a [`GenerationPlan`].
//!
//! ```no_run
//! use wasmbridge_core::{build_generation_plan, DescriptorSet, FilterCriteria, GeneratorConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let set = DescriptorSet::from_json(&std::fs::read_to_string("descriptor.json")?)?;
//! let mut config = GeneratorConfig::default();
//! config.apply_parameter("services=LibraryService,method_exclude=*Internal")?;
//! let plan = build_generation_plan(&set, &FilterCriteria::from_config(&config)?)?;
//! println!("{}", plan.stats);
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod collect;
pub mod config;
pub mod criteria;
pub mod descriptor;
pub mod error;
pub mod factory;
pub mod filter;
pub mod names;
pub mod paths;
pub mod plan;
pub mod resolve;

pub use collect::{CollectionResult, EnumInfo, EnumValueInfo, FieldInfo, MessageInfo};
pub use config::GeneratorConfig;
pub use criteria::{FilterCriteria, MethodPattern, ServiceAllowList};
pub use descriptor::{DescriptorSet, FileDescriptor, TypeIndex};
pub use error::{ConfigError, DescriptorError, Error, ResolveError, Result};
pub use factory::PackageFactory;
pub use filter::{
    FilterResult, FilterStats, MethodFilterResult, PackageFilterResult, ServiceFilterResult,
};
pub use plan::{build_generation_plan, GenerationPlan, MethodPlan, PackagePlan, ServicePlan};
pub use resolve::{
    CrossPackageImport, ExternalImport, ExternalTypeMapping, ExternalTypeMappings,
    FactoryDependency, PackageReferences,
};
