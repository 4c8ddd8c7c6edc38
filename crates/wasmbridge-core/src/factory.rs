//! Per-package factories with cross-package delegation.
//!
//! A [`PackageFactory`] constructs the messages of one package and forwards
//! requests for any other package's type to the dependency factory that
//! owns it. Constructors are registered closures keyed by flattened type
//! name, so delegation is a table lookup rather than a method-name lookup.

use crate::analyzer;
use crate::collect::{FieldInfo, MessageInfo};
use crate::descriptor::qualify;
use crate::error::ResolveError;
use crate::names;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Callback producing a fresh instance.
pub type Constructor<T> = Arc<dyn Fn() -> T + Send + Sync>;

pub struct PackageFactory<T> {
    package: String,
    constructors: BTreeMap<String, Constructor<T>>,
    dependencies: BTreeMap<String, Arc<PackageFactory<T>>>,
}

impl<T> std::fmt::Debug for PackageFactory<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageFactory")
            .field("package", &self.package)
            .field("constructors", &self.constructors.keys().collect::<Vec<_>>())
            .field("dependencies", &self.dependencies.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T> PackageFactory<T> {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            constructors: BTreeMap::new(),
            dependencies: BTreeMap::new(),
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// Register the constructor for a local type (flattened name). A second
    /// registration under the same name replaces the first.
    pub fn register<F>(&mut self, type_name: impl Into<String>, constructor: F)
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let type_name = type_name.into();
        if self.constructors.contains_key(&type_name) {
            warn!(
                package = %self.package,
                type_name = %type_name,
                "duplicate constructor registered, replacing the earlier one"
            );
        }
        self.constructors.insert(type_name, Arc::new(constructor));
    }

    /// Delegate the types of `dependency`'s package to it. A later factory
    /// for the same package replaces the earlier one.
    pub fn add_dependency(&mut self, dependency: Arc<PackageFactory<T>>) {
        self.dependencies
            .insert(dependency.package.clone(), dependency);
    }

    pub fn has_dependency(&self, package: &str) -> bool {
        self.dependencies.contains_key(package)
    }

    /// Local factory method names (`new` + flattened type name), sorted.
    pub fn method_names(&self) -> Vec<String> {
        self.constructors
            .keys()
            .map(|name| names::to_factory_method_name(name))
            .collect()
    }

    /// Construct `type_name` (fully qualified, flattened, leading dot optional).
    pub fn create(&self, type_name: &str) -> Result<T, ResolveError> {
        let type_name = type_name.trim_start_matches('.');
        let package = analyzer::extract_package_name(type_name);

        if package == self.package {
            let local = analyzer::extract_message_name(type_name);
            return match self.constructors.get(&local) {
                Some(constructor) => Ok(constructor()),
                None => Err(ResolveError::UnknownType {
                    type_name: type_name.to_string(),
                    package,
                    method: names::to_factory_method_name(&local),
                }),
            };
        }

        match self.dependencies.get(&package) {
            Some(dependency) => dependency.create(type_name),
            None => Err(ResolveError::UnknownPackage {
                type_name: type_name.to_string(),
                package,
            }),
        }
    }

    /// Every constructor reachable from this factory, keyed by fully
    /// qualified name. Local entries shadow dependency entries.
    pub fn constructors(&self) -> BTreeMap<String, Constructor<T>> {
        let mut merged = BTreeMap::new();
        for dependency in self.dependencies.values() {
            merged.extend(dependency.constructors());
        }
        for (name, constructor) in &self.constructors {
            merged.insert(qualify(&self.package, name), Arc::clone(constructor));
        }
        merged
    }
}

// =============================================================================
// Default JSON instances
// =============================================================================

/// Protobuf JSON default for one field.
///
/// Lists and maps start empty, message fields and oneof members are `null`,
/// 64-bit integers are strings as in the canonical JSON mapping.
pub fn default_field_value(field: &FieldInfo) -> Value {
    if field.is_map {
        return Value::Object(Map::new());
    }
    if field.is_repeated {
        return Value::Array(Vec::new());
    }
    if field.is_message || field.oneof_group.is_some() || field.is_optional {
        return Value::Null;
    }
    if field.is_enum {
        return Value::from(0);
    }
    match field.type_name.as_str() {
        "bool" => Value::Bool(false),
        "string" | "bytes" => Value::String(String::new()),
        "int64" | "uint64" | "sint64" | "fixed64" | "sfixed64" => Value::String("0".to_string()),
        "double" | "float" => Value::from(0.0),
        "int32" | "uint32" | "sint32" | "fixed32" | "sfixed32" => Value::from(0),
        _ => Value::Null,
    }
}

/// A message's default JSON object, keyed by JSON field name.
pub fn default_instance(message: &MessageInfo) -> Value {
    let fields: Map<String, Value> = message
        .fields
        .iter()
        .map(|f| (f.json_name.clone(), default_field_value(f)))
        .collect();
    Value::Object(fields)
}

/// A factory whose constructors build default JSON instances of `messages`.
pub fn json_factory(package: &str, messages: &[MessageInfo]) -> PackageFactory<Value> {
    let mut factory = PackageFactory::new(package);
    for message in messages {
        let instance = default_instance(message);
        factory.register(message.name.clone(), move || instance.clone());
    }
    factory
}
