//! Descriptor set JSON (subset).
//!
//! The input is the protobuf JSON rendering of a `FileDescriptorSet` (as
//! written by `buf build --as-file-descriptor-set -o descriptor.json`) or of a
//! `CodeGeneratorRequest`. Extension options show up as bracketed keys:
//!
//! ```json
//! { "[wasmjs.v1.wasm_service_exclude]": true }
//! ```
//!
//! Raw option maps are kept for completeness, but the annotations the
//! generator cares about are decoded once, right after parsing, into typed
//! records ([`ServiceAnnotations`], [`MethodAnnotations`], [`FileAnnotations`]).

use crate::error::DescriptorError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

pub type Options = BTreeMap<String, Value>;

/// Extension names of the annotation package.
pub mod annotation {
    pub const PACKAGE: &str = "wasmjs.v1";

    pub const SERVICE_EXCLUDE: &str = "wasm_service_exclude";
    pub const SERVICE_NAME: &str = "wasm_service_name";
    pub const BROWSER_PROVIDED: &str = "wasm_browser_provided";
    pub const METHOD_EXCLUDE: &str = "wasm_method_exclude";
    pub const METHOD_NAME: &str = "wasm_method_name";
    pub const ASYNC_METHOD: &str = "async_method";
    pub const FACTORY_FILE: &str = "ts_factory_file";
}

// =============================================================================
// Descriptor JSON
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorSet {
    #[serde(default, alias = "protoFile")]
    pub file: Vec<FileDescriptor>,
    /// Files the generation request asks for. Empty means "all files".
    #[serde(default)]
    pub file_to_generate: Vec<String>,
    /// Raw plugin parameter string, when the document is a `CodeGeneratorRequest`.
    #[serde(default)]
    pub parameter: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub dependency: Vec<String>,
    #[serde(default)]
    pub message_type: Vec<MessageDescriptor>,
    #[serde(default)]
    pub enum_type: Vec<EnumDescriptor>,
    #[serde(default)]
    pub service: Vec<ServiceDescriptor>,
    #[serde(default)]
    pub options: Option<Options>,
    #[serde(default)]
    pub source_code_info: Option<SourceCodeInfo>,
    pub syntax: Option<String>,

    /// Whether the file is part of the generation request.
    #[serde(skip)]
    pub generate: bool,
    #[serde(skip)]
    pub annotations: FileAnnotations,
    #[serde(skip)]
    comments: HashMap<Vec<i32>, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub field: Vec<FieldDescriptor>,
    #[serde(default)]
    pub nested_type: Vec<MessageDescriptor>,
    #[serde(default)]
    pub enum_type: Vec<EnumDescriptor>,
    #[serde(default)]
    pub oneof_decl: Vec<OneofDescriptor>,
    #[serde(default)]
    pub options: Option<Options>,
}

impl MessageDescriptor {
    /// True for the synthetic `XxxEntry` messages protoc emits for `map<K, V>`.
    ///
    /// The `map_entry` message option is authoritative; descriptor sets that
    /// dropped options are recognised by shape (`key = 1`, `value = 2`,
    /// name ending in `Entry`).
    pub fn is_map_entry(&self) -> bool {
        if let Some(flag) = self
            .options
            .as_ref()
            .and_then(|o| o.get("mapEntry").or_else(|| o.get("map_entry")))
            .and_then(Value::as_bool)
        {
            return flag;
        }
        self.name.ends_with("Entry")
            && self.field.len() == 2
            && self.field_by_number(1).is_some_and(|f| f.name == "key")
            && self.field_by_number(2).is_some_and(|f| f.name == "value")
    }

    pub fn field_by_number(&self, number: i32) -> Option<&FieldDescriptor> {
        self.field.iter().find(|f| f.number == number)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OneofDescriptor {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub number: i32,
    pub label: Option<FieldLabel>,
    #[serde(rename = "type")]
    pub kind: Option<FieldKind>,
    /// Fully-qualified referenced type, with a leading dot (`.pkg.Message`).
    pub type_name: Option<String>,
    pub json_name: Option<String>,
    pub oneof_index: Option<i32>,
    #[serde(default)]
    pub proto3_optional: bool,
    #[serde(default)]
    pub options: Option<Options>,
}

impl FieldDescriptor {
    pub fn is_repeated(&self) -> bool {
        self.label == Some(FieldLabel::Repeated)
    }

    /// Referenced type without the leading dot.
    pub fn type_reference(&self) -> Option<&str> {
        self.type_name
            .as_deref()
            .map(|t| t.trim_start_matches('.'))
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum FieldKind {
    #[serde(rename = "TYPE_DOUBLE")]
    Double,
    #[serde(rename = "TYPE_FLOAT")]
    Float,
    #[serde(rename = "TYPE_INT64")]
    Int64,
    #[serde(rename = "TYPE_UINT64")]
    Uint64,
    #[serde(rename = "TYPE_INT32")]
    Int32,
    #[serde(rename = "TYPE_FIXED64")]
    Fixed64,
    #[serde(rename = "TYPE_FIXED32")]
    Fixed32,
    #[serde(rename = "TYPE_BOOL")]
    Bool,
    #[serde(rename = "TYPE_STRING")]
    String,
    #[serde(rename = "TYPE_GROUP")]
    Group,
    #[serde(rename = "TYPE_MESSAGE")]
    Message,
    #[serde(rename = "TYPE_BYTES")]
    Bytes,
    #[serde(rename = "TYPE_UINT32")]
    Uint32,
    #[serde(rename = "TYPE_ENUM")]
    Enum,
    #[serde(rename = "TYPE_SFIXED32")]
    Sfixed32,
    #[serde(rename = "TYPE_SFIXED64")]
    Sfixed64,
    #[serde(rename = "TYPE_SINT32")]
    Sint32,
    #[serde(rename = "TYPE_SINT64")]
    Sint64,
}

impl FieldKind {
    pub fn is_message(self) -> bool {
        matches!(self, FieldKind::Message | FieldKind::Group)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum FieldLabel {
    #[serde(rename = "LABEL_OPTIONAL")]
    Optional,
    #[serde(rename = "LABEL_REQUIRED")]
    Required,
    #[serde(rename = "LABEL_REPEATED")]
    Repeated,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnumDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: Vec<EnumValueDescriptor>,
    #[serde(default)]
    pub options: Option<Options>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnumValueDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub number: i32,
    #[serde(default)]
    pub options: Option<Options>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub method: Vec<MethodDescriptor>,
    #[serde(default)]
    pub options: Option<Options>,
    #[serde(skip)]
    pub annotations: ServiceAnnotations,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub input_type: String,
    #[serde(default)]
    pub output_type: String,
    #[serde(default)]
    pub client_streaming: bool,
    #[serde(default)]
    pub server_streaming: bool,
    #[serde(default)]
    pub options: Option<Options>,
    #[serde(skip)]
    pub annotations: MethodAnnotations,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceCodeInfo {
    #[serde(default)]
    pub location: Vec<Location>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub path: Vec<i32>,
    pub leading_comments: Option<String>,
    pub trailing_comments: Option<String>,
}

// =============================================================================
// Typed annotations
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceAnnotations {
    pub excluded: bool,
    pub custom_name: Option<String>,
    pub browser_provided: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodAnnotations {
    pub excluded: bool,
    pub custom_name: Option<String>,
    pub is_async: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileAnnotations {
    pub factory_file: bool,
}

fn extension<'a>(options: Option<&'a Options>, name: &str) -> Option<&'a Value> {
    let key = format!("[{}.{}]", annotation::PACKAGE, name);
    options?.get(&key)
}

// A missing extension and a `false` one both mean "not set".
fn extension_flag(options: Option<&Options>, name: &str) -> bool {
    extension(options, name)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

// Likewise an empty string is treated as absent.
fn extension_string(options: Option<&Options>, name: &str) -> Option<String> {
    extension(options, name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl ServiceAnnotations {
    pub fn from_options(options: Option<&Options>) -> Self {
        Self {
            excluded: extension_flag(options, annotation::SERVICE_EXCLUDE),
            custom_name: extension_string(options, annotation::SERVICE_NAME),
            browser_provided: extension_flag(options, annotation::BROWSER_PROVIDED),
        }
    }
}

impl MethodAnnotations {
    pub fn from_options(options: Option<&Options>) -> Self {
        let is_async = extension(options, annotation::ASYNC_METHOD)
            .and_then(Value::as_object)
            .and_then(|obj| obj.get("isAsync").or_else(|| obj.get("is_async")))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Self {
            excluded: extension_flag(options, annotation::METHOD_EXCLUDE),
            custom_name: extension_string(options, annotation::METHOD_NAME),
            is_async,
        }
    }
}

impl FileAnnotations {
    pub fn from_options(options: Option<&Options>) -> Self {
        Self {
            factory_file: extension_flag(options, annotation::FACTORY_FILE),
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

impl DescriptorSet {
    pub fn from_json(text: &str) -> Result<Self, DescriptorError> {
        let set: DescriptorSet = serde_json::from_str(text)?;
        Ok(set.prepared())
    }

    pub fn from_value(value: Value) -> Result<Self, DescriptorError> {
        let set: DescriptorSet = serde_json::from_value(value)?;
        Ok(set.prepared())
    }

    /// Replace the generation request; an empty list puts every file in scope.
    pub fn set_files_to_generate(&mut self, files: Vec<String>) {
        self.file_to_generate = files;
        self.mark_generated_files();
    }

    fn prepared(mut self) -> Self {
        self.mark_generated_files();
        for file in &mut self.file {
            file.annotations = FileAnnotations::from_options(file.options.as_ref());
            file.comments = index_comments(file.source_code_info.as_ref());
            for service in &mut file.service {
                service.annotations = ServiceAnnotations::from_options(service.options.as_ref());
                for method in &mut service.method {
                    method.annotations = MethodAnnotations::from_options(method.options.as_ref());
                }
            }
        }
        self
    }

    fn mark_generated_files(&mut self) {
        let all = self.file_to_generate.is_empty();
        for file in &mut self.file {
            file.generate = all || self.file_to_generate.iter().any(|f| f == &file.name);
        }
    }
}

impl FileDescriptor {
    /// Comment attached to a `SourceCodeInfo` path, if any.
    pub fn comment(&self, path: &[i32]) -> Option<&str> {
        self.comments.get(path).map(String::as_str)
    }
}

fn index_comments(info: Option<&SourceCodeInfo>) -> HashMap<Vec<i32>, String> {
    let mut index = HashMap::new();
    let Some(info) = info else {
        return index;
    };
    for loc in &info.location {
        // prefer leading, fall back to trailing
        let comment = loc
            .leading_comments
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .or(loc.trailing_comments.as_deref());
        let Some(comment) = comment else {
            continue;
        };
        let trimmed = comment
            .lines()
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();
        if !trimmed.is_empty() {
            index.insert(loc.path.clone(), trimmed);
        }
    }
    index
}

// =============================================================================
// Type index
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Message,
    Enum,
}

/// Where a fully-qualified type lives.
#[derive(Debug, Clone)]
pub struct TypeEntry<'a> {
    pub kind: TypeKind,
    pub package: String,
    pub file: String,
    /// Local names from the outermost message down, e.g. `["Outer", "Inner"]`.
    pub nesting: Vec<String>,
    pub message: Option<&'a MessageDescriptor>,
}

impl TypeEntry<'_> {
    pub fn is_nested(&self) -> bool {
        self.nesting.len() > 1
    }

    pub fn flattened_name(&self) -> String {
        self.nesting.join("_")
    }
}

/// Lookup table over every file of the set, including files outside the
/// generation request.
#[derive(Debug, Default)]
pub struct TypeIndex<'a> {
    entries: HashMap<String, TypeEntry<'a>>,
}

impl<'a> TypeIndex<'a> {
    pub fn build(set: &'a DescriptorSet) -> Self {
        let mut index = TypeIndex::default();
        for file in &set.file {
            for message in &file.message_type {
                index.insert_message(file, message, Vec::new());
            }
            for en in &file.enum_type {
                index.insert_enum(file, en, &[]);
            }
        }
        index
    }

    fn insert_message(
        &mut self,
        file: &'a FileDescriptor,
        message: &'a MessageDescriptor,
        mut nesting: Vec<String>,
    ) {
        nesting.push(message.name.clone());
        for nested in &message.nested_type {
            self.insert_message(file, nested, nesting.clone());
        }
        for en in &message.enum_type {
            self.insert_enum(file, en, &nesting);
        }
        self.entries.insert(
            qualify(&file.package, &nesting.join(".")),
            TypeEntry {
                kind: TypeKind::Message,
                package: file.package.clone(),
                file: file.name.clone(),
                nesting,
                message: Some(message),
            },
        );
    }

    fn insert_enum(&mut self, file: &'a FileDescriptor, en: &'a EnumDescriptor, parents: &[String]) {
        let mut nesting = parents.to_vec();
        nesting.push(en.name.clone());
        self.entries.insert(
            qualify(&file.package, &nesting.join(".")),
            TypeEntry {
                kind: TypeKind::Enum,
                package: file.package.clone(),
                file: file.name.clone(),
                nesting,
                message: None,
            },
        );
    }

    /// Look up a type by its fully-qualified name (leading dot optional).
    pub fn get(&self, type_name: &str) -> Option<&TypeEntry<'a>> {
        self.entries.get(type_name.trim_start_matches('.'))
    }

    pub fn message(&self, type_name: &str) -> Option<&'a MessageDescriptor> {
        self.get(type_name).and_then(|e| e.message)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub(crate) fn qualify(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{package}.{name}")
    }
}
