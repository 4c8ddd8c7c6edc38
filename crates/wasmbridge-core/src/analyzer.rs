//! Metadata extraction over parsed descriptors.

use crate::descriptor::{
    FieldDescriptor, FieldKind, FileDescriptor, MessageDescriptor, MethodDescriptor,
    ServiceDescriptor, TypeIndex,
};

/// `library.v1.Book` -> `library.v1`. Empty for names with one segment.
pub fn extract_package_name(type_name: &str) -> String {
    let trimmed = type_name.trim_start_matches('.');
    match trimmed.rsplit_once('.') {
        Some((package, _)) => package.to_string(),
        None => String::new(),
    }
}

/// `library.v1.Book` -> `Book`.
pub fn extract_message_name(type_name: &str) -> String {
    let trimmed = type_name.trim_start_matches('.');
    match trimmed.rsplit_once('.') {
        Some((_, name)) => name.to_string(),
        None => trimmed.to_string(),
    }
}

/// Canonical type string: scalar proto type names, or the bare referenced
/// type name for messages and enums.
pub fn field_type_name(field: &FieldDescriptor) -> String {
    let Some(kind) = field.kind else {
        // no kind but a type name: proto2 descriptors may leave it to resolution
        return field
            .type_reference()
            .map(extract_message_name)
            .unwrap_or_else(|| "any".to_string());
    };
    let scalar = match kind {
        FieldKind::Double => "double",
        FieldKind::Float => "float",
        FieldKind::Int32 => "int32",
        FieldKind::Int64 => "int64",
        FieldKind::Uint32 => "uint32",
        FieldKind::Uint64 => "uint64",
        FieldKind::Sint32 => "sint32",
        FieldKind::Sint64 => "sint64",
        FieldKind::Fixed32 => "fixed32",
        FieldKind::Fixed64 => "fixed64",
        FieldKind::Sfixed32 => "sfixed32",
        FieldKind::Sfixed64 => "sfixed64",
        FieldKind::Bool => "bool",
        FieldKind::String => "string",
        FieldKind::Bytes => "bytes",
        FieldKind::Message | FieldKind::Group | FieldKind::Enum => {
            return field
                .type_reference()
                .map(extract_message_name)
                .unwrap_or_else(|| "any".to_string());
        }
    };
    scalar.to_string()
}

/// True when the field's message type is a synthetic map entry.
pub fn is_map_field(field: &FieldDescriptor, index: &TypeIndex<'_>) -> bool {
    map_entry_of(field, index).is_some()
}

fn map_entry_of<'a>(field: &FieldDescriptor, index: &TypeIndex<'a>) -> Option<&'a MessageDescriptor> {
    if !field.kind.is_some_and(FieldKind::is_message) {
        return None;
    }
    let entry = index.message(field.type_reference()?)?;
    let shaped = entry.field.len() == 2
        && entry.field_by_number(1).is_some()
        && entry.field_by_number(2).is_some();
    (shaped && entry.is_map_entry()).then_some(entry)
}

/// `(key, value)` types of a map field; `("any", "any")` for anything else.
pub fn map_key_value_types(field: &FieldDescriptor, index: &TypeIndex<'_>) -> (String, String) {
    let Some(entry) = map_entry_of(field, index) else {
        return ("any".to_string(), "any".to_string());
    };
    let key = entry
        .field_by_number(1)
        .map(field_type_name)
        .unwrap_or_else(|| "any".to_string());
    let value = entry
        .field_by_number(2)
        .map(field_type_name)
        .unwrap_or_else(|| "any".to_string());
    (key, value)
}

/// The value field of a map entry, used to follow references through maps.
pub fn map_value_field<'a>(
    field: &FieldDescriptor,
    index: &TypeIndex<'a>,
) -> Option<&'a FieldDescriptor> {
    map_entry_of(field, index)?.field_by_number(2)
}

pub fn is_service_excluded(service: &ServiceDescriptor) -> bool {
    service.annotations.excluded
}

pub fn is_browser_provided_service(service: &ServiceDescriptor) -> bool {
    service.annotations.browser_provided
}

pub fn custom_service_name(service: &ServiceDescriptor) -> Option<&str> {
    service.annotations.custom_name.as_deref()
}

pub fn is_method_excluded(method: &MethodDescriptor) -> bool {
    method.annotations.excluded
}

pub fn is_async_method(method: &MethodDescriptor) -> bool {
    method.annotations.is_async
}

pub fn custom_method_name(method: &MethodDescriptor) -> Option<&str> {
    method.annotations.custom_name.as_deref()
}

pub fn is_factory_file(file: &FileDescriptor) -> bool {
    file.annotations.factory_file
}

/// Distinct oneof names in declaration order.
///
/// Synthetic oneofs wrapping proto3 `optional` fields are not unions and are
/// left out.
pub fn oneof_groups(message: &MessageDescriptor) -> Vec<String> {
    let mut groups: Vec<String> = Vec::new();
    for field in &message.field {
        if field.proto3_optional {
            continue;
        }
        let Some(name) = field
            .oneof_index
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| message.oneof_decl.get(i))
            .map(|o| o.name.clone())
        else {
            continue;
        };
        if !groups.contains(&name) {
            groups.push(name);
        }
    }
    groups
}

/// What a message descriptor is declared in.
#[derive(Debug, Clone, Copy)]
pub enum Parent<'a> {
    File(&'a FileDescriptor),
    Message(&'a MessageDescriptor),
}

pub fn is_nested_message(parent: Parent<'_>) -> bool {
    matches!(parent, Parent::Message(_))
}
