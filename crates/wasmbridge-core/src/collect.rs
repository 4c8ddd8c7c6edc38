//! Message and enum collection.
//!
//! Depth-first over each file's message tree. `total_found` counts every node
//! the traversal visits, including map entries that are then dropped; nested
//! nodes skipped because of `exclude_nested_*` are never visited and so are
//! not counted.

use crate::analyzer::{self, Parent};
use crate::criteria::FilterCriteria;
use crate::descriptor::{
    qualify, EnumDescriptor, FieldDescriptor, FieldKind, FileDescriptor, MessageDescriptor,
    TypeIndex,
};
use crate::names;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldInfo {
    pub name: String,
    pub json_name: String,
    pub number: i32,
    /// Canonical scalar name, or the bare referenced type name.
    pub type_name: String,
    /// Referenced message/enum, fully qualified without the leading dot.
    pub type_reference: Option<String>,
    pub is_message: bool,
    pub is_enum: bool,
    pub is_repeated: bool,
    pub is_optional: bool,
    pub is_map: bool,
    pub map_key_type: Option<String>,
    pub map_value_type: Option<String>,
    /// Referenced type of a map's value, when it is a message or enum.
    pub map_value_reference: Option<String>,
    pub oneof_group: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageInfo {
    /// Flattened name (`Outer_Inner` for nested messages).
    pub name: String,
    /// Name as declared (`Inner`).
    pub local_name: String,
    /// Always `package_name + "." + name`.
    pub fully_qualified_name: String,
    /// Proto full name (`pkg.Outer.Inner`).
    pub proto_name: String,
    pub package_name: String,
    pub file_path: String,
    pub is_nested: bool,
    pub is_map_entry: bool,
    pub comment: Option<String>,
    pub fields: Vec<FieldInfo>,
    pub oneof_groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumValueInfo {
    pub name: String,
    pub number: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumInfo {
    pub name: String,
    pub local_name: String,
    pub fully_qualified_name: String,
    pub proto_name: String,
    pub package_name: String,
    pub file_path: String,
    pub is_nested: bool,
    pub comment: Option<String>,
    pub values: Vec<EnumValueInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionResult<T> {
    pub items: Vec<T>,
    /// Nodes visited before per-item filtering.
    pub total_found: usize,
    pub files_scanned: usize,
}

impl<T> CollectionResult<T> {
    fn new(files_scanned: usize) -> Self {
        Self {
            items: Vec::new(),
            total_found: 0,
            files_scanned,
        }
    }
}

// =============================================================================
// Messages
// =============================================================================

pub fn collect_messages(
    files: &[&FileDescriptor],
    criteria: &FilterCriteria,
    index: &TypeIndex<'_>,
) -> CollectionResult<MessageInfo> {
    let mut result = CollectionResult::new(files.len());
    for file in files.iter().copied() {
        for (i, message) in file.message_type.iter().enumerate() {
            let walk = MessageWalk {
                file,
                parent: Parent::File(file),
                parents: &[],
                path: vec![4, i as i32],
            };
            visit_message(&walk, message, criteria, index, &mut result);
        }
    }
    result
}

struct MessageWalk<'a> {
    file: &'a FileDescriptor,
    parent: Parent<'a>,
    parents: &'a [String],
    path: Vec<i32>,
}

fn visit_message(
    walk: &MessageWalk<'_>,
    message: &MessageDescriptor,
    criteria: &FilterCriteria,
    index: &TypeIndex<'_>,
    result: &mut CollectionResult<MessageInfo>,
) {
    result.total_found += 1;

    let mut nesting = walk.parents.to_vec();
    nesting.push(message.name.clone());

    let is_map_entry = message.is_map_entry();
    if !(is_map_entry && criteria.exclude_map_entries) {
        result
            .items
            .push(message_info(walk, message, &nesting, is_map_entry, index));
    }

    if criteria.exclude_nested_messages {
        return;
    }
    for (j, nested) in message.nested_type.iter().enumerate() {
        let mut path = walk.path.clone();
        path.extend([3, j as i32]);
        let child = MessageWalk {
            file: walk.file,
            parent: Parent::Message(message),
            parents: &nesting,
            path,
        };
        visit_message(&child, nested, criteria, index, result);
    }
}

fn message_info(
    walk: &MessageWalk<'_>,
    message: &MessageDescriptor,
    nesting: &[String],
    is_map_entry: bool,
    index: &TypeIndex<'_>,
) -> MessageInfo {
    let package = &walk.file.package;
    let name = nesting.join("_");
    let oneofs = analyzer::oneof_groups(message);

    let fields = message
        .field
        .iter()
        .enumerate()
        .map(|(k, field)| {
            let mut path = walk.path.clone();
            path.extend([2, k as i32]);
            field_info(walk.file, message, field, &path, index)
        })
        .collect();

    MessageInfo {
        fully_qualified_name: qualify(package, &name),
        proto_name: qualify(package, &nesting.join(".")),
        name,
        local_name: message.name.clone(),
        package_name: package.clone(),
        file_path: walk.file.name.clone(),
        is_nested: analyzer::is_nested_message(walk.parent),
        is_map_entry,
        comment: walk.file.comment(&walk.path).map(str::to_string),
        fields,
        oneof_groups: oneofs,
    }
}

fn field_info(
    file: &FileDescriptor,
    message: &MessageDescriptor,
    field: &FieldDescriptor,
    path: &[i32],
    index: &TypeIndex<'_>,
) -> FieldInfo {
    let is_map = analyzer::is_map_field(field, index);
    let (map_key_type, map_value_type, map_value_reference) = if is_map {
        let (key, value) = analyzer::map_key_value_types(field, index);
        let value_reference = analyzer::map_value_field(field, index)
            .and_then(FieldDescriptor::type_reference)
            .map(str::to_string);
        (Some(key), Some(value), value_reference)
    } else {
        (None, None, None)
    };

    let oneof_group = if field.proto3_optional {
        None
    } else {
        field
            .oneof_index
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| message.oneof_decl.get(i))
            .map(|o| o.name.clone())
    };

    FieldInfo {
        name: field.name.clone(),
        json_name: field
            .json_name
            .clone()
            .unwrap_or_else(|| names::to_json_name(&field.name)),
        number: field.number,
        type_name: analyzer::field_type_name(field),
        type_reference: field.type_reference().map(str::to_string),
        is_message: field.kind.is_some_and(FieldKind::is_message),
        is_enum: field.kind == Some(FieldKind::Enum),
        // map fields are repeated entries on the wire but not lists in the model
        is_repeated: field.is_repeated() && !is_map,
        is_optional: field.proto3_optional,
        is_map,
        map_key_type,
        map_value_type,
        map_value_reference,
        oneof_group,
        comment: file.comment(path).map(str::to_string),
    }
}

/// True as soon as one message would be collected.
pub fn has_any_messages(files: &[&FileDescriptor], criteria: &FilterCriteria) -> bool {
    fn qualifies(message: &MessageDescriptor, criteria: &FilterCriteria) -> bool {
        if !(criteria.exclude_map_entries && message.is_map_entry()) {
            return true;
        }
        !criteria.exclude_nested_messages
            && message.nested_type.iter().any(|n| qualifies(n, criteria))
    }
    files
        .iter()
        .flat_map(|f| &f.message_type)
        .any(|m| qualifies(m, criteria))
}

/// Collect messages of each package separately.
pub fn collect_messages_by_package(
    files: &[&FileDescriptor],
    criteria: &FilterCriteria,
    index: &TypeIndex<'_>,
) -> BTreeMap<String, CollectionResult<MessageInfo>> {
    group_by_package(files)
        .into_iter()
        .map(|(package, files)| (package, collect_messages(&files, criteria, index)))
        .collect()
}

// =============================================================================
// Enums
// =============================================================================

pub fn collect_enums(files: &[&FileDescriptor], criteria: &FilterCriteria) -> CollectionResult<EnumInfo> {
    let mut result = CollectionResult::new(files.len());
    for file in files.iter().copied() {
        for (i, en) in file.enum_type.iter().enumerate() {
            visit_enum(file, en, &[], vec![5, i as i32], &mut result);
        }
        if criteria.exclude_nested_enums {
            continue;
        }
        for (i, message) in file.message_type.iter().enumerate() {
            collect_nested_enums(file, message, &[], vec![4, i as i32], &mut result);
        }
    }
    result
}

fn collect_nested_enums(
    file: &FileDescriptor,
    message: &MessageDescriptor,
    parents: &[String],
    path: Vec<i32>,
    result: &mut CollectionResult<EnumInfo>,
) {
    let mut nesting = parents.to_vec();
    nesting.push(message.name.clone());

    for (k, en) in message.enum_type.iter().enumerate() {
        let mut enum_path = path.clone();
        enum_path.extend([4, k as i32]);
        visit_enum(file, en, &nesting, enum_path, result);
    }
    for (j, nested) in message.nested_type.iter().enumerate() {
        let mut nested_path = path.clone();
        nested_path.extend([3, j as i32]);
        collect_nested_enums(file, nested, &nesting, nested_path, result);
    }
}

fn visit_enum(
    file: &FileDescriptor,
    en: &EnumDescriptor,
    parents: &[String],
    path: Vec<i32>,
    result: &mut CollectionResult<EnumInfo>,
) {
    result.total_found += 1;

    let mut nesting = parents.to_vec();
    nesting.push(en.name.clone());
    let name = nesting.join("_");

    let values = en
        .value
        .iter()
        .enumerate()
        .map(|(k, v)| {
            let mut value_path = path.clone();
            value_path.extend([2, k as i32]);
            EnumValueInfo {
                name: v.name.clone(),
                number: v.number,
                comment: file.comment(&value_path).map(str::to_string),
            }
        })
        .collect();

    result.items.push(EnumInfo {
        fully_qualified_name: qualify(&file.package, &name),
        proto_name: qualify(&file.package, &nesting.join(".")),
        name,
        local_name: en.name.clone(),
        package_name: file.package.clone(),
        file_path: file.name.clone(),
        is_nested: !parents.is_empty(),
        comment: file.comment(&path).map(str::to_string),
        values,
    });
}

/// True as soon as one enum would be collected.
pub fn has_any_enums(files: &[&FileDescriptor], criteria: &FilterCriteria) -> bool {
    fn nested(message: &MessageDescriptor) -> bool {
        !message.enum_type.is_empty() || message.nested_type.iter().any(nested)
    }
    files.iter().any(|f| {
        !f.enum_type.is_empty()
            || (!criteria.exclude_nested_enums && f.message_type.iter().any(nested))
    })
}

pub fn collect_enums_by_package(
    files: &[&FileDescriptor],
    criteria: &FilterCriteria,
) -> BTreeMap<String, CollectionResult<EnumInfo>> {
    group_by_package(files)
        .into_iter()
        .map(|(package, files)| (package, collect_enums(&files, criteria)))
        .collect()
}

fn group_by_package<'a>(files: &[&'a FileDescriptor]) -> BTreeMap<String, Vec<&'a FileDescriptor>> {
    let mut grouped: BTreeMap<String, Vec<&'a FileDescriptor>> = BTreeMap::new();
    for file in files.iter().copied() {
        grouped.entry(file.package.clone()).or_default().push(file);
    }
    grouped
}
