//! Identifier case conversion and sanitisation.

/// Lower-case the first character.
pub fn to_camel_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
    }
}

/// Upper-case the first character.
pub fn to_pascal_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
    }
}

/// `HTTPSConnection` -> `h_t_t_p_s_connection`.
///
/// Every upper-case letter after the first gets its own separator; acronym
/// runs are not grouped.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            out.push('_');
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// Short alias for a slash-delimited import path: the last two segments
/// glued together, sanitised and lower-cased.
pub fn to_package_alias(import_path: &str) -> String {
    let segments: Vec<&str> = import_path.split('/').filter(|s| !s.is_empty()).collect();
    let alias = match segments.as_slice() {
        [] => return "pkg".to_string(),
        [only] => strip_separators(only),
        [.., parent, last] => strip_separators(parent) + &strip_separators(last),
    };
    if alias.is_empty() {
        "pkg".to_string()
    } else {
        alias.to_ascii_lowercase()
    }
}

fn strip_separators(segment: &str) -> String {
    segment
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | '.'))
        .collect()
}

/// `library.v1` -> `library_v1`.
pub fn to_js_namespace(package: &str) -> String {
    package.to_ascii_lowercase().replace(['.', '-'], "_")
}

fn pascal_segments(package: &str) -> impl Iterator<Item = &str> {
    package.split(['.', '-', '_']).filter(|s| !s.is_empty())
}

/// `library.v1` -> `LibraryV1Factory`.
pub fn to_factory_name(package: &str) -> String {
    pascal_join(package) + "Factory"
}

/// `library.v1` -> `LibraryV1Deserializer`.
pub fn to_deserializer_name(package: &str) -> String {
    pascal_join(package) + "Deserializer"
}

/// `library.v1` -> `libraryV1Schemas`.
pub fn to_schema_registry_name(package: &str) -> String {
    let mut out = String::new();
    for (i, segment) in pascal_segments(package).enumerate() {
        if i == 0 {
            out.push_str(&segment.to_ascii_lowercase());
        } else {
            out.push_str(&to_pascal_case(segment));
        }
    }
    out + "Schemas"
}

fn pascal_join(package: &str) -> String {
    pascal_segments(package).map(to_pascal_case).collect()
}

/// protoc's default JSON name: `page_size` -> `pageSize`.
pub fn to_json_name(field_name: &str) -> String {
    let mut out = String::with_capacity(field_name.len());
    let mut upper_next = false;
    for c in field_name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.push(c.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Name of the factory method constructing `type_name` (already flattened).
pub fn to_factory_method_name(type_name: &str) -> String {
    format!("new{type_name}")
}

/// Make `name` usable as an identifier.
///
/// A leading digit is replaced by `_` in place; any other character that is
/// not a letter, digit or underscore becomes `_`.
pub fn sanitize_identifier(name: &str) -> String {
    if name.is_empty() {
        return "_".to_string();
    }
    name.chars()
        .enumerate()
        .map(|(i, c)| {
            let valid = if i == 0 {
                c.is_ascii_alphabetic() || c == '_'
            } else {
                c.is_ascii_alphanumeric() || c == '_'
            };
            if valid {
                c
            } else {
                '_'
            }
        })
        .collect()
}
