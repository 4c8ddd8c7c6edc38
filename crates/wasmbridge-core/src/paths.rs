//! Path arithmetic for generated output.
//!
//! Everything here works on forward-slash paths regardless of the host OS;
//! the generated imports are consumed by a strictly-slash toolchain.

use crate::names;

/// `library.v1` -> `library/v1`. A lone `.` maps to `/`.
pub fn build_package_path(package: &str) -> String {
    package.replace('.', "/")
}

/// Relative path from directory `from` to directory `to`.
///
/// Both sides are normalized first, so `gen/ts/..` and `gen` are the same
/// directory.
pub fn calculate_relative_path(from: &str, to: &str) -> String {
    let (from, to) = (normalize_path(from), normalize_path(to));
    let from = components(&from);
    let to = components(&to);
    let common = from
        .iter()
        .zip(&to)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; from.len() - common];
    parts.extend(to[common..].iter().copied());
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

fn components(path: &str) -> Vec<&str> {
    path.split(['/', '\\'])
        .filter(|c| !c.is_empty() && *c != ".")
        .collect()
}

/// Import path from the generated directory of `current` to that of `target`.
///
/// Packages are dotted directory trees. Below a shared prefix the remaining
/// target segments are nested directories; packages with no common prefix
/// live side by side in one directory named after the whole target package
/// joined with `_` (`library.v1` -> `common.v1` is `../../common_v1`).
pub fn build_cross_package_import_path(current: &str, target: &str) -> String {
    let current: Vec<&str> = current.split('.').filter(|s| !s.is_empty()).collect();
    let target: Vec<&str> = target.split('.').filter(|s| !s.is_empty()).collect();
    let common = current
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();

    let rest = &target[common..];
    let leaf = if common == 0 {
        rest.join("_")
    } else {
        rest.join("/")
    };
    let ups = current.len() - common;

    match (ups, leaf.is_empty()) {
        (0, true) => ".".to_string(),
        (0, false) => format!("./{leaf}"),
        (_, true) => vec![".."; ups].join("/"),
        (_, false) => format!("{}/{leaf}", vec![".."; ups].join("/")),
    }
}

/// Import path of `dependency`'s factory module, seen from `current`.
pub fn get_factory_import_path(dependency: &str, current: &str) -> String {
    if dependency == current {
        return "./factory".to_string();
    }
    format!("{}/factory", build_cross_package_import_path(current, dependency))
}

/// Alias for a Go import path (`.../library/v1` -> `libraryv1`).
pub fn get_go_package_alias(import_path: &str) -> String {
    names::to_package_alias(import_path)
}

/// Resolve `.` and `..` and unify separators.
///
/// A path written as `./x` keeps its `./` prefix unless it resolves upwards
/// (`../x`) or to the current directory itself (`.`).
///
/// Each `..` cancels exactly one preceding component, so `./gen/ts/../wasm`
/// is `./gen/wasm`, not `./wasm`.
pub fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    let unified = path.replace('\\', "/");
    let absolute = unified.starts_with('/');
    let explicit_relative = unified.starts_with("./");

    let mut stack: Vec<&str> = Vec::new();
    for component in unified.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                if stack.last().is_some_and(|last| *last != "..") {
                    stack.pop();
                } else if !absolute {
                    stack.push("..");
                }
            }
            other => stack.push(other),
        }
    }

    let joined = stack.join("/");
    if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else if explicit_relative && !joined.starts_with("..") {
        format!("./{joined}")
    } else {
        joined
    }
}

/// Join non-empty components with `/`.
pub fn join_paths<S: AsRef<str>>(parts: &[S]) -> String {
    let parts: Vec<&str> = parts
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| !p.is_empty())
        .collect();

    let mut out = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i == 0 {
            out.push_str(if parts.len() > 1 { part.trim_end_matches('/') } else { part });
        } else {
            let part = part.trim_start_matches('/');
            let part = if i + 1 < parts.len() { part.trim_end_matches('/') } else { part };
            out.push('/');
            out.push_str(part);
        }
    }
    out
}

/// POSIX paths with a leading `/` are absolute everywhere; drive-letter and
/// UNC forms only count on Windows.
pub fn is_absolute_path(path: &str) -> bool {
    if path.starts_with('/') {
        return true;
    }
    if cfg!(windows) {
        if path.starts_with("\\\\") || path.starts_with('\\') {
            return true;
        }
        let bytes = path.as_bytes();
        return bytes.len() >= 3
            && bytes[0].is_ascii_alphabetic()
            && bytes[1] == b':'
            && matches!(bytes[2], b'/' | b'\\');
    }
    false
}
