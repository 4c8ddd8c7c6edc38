//! Error taxonomy.
//!
//! - [`ConfigError`]: bad configuration, detected before any filtering runs.
//! - [`DescriptorError`]: the descriptor document could not be decoded.
//! - [`ResolveError`]: a type could not be constructed through the factory chain.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid method pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("malformed method rename `{entry}`: {reason}")]
    MalformedRename { entry: String, reason: &'static str },

    #[error("unknown plugin parameter `{0}`")]
    UnknownParameter(String),

    #[error("invalid value `{value}` for parameter `{key}`")]
    InvalidValue { key: String, value: String },

    #[error("plugin parameter entry `{0}` has no key")]
    MissingKey(String),

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("failed to parse descriptor set JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no factory method `{method}` for type `{type_name}` in package `{package}`")]
    UnknownType {
        type_name: String,
        package: String,
        method: String,
    },

    #[error("type `{type_name}` belongs to package `{package}`, which is not a factory dependency")]
    UnknownPackage { type_name: String, package: String },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
