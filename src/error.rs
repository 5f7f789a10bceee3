//! Error types
//!
//! Each layer owns one error enum. Model errors signal programming or schema
//! defects, store errors cover rejected mutations and loading, proxy errors
//! cover the row sources.

use thiserror::Error;

/// Record model and type registration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Type not registered: {0}")]
    UnregisteredType(String),

    #[error("Type already registered: {0}")]
    DuplicateType(String),

    #[error("Type {type_name} extends unknown type {parent}")]
    UnknownParent { type_name: String, parent: String },

    #[error("Field {field} of {type_name} references unknown nested model {model}")]
    UnknownNestedModel {
        type_name: String,
        field: String,
        model: String,
    },

    #[error("Field {field} declared more than once in {type_name}")]
    DuplicateField { type_name: String, field: String },

    #[error("Type {type_name} declares more than one identifier field")]
    DuplicateIdentifier { type_name: String },

    #[error("Type {type_name} cannot redeclare inherited identifier {inherited}")]
    IdentifierRedeclared { type_name: String, inherited: String },

    #[error("Type {type_name} has no identifier field")]
    NoIdentifierField { type_name: String },

    #[error("Unknown field {field} on {type_name}")]
    UnknownField { type_name: String, field: String },

    #[error("Field index {index} out of range for {type_name}")]
    FieldIndexOutOfRange { type_name: String, index: usize },

    #[error("Computed field {field} on {type_name} is not writable")]
    ComputedField { type_name: String, field: String },

    #[error("Record of {type_name} has no identifier value")]
    MissingIdentifier { type_name: String },

    #[error("Cannot infer fields for {type_name}: {reason}")]
    Inference { type_name: String, reason: String },
}

/// Row source errors
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unexpected document shape: {0}")]
    Shape(String),
}

/// Data store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Cannot append a {type_name} record without an identifier")]
    MissingIdentifier { type_name: String },

    #[error("Identifier {0} already present in store")]
    DuplicateIdentifier(String),

    #[error("Store holds {expected} records, got {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Store has no source to reload from")]
    NoSource,

    #[error("Unknown comparison operator: {0}")]
    UnknownOperator(String),

    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

/// Configuration and logging setup errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Load(#[from] config::ConfigError),
}
