//! Record Model
//!
//! Typed rows and the metadata that describes them. Types are declared as
//! [`TypeDef`]s, flattened by a [`ModelRegistry`] into [`TypeMetadata`], and
//! instantiated as [`Record`]s by ingesting raw key-value rows.

pub mod auto;
pub mod field;
pub mod metadata;
pub mod record;
pub mod registry;
pub mod value;

pub use auto::AutoRecord;
pub use field::{CalcFn, FieldDescriptor, FieldType};
pub use metadata::{TypeDef, TypeMetadata};
pub use record::{FieldRef, Record};
pub use registry::ModelRegistry;
pub use value::Value;

/// Plain key-value row as produced by loaders and `Record::serialize`
pub type RawRow = serde_json::Map<String, serde_json::Value>;
