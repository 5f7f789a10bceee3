//! Integration tests for the datastore record store and views

mod model_inheritance;
mod proxy_load;
mod store_properties;
mod view_reactivity;

use datastore::{FieldDescriptor, FieldType, ModelRegistry, RawRow, TypeDef, TypeMetadata};
use std::sync::Arc;

pub(crate) fn row(value: serde_json::Value) -> RawRow {
    value.as_object().cloned().unwrap()
}

/// `Item { id: int (identifier), name: string, qty: int }`
pub(crate) fn item_model() -> Arc<TypeMetadata> {
    let mut registry = ModelRegistry::new();
    registry
        .register(
            TypeDef::new("Item")
                .field(FieldDescriptor::new("id", FieldType::Int).identifier())
                .field(FieldDescriptor::new("name", FieldType::String))
                .field(FieldDescriptor::new("qty", FieldType::Int)),
        )
        .unwrap()
}
