//! Schema-less records
//!
//! `AutoRecord` derives a type from the keys of the first object it sees.

use crate::error::ModelError;
use crate::model::field::{FieldDescriptor, FieldType};
use crate::model::metadata::TypeMetadata;
use crate::model::record::Record;
use crate::model::RawRow;
use std::sync::Arc;

const DEFAULT_IDENTIFIER: &str = "id";

/// Record type inferred from sample data
pub struct AutoRecord;

impl AutoRecord {
    /// Infer metadata from one raw object
    ///
    /// Every key becomes an `any` field, in key order. The identifier is
    /// `identifier` if given, else `id` when present, else the first key.
    pub fn infer(
        type_name: &str,
        raw: &RawRow,
        identifier: Option<&str>,
    ) -> Result<Arc<TypeMetadata>, ModelError> {
        let identifier = match identifier {
            Some(name) if raw.contains_key(name) => name.to_string(),
            Some(name) => {
                return Err(ModelError::Inference {
                    type_name: type_name.to_string(),
                    reason: format!("identifier {} not present in sample row", name),
                })
            }
            None if raw.contains_key(DEFAULT_IDENTIFIER) => DEFAULT_IDENTIFIER.to_string(),
            None => raw
                .keys()
                .next()
                .cloned()
                .ok_or_else(|| ModelError::Inference {
                    type_name: type_name.to_string(),
                    reason: "sample row has no fields".to_string(),
                })?,
        };

        let fields = raw
            .keys()
            .map(|key| {
                let field = FieldDescriptor::new(key.clone(), FieldType::Any);
                if *key == identifier {
                    field.identifier()
                } else {
                    field
                }
            })
            .collect();

        TypeMetadata::compose(type_name.to_string(), fields, |_| None).map(Arc::new)
    }

    /// Infer a type from `raw` and ingest it in one step
    pub fn from_raw(
        type_name: &str,
        raw: &RawRow,
        identifier: Option<&str>,
    ) -> Result<Record, ModelError> {
        let meta = Self::infer(type_name, raw, identifier)?;
        Record::from_raw(&meta, raw, None)
    }
}
