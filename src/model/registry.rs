//! Model registry
//!
//! Owns the flattened metadata of every registered record type. Each store
//! and test builds its own registry; nothing here is process-global.

use crate::error::ModelError;
use crate::model::metadata::{TypeDef, TypeMetadata};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Registry of record types keyed by type name
#[derive(Debug, Default)]
pub struct ModelRegistry {
    types: HashMap<String, Arc<TypeMetadata>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type, flattening it onto its parent chain
    ///
    /// Child metadata is the parent's fields followed by the child's own. The
    /// identifier is inherited; a child may not declare another one.
    pub fn register(&mut self, def: TypeDef) -> Result<Arc<TypeMetadata>, ModelError> {
        if self.types.contains_key(&def.name) {
            return Err(ModelError::DuplicateType(def.name));
        }

        let (mut fields, inherited) = match &def.parent {
            Some(parent) => {
                let parent_meta =
                    self.types
                        .get(parent)
                        .ok_or_else(|| ModelError::UnknownParent {
                            type_name: def.name.clone(),
                            parent: parent.clone(),
                        })?;
                (
                    parent_meta.fields().to_vec(),
                    Some(parent_meta.identifier_name().to_string()),
                )
            }
            None => (Vec::new(), None),
        };

        let own_identifiers = def.fields.iter().filter(|f| f.is_identifier()).count();
        if own_identifiers > 1 {
            return Err(ModelError::DuplicateIdentifier {
                type_name: def.name,
            });
        }
        if let (Some(inherited), true) = (inherited, own_identifiers == 1) {
            return Err(ModelError::IdentifierRedeclared {
                type_name: def.name,
                inherited,
            });
        }

        fields.extend(def.fields);
        let metadata = Arc::new(TypeMetadata::compose(def.name.clone(), fields, |model| {
            self.types.get(model).cloned()
        })?);

        debug!(
            type_name = %def.name,
            parent = ?def.parent,
            fields = metadata.fields().len(),
            "Registered record type"
        );
        self.types.insert(def.name, Arc::clone(&metadata));
        Ok(metadata)
    }

    /// Metadata for a registered type
    pub fn get(&self, type_name: &str) -> Result<Arc<TypeMetadata>, ModelError> {
        self.types
            .get(type_name)
            .cloned()
            .ok_or_else(|| ModelError::UnregisteredType(type_name.to_string()))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
