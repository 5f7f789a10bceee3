//! Type metadata
//!
//! A [`TypeDef`] is what callers declare; a [`TypeMetadata`] is the flattened,
//! resolved form records and stores run against. Flattening happens once, at
//! registration, so every lookup afterwards is a map or slice access.

use crate::error::ModelError;
use crate::model::field::FieldDescriptor;
use std::collections::HashMap;
use std::sync::Arc;

/// Declaration of a record type
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub name: String,
    pub parent: Option<String>,
    pub fields: Vec<FieldDescriptor>,
}

impl TypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
        }
    }

    /// Inherit fields and identifier from a registered type
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }
}

/// Flattened field list of one concrete type
#[derive(Debug)]
pub struct TypeMetadata {
    type_name: String,
    identifier: usize,
    fields: Vec<FieldDescriptor>,
    positions: HashMap<String, usize>,
    nested: HashMap<usize, Arc<TypeMetadata>>,
}

impl TypeMetadata {
    /// Build metadata from an already-flattened field list
    ///
    /// `resolve` maps nested model names to their registered metadata.
    pub(crate) fn compose<R>(
        type_name: String,
        fields: Vec<FieldDescriptor>,
        resolve: R,
    ) -> Result<Self, ModelError>
    where
        R: Fn(&str) -> Option<Arc<TypeMetadata>>,
    {
        let mut positions = HashMap::with_capacity(fields.len());
        let mut identifier = None;
        let mut nested = HashMap::new();

        for (position, field) in fields.iter().enumerate() {
            if positions.insert(field.name.clone(), position).is_some() {
                return Err(ModelError::DuplicateField {
                    type_name,
                    field: field.name.clone(),
                });
            }
            if field.is_identifier() {
                if identifier.is_some() {
                    return Err(ModelError::DuplicateIdentifier { type_name });
                }
                if field.is_computed() {
                    return Err(ModelError::ComputedField {
                        type_name,
                        field: field.name.clone(),
                    });
                }
                identifier = Some(position);
            }
            if let Some(model) = &field.nested_model {
                let resolved = resolve(model.as_str()).ok_or_else(|| ModelError::UnknownNestedModel {
                    type_name: type_name.clone(),
                    field: field.name.clone(),
                    model: model.clone(),
                })?;
                nested.insert(position, resolved);
            }
        }

        let identifier = identifier.ok_or_else(|| ModelError::NoIdentifierField {
            type_name: type_name.clone(),
        })?;

        Ok(Self {
            type_name,
            identifier,
            fields,
            positions,
            nested,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.position(name).map(|position| &self.fields[position])
    }

    /// Position of a field in the flattened list
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn identifier_position(&self) -> usize {
        self.identifier
    }

    pub fn identifier_field(&self) -> &FieldDescriptor {
        &self.fields[self.identifier]
    }

    pub fn identifier_name(&self) -> &str {
        &self.identifier_field().name
    }

    /// Nested model of the array field at `position`
    pub fn nested_model(&self, position: usize) -> Option<&Arc<TypeMetadata>> {
        self.nested.get(&position)
    }

    pub(crate) fn unknown_field(&self, field: &str) -> ModelError {
        ModelError::UnknownField {
            type_name: self.type_name.clone(),
            field: field.to_string(),
        }
    }
}
