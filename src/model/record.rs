//! Typed records
//!
//! A [`Record`] is one row of a registered type: a value slot per declared
//! field plus a shared handle to the type's metadata.

use crate::error::ModelError;
use crate::model::field::FieldDescriptor;
use crate::model::metadata::TypeMetadata;
use crate::model::value::{coerce_json, coerce_value, Value};
use crate::model::RawRow;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Field addressed by name or by position in the flattened field list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRef<'a> {
    Name(&'a str),
    Position(usize),
}

impl<'a> From<&'a str> for FieldRef<'a> {
    fn from(name: &'a str) -> Self {
        FieldRef::Name(name)
    }
}

impl<'a> From<&'a String> for FieldRef<'a> {
    fn from(name: &'a String) -> Self {
        FieldRef::Name(name)
    }
}

impl From<usize> for FieldRef<'_> {
    fn from(position: usize) -> Self {
        FieldRef::Position(position)
    }
}

/// One typed row
#[derive(Clone)]
pub struct Record {
    meta: Arc<TypeMetadata>,
    values: Vec<Value>,
}

impl Record {
    /// Blank record, every field null
    pub fn new(meta: &Arc<TypeMetadata>) -> Self {
        Self {
            meta: Arc::clone(meta),
            values: vec![Value::Null; meta.fields().len()],
        }
    }

    /// Ingest a raw row
    ///
    /// Declared fields present in `raw` are coerced to their type. With an
    /// `identifier` override the identifier is force-assigned; without one
    /// the row itself must provide it.
    pub fn from_raw(
        meta: &Arc<TypeMetadata>,
        raw: &RawRow,
        identifier: Option<Value>,
    ) -> Result<Self, ModelError> {
        let mut record = Self::new(meta);
        record.unserialize(raw, identifier)?;
        Ok(record)
    }

    /// New record of the same type, optionally ingesting `raw`
    pub fn clone_with(&self, raw: Option<&RawRow>) -> Result<Self, ModelError> {
        match raw {
            Some(raw) => Self::from_raw(&self.meta, raw, None),
            None => Ok(Self::new(&self.meta)),
        }
    }

    pub fn metadata(&self) -> &Arc<TypeMetadata> {
        &self.meta
    }

    pub fn type_name(&self) -> &str {
        self.meta.type_name()
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        self.meta.fields()
    }

    /// Identifier value; null until populated
    pub fn id(&self) -> &Value {
        &self.values[self.meta.identifier_position()]
    }

    pub fn has_id(&self) -> bool {
        !self.id().is_null()
    }

    /// Names of required fields that are empty
    pub fn validate(&self) -> Vec<String> {
        self.meta
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, field)| field.required)
            .filter(|(position, _)| {
                self.get_raw(*position)
                    .map(|value| value.is_empty())
                    .unwrap_or(true)
            })
            .map(|(_, field)| field.name.clone())
            .collect()
    }

    /// String form of a field
    pub fn get_field(&self, name: &str) -> Result<String, ModelError> {
        self.get_raw(name).map(|value| value.to_text())
    }

    /// Assign a field, coercing to its declared type
    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ModelError> {
        let position = self.writable_position(name)?;
        let field = &self.meta.fields()[position];
        self.values[position] = coerce_value(field, self.meta.nested_model(position), value.into())?;
        Ok(())
    }

    /// Raw field value; computed fields are derived on every call
    pub fn get_raw<'a>(&self, field: impl Into<FieldRef<'a>>) -> Result<Cow<'_, Value>, ModelError> {
        let position = self.resolve(field.into())?;
        match self.meta.fields()[position].calc_fn() {
            Some(calc) => Ok(Cow::Owned(calc(self))),
            None => Ok(Cow::Borrowed(&self.values[position])),
        }
    }

    /// Assign a field verbatim, skipping coercion
    pub fn set_raw(&mut self, name: &str, value: Value) -> Result<(), ModelError> {
        let position = self.writable_position(name)?;
        self.values[position] = value;
        Ok(())
    }

    /// Plain key-value form; computed fields are omitted
    pub fn serialize(&self) -> RawRow {
        self.meta
            .fields()
            .iter()
            .zip(&self.values)
            .filter(|(field, _)| !field.is_computed())
            .map(|(field, value)| (field.name.clone(), value.to_json()))
            .collect()
    }

    /// Re-ingest `raw` into this record
    ///
    /// Fields absent from `raw` keep their values. Nothing is modified when
    /// an error is returned.
    pub fn unserialize(
        &mut self,
        raw: &RawRow,
        identifier: Option<Value>,
    ) -> Result<&mut Self, ModelError> {
        let mut values = self.values.clone();
        for (position, field) in self.meta.fields().iter().enumerate() {
            if field.is_computed() {
                continue;
            }
            if let Some(raw_value) = raw.get(&field.name) {
                values[position] =
                    coerce_json(field, self.meta.nested_model(position), raw_value)?;
            }
        }

        let id_position = self.meta.identifier_position();
        if let Some(identifier) = identifier {
            let field = self.meta.identifier_field();
            values[id_position] =
                coerce_value(field, self.meta.nested_model(id_position), identifier)?;
        }
        if values[id_position].is_null() {
            return Err(ModelError::MissingIdentifier {
                type_name: self.meta.type_name().to_string(),
            });
        }

        self.values = values;
        Ok(self)
    }

    fn resolve(&self, field: FieldRef<'_>) -> Result<usize, ModelError> {
        match field {
            FieldRef::Name(name) => self
                .meta
                .position(name)
                .ok_or_else(|| self.meta.unknown_field(name)),
            FieldRef::Position(position) if position < self.values.len() => Ok(position),
            FieldRef::Position(index) => Err(ModelError::FieldIndexOutOfRange {
                type_name: self.meta.type_name().to_string(),
                index,
            }),
        }
    }

    fn writable_position(&self, name: &str) -> Result<usize, ModelError> {
        let position = self.resolve(FieldRef::Name(name))?;
        if self.meta.fields()[position].is_computed() {
            return Err(ModelError::ComputedField {
                type_name: self.meta.type_name().to_string(),
                field: name.to_string(),
            });
        }
        Ok(position)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.type_name() == other.type_name() && self.values == other.values
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(self.type_name());
        for (field, value) in self.meta.fields().iter().zip(&self.values) {
            if !field.is_computed() {
                out.field(&field.name, value);
            }
        }
        out.finish()
    }
}
