//! Field descriptors

use crate::model::record::Record;
use crate::model::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Function deriving a computed field from its owning record
pub type CalcFn = Arc<dyn Fn(&Record) -> Value + Send + Sync>;

/// Scalar type of a field, drives coercion on ingest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int,
    Float,
    Date,
    Bool,
    Array,
    Object,
    Any,
    Calc,
}

/// Metadata describing one field of a record type
#[derive(Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldType,
    /// Decimal places kept for float fields
    pub precision: Option<u32>,
    pub required: bool,
    /// Name of the registered type array elements are materialized as
    pub nested_model: Option<String>,
    identifier: bool,
    calc: Option<CalcFn>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldType) -> Self {
        Self {
            name: name.into(),
            kind,
            precision: None,
            required: false,
            nested_model: None,
            identifier: false,
            calc: None,
        }
    }

    /// Computed field, re-derived from the record on every read
    pub fn calc<F>(name: impl Into<String>, calc: F) -> Self
    where
        F: Fn(&Record) -> Value + Send + Sync + 'static,
    {
        Self {
            calc: Some(Arc::new(calc)),
            ..Self::new(name, FieldType::Calc)
        }
    }

    /// Designate this field as the type's identifier
    pub fn identifier(mut self) -> Self {
        self.identifier = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn precision(mut self, digits: u32) -> Self {
        self.precision = Some(digits);
        self
    }

    /// Array elements are ingested as records of `model`
    pub fn nested(mut self, model: impl Into<String>) -> Self {
        self.nested_model = Some(model.into());
        self
    }

    pub fn is_identifier(&self) -> bool {
        self.identifier
    }

    pub fn is_computed(&self) -> bool {
        self.calc.is_some()
    }

    pub(crate) fn calc_fn(&self) -> Option<&CalcFn> {
        self.calc.as_ref()
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("precision", &self.precision)
            .field("required", &self.required)
            .field("nested_model", &self.nested_model)
            .field("identifier", &self.identifier)
            .field("computed", &self.is_computed())
            .finish()
    }
}
