//! Field values and ingest coercion
//!
//! Raw rows arrive as JSON; every declared field is coerced to its
//! [`FieldType`] on the way in. Comparison and stringification here back the
//! store's filter and sort algorithms.

use crate::error::ModelError;
use crate::model::field::{FieldDescriptor, FieldType};
use crate::model::metadata::TypeMetadata;
use crate::model::record::Record;
use crate::model::RawRow;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::Value as JsonValue;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y"];

/// Value held by one record field
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(DateTime<Utc>),
    /// Nested records, always instances of the field's nested model
    Array(Vec<Record>),
    Object(RawRow),
    /// Untyped JSON, used by `any` fields and model-less arrays
    Any(JsonValue),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null | Value::Any(JsonValue::Null))
    }

    /// Empty in the sense of a required-field check
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(text) => text.trim().is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Any(JsonValue::Null) => true,
            Value::Any(JsonValue::String(text)) => text.trim().is_empty(),
            Value::Any(JsonValue::Array(items)) => items.is_empty(),
            _ => false,
        }
    }

    /// String form used by filters; null renders as the empty string
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(flag) => flag.to_string(),
            Value::Int(number) => number.to_string(),
            Value::Float(number) => number.to_string(),
            Value::Text(text) => text.clone(),
            Value::Date(date) => date.to_rfc3339_opts(SecondsFormat::Millis, true),
            Value::Any(JsonValue::Null) => String::new(),
            Value::Any(JsonValue::String(text)) => text.clone(),
            other => other.to_json().to_string(),
        }
    }

    /// Natural ordering for sorting and identifier lookup
    ///
    /// A total order: values rank by class first (null, bool, number, text,
    /// date, structured), then compare within the class. Numbers compare
    /// numerically across int/float; structured values compare string forms.
    /// Untyped JSON scalars rank with their typed counterparts.
    pub fn compare(&self, other: &Self) -> Ordering {
        let (left, right) = (self.as_scalar(), other.as_scalar());
        left.rank()
            .cmp(&right.rank())
            .then_with(|| match (&*left, &*right) {
                (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
                (Value::Text(a), Value::Text(b)) => a.cmp(b),
                (Value::Date(a), Value::Date(b)) => a.cmp(b),
                (a, b) => match (a.numeric_key(), b.numeric_key()) {
                    (Some((a_float, a_int)), Some((b_float, b_int))) => {
                        a_float.total_cmp(&b_float).then(a_int.cmp(&b_int))
                    }
                    _ => a.to_text().cmp(&b.to_text()),
                },
            })
    }

    fn as_scalar(&self) -> Cow<'_, Value> {
        match self {
            Value::Any(json) if !json.is_array() && !json.is_object() => {
                Cow::Owned(Value::from_json(json))
            }
            _ => Cow::Borrowed(self),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::Text(_) => 3,
            Value::Date(_) => 4,
            Value::Array(_) | Value::Object(_) | Value::Any(_) => 5,
        }
    }

    /// Float magnitude plus an integer tie-break, so ints beyond f64
    /// precision stay distinct while `Int(2)` still equals `Float(2.0)`
    fn numeric_key(&self) -> Option<(f64, i64)> {
        match self {
            Value::Int(number) => Some((*number as f64, *number)),
            Value::Float(number) => Some((*number, *number as i64)),
            _ => None,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(flag) => JsonValue::Bool(*flag),
            Value::Int(number) => JsonValue::from(*number),
            Value::Float(number) => serde_json::Number::from_f64(*number)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Text(text) => JsonValue::String(text.clone()),
            Value::Date(date) => {
                JsonValue::String(date.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Value::Array(records) => JsonValue::Array(
                records
                    .iter()
                    .map(|record| JsonValue::Object(record.serialize()))
                    .collect(),
            ),
            Value::Object(map) => JsonValue::Object(map.clone()),
            Value::Any(json) => json.clone(),
        }
    }

    /// Untyped conversion: scalars map to scalars, containers stay JSON
    pub fn from_json(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(flag) => Value::Bool(*flag),
            JsonValue::Number(number) => match number.as_i64() {
                Some(int) => Value::Int(int),
                None => number.as_f64().map_or(Value::Null, Value::Float),
            },
            JsonValue::String(text) => Value::Text(text.clone()),
            other => Value::Any(other.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Date(value)
    }
}

impl From<Vec<Record>> for Value {
    fn from(value: Vec<Record>) -> Self {
        Value::Array(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Coerce a raw JSON value to the field's declared type
pub(crate) fn coerce_json(
    field: &FieldDescriptor,
    nested: Option<&Arc<TypeMetadata>>,
    raw: &JsonValue,
) -> Result<Value, ModelError> {
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let value = match field.kind {
        FieldType::String => match raw {
            JsonValue::String(text) => Value::Text(text.clone()),
            JsonValue::Number(number) => Value::Text(number.to_string()),
            JsonValue::Bool(flag) => Value::Text(flag.to_string()),
            other => Value::Text(other.to_string()),
        },
        FieldType::Int => coerce_int(raw).map_or(Value::Null, Value::Int),
        FieldType::Float => coerce_float(raw)
            .map_or(Value::Null, |number| Value::Float(round_to(number, field.precision))),
        FieldType::Date => coerce_date(raw).map_or(Value::Null, Value::Date),
        FieldType::Bool => coerce_bool(raw).map_or(Value::Null, Value::Bool),
        FieldType::Array => match (raw, nested) {
            (JsonValue::Array(items), Some(model)) => Value::Array(
                items
                    .iter()
                    .map(|item| ingest_nested(model, item))
                    .collect::<Result<_, _>>()?,
            ),
            (JsonValue::Array(_), None) => Value::Any(raw.clone()),
            _ => Value::Null,
        },
        FieldType::Object => match raw {
            JsonValue::Object(map) => Value::Object(map.clone()),
            _ => Value::Null,
        },
        FieldType::Any => Value::from_json(raw),
        FieldType::Calc => Value::Null,
    };
    Ok(value)
}

/// Coerce an already-typed value, going through JSON only on a type mismatch
pub(crate) fn coerce_value(
    field: &FieldDescriptor,
    nested: Option<&Arc<TypeMetadata>>,
    value: Value,
) -> Result<Value, ModelError> {
    match (field.kind, value) {
        (_, Value::Null) => Ok(Value::Null),
        (FieldType::String, Value::Text(text)) => Ok(Value::Text(text)),
        (FieldType::Int, Value::Int(number)) => Ok(Value::Int(number)),
        (FieldType::Float, Value::Float(number)) => {
            Ok(Value::Float(round_to(number, field.precision)))
        }
        (FieldType::Float, Value::Int(number)) => {
            Ok(Value::Float(round_to(number as f64, field.precision)))
        }
        (FieldType::Date, Value::Date(date)) => Ok(Value::Date(date)),
        (FieldType::Bool, Value::Bool(flag)) => Ok(Value::Bool(flag)),
        (FieldType::Array, Value::Array(records))
            if nested.is_some_and(|model| {
                records
                    .iter()
                    .all(|record| record.type_name() == model.type_name())
            }) =>
        {
            Ok(Value::Array(records))
        }
        (FieldType::Object, Value::Object(map)) => Ok(Value::Object(map)),
        (FieldType::Any, value) => Ok(value),
        (_, other) => coerce_json(field, nested, &other.to_json()),
    }
}

fn ingest_nested(model: &Arc<TypeMetadata>, item: &JsonValue) -> Result<Record, ModelError> {
    match item {
        JsonValue::Object(row) => Record::from_raw(model, row, None),
        _ => Err(ModelError::MissingIdentifier {
            type_name: model.type_name().to_string(),
        }),
    }
}

fn round_to(number: f64, precision: Option<u32>) -> f64 {
    match precision {
        Some(digits) => {
            let factor = 10f64.powi(digits as i32);
            (number * factor).round() / factor
        }
        None => number,
    }
}

fn coerce_int(raw: &JsonValue) -> Option<i64> {
    match raw {
        JsonValue::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.trunc() as i64)),
        JsonValue::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| {
                    text.parse::<f64>()
                        .ok()
                        .filter(|float| float.is_finite())
                        .map(|float| float.trunc() as i64)
                })
                .or_else(|| leading_int(text))
        }
        JsonValue::Bool(flag) => Some(i64::from(*flag)),
        _ => None,
    }
}

fn leading_int(text: &str) -> Option<i64> {
    let end = text
        .char_indices()
        .take_while(|(at, c)| c.is_ascii_digit() || (*at == 0 && (*c == '-' || *c == '+')))
        .map(|(at, c)| at + c.len_utf8())
        .last()?;
    text[..end].parse().ok()
}

fn coerce_float(raw: &JsonValue) -> Option<f64> {
    match raw {
        JsonValue::Number(number) => number.as_f64(),
        JsonValue::String(text) => text.trim().parse::<f64>().ok(),
        JsonValue::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn coerce_bool(raw: &JsonValue) -> Option<bool> {
    match raw {
        JsonValue::Bool(flag) => Some(*flag),
        JsonValue::Number(number) => number.as_f64().map(|float| float != 0.0),
        JsonValue::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn coerce_date(raw: &JsonValue) -> Option<DateTime<Utc>> {
    match raw {
        JsonValue::Number(number) => number
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        JsonValue::String(text) => parse_date(text.trim()),
        _ => None,
    }
}

/// Parse an ISO 8601 / RFC 3339 timestamp or a common date-only form
pub(crate) fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for format in DATE_FORMATS {
        if let Ok(day) = NaiveDate::parse_from_str(text, format) {
            return day
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));
        }
    }
    None
}
