//! Filter criteria
//!
//! A filter turns the store's records into a position array in storage
//! order. Unknown fields fail closed: the condition matches nothing.

use crate::error::StoreError;
use crate::model::{Record, TypeMetadata};
use regex::Regex;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

/// Record predicate used by [`Filter::Predicate`]
pub type PredicateFn = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// Comparison applied to a field's string form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
    Ne,
}

impl CompareOp {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ge => ordering != Ordering::Less,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ne => ordering != Ordering::Equal,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Eq => "=",
            CompareOp::Ge => ">=",
            CompareOp::Gt => ">",
            CompareOp::Ne => "<>",
        }
    }
}

impl FromStr for CompareOp {
    type Err = StoreError;

    fn from_str(op: &str) -> Result<Self, Self::Err> {
        match op.trim() {
            "<" => Ok(CompareOp::Lt),
            "<=" => Ok(CompareOp::Le),
            "=" | "==" => Ok(CompareOp::Eq),
            ">=" => Ok(CompareOp::Ge),
            ">" => Ok(CompareOp::Gt),
            "<>" | "!=" => Ok(CompareOp::Ne),
            other => Err(StoreError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of a field condition
#[derive(Debug, Clone)]
pub enum Pattern {
    Text(String),
    /// Matched against the field's string form; the operator is ignored
    Regex(Regex),
}

/// `field op value` condition
#[derive(Debug, Clone)]
pub struct Condition {
    pub field: String,
    pub op: CompareOp,
    pub value: Pattern,
    pub case_sensitive: bool,
}

impl Condition {
    fn matches(&self, text: &str) -> bool {
        match &self.value {
            Pattern::Regex(regex) => regex.is_match(text),
            Pattern::Text(expected) => {
                let (left, right) = if self.case_sensitive {
                    (Cow::Borrowed(text), Cow::Borrowed(expected.as_str()))
                } else {
                    (
                        Cow::Owned(text.to_uppercase()),
                        Cow::Owned(expected.to_uppercase()),
                    )
                };
                self.op.accepts(left.cmp(&right))
            }
        }
    }
}

/// Selection criteria for `create_index`
#[derive(Clone)]
pub enum Filter {
    /// Matches nothing
    EmptyResult,
    Predicate(PredicateFn),
    Compare(Condition),
    /// Intersection; an empty list matches everything
    All(Vec<Filter>),
    /// Union; an empty list matches nothing
    Any(Vec<Filter>),
}

impl Filter {
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        Filter::Predicate(Arc::new(predicate))
    }

    /// Case-insensitive comparison against `value`
    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<String>) -> Self {
        Filter::Compare(Condition {
            field: field.into(),
            op,
            value: Pattern::Text(value.into()),
            case_sensitive: false,
        })
    }

    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    /// Regular-expression match on the field's string form
    pub fn matches(field: impl Into<String>, regex: Regex) -> Self {
        Filter::Compare(Condition {
            field: field.into(),
            op: CompareOp::Eq,
            value: Pattern::Regex(regex),
            case_sensitive: true,
        })
    }

    /// Set case sensitivity of a field condition; other filters are unchanged
    pub fn case_sensitive(self, case_sensitive: bool) -> Self {
        match self {
            Filter::Compare(condition) => Filter::Compare(Condition {
                case_sensitive,
                ..condition
            }),
            other => other,
        }
    }

    /// Positions of matching records, in storage order
    pub(crate) fn select(&self, records: &[Record], meta: Option<&TypeMetadata>) -> Vec<u32> {
        self.mask(records, meta)
            .into_iter()
            .enumerate()
            .filter(|(_, keep)| *keep)
            .map(|(position, _)| position as u32)
            .collect()
    }

    fn mask(&self, records: &[Record], meta: Option<&TypeMetadata>) -> Vec<bool> {
        match self {
            Filter::EmptyResult => vec![false; records.len()],
            Filter::Predicate(predicate) => records.iter().map(|r| predicate(r)).collect(),
            Filter::Compare(condition) => {
                let Some(position) = meta.and_then(|meta| meta.position(&condition.field)) else {
                    if !records.is_empty() {
                        warn!(field = %condition.field, "Unknown filter field, matching nothing");
                    }
                    return vec![false; records.len()];
                };
                records
                    .iter()
                    .map(|record| {
                        record
                            .get_raw(position)
                            .map(|value| condition.matches(&value.to_text()))
                            .unwrap_or(false)
                    })
                    .collect()
            }
            Filter::All(children) => children.iter().fold(vec![true; records.len()], |acc, child| {
                acc.into_iter()
                    .zip(child.mask(records, meta))
                    .map(|(left, right)| left && right)
                    .collect()
            }),
            Filter::Any(children) => children.iter().fold(vec![false; records.len()], |acc, child| {
                acc.into_iter()
                    .zip(child.mask(records, meta))
                    .map(|(left, right)| left || right)
                    .collect()
            }),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::EmptyResult => f.write_str("EmptyResult"),
            Filter::Predicate(_) => f.write_str("Predicate(..)"),
            Filter::Compare(condition) => f.debug_tuple("Compare").field(condition).finish(),
            Filter::All(children) => f.debug_tuple("All").field(children).finish(),
            Filter::Any(children) => f.debug_tuple("Any").field(children).finish(),
        }
    }
}
