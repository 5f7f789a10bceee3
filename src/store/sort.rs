//! Sort criteria
//!
//! Sorting reorders a position array; records never move.

use crate::model::{Record, TypeMetadata, Value};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;
use tracing::warn;

/// One sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default = "default_ascending")]
    pub ascending: bool,
}

fn default_ascending() -> bool {
    true
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: true,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: false,
        }
    }

    /// Parse `name`, `-name`, `name asc` or `name desc`
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        if let Some(field) = spec.strip_prefix('-') {
            return Self::desc(field.trim());
        }
        match spec.rsplit_once(char::is_whitespace) {
            Some((field, dir)) if dir.eq_ignore_ascii_case("desc") => Self::desc(field.trim()),
            Some((field, dir)) if dir.eq_ignore_ascii_case("asc") => Self::asc(field.trim()),
            _ => Self::asc(spec),
        }
    }

    /// Parse a comma-separated list, e.g. `"last, first desc"`
    pub fn parse_list(specs: &str) -> Vec<Self> {
        specs
            .split(',')
            .filter(|spec| !spec.trim().is_empty())
            .map(Self::parse)
            .collect()
    }
}

impl From<&str> for SortSpec {
    fn from(spec: &str) -> Self {
        Self::parse(spec)
    }
}

/// Reorder `index` by `specs`
///
/// No specs (or an empty list) means identifier ascending. If any field is
/// unknown the whole sort is skipped and `index` comes back unchanged.
pub(crate) fn sort_positions(
    records: &[Record],
    meta: Option<&TypeMetadata>,
    index: &[u32],
    specs: Option<&[SortSpec]>,
) -> Vec<u32> {
    let Some(meta) = meta else {
        return index.to_vec();
    };

    let default_spec;
    let specs = match specs {
        Some(specs) if !specs.is_empty() => specs,
        _ => {
            default_spec = [SortSpec::asc(meta.identifier_name())];
            &default_spec[..]
        }
    };

    let mut positions = Vec::with_capacity(specs.len());
    for spec in specs {
        match meta.position(&spec.field) {
            Some(position) => positions.push(position),
            None => {
                warn!(field = %spec.field, "Unknown sort field, leaving order unchanged");
                return index.to_vec();
            }
        }
    }

    let key = |record: &Record, position: usize| -> Value {
        record
            .get_raw(position)
            .map(Cow::into_owned)
            .unwrap_or_default()
    };

    if let [position] = positions.as_slice() {
        let position = *position;
        let mut keyed: Vec<(u32, Value)> = index
            .iter()
            .filter_map(|&at| records.get(at as usize).map(|record| (at, key(record, position))))
            .collect();
        // position tie-break keeps the reversal deterministic
        keyed.sort_by(|a, b| a.1.compare(&b.1).then(a.0.cmp(&b.0)));
        let mut sorted: Vec<u32> = keyed.into_iter().map(|(at, _)| at).collect();
        if !specs[0].ascending {
            sorted.reverse();
        }
        return sorted;
    }

    let directions: Vec<bool> = specs.iter().map(|spec| spec.ascending).collect();
    let mut keyed: Vec<(u32, Vec<Value>)> = index
        .iter()
        .filter_map(|&at| {
            records.get(at as usize).map(|record| {
                (
                    at,
                    positions
                        .iter()
                        .map(|&position| key(record, position))
                        .collect(),
                )
            })
        })
        .collect();
    keyed.sort_by(|a, b| {
        for (slot, ascending) in directions.iter().enumerate() {
            let ordering = a.1[slot].compare(&b.1[slot]);
            if ordering != Ordering::Equal {
                return if *ascending { ordering } else { ordering.reverse() };
            }
        }
        Ordering::Equal
    });
    keyed.into_iter().map(|(at, _)| at).collect()
}
