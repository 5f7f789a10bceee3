//! Store internals: records, identifier index and the bound model.

use crate::error::StoreError;
use crate::model::{AutoRecord, Record, TypeMetadata, Value};
use crate::store::filter::Filter;
use crate::store::sort::{sort_positions, SortSpec};
use crate::store::Row;
use std::cmp::Ordering;
use std::sync::Arc;

/// Positions of `records` sorted by identifier
fn identifier_index(records: &[Record]) -> Vec<u32> {
    let mut index: Vec<u32> = (0..records.len() as u32).collect();
    index.sort_by(|&a, &b| records[a as usize].id().compare(records[b as usize].id()));
    index
}

/// Record type a store is bound to
#[derive(Clone)]
pub(crate) enum StoreModel {
    Typed(Arc<TypeMetadata>),
    /// Inferred from the first row ingested
    Auto {
        type_name: String,
        identifier: Option<String>,
        meta: Option<Arc<TypeMetadata>>,
    },
}

impl StoreModel {
    pub(crate) fn metadata(&self) -> Option<&Arc<TypeMetadata>> {
        match self {
            StoreModel::Typed(meta) => Some(meta),
            StoreModel::Auto { meta, .. } => meta.as_ref(),
        }
    }

    pub(crate) fn type_name(&self) -> &str {
        match self {
            StoreModel::Typed(meta) => meta.type_name(),
            StoreModel::Auto { type_name, .. } => type_name,
        }
    }

    /// Turn an input row into a record of this model
    fn materialize(&mut self, row: Row) -> Result<Record, StoreError> {
        match row {
            Row::Record(record) => match self.metadata() {
                Some(meta) if meta.type_name() == record.type_name() => Ok(record),
                Some(meta) => Ok(Record::from_raw(meta, &record.serialize(), None)?),
                None => {
                    self.adopt(Arc::clone(record.metadata()));
                    Ok(record)
                }
            },
            Row::Raw(raw) => {
                let meta = match self {
                    StoreModel::Typed(meta) => Arc::clone(meta),
                    StoreModel::Auto {
                        meta: Some(meta), ..
                    } => Arc::clone(meta),
                    StoreModel::Auto {
                        type_name,
                        identifier,
                        meta,
                    } => {
                        let inferred = AutoRecord::infer(type_name, &raw, identifier.as_deref())?;
                        *meta = Some(Arc::clone(&inferred));
                        inferred
                    }
                };
                Ok(Record::from_raw(&meta, &raw, None)?)
            }
        }
    }

    fn adopt(&mut self, adopted: Arc<TypeMetadata>) {
        if let StoreModel::Auto { meta, .. } = self {
            *meta = Some(adopted);
        }
    }

    fn check(&self, record: &Record) -> Result<(), StoreError> {
        match self.metadata() {
            Some(meta) if meta.type_name() != record.type_name() => Err(StoreError::TypeMismatch {
                expected: meta.type_name().to_string(),
                found: record.type_name().to_string(),
            }),
            _ => Ok(()),
        }
    }
}

/// Records plus a permutation of their positions sorted by identifier
pub(crate) struct StoreState {
    pub(crate) model: StoreModel,
    pub(crate) records: Vec<Record>,
    pub(crate) index: Vec<u32>,
}

impl StoreState {
    pub(crate) fn new(model: StoreModel) -> Self {
        Self {
            model,
            records: Vec::new(),
            index: Vec::new(),
        }
    }

    pub(crate) fn metadata(&self) -> Option<&TypeMetadata> {
        self.model.metadata().map(Arc::as_ref)
    }

    /// Materialize all rows, then swap them in; nothing changes on error
    pub(crate) fn replace(&mut self, rows: Vec<Row>) -> Result<usize, StoreError> {
        let mut model = self.model.clone();
        let records = rows
            .into_iter()
            .map(|row| model.materialize(row))
            .collect::<Result<Vec<_>, _>>()?;
        let index = identifier_index(&records);
        self.model = model;
        self.records = records;
        self.index = index;
        Ok(self.records.len())
    }

    pub(crate) fn replace_records(&mut self, records: Vec<Record>) -> Result<usize, StoreError> {
        let mut model = self.model.clone();
        for record in &records {
            if model.metadata().is_none() {
                model.adopt(Arc::clone(record.metadata()));
            }
            model.check(record)?;
        }
        let index = identifier_index(&records);
        self.model = model;
        self.records = records;
        self.index = index;
        Ok(self.records.len())
    }

    pub(crate) fn append(&mut self, record: Record) -> Result<Value, StoreError> {
        self.model.check(&record)?;
        if !record.has_id() {
            return Err(StoreError::MissingIdentifier {
                type_name: record.type_name().to_string(),
            });
        }
        let position = match self.search(record.id()) {
            Ok(_) => return Err(StoreError::DuplicateIdentifier(record.id().to_text())),
            Err(position) => position,
        };
        if self.model.metadata().is_none() {
            self.model.adopt(Arc::clone(record.metadata()));
        }
        let id = record.id().clone();
        self.index.insert(position, self.records.len() as u32);
        self.records.push(record);
        Ok(id)
    }

    pub(crate) fn update(&mut self, record: Record) -> Option<Value> {
        if self.model.check(&record).is_err() {
            return None;
        }
        let position = self.position_of(record.id())?;
        let slot = self.index[position] as usize;
        let id = record.id().clone();
        self.records[slot] = record;
        Some(id)
    }

    pub(crate) fn delete(&mut self, id: &Value) -> bool {
        let Some(position) = self.position_of(id) else {
            return false;
        };
        let slot = self.index.remove(position);
        self.records.remove(slot as usize);
        for entry in &mut self.index {
            if *entry > slot {
                *entry -= 1;
            }
        }
        true
    }

    /// Binary search of the identifier index; returns the index position
    pub(crate) fn position_of(&self, id: &Value) -> Option<usize> {
        if id.is_null() {
            return None;
        }
        self.search(id).ok()
    }

    /// Found position, or the insertion point that keeps the index sorted
    fn search(&self, id: &Value) -> Result<usize, usize> {
        self.index.binary_search_by(|&slot| {
            self.records
                .get(slot as usize)
                .map_or(Ordering::Less, |record| record.id().compare(id))
        })
    }

    pub(crate) fn record_at(&self, position: usize) -> Option<&Record> {
        self.index
            .get(position)
            .and_then(|&slot| self.records.get(slot as usize))
    }

    pub(crate) fn create_index(&self, filter: Option<&Filter>) -> Vec<u32> {
        match filter {
            None => (0..self.records.len() as u32).collect(),
            Some(filter) => filter.select(&self.records, self.metadata()),
        }
    }

    pub(crate) fn sort_index(&self, index: &[u32], specs: Option<&[SortSpec]>) -> Vec<u32> {
        sort_positions(&self.records, self.metadata(), index, specs)
    }
}
