//! Data Store
//!
//! Owns the records of one model type and a positional index sorted by
//! identifier. Reads in default order go through the index; identifier
//! lookups binary-search it. Filtering and sorting produce fresh position
//! arrays and never reorder the store itself.
//!
//! A `DataStore` is a cheap handle; clones share the same records. Every
//! mutation runs to completion under the write lock, and its change
//! notification is emitted after the lock is released.

pub mod filter;
mod load;
pub mod sort;
mod state;

pub use filter::{CompareOp, Condition, Filter, Pattern, PredicateFn};
pub use sort::SortSpec;

use crate::config::ProxyConfig;
use crate::error::StoreError;
use crate::events::{Emitter, Subscription};
use crate::model::{FieldDescriptor, RawRow, Record, TypeMetadata, Value};
use crate::view::{DataView, ViewOptions};
use parking_lot::RwLock;
use state::{StoreModel, StoreState};
use std::ops::ControlFlow;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Notification emitted after a store mutation
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Create(Value),
    Update(Value),
    Delete(Value),
    /// Whole collection replaced
    Change,
}

/// Input row for [`DataStore::set_data`]
#[derive(Debug, Clone)]
pub enum Row {
    Raw(RawRow),
    Record(Record),
}

impl From<RawRow> for Row {
    fn from(raw: RawRow) -> Self {
        Row::Raw(raw)
    }
}

impl From<Record> for Row {
    fn from(record: Record) -> Self {
        Row::Record(record)
    }
}

pub(crate) struct StoreShared {
    state: RwLock<StoreState>,
    events: Emitter<StoreEvent>,
    source: RwLock<Option<String>>,
    proxy_config: RwLock<ProxyConfig>,
}

/// Shared handle to an in-memory record store
#[derive(Clone)]
pub struct DataStore {
    shared: Arc<StoreShared>,
}

impl DataStore {
    /// Empty store bound to a registered type
    pub fn new(meta: &Arc<TypeMetadata>) -> Self {
        Self::from_model(StoreModel::Typed(Arc::clone(meta)))
    }

    /// Empty store whose type is inferred from the first row it ingests
    pub fn auto(type_name: impl Into<String>, identifier: Option<&str>) -> Self {
        Self::from_model(StoreModel::Auto {
            type_name: type_name.into(),
            identifier: identifier.map(str::to_string),
            meta: None,
        })
    }

    /// Store pre-populated with `rows`
    pub fn with_data<I, R>(meta: &Arc<TypeMetadata>, rows: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = R>,
        R: Into<Row>,
    {
        let store = Self::new(meta);
        store.set_data(rows)?;
        Ok(store)
    }

    /// Remember `url` as the source for [`DataStore::reload`]
    pub fn with_source(self, url: impl Into<String>) -> Self {
        *self.shared.source.write() = Some(url.into());
        self
    }

    pub fn with_proxy_config(self, config: ProxyConfig) -> Self {
        *self.shared.proxy_config.write() = config;
        self
    }

    fn from_model(model: StoreModel) -> Self {
        Self {
            shared: Arc::new(StoreShared {
                state: RwLock::new(StoreState::new(model)),
                events: Emitter::new(),
                source: RwLock::new(None),
                proxy_config: RwLock::new(ProxyConfig::default()),
            }),
        }
    }

    /// Replace the whole collection and rebuild the index
    ///
    /// Raw rows are ingested through the store's model; records of another
    /// type are re-materialized. On error the store is left untouched.
    pub fn set_data<I, R>(&self, rows: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = R>,
        R: Into<Row>,
    {
        let rows: Vec<Row> = rows.into_iter().map(Into::into).collect();
        let count = self.shared.state.write().replace(rows)?;
        debug!(count, "Store data replaced");
        self.emit(StoreEvent::Change);
        Ok(count)
    }

    /// Install already-typed records verbatim
    pub fn set_raw_data(&self, records: Vec<Record>) -> Result<usize, StoreError> {
        let count = self.shared.state.write().replace_records(records)?;
        debug!(count, "Store records replaced");
        self.emit(StoreEvent::Change);
        Ok(count)
    }

    /// Add one record; it must carry a new identifier
    pub fn append(&self, record: Record) -> Result<(), StoreError> {
        let id = self.shared.state.write().append(record)?;
        debug!(id = %id, "Record appended");
        self.emit(StoreEvent::Create(id));
        Ok(())
    }

    /// Overwrite the record with the same identifier
    ///
    /// Returns false if no such record exists. The index is kept as is since
    /// the identifier did not change.
    pub fn update(&self, record: Record) -> bool {
        let updated = self.shared.state.write().update(record);
        match updated {
            Some(id) => {
                debug!(id = %id, "Record updated");
                self.emit(StoreEvent::Update(id));
                true
            }
            None => false,
        }
    }

    /// Remove the record with `id`; false if absent
    pub fn delete(&self, id: &Value) -> bool {
        let deleted = self.shared.state.write().delete(id);
        if deleted {
            debug!(id = %id, "Record deleted");
            self.emit(StoreEvent::Delete(id.clone()));
        }
        deleted
    }

    /// Greatest identifier in the store
    pub fn max_id(&self) -> Option<Value> {
        let state = self.shared.state.read();
        state
            .index
            .last()
            .map(|&slot| state.records[slot as usize].id().clone())
    }

    pub fn count(&self) -> usize {
        self.shared.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Field list of the bound type; empty for an auto store with no data yet
    pub fn fields(&self) -> Vec<FieldDescriptor> {
        self.metadata()
            .map(|meta| meta.fields().to_vec())
            .unwrap_or_default()
    }

    pub fn metadata(&self) -> Option<Arc<TypeMetadata>> {
        self.shared.state.read().model.metadata().cloned()
    }

    pub fn type_name(&self) -> String {
        self.shared.state.read().model.type_name().to_string()
    }

    /// Index position of the record with `id`, by binary search
    pub fn index_of_id(&self, id: &Value) -> Option<usize> {
        self.shared.state.read().position_of(id)
    }

    pub fn get_by_id(&self, id: &Value) -> Option<Record> {
        let state = self.shared.state.read();
        state
            .position_of(id)
            .and_then(|position| state.record_at(position))
            .cloned()
    }

    /// Record at `position` in identifier order
    pub fn get_by_index(&self, position: usize) -> Option<Record> {
        self.shared.state.read().record_at(position).cloned()
    }

    /// Position array of records matching `filter`, in storage order
    pub fn create_index(&self, filter: Option<&Filter>) -> Vec<u32> {
        self.shared.state.read().create_index(filter)
    }

    /// Reorder a position array; identifier order when `specs` is `None`
    pub fn sort_index(&self, index: &[u32], specs: Option<&[SortSpec]>) -> Vec<u32> {
        self.shared.state.read().sort_index(index, specs)
    }

    /// Visit records in identifier order until `visit` breaks
    ///
    /// The store is read-locked for the duration; `visit` must not mutate it.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(usize, &Record) -> ControlFlow<()>,
    {
        let state = self.shared.state.read();
        for (position, &slot) in state.index.iter().enumerate() {
            if let Some(record) = state.records.get(slot as usize) {
                if visit(position, record).is_break() {
                    break;
                }
            }
        }
    }

    /// Serialized records in identifier order
    pub fn export(&self) -> Vec<RawRow> {
        let state = self.shared.state.read();
        state
            .index
            .iter()
            .filter_map(|&slot| state.records.get(slot as usize))
            .map(Record::serialize)
            .collect()
    }

    /// Live filtered/sorted projection of this store
    pub fn create_view(&self, options: ViewOptions) -> DataView {
        DataView::new(self, options)
    }

    /// Listen for mutations
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        self.shared.events.subscribe(listener)
    }

    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.shared.events.unsubscribe(subscription)
    }

    /// Listeners currently attached, live views included
    pub fn listener_count(&self) -> usize {
        self.shared.events.listener_count()
    }

    pub fn source(&self) -> Option<String> {
        self.shared.source.read().clone()
    }

    pub fn proxy_config(&self) -> ProxyConfig {
        self.shared.proxy_config.read().clone()
    }

    fn emit(&self, event: StoreEvent) {
        self.shared.events.emit(&event);
    }

    pub(crate) fn downgrade(&self) -> Weak<StoreShared> {
        Arc::downgrade(&self.shared)
    }

    pub(crate) fn upgrade(shared: &Weak<StoreShared>) -> Option<Self> {
        shared.upgrade().map(|shared| Self { shared })
    }

    /// Filter then sort under a single read lock
    pub(crate) fn derive_index(&self, filter: Option<&Filter>, order: Option<&[SortSpec]>) -> Vec<u32> {
        let state = self.shared.state.read();
        let index = state.create_index(filter);
        state.sort_index(&index, order)
    }

    /// Record at a storage position (not an index position)
    pub(crate) fn record_at_slot(&self, slot: u32) -> Option<Record> {
        self.shared.state.read().records.get(slot as usize).cloned()
    }

    pub(crate) fn with_records<T>(&self, read: impl FnOnce(&[Record]) -> T) -> T {
        read(&self.shared.state.read().records)
    }
}
