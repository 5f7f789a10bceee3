//! Data Views
//!
//! A [`DataView`] is a filtered, sorted projection of a [`DataStore`]. It owns
//! only a position array; records stay in the store. The view listens to its
//! store and re-derives that array synchronously on every mutation, so by the
//! time a view's [`ViewEvent::Change`] fires it already reflects the change.

use crate::events::{Emitter, Subscription};
use crate::model::{Record, Value};
use crate::store::{DataStore, Filter, SortSpec, StoreShared};
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::ops::ControlFlow;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Notification emitted by a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    /// Filter replaced through [`DataView::filter`]
    Filter,
    /// Order replaced through [`DataView::sort`]
    Sort,
    /// Backing store mutated
    Change,
}

/// Initial criteria for [`DataStore::create_view`]
#[derive(Debug, Clone, Default)]
pub struct ViewOptions {
    pub filter: Option<Filter>,
    /// Identifier order when unset
    pub order: Option<Vec<SortSpec>>,
}

impl ViewOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order<I, S>(mut self, specs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SortSpec>,
    {
        self.order = Some(specs.into_iter().map(Into::into).collect());
        self
    }
}

struct ViewState {
    filter: Option<Filter>,
    order: Option<Vec<SortSpec>>,
    index: Vec<u32>,
}

struct ViewShared {
    store: Weak<StoreShared>,
    state: RwLock<ViewState>,
    events: Emitter<ViewEvent>,
    subscription: Subscription,
}

impl ViewShared {
    fn store(&self) -> Option<DataStore> {
        DataStore::upgrade(&self.store)
    }

    /// Recompute the index from the store with the current criteria
    fn rederive(&self) -> usize {
        let Some(store) = self.store() else {
            self.state.write().index.clear();
            return 0;
        };
        let (filter, order) = {
            let state = self.state.read();
            (state.filter.clone(), state.order.clone())
        };
        let index = store.derive_index(filter.as_ref(), order.as_deref());
        let count = index.len();
        self.state.write().index = index;
        debug!(count, "View re-derived");
        count
    }
}

impl Drop for ViewShared {
    fn drop(&mut self) {
        if let Some(store) = self.store() {
            store.unsubscribe(self.subscription);
        }
    }
}

/// Live projection of a store
///
/// Clones share the same view. Dropping the last clone detaches it from the
/// store.
#[derive(Clone)]
pub struct DataView {
    shared: Arc<ViewShared>,
}

impl DataView {
    pub fn new(store: &DataStore, options: ViewOptions) -> Self {
        let shared = Arc::new_cyclic(|view: &Weak<ViewShared>| {
            let view = view.clone();
            let subscription = store.subscribe(move |_| {
                if let Some(view) = view.upgrade() {
                    view.rederive();
                    view.events.emit(&ViewEvent::Change);
                }
            });
            ViewShared {
                store: store.downgrade(),
                state: RwLock::new(ViewState {
                    filter: options.filter,
                    order: options.order,
                    index: Vec::new(),
                }),
                events: Emitter::new(),
                subscription,
            }
        });
        shared.rederive();
        Self { shared }
    }

    /// Replace the filter and re-derive; returns the new record count
    ///
    /// `None` clears the filter. The current order is re-applied.
    pub fn filter(&self, filter: Option<Filter>) -> usize {
        self.shared.state.write().filter = filter;
        let count = self.shared.rederive();
        self.shared.events.emit(&ViewEvent::Filter);
        count
    }

    /// Replace the order and re-derive; `None` means identifier order
    pub fn sort(&self, order: Option<Vec<SortSpec>>) {
        self.shared.state.write().order = order;
        self.shared.rederive();
        self.shared.events.emit(&ViewEvent::Sort);
    }

    /// Number of records in the view; zero once the store is gone
    pub fn count(&self) -> usize {
        if self.shared.store.strong_count() == 0 {
            return 0;
        }
        self.shared.state.read().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Position of the record with `id` in this view's order
    pub fn index_of_id(&self, id: &Value) -> Option<usize> {
        let store = self.shared.store()?;
        let state = self.shared.state.read();
        store.with_records(|records| {
            state.index.iter().position(|&slot| {
                records
                    .get(slot as usize)
                    .is_some_and(|record| record.id().compare(id) == Ordering::Equal)
            })
        })
    }

    pub fn get_by_id(&self, id: &Value) -> Option<Record> {
        self.index_of_id(id)
            .and_then(|position| self.get_by_index(position))
    }

    pub fn get_by_index(&self, position: usize) -> Option<Record> {
        let store = self.shared.store()?;
        let slot = *self.shared.state.read().index.get(position)?;
        store.record_at_slot(slot)
    }

    /// Visit records in view order until `visit` breaks
    ///
    /// The visitor sees a snapshot of clones taken before the first call, so
    /// it may mutate the store; those changes show up on the next read.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(usize, &Record) -> ControlFlow<()>,
    {
        let Some(store) = self.shared.store() else {
            return;
        };
        let index = self.shared.state.read().index.clone();
        let snapshot: Vec<Record> = store.with_records(|records| {
            index
                .iter()
                .filter_map(|&slot| records.get(slot as usize).cloned())
                .collect()
        });
        for (position, record) in snapshot.iter().enumerate() {
            if visit(position, record).is_break() {
                break;
            }
        }
    }

    pub fn order(&self) -> Option<Vec<SortSpec>> {
        self.shared.state.read().order.clone()
    }

    pub fn has_filter(&self) -> bool {
        self.shared.state.read().filter.is_some()
    }

    /// Backing store, if it is still alive
    pub fn store(&self) -> Option<DataStore> {
        self.shared.store()
    }

    /// Listen for view notifications
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ViewEvent) + Send + Sync + 'static,
    {
        self.shared.events.subscribe(listener)
    }

    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.shared.events.unsubscribe(subscription)
    }
}
