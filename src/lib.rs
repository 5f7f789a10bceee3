//! Datastore: In-Memory Record Store and Views
//!
//! Typed records with inheritable field metadata, a store that keeps them in
//! a positional index sorted by identifier, composable filters, single- and
//! multi-key sorting, and live views that re-derive their own index whenever
//! the store mutates. Rows are fed in directly or loaded through a
//! [`proxy::DataProxy`].

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod model;
pub mod proxy;
pub mod store;
pub mod view;

pub use error::{ConfigError, ModelError, ProxyError, StoreError};
pub use model::{
    AutoRecord, FieldDescriptor, FieldType, ModelRegistry, RawRow, Record, TypeDef,
    TypeMetadata, Value,
};
pub use store::{CompareOp, DataStore, Filter, Row, SortSpec, StoreEvent};
pub use view::{DataView, ViewEvent, ViewOptions};
