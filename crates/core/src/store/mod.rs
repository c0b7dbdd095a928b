//! Record store implementations.
//!
//! [`RecordStore`] is the seam between request handling and the tabular backend. Each
//! operation is one logical backend call and blocks until it completes; async callers move it
//! onto a blocking thread.
//!
//! - [`airtable::AirtableStore`]: the hosted Airtable base, over HTTP.
//! - [`memory::MemoryStore`]: an injected in-process data source with the same failure
//!   behaviour, used for local runs and tests.

pub mod airtable;
pub mod memory;

use crate::config::{CoreConfig, StoreKind};
use crate::error::{ConnectionError, WriteError};
use crate::record::{FieldUpdate, NewRecord, Record, RecordId};
use std::sync::Arc;

/// Blocking access to the remote table of records.
pub trait RecordStore: Send + Sync {
    /// Fetch every record, in backend order.
    fn list(&self) -> Result<Vec<Record>, ConnectionError>;

    /// Create a record and return the id the backend assigned.
    fn create(&self, record: &NewRecord) -> Result<RecordId, WriteError>;

    /// Replace only the fields present in `update`.
    fn update(&self, id: &RecordId, update: &FieldUpdate) -> Result<(), WriteError>;

    fn delete(&self, id: &RecordId) -> Result<(), WriteError>;
}

/// Build the store selected by the configuration.
pub fn build_store(cfg: &CoreConfig) -> Arc<dyn RecordStore> {
    match cfg.store_kind() {
        StoreKind::Airtable => Arc::new(airtable::AirtableStore::new(cfg.airtable().clone())),
        StoreKind::Memory => Arc::new(memory::MemoryStore::with_placeholder_rows()),
    }
}
