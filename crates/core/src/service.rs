//! Record actions.
//!
//! [`RecordService`] is the request handler for the four user actions. Each write action
//! validates its form, calls the record store at most once, and reduces the result to a
//! [`Notice`]. Failures never propagate past this boundary; the caller always goes back to the
//! view afterwards.

use crate::error::ConnectionError;
use crate::notice::Notice;
use crate::record::Record;
use crate::store::RecordStore;
use crate::validation::RecordForm;
use std::sync::Arc;

/// Pure record operations over an injected store - no HTTP concerns.
#[derive(Clone)]
pub struct RecordService {
    store: Arc<dyn RecordStore>,
}

impl RecordService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Fetch the full record list for rendering.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ConnectionError`]; its text is the diagnostic shown in place of
    /// the table.
    pub fn view(&self) -> Result<Vec<Record>, ConnectionError> {
        let records = self.store.list()?;
        tracing::info!(count = records.len(), "Listed records");
        Ok(records)
    }

    /// Create a record. All four content fields are required.
    pub fn add(&self, form: &RecordForm) -> Notice {
        let record = match form.new_record() {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Rejected new record: {}", e);
                return Notice::error(e.to_string());
            }
        };

        match self.store.create(&record) {
            Ok(id) => {
                tracing::info!(record_id = %id, "Created record");
                Notice::success(format!("New record created successfully! ID: {id}"))
            }
            Err(e) => {
                tracing::error!("Create record error: {:?}", e);
                Notice::error(e.to_string())
            }
        }
    }

    /// Update only the supplied fields of an existing record.
    pub fn edit(&self, form: &RecordForm) -> Notice {
        let (id, update) = match form.field_update() {
            Ok(parts) => parts,
            Err(e) => {
                tracing::warn!("Rejected record update: {}", e);
                return Notice::error(e.to_string());
            }
        };

        match self.store.update(&id, &update) {
            Ok(()) => {
                tracing::info!(
                    record_id = %id,
                    columns = ?update.fields().present_columns(),
                    "Updated record"
                );
                Notice::success(format!("Record {id} updated successfully!"))
            }
            Err(e) => {
                tracing::error!(record_id = %id, "Update record error: {:?}", e);
                Notice::error(e.to_string())
            }
        }
    }

    pub fn delete(&self, form: &RecordForm) -> Notice {
        let id = match form.delete_target() {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Rejected record deletion: {}", e);
                return Notice::error(e.to_string());
            }
        };

        match self.store.delete(&id) {
            Ok(()) => {
                tracing::info!(record_id = %id, "Deleted record");
                Notice::success(format!("Record {id} deleted successfully!"))
            }
            Err(e) => {
                tracing::error!(record_id = %id, "Delete record error: {:?}", e);
                Notice::error(e.to_string())
            }
        }
    }
}
