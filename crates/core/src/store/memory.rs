//! In-process record store.
//!
//! Holds rows behind a mutex and mimics the backend's failure modes: updating or deleting an
//! unknown id fails as not-found. Nothing is persisted; the store lives as long as the value
//! that owns it, so every test or process gets its own dataset.

use super::RecordStore;
use crate::constants::RECORD_ID_PREFIX;
use crate::error::{BackendError, ConnectionError, WriteAction, WriteError};
use crate::record::{FieldUpdate, NewRecord, Record, RecordFields, RecordId};
use chrono::Utc;
use std::sync::{Mutex, MutexGuard};

type IdSource = Box<dyn Fn() -> String + Send + Sync>;

pub struct MemoryStore {
    rows: Mutex<Vec<Record>>,
    next_id: IdSource,
}

impl MemoryStore {
    /// An empty store assigning Airtable-shaped ids (`rec` + 14 hex characters).
    pub fn new() -> Self {
        Self::with_id_source(|| {
            let hex = uuid::Uuid::new_v4().simple().to_string();
            format!("{RECORD_ID_PREFIX}{}", &hex[..14])
        })
    }

    /// An empty store taking new ids from `next_id`.
    pub fn with_id_source(next_id: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            next_id: Box::new(next_id),
        }
    }

    /// Seed the store with existing rows.
    pub fn with_rows(self, rows: Vec<Record>) -> Self {
        *self.lock() = rows;
        self
    }

    /// The two placeholder rows the front end shows when no backend is configured.
    pub fn with_placeholder_rows() -> Self {
        let rows = ["rec1001", "rec1002"]
            .into_iter()
            .filter_map(|id| RecordId::new(id).ok())
            .map(|id| Record {
                id,
                created_time: None,
                fields: RecordFields {
                    patient_name: Some("Talha".into()),
                    pharmacy: Some("Clinton Pharmacy".into()),
                    status: Some("Plan Exclusion".into()),
                    dob: Some("2/5/1999".into()),
                },
            })
            .collect();

        Self::new().with_rows(rows)
    }

    // Mutations cannot panic part-way, so a poisoned lock still guards consistent rows.
    fn lock(&self) -> MutexGuard<'_, Vec<Record>> {
        self.rows.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    fn not_found(id: &RecordId, action: WriteAction) -> WriteError {
        WriteError::classify(
            action,
            Some(id.as_str()),
            BackendError::not_found(format!("Could not find record {id}")),
        )
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn list(&self) -> Result<Vec<Record>, ConnectionError> {
        Ok(self.lock().clone())
    }

    fn create(&self, record: &NewRecord) -> Result<RecordId, WriteError> {
        let id = RecordId::new((self.next_id)()).map_err(|err| WriteError::Failed {
            action: WriteAction::Create,
            message: format!("id source produced an invalid id: {err}"),
        })?;

        self.lock().push(Record {
            id: id.clone(),
            created_time: Some(Utc::now()),
            fields: record.fields(),
        });
        Ok(id)
    }

    fn update(&self, id: &RecordId, update: &FieldUpdate) -> Result<(), WriteError> {
        let mut rows = self.lock();
        let row = rows
            .iter_mut()
            .find(|row| &row.id == id)
            .ok_or_else(|| Self::not_found(id, WriteAction::Update))?;
        row.fields.apply(update.fields());
        Ok(())
    }

    fn delete(&self, id: &RecordId) -> Result<(), WriteError> {
        let mut rows = self.lock();
        let index = rows
            .iter()
            .position(|row| &row.id == id)
            .ok_or_else(|| Self::not_found(id, WriteAction::Delete))?;
        rows.remove(index);
        Ok(())
    }
}
