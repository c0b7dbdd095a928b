//! Input validation for record actions.
//!
//! Form submissions arrive as raw strings. The checks here run before any backend call and
//! turn a [`RecordForm`] into the typed inputs the record store accepts. A blank or
//! whitespace-only field counts as missing.

use crate::record::{FieldUpdate, NewRecord, RecordId};
use rxstatus_types::NonEmptyText;
use serde::Deserialize;

/// A rejected form submission. The `Display` text is shown to the user as-is.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("All fields are required for creating a new record")]
    MissingCreateFields,
    #[error("Record ID is required")]
    MissingUpdateId,
    #[error("At least one field must be provided for update")]
    EmptyUpdate,
    #[error("Record ID is required for deletion")]
    MissingDeleteId,
}

/// Raw form input for the add, edit and delete actions.
///
/// Field names match the table's column names. Missing form fields deserialize as empty.
/// Values are trimmed of surrounding whitespace when validated, so the backend stores the
/// trimmed text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RecordForm {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "Patient Name", default)]
    pub patient_name: String,
    #[serde(rename = "Pharmacy", default)]
    pub pharmacy: String,
    #[serde(rename = "Status", default)]
    pub status: String,
    #[serde(rename = "DOB", default)]
    pub dob: String,
}

impl RecordForm {
    /// Validate the form for record creation: every content field is required.
    pub fn new_record(&self) -> Result<NewRecord, ValidationError> {
        let required =
            |value: &str| NonEmptyText::new(value).map_err(|_| ValidationError::MissingCreateFields);

        Ok(NewRecord {
            patient_name: required(&self.patient_name)?,
            pharmacy: required(&self.pharmacy)?,
            status: required(&self.status)?,
            dob: required(&self.dob)?,
        })
    }

    /// Validate the form for a partial update: an id and at least one content field.
    pub fn field_update(&self) -> Result<(RecordId, FieldUpdate), ValidationError> {
        let id = RecordId::new(&self.id).map_err(|_| ValidationError::MissingUpdateId)?;
        let update = FieldUpdate::new(
            NonEmptyText::optional(&self.patient_name),
            NonEmptyText::optional(&self.pharmacy),
            NonEmptyText::optional(&self.status),
            NonEmptyText::optional(&self.dob),
        )
        .ok_or(ValidationError::EmptyUpdate)?;

        Ok((id, update))
    }

    /// Validate the form for deletion: only the id is required.
    pub fn delete_target(&self) -> Result<RecordId, ValidationError> {
        RecordId::new(&self.id).map_err(|_| ValidationError::MissingDeleteId)
    }
}
