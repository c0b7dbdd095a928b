//! Record model.
//!
//! A [`Record`] is one row of the patient/pharmacy/status table. The content fields are free
//! text and may be absent when read back (Airtable omits empty cells). Write inputs carry their
//! presence guarantees in the type:
//!
//! - [`NewRecord`]: all four content fields non-empty,
//! - [`FieldUpdate`]: at least one content field, only supplied fields are sent,
//! - [`RecordId`]: a non-empty backend-assigned identifier.

use crate::constants::{FIELD_DOB, FIELD_PATIENT_NAME, FIELD_PHARMACY, FIELD_STATUS};
use chrono::{DateTime, Utc};
use rxstatus_types::{NonEmptyText, TextError};
use serde::{Deserialize, Deserializer, Serialize};

/// Opaque, backend-assigned record identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(NonEmptyText);

impl RecordId {
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] for blank input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, TextError> {
        NonEmptyText::new(id).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Content fields of a record, keyed by their backend column names on the wire.
///
/// Absent fields are skipped when serialised, which is what makes an update partial.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    #[serde(
        rename = "Patient Name",
        default,
        deserialize_with = "text_cell",
        skip_serializing_if = "Option::is_none"
    )]
    pub patient_name: Option<String>,
    #[serde(
        rename = "Pharmacy",
        default,
        deserialize_with = "text_cell",
        skip_serializing_if = "Option::is_none"
    )]
    pub pharmacy: Option<String>,
    #[serde(
        rename = "Status",
        default,
        deserialize_with = "text_cell",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
    #[serde(
        rename = "DOB",
        default,
        deserialize_with = "text_cell",
        skip_serializing_if = "Option::is_none"
    )]
    pub dob: Option<String>,
}

impl RecordFields {
    /// Column names of the fields that are present.
    pub fn present_columns(&self) -> Vec<&'static str> {
        [
            (FIELD_PATIENT_NAME, &self.patient_name),
            (FIELD_PHARMACY, &self.pharmacy),
            (FIELD_STATUS, &self.status),
            (FIELD_DOB, &self.dob),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_some())
        .map(|(name, _)| name)
        .collect()
    }

    /// Overwrite the fields present in `update`, leaving the others untouched.
    pub fn apply(&mut self, update: &RecordFields) {
        fn replace(slot: &mut Option<String>, value: &Option<String>) {
            if let Some(value) = value {
                *slot = Some(value.clone());
            }
        }

        replace(&mut self.patient_name, &update.patient_name);
        replace(&mut self.pharmacy, &update.pharmacy);
        replace(&mut self.status, &update.status);
        replace(&mut self.dob, &update.dob);
    }
}

// Cells are treated as text; numeric or boolean cells are rendered rather than rejected.
fn text_cell<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// One row as returned by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub fields: RecordFields,
}

/// A record to be created. All content fields are required.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewRecord {
    pub patient_name: NonEmptyText,
    pub pharmacy: NonEmptyText,
    pub status: NonEmptyText,
    pub dob: NonEmptyText,
}

impl NewRecord {
    pub fn fields(&self) -> RecordFields {
        RecordFields {
            patient_name: Some(self.patient_name.to_string()),
            pharmacy: Some(self.pharmacy.to_string()),
            status: Some(self.status.to_string()),
            dob: Some(self.dob.to_string()),
        }
    }
}

/// A partial update carrying at least one field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldUpdate {
    fields: RecordFields,
}

impl FieldUpdate {
    /// Build an update from the supplied fields.
    ///
    /// Returns `None` when no field is supplied.
    pub fn new(
        patient_name: Option<NonEmptyText>,
        pharmacy: Option<NonEmptyText>,
        status: Option<NonEmptyText>,
        dob: Option<NonEmptyText>,
    ) -> Option<Self> {
        let fields = RecordFields {
            patient_name: patient_name.map(NonEmptyText::into_inner),
            pharmacy: pharmacy.map(NonEmptyText::into_inner),
            status: status.map(NonEmptyText::into_inner),
            dob: dob.map(NonEmptyText::into_inner),
        };

        if fields.present_columns().is_empty() {
            None
        } else {
            Some(Self { fields })
        }
    }

    pub fn fields(&self) -> &RecordFields {
        &self.fields
    }
}
