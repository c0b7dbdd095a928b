//! Constants used throughout the RxStatus core crate.
//!
//! Backend column names, configuration defaults and the environment variable
//! names that binaries read at startup.

/// Airtable column holding the patient's name.
pub const FIELD_PATIENT_NAME: &str = "Patient Name";

/// Airtable column holding the dispensing pharmacy.
pub const FIELD_PHARMACY: &str = "Pharmacy";

/// Airtable column holding the prescription status.
pub const FIELD_STATUS: &str = "Status";

/// Airtable column holding the date of birth (free text).
pub const FIELD_DOB: &str = "DOB";

/// Default Airtable API origin.
pub const DEFAULT_AIRTABLE_API_URL: &str = "https://api.airtable.com";

/// Airtable REST API version path segment.
pub const AIRTABLE_API_VERSION: &str = "v0";

/// Default timeout for a single backend request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Prefix of record ids, matching the ids Airtable hands out.
pub const RECORD_ID_PREFIX: &str = "rec";

pub const ENV_ACCESS_TOKEN: &str = "AIRTABLE_ACCESS_TOKEN";
pub const ENV_BASE_ID: &str = "AIRTABLE_BASE_ID";
pub const ENV_TABLE_NAME: &str = "AIRTABLE_TABLE_NAME";
pub const ENV_API_URL: &str = "AIRTABLE_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "AIRTABLE_TIMEOUT_SECS";
pub const ENV_STORE: &str = "RXSTATUS_STORE";
pub const ENV_ADDR: &str = "RXSTATUS_ADDR";

/// Listen address of the web front end when `RXSTATUS_ADDR` is unset.
pub const DEFAULT_ADDR: &str = "0.0.0.0:5000";
