//! Error taxonomy for record store operations.
//!
//! A store reports every failed backend call as a [`BackendError`]: a status drawn from the
//! closed set [`BackendStatus`] plus the backend's own message. Callers never inspect the
//! message text to decide what happened. The user-facing errors are derived by total matches:
//!
//! - [`ConnectionError`] for `list()` failures,
//! - [`WriteError`] for `create()`, `update()` and `delete()` failures.
//!
//! Their `Display` output is the exact text shown to the user.

use std::fmt;

/// Classification of a failed backend call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendStatus {
    /// The credential was rejected (HTTP 401).
    Unauthorized,
    /// The credential lacks permission for the base or table (HTTP 403).
    Forbidden,
    /// The base, table or record does not exist (HTTP 404).
    NotFound,
    /// The backend rejected the field data (HTTP 400 / 422).
    InvalidFormat,
    /// Anything else, including transport failures.
    Unknown,
}

impl BackendStatus {
    /// Map an HTTP status code onto the closed classification set.
    pub fn from_http(code: u16) -> Self {
        match code {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            400 | 422 => Self::InvalidFormat,
            _ => Self::Unknown,
        }
    }
}

/// A failed call against the record backend.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct BackendError {
    pub status: BackendStatus,
    pub message: String,
}

impl BackendError {
    pub fn new(status: BackendStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(BackendStatus::NotFound, message)
    }
}

/// Failure to read the record list from the backend.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    #[error("Invalid access token. Airtable rejected the credential (401 Unauthorized).")]
    Unauthorized,
    #[error(
        "Access forbidden. The access token does not have permission to read this base (403 Forbidden)."
    )]
    Forbidden,
    #[error("Base or table not found. Check the base ID and table name (404 Not Found).")]
    NotFound,
    #[error("Unexpected error while connecting to Airtable: {0}")]
    Unexpected(String),
}

impl From<BackendError> for ConnectionError {
    fn from(err: BackendError) -> Self {
        match err.status {
            BackendStatus::Unauthorized => Self::Unauthorized,
            BackendStatus::Forbidden => Self::Forbidden,
            BackendStatus::NotFound => Self::NotFound,
            BackendStatus::InvalidFormat | BackendStatus::Unknown => Self::Unexpected(err.message),
        }
    }
}

/// The write operation that failed, used in user-facing messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteAction {
    Create,
    Update,
    Delete,
}

impl fmt::Display for WriteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(verb)
    }
}

/// Failure to create, update or delete a record.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WriteError {
    #[error("Record {id} not found. It may have already been deleted.")]
    NotFound { id: String },
    #[error("Permission denied. The access token cannot {action} records in this table.")]
    Forbidden { action: WriteAction },
    #[error("Invalid field data: {message}")]
    InvalidFormat { message: String },
    #[error("Failed to {action} record: {message}")]
    Failed { action: WriteAction, message: String },
}

impl WriteError {
    /// Classify a backend failure for the given write.
    ///
    /// Each action recognises only its own failure classes; everything else is `Failed`:
    /// create has no record to miss, and delete sends no field data.
    pub fn classify(action: WriteAction, id: Option<&str>, err: BackendError) -> Self {
        match (action, err.status, id) {
            (WriteAction::Update | WriteAction::Delete, BackendStatus::NotFound, Some(id)) => {
                Self::NotFound { id: id.to_owned() }
            }
            (_, BackendStatus::Forbidden, _) => Self::Forbidden { action },
            (WriteAction::Create | WriteAction::Update, BackendStatus::InvalidFormat, _) => {
                Self::InvalidFormat {
                    message: err.message,
                }
            }
            _ => Self::Failed {
                action,
                message: err.message,
            },
        }
    }
}

/// Invalid startup configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid Airtable API URL {value:?}: {source}")]
    ApiUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Airtable API URL must use http or https: {0}")]
    ApiUrlScheme(String),
    #[error("invalid timeout {0:?}: expected a whole number of seconds")]
    Timeout(String),
    #[error("unknown record store {0:?}: expected \"airtable\" or \"memory\"")]
    StoreKind(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
