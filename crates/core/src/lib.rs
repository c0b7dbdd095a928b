//! # RxStatus Core
//!
//! Core logic for the RxStatus patient-pharmacy-status front end.
//!
//! This crate contains the record model and everything between a form submission and the
//! tabular backend:
//! - Validation of add/edit/delete input before any backend call
//! - The [`RecordStore`] seam, with Airtable and in-memory implementations
//! - Classification of backend failures into user-facing messages
//!
//! **No HTTP server concerns**: routing, page rendering and flash cookies belong in `api-rest`.

pub mod config;
pub mod constants;
pub mod error;
pub mod notice;
pub mod record;
pub mod service;
pub mod store;
pub mod validation;

pub use config::{AirtableConfig, CoreConfig, StoreKind};
pub use error::{
    BackendError, BackendStatus, ConfigError, ConnectionError, WriteAction, WriteError,
};
pub use notice::{Notice, NoticeKind};
pub use record::{FieldUpdate, NewRecord, Record, RecordFields, RecordId};
pub use rxstatus_types::{NonEmptyText, TextError};
pub use service::RecordService;
pub use store::{airtable::AirtableStore, build_store, memory::MemoryStore, RecordStore};
pub use validation::{RecordForm, ValidationError};
