//! Airtable-backed record store.
//!
//! Speaks the Airtable REST API (`/v0/{base}/{table}`) with a bearer token over a blocking
//! `ureq` agent. Every failure is turned into a [`BackendError`] by HTTP status code, with the
//! message taken from Airtable's error envelope when the body carries one.
//!
//! Wire shapes:
//!
//! ```text
//! GET    /v0/{base}/{table}[?offset=..]  -> {"records": [{"id", "createdTime", "fields"}], "offset"?}
//! POST   /v0/{base}/{table}              <- {"fields": {...}}  -> record
//! PATCH  /v0/{base}/{table}/{id}         <- {"fields": {...}}  -> record
//! DELETE /v0/{base}/{table}/{id}                               -> {"deleted": true, "id"}
//! ```

use super::RecordStore;
use crate::config::AirtableConfig;
use crate::constants::AIRTABLE_API_VERSION;
use crate::error::{BackendError, BackendStatus, ConnectionError, WriteAction, WriteError};
use crate::record::{FieldUpdate, NewRecord, Record, RecordFields, RecordId};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use url::Url;

type BackendResult<T> = Result<T, BackendError>;

#[derive(Clone)]
pub struct AirtableStore {
    cfg: AirtableConfig,
    agent: ureq::Agent,
}

#[derive(Deserialize)]
struct ListResponse {
    records: Vec<AirtableRecord>,
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Deserialize)]
struct AirtableRecord {
    id: String,
    #[serde(rename = "createdTime", default)]
    created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    fields: RecordFields,
}

#[derive(Deserialize)]
struct DeleteResponse {
    deleted: bool,
}

#[derive(Serialize)]
struct FieldsPayload<'a> {
    fields: &'a RecordFields,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Detailed {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        message: Option<String>,
    },
    Code(String),
}

impl AirtableStore {
    pub fn new(cfg: AirtableConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(cfg.timeout())
            .timeout(cfg.timeout())
            .build();
        Self { cfg, agent }
    }

    fn table_url(&self) -> BackendResult<Url> {
        build_url(
            self.cfg.api_url(),
            &[
                AIRTABLE_API_VERSION,
                self.cfg.base_id(),
                self.cfg.table_name(),
            ],
        )
    }

    fn record_url(&self, id: &RecordId) -> BackendResult<Url> {
        build_url(
            self.cfg.api_url(),
            &[
                AIRTABLE_API_VERSION,
                self.cfg.base_id(),
                self.cfg.table_name(),
                id.as_str(),
            ],
        )
    }

    fn request(&self, method: &str, url: &Url) -> ureq::Request {
        self.agent
            .request(method, url.as_str())
            .set(
                "Authorization",
                &format!("Bearer {}", self.cfg.access_token()),
            )
            .set("Accept", "application/json")
    }

    fn send<R>(&self, request: ureq::Request, body: Option<&FieldsPayload<'_>>) -> BackendResult<R>
    where
        R: DeserializeOwned,
    {
        let response = match body {
            None => request.call(),
            Some(body) => {
                let payload = serde_json::to_string(body).map_err(|err| {
                    BackendError::new(
                        BackendStatus::Unknown,
                        format!("failed to encode request: {err}"),
                    )
                })?;
                request
                    .set("Content-Type", "application/json")
                    .send_string(&payload)
            }
        };

        match response {
            Ok(resp) => read_json_response(resp),
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                Err(parse_error_response(code, &body))
            }
            Err(ureq::Error::Transport(err)) => Err(BackendError::new(
                BackendStatus::Unknown,
                format!("request failed: {err}"),
            )),
        }
    }

    fn fetch_all(&self) -> BackendResult<Vec<Record>> {
        let url = self.table_url()?;
        let mut records = Vec::new();
        let mut offset: Option<String> = None;
        let mut seen_offsets = HashSet::new();

        loop {
            let mut request = self.request("GET", &url);
            if let Some(offset) = &offset {
                request = request.query("offset", offset);
            }
            let page: ListResponse = self.send(request, None)?;
            for record in page.records {
                records.push(record_from_remote(record)?);
            }

            match page.offset {
                // A cursor seen before would restart a page we already hold.
                Some(next) if !seen_offsets.insert(next.clone()) => {
                    return Err(BackendError::new(
                        BackendStatus::Unknown,
                        format!("backend repeated pagination offset {next:?}"),
                    ));
                }
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(records)
    }
}

impl RecordStore for AirtableStore {
    fn list(&self) -> Result<Vec<Record>, ConnectionError> {
        tracing::debug!(table = self.cfg.table_name(), "listing Airtable records");
        self.fetch_all().map_err(|err| {
            tracing::error!(status = ?err.status, "Airtable list failed: {}", err);
            ConnectionError::from(err)
        })
    }

    fn create(&self, record: &NewRecord) -> Result<RecordId, WriteError> {
        let fields = record.fields();
        let created = self
            .table_url()
            .and_then(|url| {
                self.send::<AirtableRecord>(
                    self.request("POST", &url),
                    Some(&FieldsPayload { fields: &fields }),
                )
            })
            .and_then(|remote| record_from_remote(remote).map(|r| r.id));

        created.map_err(|err| {
            tracing::error!(status = ?err.status, "Airtable create failed: {}", err);
            WriteError::classify(WriteAction::Create, None, err)
        })
    }

    fn update(&self, id: &RecordId, update: &FieldUpdate) -> Result<(), WriteError> {
        tracing::debug!(
            record_id = %id,
            columns = ?update.fields().present_columns(),
            "updating Airtable record"
        );
        self.record_url(id)
            .and_then(|url| {
                self.send::<serde_json::Value>(
                    self.request("PATCH", &url),
                    Some(&FieldsPayload {
                        fields: update.fields(),
                    }),
                )
            })
            .map(|_| ())
            .map_err(|err| {
                tracing::error!(record_id = %id, status = ?err.status, "Airtable update failed: {}", err);
                WriteError::classify(WriteAction::Update, Some(id.as_str()), err)
            })
    }

    fn delete(&self, id: &RecordId) -> Result<(), WriteError> {
        self.record_url(id)
            .and_then(|url| self.send::<DeleteResponse>(self.request("DELETE", &url), None))
            .and_then(|resp| {
                if resp.deleted {
                    Ok(())
                } else {
                    Err(BackendError::new(
                        BackendStatus::Unknown,
                        "backend did not confirm the deletion",
                    ))
                }
            })
            .map_err(|err| {
                tracing::error!(record_id = %id, status = ?err.status, "Airtable delete failed: {}", err);
                WriteError::classify(WriteAction::Delete, Some(id.as_str()), err)
            })
    }
}

/// Append path segments to the API origin, percent-encoding each one.
fn build_url(api_url: &Url, segments: &[&str]) -> BackendResult<Url> {
    let mut url = api_url.clone();
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            BackendError::new(BackendStatus::Unknown, "Airtable API URL cannot be a base")
        })?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    url.set_query(None);
    Ok(url)
}

fn record_from_remote(remote: AirtableRecord) -> BackendResult<Record> {
    let id = RecordId::new(&remote.id).map_err(|_| {
        BackendError::new(
            BackendStatus::Unknown,
            "backend returned a record without an id",
        )
    })?;
    Ok(Record {
        id,
        created_time: remote.created_time,
        fields: remote.fields,
    })
}

fn read_json_response<R>(response: ureq::Response) -> BackendResult<R>
where
    R: DeserializeOwned,
{
    let body = response.into_string().map_err(|err| {
        BackendError::new(
            BackendStatus::Unknown,
            format!("failed to read response body: {err}"),
        )
    })?;
    serde_json::from_str(&body).map_err(|err| {
        BackendError::new(
            BackendStatus::Unknown,
            format!("invalid response json: {err}"),
        )
    })
}

/// Classify an error response by status code and extract Airtable's message.
fn parse_error_response(code: u16, body: &str) -> BackendError {
    let status = BackendStatus::from_http(code);
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error:
                ErrorBody::Detailed {
                    kind,
                    message: Some(message),
                },
        }) => format!("{kind}: {message}"),
        Ok(ErrorEnvelope {
            error: ErrorBody::Detailed { kind, message: None },
        }) => kind,
        Ok(ErrorEnvelope {
            error: ErrorBody::Code(text),
        }) => text,
        Err(_) => format!("HTTP {code}"),
    };
    BackendError::new(status, message)
}
