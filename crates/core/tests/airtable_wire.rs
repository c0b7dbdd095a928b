//! Wire-level tests for `AirtableStore` against an in-process fake of the Airtable REST API.
//!
//! The fake runs on its own thread and port per test, serves two records per page, and
//! records every request it receives.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use rxstatus_core::{
    AirtableConfig, AirtableStore, ConnectionError, FieldUpdate, NewRecord, NonEmptyText,
    RecordId, RecordStore, WriteAction, WriteError,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

const TOKEN: &str = "patTEST";
const BASE: &str = "appTEST";
const TABLE: &str = "Pharmacy Status";
const PAGE_SIZE: usize = 2;

#[derive(Default)]
struct FakeTable {
    rows: Vec<(String, Value)>,
    next_id: usize,
    requests: Vec<Captured>,
}

#[derive(Clone, Debug)]
struct Captured {
    method: &'static str,
    query_offset: Option<String>,
    body: Option<Value>,
}

type Shared = Arc<Mutex<FakeTable>>;

fn error(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn check_access(headers: &HeaderMap, base: &str, table: &str) -> Result<(), Response> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if auth != format!("Bearer {TOKEN}") {
        return Err(error(
            StatusCode::UNAUTHORIZED,
            json!({"error": {"type": "AUTHENTICATION_REQUIRED", "message": "Authentication required"}}),
        ));
    }
    if table == "Locked" {
        return Err(error(
            StatusCode::FORBIDDEN,
            json!({"error": {"type": "INVALID_PERMISSIONS_OR_MODEL_NOT_FOUND", "message": "Invalid permissions"}}),
        ));
    }
    if base != BASE || (table != TABLE && table != "Locked") {
        return Err(error(StatusCode::NOT_FOUND, json!({"error": "NOT_FOUND"})));
    }
    Ok(())
}

fn record_json(id: &str, fields: &Value) -> Value {
    json!({"id": id, "createdTime": "2024-03-01T09:30:00.000Z", "fields": fields})
}

fn rejects_fields(fields: &Value) -> Option<Response> {
    (fields.get("Status") == Some(&json!("bogus"))).then(|| {
        error(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({"error": {"type": "INVALID_MULTIPLE_CHOICE_OPTIONS", "message": "Insufficient permissions to create new select option \"bogus\""}}),
        )
    })
}

async fn list_records(
    State(table): State<Shared>,
    headers: HeaderMap,
    Path((base, name)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(resp) = check_access(&headers, &base, &name) {
        return resp;
    }
    let mut table = table.lock().unwrap();
    let offset = query.get("offset").cloned();
    table.requests.push(Captured {
        method: "GET",
        query_offset: offset.clone(),
        body: None,
    });

    let start = offset.and_then(|o| o.parse::<usize>().ok()).unwrap_or(0);
    let end = (start + PAGE_SIZE).min(table.rows.len());
    let records: Vec<Value> = table.rows[start..end]
        .iter()
        .map(|(id, fields)| record_json(id, fields))
        .collect();

    let mut body = json!({ "records": records });
    if end < table.rows.len() {
        body["offset"] = json!(end.to_string());
    }
    Json(body).into_response()
}

async fn create_record(
    State(table): State<Shared>,
    headers: HeaderMap,
    Path((base, name)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = check_access(&headers, &base, &name) {
        return resp;
    }
    let mut table = table.lock().unwrap();
    table.requests.push(Captured {
        method: "POST",
        query_offset: None,
        body: Some(body.clone()),
    });
    let fields = body["fields"].clone();
    if let Some(resp) = rejects_fields(&fields) {
        return resp;
    }

    table.next_id += 1;
    let id = format!("recFAKE{:07}", table.next_id);
    table.rows.push((id.clone(), fields.clone()));
    Json(record_json(&id, &fields)).into_response()
}

async fn update_record(
    State(table): State<Shared>,
    headers: HeaderMap,
    Path((base, name, id)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = check_access(&headers, &base, &name) {
        return resp;
    }
    let mut table = table.lock().unwrap();
    table.requests.push(Captured {
        method: "PATCH",
        query_offset: None,
        body: Some(body.clone()),
    });
    if let Some(resp) = rejects_fields(&body["fields"]) {
        return resp;
    }

    let Some((_, fields)) = table.rows.iter_mut().find(|(row_id, _)| *row_id == id) else {
        return error(
            StatusCode::NOT_FOUND,
            json!({"error": {"type": "MODEL_ID_NOT_FOUND", "message": "Could not find a record with that ID"}}),
        );
    };
    if let (Some(stored), Some(changes)) = (fields.as_object_mut(), body["fields"].as_object()) {
        for (key, value) in changes {
            stored.insert(key.clone(), value.clone());
        }
    }
    let fields = fields.clone();
    Json(record_json(&id, &fields)).into_response()
}

async fn delete_record(
    State(table): State<Shared>,
    headers: HeaderMap,
    Path((base, name, id)): Path<(String, String, String)>,
) -> Response {
    if let Err(resp) = check_access(&headers, &base, &name) {
        return resp;
    }
    let mut table = table.lock().unwrap();
    table.requests.push(Captured {
        method: "DELETE",
        query_offset: None,
        body: None,
    });

    let Some(index) = table.rows.iter().position(|(row_id, _)| *row_id == id) else {
        return error(
            StatusCode::NOT_FOUND,
            json!({"error": {"type": "MODEL_ID_NOT_FOUND", "message": "Could not find a record with that ID"}}),
        );
    };
    table.rows.remove(index);
    Json(json!({"deleted": true, "id": id})).into_response()
}

/// Serve `app` on a loopback port from its own thread and return its origin.
fn serve(app: Router) -> Url {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("should bind");
    listener.set_nonblocking(true).expect("should set nonblocking");
    let addr = listener.local_addr().expect("should have address");

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("should build runtime");
        runtime.block_on(async move {
            let listener =
                tokio::net::TcpListener::from_std(listener).expect("should adopt listener");
            axum::serve(listener, app).await.expect("fake server failed");
        });
    });

    Url::parse(&format!("http://{addr}")).expect("should parse url")
}

struct FakeAirtable {
    api_url: Url,
    table: Shared,
}

impl FakeAirtable {
    fn start(rows: Vec<(&str, Value)>) -> Self {
        let table: Shared = Arc::new(Mutex::new(FakeTable {
            rows: rows
                .into_iter()
                .map(|(id, fields)| (id.to_string(), fields))
                .collect(),
            ..FakeTable::default()
        }));

        let app = Router::new()
            .route("/v0/:base/:table", get(list_records).post(create_record))
            .route(
                "/v0/:base/:table/:id",
                axum::routing::patch(update_record).delete(delete_record),
            )
            .with_state(table.clone());

        Self {
            api_url: serve(app),
            table,
        }
    }

    fn store(&self) -> AirtableStore {
        self.store_for(TOKEN, BASE, TABLE)
    }

    fn store_for(&self, token: &str, base: &str, table: &str) -> AirtableStore {
        AirtableStore::new(AirtableConfig::new(
            token,
            base,
            table,
            self.api_url.clone(),
            Duration::from_secs(5),
        ))
    }

    fn requests(&self) -> Vec<Captured> {
        self.table.lock().unwrap().requests.clone()
    }
}

fn text(s: &str) -> NonEmptyText {
    NonEmptyText::new(s).unwrap()
}

fn patient_row(name: &str) -> Value {
    json!({"Patient Name": name, "Pharmacy": "Clinton Pharmacy", "Status": "Plan Exclusion", "DOB": "2/5/1999"})
}

#[test]
fn test_list_follows_offsets_until_exhausted() {
    let fake = FakeAirtable::start(vec![
        ("rec1", patient_row("A")),
        ("rec2", patient_row("B")),
        ("rec3", patient_row("C")),
        ("rec4", patient_row("D")),
        ("rec5", json!({"Patient Name": "E"})),
    ]);

    let records = fake.store().list().expect("list should succeed");

    let ids: Vec<_> = records.iter().map(|r| r.id.as_str().to_string()).collect();
    assert_eq!(ids, vec!["rec1", "rec2", "rec3", "rec4", "rec5"]);
    assert_eq!(records[4].fields.pharmacy, None);
    assert!(records[0].created_time.is_some());

    let offsets: Vec<_> = fake
        .requests()
        .into_iter()
        .map(|r| r.query_offset)
        .collect();
    assert_eq!(offsets, vec![None, Some("2".into()), Some("4".into())]);
}

#[test]
fn test_list_classifies_access_failures() {
    let fake = FakeAirtable::start(vec![]);

    assert_eq!(
        fake.store_for("patWRONG", BASE, TABLE).list(),
        Err(ConnectionError::Unauthorized)
    );
    assert_eq!(
        fake.store_for(TOKEN, BASE, "Locked").list(),
        Err(ConnectionError::Forbidden)
    );
    assert_eq!(
        fake.store_for(TOKEN, "appMISSING", TABLE).list(),
        Err(ConnectionError::NotFound)
    );
}

#[test]
fn test_list_reports_transport_failure_as_unexpected() {
    // Bind and drop to get a port nothing listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .expect("should bind")
        .port();
    let store = AirtableStore::new(AirtableConfig::new(
        TOKEN,
        BASE,
        TABLE,
        Url::parse(&format!("http://127.0.0.1:{port}")).unwrap(),
        Duration::from_secs(2),
    ));

    let err = store.list().expect_err("list should fail");
    assert!(matches!(err, ConnectionError::Unexpected(_)));
    assert!(err
        .to_string()
        .starts_with("Unexpected error while connecting to Airtable: "));
}

#[test]
fn test_create_update_delete_round_trip() {
    let fake = FakeAirtable::start(vec![]);
    let store = fake.store();

    let id = store
        .create(&NewRecord {
            patient_name: text("Jane"),
            pharmacy: text("Main St Pharmacy"),
            status: text("Active"),
            dob: text("1/1/1990"),
        })
        .expect("create should succeed");
    assert_eq!(id.as_str(), "recFAKE0000001");

    let update = FieldUpdate::new(None, None, Some(text("Inactive")), None).unwrap();
    store.update(&id, &update).expect("update should succeed");

    let record = &store.list().expect("list should succeed")[0];
    assert_eq!(record.fields.status.as_deref(), Some("Inactive"));
    assert_eq!(record.fields.patient_name.as_deref(), Some("Jane"));

    store.delete(&id).expect("first delete should succeed");
    assert_eq!(
        store.delete(&id),
        Err(WriteError::NotFound {
            id: "recFAKE0000001".into()
        })
    );

    let requests = fake.requests();
    let post = requests.iter().find(|r| r.method == "POST").unwrap();
    assert_eq!(
        post.body,
        Some(json!({"fields": {
            "Patient Name": "Jane",
            "Pharmacy": "Main St Pharmacy",
            "Status": "Active",
            "DOB": "1/1/1990",
        }}))
    );
    let patch = requests.iter().find(|r| r.method == "PATCH").unwrap();
    assert_eq!(patch.body, Some(json!({"fields": {"Status": "Inactive"}})));
}

#[test]
fn test_write_failures_are_classified() {
    let fake = FakeAirtable::start(vec![("rec1", patient_row("A"))]);
    let id = RecordId::new("rec1").unwrap();

    let bogus = FieldUpdate::new(None, None, Some(text("bogus")), None).unwrap();
    let err = fake
        .store()
        .update(&id, &bogus)
        .expect_err("update should be rejected");
    assert!(matches!(err, WriteError::InvalidFormat { .. }));
    assert!(err.to_string().contains("INVALID_MULTIPLE_CHOICE_OPTIONS"));

    let err = fake
        .store_for(TOKEN, BASE, "Locked")
        .delete(&id)
        .expect_err("delete should be forbidden");
    assert_eq!(
        err.to_string(),
        "Permission denied. The access token cannot delete records in this table."
    );

    let missing = RecordId::new("recGONE").unwrap();
    let update = FieldUpdate::new(Some(text("Jane")), None, None, None).unwrap();
    assert_eq!(
        fake.store().update(&missing, &update),
        Err(WriteError::NotFound {
            id: "recGONE".into()
        })
    );
}

#[test]
fn test_list_rejects_repeated_offset() {
    async fn same_page() -> Json<Value> {
        Json(json!({"records": [{"id": "rec1", "fields": {}}], "offset": "same"}))
    }
    let api_url = serve(Router::new().route("/v0/:base/:table", get(same_page)));
    let store = AirtableStore::new(AirtableConfig::new(
        TOKEN,
        BASE,
        TABLE,
        api_url,
        Duration::from_secs(5),
    ));

    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(store.list());
    });
    let result = rx
        .recv_timeout(Duration::from_secs(10))
        .expect("list should stop on a repeated offset");

    let err = result.expect_err("list should fail");
    assert!(matches!(err, ConnectionError::Unexpected(_)));
    assert!(err.to_string().contains("repeated pagination offset"));
}

#[test]
fn test_hung_backend_times_out_as_unexpected() {
    // Accept connections and never answer.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("should bind");
    let addr = listener.local_addr().expect("should have address");
    std::thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });

    let store = AirtableStore::new(AirtableConfig::new(
        TOKEN,
        BASE,
        TABLE,
        Url::parse(&format!("http://{addr}")).unwrap(),
        Duration::from_secs(1),
    ));

    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let started = std::time::Instant::now();
        let list = store.list();
        let elapsed = started.elapsed();
        let delete = store.delete(&RecordId::new("rec1").unwrap());
        let _ = tx.send((list, elapsed, delete));
    });
    let (list, elapsed, delete) = rx
        .recv_timeout(Duration::from_secs(10))
        .expect("calls should time out instead of hanging");

    assert!(matches!(list, Err(ConnectionError::Unexpected(_))));
    assert!(elapsed < Duration::from_secs(5));
    assert!(matches!(
        delete,
        Err(WriteError::Failed {
            action: WriteAction::Delete,
            ..
        })
    ));
}
