//! # API REST
//!
//! Web front end and REST API for RxStatus.
//!
//! Handles:
//! - The HTML record table and its add/edit/delete forms
//! - One-shot flash notices across the post/redirect/get cycle
//! - JSON endpoints with OpenAPI/Swagger documentation
//!
//! Record logic lives in `rxstatus-core`; this crate only moves requests in and pages out.

#![warn(rust_2018_idioms)]

pub mod flash;
pub mod page;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use rxstatus_core::{Notice, Record, RecordForm, RecordService};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub records: RecordService,
}

impl AppState {
    pub fn new(records: RecordService) -> Self {
        Self { records }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// One record as exposed by the JSON API.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordRes {
    pub id: String,
    /// RFC 3339 creation time, when the backend reports one.
    pub created_time: Option<String>,
    pub patient_name: Option<String>,
    pub pharmacy: Option<String>,
    pub status: Option<String>,
    pub dob: Option<String>,
}

impl From<Record> for RecordRes {
    fn from(record: Record) -> Self {
        Self {
            id: record.id.to_string(),
            created_time: record.created_time.map(|t| t.to_rfc3339()),
            patient_name: record.fields.patient_name,
            pharmacy: record.fields.pharmacy,
            status: record.fields.status,
            dob: record.fields.dob,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListRecordsRes {
    pub records: Vec<RecordRes>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, list_records),
    components(schemas(HealthRes, RecordRes, ListRecordsRes, ErrorRes))
)]
pub struct ApiDoc;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/add", post(add_record))
        .route("/edit", post(edit_record))
        .route("/delete", post(delete_record))
        .route("/health", get(health))
        .route("/api/records", get(list_records))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Render the record table, or the connection diagnostic when the list cannot be fetched.
///
/// A flash notice left by the previous action is shown once and its cookie cleared.
#[axum::debug_handler]
async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let notice = flash::take(&headers);
    let service = state.records.clone();

    let mut response = match tokio::task::spawn_blocking(move || service.view()).await {
        Ok(Ok(records)) => Html(page::render_records(&records, notice.as_ref())).into_response(),
        Ok(Err(e)) => {
            tracing::error!("List records error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(page::render_connection_error(&e, notice.as_ref())),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("List records task failed: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(page::render_internal_error()),
            )
                .into_response()
        }
    };

    if flash::present(&headers) {
        response.headers_mut().append(
            header::SET_COOKIE,
            HeaderValue::from_static(flash::CLEARED_COOKIE),
        );
    }
    response
}

#[axum::debug_handler]
async fn add_record(State(state): State<AppState>, Form(form): Form<RecordForm>) -> Response {
    perform(state, form, RecordService::add).await
}

#[axum::debug_handler]
async fn edit_record(State(state): State<AppState>, Form(form): Form<RecordForm>) -> Response {
    perform(state, form, RecordService::edit).await
}

#[axum::debug_handler]
async fn delete_record(State(state): State<AppState>, Form(form): Form<RecordForm>) -> Response {
    perform(state, form, RecordService::delete).await
}

/// Run one write action off the async runtime and redirect back to the table with its notice.
async fn perform(
    state: AppState,
    form: RecordForm,
    action: fn(&RecordService, &RecordForm) -> Notice,
) -> Response {
    let service = state.records.clone();
    match tokio::task::spawn_blocking(move || action(&service, &form)).await {
        Ok(notice) => redirect_with(&notice),
        Err(e) => {
            tracing::error!("Record action task failed: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(page::render_internal_error()),
            )
                .into_response()
        }
    }
}

fn redirect_with(notice: &Notice) -> Response {
    let mut response = Redirect::to("/").into_response();
    match flash::set_cookie(notice) {
        Some(cookie) => {
            response.headers_mut().append(header::SET_COOKIE, cookie);
        }
        None => tracing::warn!("Dropped notice that could not be encoded: {}", notice),
    }
    response
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint
///
/// Used for monitoring and load balancer health checks. Does not touch the record backend.
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "RxStatus is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/api/records",
    responses(
        (status = 200, description = "All records in backend order", body = ListRecordsRes),
        (status = 502, description = "The record backend could not be read", body = ErrorRes),
        (status = 500, description = "Internal server error")
    )
)]
/// List all records as JSON
///
/// # Returns
/// * `Ok(Json<ListRecordsRes>)` - Every record, following backend pagination to the end
/// * `Err((StatusCode, Json<ErrorRes>))` - The connection diagnostic with 502, or 500 if the
///   blocking task failed
async fn list_records(
    State(state): State<AppState>,
) -> Result<Json<ListRecordsRes>, (StatusCode, Json<ErrorRes>)> {
    let service = state.records.clone();
    match tokio::task::spawn_blocking(move || service.view()).await {
        Ok(Ok(records)) => Ok(Json(ListRecordsRes {
            records: records.into_iter().map(RecordRes::from).collect(),
        })),
        Ok(Err(e)) => {
            tracing::error!("List records error: {}", e);
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ErrorRes {
                    error: e.to_string(),
                }),
            ))
        }
        Err(e) => {
            tracing::error!("List records task failed: {:?}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorRes {
                    error: "Internal error".into(),
                }),
            ))
        }
    }
}
