// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.

use std::path::PathBuf;
use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use triage_core::timestamp::parse_iso8601;
use triage_core::{
    CategoryStats, HealthStatus, MessageRecord, RecordFilter, RecordPatch, TriageCategory,
    TriageError,
};
use triage_ingest::BatchPipeline;

use crate::server::GatewayState;

/// Query string for GET /messages.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    #[serde(default)]
    pub category: Option<String>,
    /// Inclusive lower bound on `occurred_at`, ISO-8601.
    #[serde(default)]
    pub start_date: Option<String>,
    /// Inclusive upper bound on `occurred_at`, ISO-8601.
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Request body for POST /messages/process.
#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    /// CSV file readable by the server process.
    pub file_path: PathBuf,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

fn error_response(status: StatusCode, detail: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            detail: detail.into(),
        }),
    )
        .into_response()
}

fn storage_failure(err: TriageError) -> Response {
    match err {
        TriageError::NotFound { .. } => error_response(StatusCode::NOT_FOUND, "Message not found"),
        other => {
            error!(error = %other, "storage request failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

/// GET /
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Healthcare Inbox Triage API" }))
}

/// GET /health
///
/// 200 while the store answers, 503 otherwise.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let (code, status, detail) = match state.storage.health_check().await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "ok", None),
        Ok(HealthStatus::Degraded(why)) => (StatusCode::OK, "degraded", Some(why)),
        Ok(HealthStatus::Unhealthy(why)) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", Some(why)),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", Some(e.to_string())),
    };
    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            detail,
        }),
    )
        .into_response()
}

/// GET /messages?category=&start_date=&end_date=
pub async fn list_messages(
    State(state): State<GatewayState>,
    Query(query): Query<MessageQuery>,
) -> Response {
    let filter = match parse_filter(&query) {
        Ok(filter) => filter,
        Err(detail) => return error_response(StatusCode::BAD_REQUEST, detail),
    };
    match state.storage.list(&filter).await {
        Ok(records) => Json::<Vec<MessageRecord>>(records).into_response(),
        Err(e) => storage_failure(e),
    }
}

/// Empty parameters (`?category=`) mean no filter.
fn parse_filter(query: &MessageQuery) -> Result<RecordFilter, String> {
    fn given(raw: &Option<String>) -> Option<&str> {
        raw.as_deref().filter(|v| !v.trim().is_empty())
    }
    let category = given(&query.category)
        .map(|raw| {
            TriageCategory::from_str(raw).map_err(|_| format!("invalid category `{raw}`"))
        })
        .transpose()?;
    let date = |name: &str, raw: Option<&str>| {
        raw.map(|value| {
            parse_iso8601(value).ok_or_else(|| format!("invalid {name} `{value}`"))
        })
        .transpose()
    };
    Ok(RecordFilter {
        category,
        start: date("start_date", given(&query.start_date))?,
        end: date("end_date", given(&query.end_date))?,
    })
}

/// PUT /messages/{message_id}
///
/// Partial update of `category`, `notes` and `is_read`.
pub async fn update_message(
    State(state): State<GatewayState>,
    Path(message_id): Path<String>,
    body: Result<Json<RecordPatch>, JsonRejection>,
) -> Response {
    let Json(patch) = match body {
        Ok(body) => body,
        Err(rejection) => return error_response(rejection.status(), rejection.body_text()),
    };
    match state.storage.update(&message_id, &patch).await {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Message not found"),
        Err(e) => storage_failure(e),
    }
}

/// GET /stats
pub async fn get_stats(State(state): State<GatewayState>) -> Response {
    match state.storage.stats().await {
        Ok(stats) => Json::<CategoryStats>(stats).into_response(),
        Err(e) => storage_failure(e),
    }
}

/// POST /messages/process
///
/// Runs the batch pipeline over a server-side CSV file. The report is returned
/// with 200 on completion and 500 on abort.
pub async fn process_batch(
    State(state): State<GatewayState>,
    Json(body): Json<ProcessRequest>,
) -> Response {
    info!(path = %body.file_path.display(), "batch run requested over HTTP");
    let pipeline = BatchPipeline::new(
        state.classifier.clone(),
        state.storage.clone(),
        state.ingest.clone(),
    );
    let report = pipeline.run_csv(&body.file_path).await;
    let status = if report.is_aborted() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    (status, Json(report)).into_response()
}
