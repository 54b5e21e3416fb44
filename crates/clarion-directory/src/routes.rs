//! Address Book HTTP surface (§6). `/entries`, `/entries/export` and
//! `/entries/import` are administrative surfaces gated behind HTTP Basic
//! auth (§3 `User` model); `/oncall` is read by peer services and is not.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use crate::config::AddressBookConfig;
use crate::csv_io;
use crate::db::DirectoryDb;
use crate::models::AddressBookEntry;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DirectoryDb>,
    pub config: Arc<AddressBookConfig>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/oncall", get(oncall))
        .route("/entries", post(upsert_entry))
        .route("/entries/export", get(export_entries))
        .route("/entries/import", post(import_entries))
        .route("/healthz", get(healthz))
        .with_state(state)
}

fn check_basic_auth(headers: &HeaderMap, config: &AddressBookConfig) -> Option<Response> {
    let header = headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    let Some(header) = header else {
        return Some(unauthorized());
    };
    let Some(encoded) = header.strip_prefix("Basic ") else {
        return Some(unauthorized());
    };
    let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(encoded) else {
        return Some(unauthorized());
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return Some(unauthorized());
    };
    match decoded.split_once(':') {
        Some((user, pass)) if user == config.basic_auth_username && pass == config.basic_auth_password => None,
        _ => Some(unauthorized()),
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(axum::http::header::WWW_AUTHENTICATE, "Basic realm=\"clarion-directory\"")],
        Json(json!({ "status": 401, "message": "authentication required" })),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct AtParam {
    #[serde(default)]
    at: Option<chrono::DateTime<chrono::Utc>>,
}

async fn oncall(State(state): State<AppState>, Query(params): Query<AtParam>) -> clarion_core::error::Result<Json<serde_json::Value>> {
    let at = params.at.unwrap_or_else(chrono::Utc::now);
    let candidates = state.db.oncall(at).await?;
    Ok(Json(json!({ "status": 200, "contacts": candidates })))
}

async fn upsert_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(entry): Json<AddressBookEntry>,
) -> Response {
    if let Some(denied) = check_basic_auth(&headers, &state.config) {
        return denied;
    }
    match state.db.upsert_entry(&entry).await {
        Ok(id) => Json(json!({ "status": 200, "id": id })).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn export_entries(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(denied) = check_basic_auth(&headers, &state.config) {
        return denied;
    }
    match csv_io::export(&state.db).await {
        Ok(csv) => (StatusCode::OK, [(axum::http::header::CONTENT_TYPE, "text/csv")], csv).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn import_entries(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Some(denied) = check_basic_auth(&headers, &state.config) {
        return denied;
    }
    let csv_data = String::from_utf8_lossy(&body);
    let summary = csv_io::import(&state.db, &csv_data).await;
    Json(json!({ "status": 200, "summary": summary })).into_response()
}

async fn healthz(State(state): State<AppState>) -> Json<serde_json::Value> {
    if state.db.healthy().await {
        Json(json!({ "status": "ok" }))
    } else {
        Json(json!({ "status": "degraded" }))
    }
}
