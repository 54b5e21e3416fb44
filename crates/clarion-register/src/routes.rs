//! Call Register HTTP surface (§6). Every endpoint takes query-string
//! parameters, including the POSTs — matching the rest of this system's
//! convention of query-driven, body-less requests.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono_tz::Tz;
use clarion_core::error::{Error, Result};
use clarion_core::time::local_to_utc;
use serde::Deserialize;
use serde_json::json;

use crate::config::CallRegisterConfig;
use crate::db::{AckOutcome, RegisterDb};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<RegisterDb>,
    pub config: Arc<CallRegisterConfig>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/register_call", post(register_call))
        .route("/msg", post(voice_message))
        .route("/ack", get(acknowledge))
        .route("/heard", get(heard))
        .route("/scheduled_call", post(scheduled_call))
        .route("/healthz", get(healthz))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct RegisterCallParams {
    phone: String,
    message: String,
    asterisk_chan: String,
    #[serde(default)]
    oncall: bool,
    #[serde(default)]
    backup_callee: bool,
}

async fn register_call(State(state): State<AppState>, Query(params): Query<RegisterCallParams>) -> Result<Json<serde_json::Value>> {
    let call = state
        .db
        .register_call(
            &params.phone,
            &params.message,
            &params.asterisk_chan,
            params.oncall,
            params.backup_callee,
            state.config.times_to_dial,
            state.config.seconds_to_forget,
        )
        .await?;
    Ok(Json(json!({
        "status": 200,
        "id": call.id,
        "dialed_times": call.dialed_times,
        "call_chk_sum": call.call_chk_sum,
        "msg_chk_sum": call.msg_chk_sum,
    })))
}

#[derive(Debug, Deserialize)]
struct ChanParam {
    asterisk_chan: String,
}

async fn voice_message(State(state): State<AppState>, Query(params): Query<ChanParam>) -> Result<Json<serde_json::Value>> {
    let found = state.db.voice_message(&params.asterisk_chan).await?;
    let (message, msg_chk_sum) = found.unwrap_or_default();
    Ok(Json(json!({ "status": 200, "message": message, "msg_chk_sum": msg_chk_sum })))
}

/// §4.1/§7: acknowledgement outside the firing window is a `StateConflict`,
/// surfaced as HTTP 400 (§8 scenario 6) rather than a 200 with
/// `acknowledged:false`.
async fn acknowledge(State(state): State<AppState>, Query(params): Query<ChanParam>) -> Result<Json<serde_json::Value>> {
    match state.db.acknowledge(&params.asterisk_chan).await? {
        AckOutcome::Acknowledged => Ok(Json(json!({ "status": 200, "acknowledged": true }))),
        AckOutcome::OutsideWindow => Err(Error::StateConflict(
            "acknowledgement arrived outside the firing period".to_string(),
        )),
        AckOutcome::NotFound => Err(Error::StateConflict("no call registered for this channel".to_string())),
    }
}

async fn heard(State(state): State<AppState>, Query(params): Query<ChanParam>) -> Result<Json<serde_json::Value>> {
    let found = state.db.heard(&params.asterisk_chan).await?;
    Ok(Json(json!({ "status": 200, "found": found })))
}

#[derive(Debug, Deserialize)]
struct ScheduledCallParams {
    phone: String,
    message: String,
    scheduled_at: String,
}

async fn scheduled_call(State(state): State<AppState>, Query(params): Query<ScheduledCallParams>) -> Result<Json<serde_json::Value>> {
    let naive = chrono::NaiveDateTime::parse_from_str(&params.scheduled_at, "%Y-%m-%dT%H:%M:%S")
        .map_err(|e| Error::StateConflict(format!("invalid scheduled_at: {e}")))?;
    let zone: Tz = state
        .config
        .local_timezone
        .parse()
        .map_err(|_| Error::Fatal(format!("invalid configured timezone: {}", state.config.local_timezone)))?;
    let scheduled_at_utc = local_to_utc(naive, zone)?;

    let scheduled = state.db.scheduled_call(&params.phone, &params.message, scheduled_at_utc).await?;
    Ok(Json(json!({ "status": 200, "id": scheduled.id, "scheduled_at": scheduled.scheduled_at })))
}

async fn healthz(State(state): State<AppState>) -> Json<serde_json::Value> {
    if state.db.healthy().await {
        Json(json!({ "status": "ok" }))
    } else {
        Json(json!({ "status": "degraded" }))
    }
}
