//! Dialer HTTP surface (§6).

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::post;
use axum::{routing::get, Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::dialer::Dialer;
use crate::queue::CallQueue;
use crate::sms_client::SmsClient;

#[derive(Clone)]
pub struct AppState {
    pub dialer: Dialer,
    pub queue: CallQueue,
    pub sms: Arc<SmsClient>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/place_call", post(place_call))
        .route("/call_to_queue", post(call_to_queue))
        .route("/play", post(play))
        .route("/send_sms", post(send_sms))
        .route("/healthz", get(healthz))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct PlaceCallParams {
    phone: String,
    message: String,
    #[serde(default)]
    backup_callee: bool,
}

async fn place_call(State(state): State<AppState>, Query(params): Query<PlaceCallParams>) -> clarion_core::error::Result<Json<serde_json::Value>> {
    let outcome = state.dialer.place_call(&params.phone, &params.message, params.backup_callee).await?;
    Ok(Json(json!({ "status": outcome.status, "asterisk_chan": outcome.asterisk_chan })))
}

#[derive(Debug, Deserialize)]
struct CallToQueueParams {
    phone: String,
    message: String,
}

async fn call_to_queue(State(state): State<AppState>, Query(params): Query<CallToQueueParams>) -> clarion_core::error::Result<Json<serde_json::Value>> {
    state.queue.enqueue(params.phone, params.message)?;
    Ok(Json(json!({ "status": 200, "queued": true })))
}

#[derive(Debug, Deserialize)]
struct PlayParams {
    asterisk_chan: String,
    msg_chk_sum: String,
}

async fn play(State(state): State<AppState>, Query(params): Query<PlayParams>) -> clarion_core::error::Result<Json<serde_json::Value>> {
    let (play_status, continue_status) = state.dialer.play(&params.asterisk_chan, &params.msg_chk_sum).await?;
    Ok(Json(json!({ "status": play_status, "continue_status": continue_status })))
}

#[derive(Debug, Deserialize)]
struct SendSmsParams {
    phone: String,
    message: String,
}

async fn send_sms(State(state): State<AppState>, Query(params): Query<SendSmsParams>) -> clarion_core::error::Result<Json<serde_json::Value>> {
    let status = state.sms.send(&params.phone, &params.message).await?;
    Ok(Json(json!({ "status": status })))
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
