//! Audio Cache HTTP surface (§6).

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::services::ServeDir;

use crate::cache::AudioCache;

#[derive(Clone)]
pub struct AppState {
    pub cache: AudioCache,
}

pub fn router(state: AppState, audio_dir: &str) -> Router {
    Router::new()
        .route("/make_audio", post(make_audio))
        .route("/is_audio_ready", get(is_audio_ready))
        .route("/healthz", get(healthz))
        .with_state(state)
        .nest_service("/audio", ServeDir::new(audio_dir))
}

#[derive(Debug, Deserialize)]
struct MakeAudioParams {
    message: String,
    msg_chk_sum: String,
}

async fn make_audio(State(state): State<AppState>, Query(params): Query<MakeAudioParams>) -> Json<serde_json::Value> {
    let outcome = state.cache.make_audio(&params.message, &params.msg_chk_sum).await;
    Json(json!({ "status": outcome.status, "cached": outcome.cached }))
}

#[derive(Debug, Deserialize)]
struct IsReadyParams {
    msg_chk_sum: String,
}

async fn is_audio_ready(State(state): State<AppState>, Query(params): Query<IsReadyParams>) -> Json<serde_json::Value> {
    let exists = state.cache.is_ready(&params.msg_chk_sum).await;
    Json(json!({ "status": 200, "exists": exists }))
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
