//! Scheduler HTTP surface (§6): a single endpoint, mirroring the Call
//! Register's own `/scheduled_call` but additionally handing the request
//! to the `DelayedDispatcher` (§4.7, §9).

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono_tz::Tz;
use clarion_core::error::{Error, Result};
use clarion_core::time::local_to_utc;
use clarion_register::RegisterDb;
use serde::Deserialize;
use serde_json::json;

use crate::config::SchedulerConfig;
use crate::dispatcher::DelayedDispatcher;

#[derive(Clone)]
pub struct AppState {
    pub register: Arc<RegisterDb>,
    pub dispatcher: Arc<dyn DelayedDispatcher>,
    pub config: Arc<SchedulerConfig>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/scheduled_call", post(scheduled_call))
        .route("/healthz", get(healthz))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ScheduledCallParams {
    phone: String,
    message: String,
    scheduled_at: String,
}

/// §4.7: parse wall-clock local time, convert to UTC (failing closed on a
/// DST-ambiguous or nonexistent instant), insert a `ScheduledCall` row for
/// UI visibility, and hand the payload to the delayed dispatcher with
/// delivery time = the resolved UTC instant.
async fn scheduled_call(State(state): State<AppState>, Query(params): Query<ScheduledCallParams>) -> Result<Json<serde_json::Value>> {
    let naive = chrono::NaiveDateTime::parse_from_str(&params.scheduled_at, "%Y-%m-%dT%H:%M:%S")
        .map_err(|e| Error::StateConflict(format!("invalid scheduled_at: {e}")))?;
    let zone: Tz = state
        .config
        .local_timezone
        .parse()
        .map_err(|_| Error::Fatal(format!("invalid configured timezone: {}", state.config.local_timezone)))?;
    let scheduled_at_utc = local_to_utc(naive, zone)?;

    let scheduled = state.register.scheduled_call(&params.phone, &params.message, scheduled_at_utc).await?;
    state.dispatcher.schedule(scheduled_at_utc, params.phone.clone(), params.message.clone());

    Ok(Json(json!({ "status": 200, "id": scheduled.id, "scheduled_at": scheduled.scheduled_at })))
}

async fn healthz(State(state): State<AppState>) -> Json<serde_json::Value> {
    if state.register.healthy().await {
        Json(json!({ "status": "ok" }))
    } else {
        Json(json!({ "status": "degraded" }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    struct NoopDispatcher {
        scheduled: std::sync::Mutex<Vec<(chrono::DateTime<chrono::Utc>, String, String)>>,
    }

    impl DelayedDispatcher for NoopDispatcher {
        fn schedule(&self, when: chrono::DateTime<chrono::Utc>, phone: String, message: String) {
            self.scheduled.lock().unwrap().push((when, phone, message));
        }
    }

    #[tokio::test]
    async fn scheduled_call_inserts_a_row_and_hands_off_to_the_dispatcher() {
        let register = Arc::new(RegisterDb::connect_in_memory().await.unwrap());
        let dispatcher = Arc::new(NoopDispatcher { scheduled: std::sync::Mutex::new(Vec::new()) });
        let config = Arc::new(SchedulerConfig {
            common: clarion_core::config::CommonConfig {
                bind_address: "127.0.0.1:0".to_string(),
                database_url: "sqlite::memory:".to_string(),
                log_level: "info".to_string(),
            },
            db_max_connections: 1,
            dialer_url: "http://dialer.example".to_string(),
            local_timezone: "America/New_York".to_string(),
            client_timeout_total_ms: 1000,
        });

        let state = AppState { register, dispatcher: dispatcher.clone(), config };
        let app = router(state);

        let request = Request::builder()
            .method("POST")
            .uri("/scheduled_call?phone=%2B15550001&message=fire&scheduled_at=2026-08-01T09%3A00%3A00")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        assert_eq!(dispatcher.scheduled.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn scheduled_call_rejects_a_dst_ambiguous_local_time() {
        let register = Arc::new(RegisterDb::connect_in_memory().await.unwrap());
        let dispatcher = Arc::new(NoopDispatcher { scheduled: std::sync::Mutex::new(Vec::new()) });
        let config = Arc::new(SchedulerConfig {
            common: clarion_core::config::CommonConfig {
                bind_address: "127.0.0.1:0".to_string(),
                database_url: "sqlite::memory:".to_string(),
                log_level: "info".to_string(),
            },
            db_max_connections: 1,
            dialer_url: "http://dialer.example".to_string(),
            local_timezone: "America/New_York".to_string(),
            client_timeout_total_ms: 1000,
        });

        let state = AppState { register, dispatcher, config };
        let app = router(state);

        // 2026-11-01 01:30 local occurs twice in America/New_York.
        let request = Request::builder()
            .method("POST")
            .uri("/scheduled_call?phone=%2B15550001&message=fire&scheduled_at=2026-11-01T01%3A30%3A00")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
        assert!(dispatcher.scheduled.lock().unwrap().is_empty());
    }
}
