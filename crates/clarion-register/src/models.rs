//! Row types for the `calls`, `asterisk_ws_events` and `scheduled_calls`
//! tables (§3).

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Call {
    pub id: String,
    pub phone: String,
    pub message: String,
    pub asterisk_chan: String,
    pub msg_chk_sum: String,
    pub call_chk_sum: String,
    pub unique_chk_sum: String,
    pub times_to_dial: i64,
    pub dialed_times: i64,
    pub seconds_to_forget: i64,
    pub first_dial: DateTime<Utc>,
    pub last_dial: DateTime<Utc>,
    pub heard_at: DateTime<Utc>,
    pub acknowledge_at: DateTime<Utc>,
    pub cycle_done: bool,
    pub oncall: bool,
    pub backup_callee: bool,
    pub call_backup_callee_number_calls: i64,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ScheduledCall {
    pub id: String,
    pub phone: String,
    pub message: String,
    pub call_chk_sum: String,
    pub inserted_at: DateTime<Utc>,
    pub scheduled_at: DateTime<Utc>,
}

/// One raw PBX WebSocket frame (§4.4). Never mutated once inserted.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PbxEvent {
    pub id: String,
    pub asterisk_chan: String,
    pub event_type: String,
    pub json_data: String,
    pub received_at: DateTime<Utc>,
}
