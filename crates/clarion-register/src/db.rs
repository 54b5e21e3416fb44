//! Database-backed implementation of the Call Register's operations (§4.1).
//!
//! Every mutation that must observe "at most one active cycle per
//! `call_chk_sum`" runs inside a `BEGIN IMMEDIATE` transaction so the
//! read-then-write is atomic under SQLite's single-writer model (§5).

use chrono::{DateTime, Duration, Utc};
use clarion_core::checksum;
use clarion_core::time::unset;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{Call, PbxEvent, ScheduledCall};

/// Outcome of an acknowledgement attempt (§4.1, §7 `StateConflict`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    NotFound,
    OutsideWindow,
    Acknowledged,
}

#[derive(Clone)]
pub struct RegisterDb {
    pool: SqlitePool,
}

impl RegisterDb {
    pub async fn connect(database_url: &str, max_connections: u32) -> clarion_core::error::Result<Self> {
        let options: SqliteConnectOptions = database_url.parse()?;
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options.create_if_missing(true))
            .await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| clarion_core::Error::Fatal(format!("migration failed: {e}")))?;
        Ok(Self { pool })
    }

    pub async fn connect_in_memory() -> clarion_core::error::Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn healthy(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    /// §4.1 register_call.
    pub async fn register_call(
        &self,
        phone: &str,
        message: &str,
        asterisk_chan: &str,
        oncall: bool,
        backup_callee: bool,
        times_to_dial: i64,
        seconds_to_forget: i64,
    ) -> clarion_core::error::Result<Call> {
        let now = Utc::now();
        let call_chk_sum = checksum::call_checksum(phone, message);
        let msg_chk_sum = checksum::message_checksum(message);

        // `pool.begin()` issues a plain `BEGIN`, and SQLite refuses a
        // `BEGIN IMMEDIATE` nested inside an already-open transaction. Take a
        // raw connection and issue `BEGIN IMMEDIATE` on it directly so the
        // write lock is actually acquired up front (§5's stand-in for
        // `SELECT ... FOR UPDATE`) instead of silently not happening.
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let outcome = register_call_locked(
            &mut conn,
            phone,
            message,
            asterisk_chan,
            oncall,
            backup_callee,
            times_to_dial,
            seconds_to_forget,
            now,
            &call_chk_sum,
            &msg_chk_sum,
        )
        .await;

        finish_locked(&mut conn, outcome).await
    }

    /// §4.1 voice_message. Returns `None` for an unknown channel; the
    /// caller maps that to an empty-string pair.
    pub async fn voice_message(&self, asterisk_chan: &str) -> clarion_core::error::Result<Option<(String, String)>> {
        let row = sqlx::query("SELECT message, msg_chk_sum FROM calls WHERE asterisk_chan = ?1 ORDER BY last_dial DESC LIMIT 1")
            .bind(asterisk_chan)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| (r.get::<String, _>("message"), r.get::<String, _>("msg_chk_sum"))))
    }

    /// §4.1 acknowledge. Distinguishes "no such channel" from "acknowledged
    /// outside the firing window" so the HTTP layer can surface a 400 for
    /// the latter (§7, §8) while still recording `acknowledge_at` on the
    /// row either way.
    pub async fn acknowledge(&self, asterisk_chan: &str) -> clarion_core::error::Result<AckOutcome> {
        let now = Utc::now();
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let outcome = acknowledge_locked(&mut conn, asterisk_chan, now).await;
        finish_locked(&mut conn, outcome).await
    }

    /// §4.1 heard.
    pub async fn heard(&self, asterisk_chan: &str) -> clarion_core::error::Result<bool> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE calls SET heard_at = ?1 WHERE id = (SELECT id FROM calls WHERE asterisk_chan = ?2 ORDER BY last_dial DESC LIMIT 1)",
        )
        .bind(now.to_rfc3339())
        .bind(asterisk_chan)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// §4.1 scheduled_call. `scheduled_at_utc` has already been converted
    /// from local wall-clock time by the caller (clarion-core::time,
    /// DST-ambiguity is a caller-side error, not a register concern).
    pub async fn scheduled_call(
        &self,
        phone: &str,
        message: &str,
        scheduled_at_utc: DateTime<Utc>,
    ) -> clarion_core::error::Result<ScheduledCall> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let call_chk_sum = checksum::call_checksum(phone, message);
        sqlx::query(
            "INSERT INTO scheduled_calls (id, phone, message, call_chk_sum, inserted_at, scheduled_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&id)
        .bind(phone)
        .bind(message)
        .bind(&call_chk_sum)
        .bind(now.to_rfc3339())
        .bind(scheduled_at_utc.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(ScheduledCall {
            id,
            phone: phone.to_string(),
            message: message.to_string(),
            call_chk_sum,
            inserted_at: now,
            scheduled_at: scheduled_at_utc,
        })
    }

    /// Appends a raw PBX frame to the append-only event log (§4.4 step 1).
    /// Linked into directly by `clarion-monitor` — there is no HTTP route
    /// for this in §6, so the event monitor shares this crate's database
    /// layer rather than going over the wire for every frame.
    pub async fn record_pbx_event(
        &self,
        asterisk_chan: &str,
        event_type: &str,
        json_data: &str,
    ) -> clarion_core::error::Result<()> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO asterisk_ws_events (id, asterisk_chan, event_type, json_data, received_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&id)
        .bind(asterisk_chan)
        .bind(event_type)
        .bind(json_data)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// §4.3 step 1 candidate set, shared with `clarion-recaller` the same
    /// way `record_pbx_event` is shared with `clarion-monitor`.
    pub async fn retry_candidates(
        &self,
        seconds_to_forget_ceiling: DateTime<Utc>,
        seconds_to_forget_floor: DateTime<Utc>,
    ) -> clarion_core::error::Result<Vec<Call>> {
        let rows = sqlx::query_as::<_, Call>(
            r#"SELECT * FROM calls
               WHERE dialed_times < times_to_dial
                 AND cycle_done = 0
                 AND first_dial >= ?1 AND first_dial <= ?2"#,
        )
        .bind(seconds_to_forget_ceiling.to_rfc3339())
        .bind(seconds_to_forget_floor.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// §4.3 step 2 candidate set.
    pub async fn backup_escalation_candidates(
        &self,
        now: DateTime<Utc>,
        call_backup_callee_max_times: i64,
    ) -> clarion_core::error::Result<Vec<Call>> {
        let unset_ts = unset().to_rfc3339();
        let rows = sqlx::query_as::<_, Call>(
            r#"SELECT * FROM calls
               WHERE acknowledge_at = ?1
                 AND cycle_done = 0
                 AND oncall = 1
                 AND call_backup_callee_number_calls < ?2
                 AND datetime(first_dial, '+' || seconds_to_forget || ' seconds') < datetime(?3)"#,
        )
        .bind(unset_ts)
        .bind(call_backup_callee_max_times)
        .bind(now.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Raises `call_backup_callee_number_calls` for one call cycle.
    /// Returns `false` (no-op) if the cap has already been reached,
    /// guarding against a double-increment race between sweeps.
    pub async fn increment_backup_count(&self, call_id: &str, max_times: i64) -> clarion_core::error::Result<bool> {
        let result = sqlx::query(
            "UPDATE calls SET call_backup_callee_number_calls = call_backup_callee_number_calls + 1
             WHERE id = ?1 AND call_backup_callee_number_calls < ?2",
        )
        .bind(call_id)
        .bind(max_times)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn recent_pbx_events(&self, limit: i64) -> clarion_core::error::Result<Vec<PbxEvent>> {
        let rows = sqlx::query_as::<_, PbxEvent>(
            "SELECT * FROM asterisk_ws_events ORDER BY received_at DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

/// Runs inside the `BEGIN IMMEDIATE` acquired by `register_call`: finds the
/// active cycle (if any) for `call_chk_sum` and inserts or updates it.
#[allow(clippy::too_many_arguments)]
async fn register_call_locked(
    conn: &mut sqlx::SqliteConnection,
    phone: &str,
    message: &str,
    asterisk_chan: &str,
    oncall: bool,
    backup_callee: bool,
    times_to_dial: i64,
    seconds_to_forget: i64,
    now: DateTime<Utc>,
    call_chk_sum: &str,
    msg_chk_sum: &str,
) -> clarion_core::error::Result<Call> {
    let window_start = now - Duration::seconds(seconds_to_forget);
    let existing = sqlx::query_as::<_, Call>(
        r#"SELECT * FROM calls
           WHERE call_chk_sum = ?1 AND cycle_done = 0 AND first_dial >= ?2 AND first_dial <= ?3
           ORDER BY first_dial DESC LIMIT 1"#,
    )
    .bind(call_chk_sum)
    .bind(window_start.to_rfc3339())
    .bind(now.to_rfc3339())
    .fetch_optional(&mut *conn)
    .await?;

    match existing {
        None => {
            let id = Uuid::new_v4().to_string();
            let unique_chk_sum = checksum::unique_checksum(phone, message, now);
            sqlx::query(
                r#"INSERT INTO calls
                   (id, phone, message, asterisk_chan, msg_chk_sum, call_chk_sum, unique_chk_sum,
                    times_to_dial, dialed_times, seconds_to_forget, first_dial, last_dial,
                    heard_at, acknowledge_at, cycle_done, oncall, backup_callee,
                    call_backup_callee_number_calls)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?10, ?10, ?11, ?11, 0, ?12, ?13, 0)"#,
            )
            .bind(&id)
            .bind(phone)
            .bind(message)
            .bind(asterisk_chan)
            .bind(msg_chk_sum)
            .bind(call_chk_sum)
            .bind(&unique_chk_sum)
            .bind(times_to_dial)
            .bind(seconds_to_forget)
            .bind(now.to_rfc3339())
            .bind(unset().to_rfc3339())
            .bind(oncall)
            .bind(backup_callee)
            .execute(&mut *conn)
            .await?;
            fetch_call_by_id(conn, &id).await
        }
        Some(row) => {
            let dialed_times = (row.dialed_times + 1).min(row.times_to_dial);
            sqlx::query(r#"UPDATE calls SET last_dial = ?1, dialed_times = ?2, asterisk_chan = ?3 WHERE id = ?4"#)
                .bind(now.to_rfc3339())
                .bind(dialed_times)
                .bind(asterisk_chan)
                .bind(&row.id)
                .execute(&mut *conn)
                .await?;
            fetch_call_by_id(conn, &row.id).await
        }
    }
}

/// Runs inside the `BEGIN IMMEDIATE` acquired by `acknowledge`.
async fn acknowledge_locked(
    conn: &mut sqlx::SqliteConnection,
    asterisk_chan: &str,
    now: DateTime<Utc>,
) -> clarion_core::error::Result<AckOutcome> {
    let row = sqlx::query_as::<_, Call>("SELECT * FROM calls WHERE asterisk_chan = ?1 ORDER BY last_dial DESC LIMIT 1")
        .bind(asterisk_chan)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(call) = row else {
        return Ok(AckOutcome::NotFound);
    };

    let deadline = call.first_dial + Duration::seconds(call.seconds_to_forget);
    let in_window = now <= deadline;

    sqlx::query("UPDATE calls SET acknowledge_at = ?1, cycle_done = cycle_done OR ?2 WHERE id = ?3")
        .bind(now.to_rfc3339())
        .bind(in_window)
        .bind(&call.id)
        .execute(&mut *conn)
        .await?;

    if in_window {
        sqlx::query("UPDATE calls SET cycle_done = 1 WHERE msg_chk_sum = ?1 AND oncall = 1 AND cycle_done = 0")
            .bind(&call.msg_chk_sum)
            .execute(&mut *conn)
            .await?;
    }

    Ok(if in_window { AckOutcome::Acknowledged } else { AckOutcome::OutsideWindow })
}

/// Commits on success, rolls back on error, and returns the original
/// result either way.
async fn finish_locked<T>(
    conn: &mut sqlx::SqliteConnection,
    result: clarion_core::error::Result<T>,
) -> clarion_core::error::Result<T> {
    match result {
        Ok(value) => {
            sqlx::query("COMMIT").execute(&mut *conn).await?;
            Ok(value)
        }
        Err(e) => {
            let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
            Err(e)
        }
    }
}

async fn fetch_call_by_id(conn: &mut sqlx::SqliteConnection, id: &str) -> clarion_core::error::Result<Call> {
    let call = sqlx::query_as::<_, Call>("SELECT * FROM calls WHERE id = ?1")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(call)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_call_creates_a_fresh_cycle() {
        let db = RegisterDb::connect_in_memory().await.unwrap();
        let call = db
            .register_call("+15550001", "fire", "chan-1", false, false, 3, 300)
            .await
            .unwrap();
        assert_eq!(call.dialed_times, 1);
        assert!(!call.cycle_done);
    }

    #[tokio::test]
    async fn register_call_dedups_within_the_window() {
        let db = RegisterDb::connect_in_memory().await.unwrap();
        db.register_call("+15550001", "fire", "chan-1", false, false, 3, 300)
            .await
            .unwrap();
        let second = db
            .register_call("+15550001", "fire", "chan-2", false, false, 3, 300)
            .await
            .unwrap();
        assert_eq!(second.dialed_times, 2);
        assert_eq!(second.asterisk_chan, "chan-2");
    }

    #[tokio::test]
    async fn register_call_clamps_dialed_times_at_the_cap() {
        let db = RegisterDb::connect_in_memory().await.unwrap();
        for i in 0..5 {
            db.register_call("+15550001", "fire", &format!("chan-{i}"), false, false, 2, 300)
                .await
                .unwrap();
        }
        let last = db
            .register_call("+15550001", "fire", "chan-last", false, false, 2, 300)
            .await
            .unwrap();
        assert_eq!(last.dialed_times, 2);
    }

    #[tokio::test]
    async fn acknowledge_inside_window_closes_the_cycle() {
        let db = RegisterDb::connect_in_memory().await.unwrap();
        db.register_call("+15550001", "fire", "chan-1", false, false, 3, 300)
            .await
            .unwrap();
        let outcome = db.acknowledge("chan-1").await.unwrap();
        assert_eq!(outcome, AckOutcome::Acknowledged);
    }

    #[tokio::test]
    async fn acknowledge_outside_the_firing_window_does_not_close_the_cycle() {
        let db = RegisterDb::connect_in_memory().await.unwrap();
        db.register_call("+15550001", "fire", "chan-1", false, false, 3, 0)
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        let outcome = db.acknowledge("chan-1").await.unwrap();
        assert_eq!(outcome, AckOutcome::OutsideWindow);

        let call = sqlx::query_as::<_, Call>("SELECT * FROM calls WHERE asterisk_chan = 'chan-1'")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert!(!call.cycle_done);
        assert!(!clarion_core::time::is_unset(call.acknowledge_at));
    }

    #[tokio::test]
    async fn acknowledge_unknown_channel_reports_not_found() {
        let db = RegisterDb::connect_in_memory().await.unwrap();
        let outcome = db.acknowledge("chan-ghost").await.unwrap();
        assert_eq!(outcome, AckOutcome::NotFound);
    }

    #[tokio::test]
    async fn acknowledge_cascades_to_oncall_siblings_with_same_message() {
        let db = RegisterDb::connect_in_memory().await.unwrap();
        db.register_call("+15550001", "fire", "chan-primary", true, false, 3, 300)
            .await
            .unwrap();
        db.register_call("+15550002", "fire", "chan-backup", true, true, 3, 300)
            .await
            .unwrap();
        db.acknowledge("chan-primary").await.unwrap();

        let backup = sqlx::query_as::<_, Call>("SELECT * FROM calls WHERE asterisk_chan = 'chan-backup'")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert!(backup.cycle_done);
    }

    #[tokio::test]
    async fn heard_sets_heard_at() {
        let db = RegisterDb::connect_in_memory().await.unwrap();
        db.register_call("+15550001", "fire", "chan-1", false, false, 3, 300)
            .await
            .unwrap();
        assert!(db.heard("chan-1").await.unwrap());
    }

    #[tokio::test]
    async fn voice_message_is_empty_for_unknown_channel() {
        let db = RegisterDb::connect_in_memory().await.unwrap();
        assert!(db.voice_message("chan-unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn backup_escalation_candidates_excludes_a_call_still_inside_its_firing_window() {
        // seconds_to_forget = 300 means the window hasn't expired yet; a
        // text comparison of `datetime(first_dial, '+300 seconds')` against
        // an unnormalized rfc3339 `now` (space vs 'T' separator) would
        // wrongly call this "expired" the instant it's registered.
        let db = RegisterDb::connect_in_memory().await.unwrap();
        db.register_call("oncall", "fire", "chan-primary", true, false, 3, 300)
            .await
            .unwrap();
        let candidates = db.backup_escalation_candidates(Utc::now(), 3).await.unwrap();
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn backup_escalation_candidates_includes_a_call_whose_window_has_expired() {
        let db = RegisterDb::connect_in_memory().await.unwrap();
        db.register_call("oncall", "fire", "chan-primary", true, false, 3, 0)
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let candidates = db.backup_escalation_candidates(Utc::now(), 3).await.unwrap();
        assert_eq!(candidates.len(), 1);
    }
}
