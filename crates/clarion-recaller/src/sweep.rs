//! The retry and backup-escalation sweeps (§4.3), independent of the
//! periodic loop that drives them so each can be exercised against an
//! in-memory register and fake peer clients.

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use clarion_register::RegisterDb;

use crate::dialer_client::PlaceCaller;
use crate::directory_client::OnCallDirectory;

/// §4.3 step 1: re-dial every call still inside its retry window that
/// hasn't exhausted `times_to_dial`, pacing requests by `sleep_and_retry`
/// so the PBX isn't hit in a burst.
pub async fn retry_sweep(
    register: &RegisterDb,
    dialer: &dyn PlaceCaller,
    seconds_to_forget: i64,
    sleep_and_retry: Duration,
) -> clarion_core::error::Result<usize> {
    let now = Utc::now();
    let window_start = now - ChronoDuration::seconds(seconds_to_forget);
    let window_end = now
        - ChronoDuration::from_std(sleep_and_retry).unwrap_or_else(|_| ChronoDuration::zero());

    let candidates = register.retry_candidates(window_start, window_end).await?;
    let mut dialed = 0;
    for call in &candidates {
        match dialer.place_call(&call.phone, &call.message, false).await {
            Ok(status) => {
                tracing::info!(phone = %call.phone, status, call_id = %call.id, "retry sweep: re-dialed");
                dialed += 1;
            }
            Err(e) => tracing::warn!(error = %e, phone = %call.phone, call_id = %call.id, "retry sweep: re-dial failed"),
        }
        tokio::time::sleep(sleep_and_retry).await;
    }
    Ok(dialed)
}

/// §4.3 step 2: escalate calls whose primary retry window has expired and
/// that remain unacknowledged to the next backup contact. The backup
/// index formula `(backup_count + 1) mod len(contacts)` is preserved
/// verbatim from the observed source behaviour (§9 open question) —
/// with exactly one contact it repeatedly redials the primary.
pub async fn backup_escalation_sweep(
    register: &RegisterDb,
    dialer: &dyn PlaceCaller,
    directory: &dyn OnCallDirectory,
    call_backup_callee_max_times: i64,
) -> clarion_core::error::Result<usize> {
    let now = Utc::now();
    let candidates = register.backup_escalation_candidates(now, call_backup_callee_max_times).await?;
    if candidates.is_empty() {
        return Ok(0);
    }

    let contacts = match directory.oncall().await {
        Ok(contacts) => contacts,
        Err(e) => {
            tracing::warn!(error = %e, "backup escalation sweep: address book unreachable");
            return Err(e);
        }
    };
    if contacts.is_empty() {
        tracing::warn!("backup escalation sweep: no on-call contacts available");
        return Ok(0);
    }

    let mut escalated = 0;
    for call in &candidates {
        let idx = (call.call_backup_callee_number_calls + 1) as usize % contacts.len();
        let backup = &contacts[idx];

        // Claim the slot atomically before dialing so a concurrent sweep
        // (or this one racing a slow HTTP response) can't double-escalate.
        let claimed = register.increment_backup_count(&call.id, call_backup_callee_max_times).await?;
        if !claimed {
            continue;
        }

        match dialer.place_call(&backup.phone_number, &call.message, true).await {
            Ok(status) => {
                tracing::info!(phone = %backup.phone_number, status, call_id = %call.id, "backup escalation: dialed backup");
                escalated += 1;
            }
            Err(e) => tracing::warn!(error = %e, phone = %backup.phone_number, call_id = %call.id, "backup escalation: dial failed"),
        }
    }
    Ok(escalated)
}
