//! Timestamp helpers shared across the call register, scheduler, and
//! recaller (§4.1, §4.7, §9).
//!
//! Two concerns live here: a sentinel "unset" instant for lifecycle columns
//! that start out empty (`first_dial`, `heard_at`, `acknowledge_at`, ...),
//! and local-timezone wall-clock parsing that fails closed on DST-ambiguous
//! or DST-nonexistent times instead of silently picking a side.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Stand-in for "this timestamp column has never been set". Using
/// `DateTime<Utc>::MIN_UTC` rather than `Option<DateTime<Utc>>` keeps the
/// sqlx column non-nullable and the `first_dial + seconds_to_forget > now`
/// window arithmetic total: an unset row simply never falls inside any
/// real firing window.
pub fn unset() -> DateTime<Utc> {
    DateTime::<Utc>::MIN_UTC
}

pub fn is_unset(ts: DateTime<Utc>) -> bool {
    ts == unset()
}

/// Parses `naive` as a wall-clock instant in `zone` and converts it to UTC.
///
/// Returns an error when the local time falls in a DST spring-forward gap
/// (does not exist) or a fall-back overlap (ambiguous) — the caller must
/// supply an unambiguous instant rather than have the scheduler guess.
pub fn local_to_utc(naive: NaiveDateTime, zone: Tz) -> crate::error::Result<DateTime<Utc>> {
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::None => Err(crate::error::Error::StateConflict(format!(
            "{naive} does not exist in timezone {zone} (DST spring-forward gap)"
        ))),
        LocalResult::Ambiguous(earlier, later) => Err(crate::error::Error::StateConflict(format!(
            "{naive} is ambiguous in timezone {zone} (DST fall-back overlap): could be {earlier} or {later}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn unset_is_stable_and_never_in_a_real_window() {
        let u = unset();
        assert!(is_unset(u));
        assert!(!is_unset(Utc::now()));
    }

    #[test]
    fn local_to_utc_resolves_an_unambiguous_time() {
        let zone: Tz = "America/New_York".parse().unwrap();
        let naive = NaiveDate::from_ymd_opt(2026, 7, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let utc = local_to_utc(naive, zone).unwrap();
        assert_eq!(utc.to_rfc3339(), "2026-07-01T16:00:00+00:00");
    }

    #[test]
    fn local_to_utc_rejects_spring_forward_gap() {
        let zone: Tz = "America/New_York".parse().unwrap();
        // 2026-03-08 02:30 local does not exist; clocks jump 02:00 -> 03:00.
        let naive = NaiveDate::from_ymd_opt(2026, 3, 8)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert!(local_to_utc(naive, zone).is_err());
    }

    #[test]
    fn local_to_utc_rejects_fall_back_overlap() {
        let zone: Tz = "America/New_York".parse().unwrap();
        // 2026-11-01 01:30 local occurs twice; clocks fall back 02:00 -> 01:00.
        let naive = NaiveDate::from_ymd_opt(2026, 11, 1)
            .unwrap()
            .and_hms_opt(1, 30, 0)
            .unwrap();
        assert!(local_to_utc(naive, zone).is_err());
    }
}
