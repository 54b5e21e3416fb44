//! Environment-driven configuration for the Recaller binary (§7.1).
//! Variables are prefixed `ASTERISK_RECALLER_`, mirroring the original
//! `asterisk_recaller.py`'s constants (`times_to_dial`, `seconds_to_forget`,
//! `SLEEP_BEFORE_QUERYING`).

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RecallerConfig {
    #[serde(flatten)]
    pub common: clarion_core::config::CommonConfig,

    /// Direct connection to the Call Register's database (§4.3 is linked
    /// into the register's db layer the same way `clarion-monitor` is,
    /// per `clarion-register`'s documented exception to its HTTP-only
    /// mutation rule).
    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    pub dialer_url: String,
    pub address_book_url: String,

    #[serde(default = "default_times_to_dial")]
    pub times_to_dial: i64,

    #[serde(default = "default_seconds_to_forget")]
    pub seconds_to_forget: i64,

    #[serde(default = "default_call_backup_callee_max_times")]
    pub call_backup_callee_max_times: i64,

    /// Cadence between full sweeps (§4.3); `SLEEP_BEFORE_QUERYING` in the
    /// original.
    #[serde(default = "default_sleep_before_querying_secs")]
    pub sleep_before_querying_secs: u64,

    #[serde(default = "default_timeout_ms")]
    pub client_timeout_total_ms: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_times_to_dial() -> i64 {
    3
}

fn default_seconds_to_forget() -> i64 {
    300
}

fn default_call_backup_callee_max_times() -> i64 {
    3
}

fn default_sleep_before_querying_secs() -> u64 {
    10
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl RecallerConfig {
    pub fn from_env() -> clarion_core::error::Result<Self> {
        clarion_core::config::load("ASTERISK_RECALLER_")
    }

    /// §4.3 cadence: `seconds_to_forget / (times_to_dial + 1)`.
    pub fn sleep_and_retry(&self) -> std::time::Duration {
        let secs = self.seconds_to_forget as f64 / (self.times_to_dial as f64 + 1.0);
        std::time::Duration::from_secs_f64(secs.max(0.0))
    }
}
