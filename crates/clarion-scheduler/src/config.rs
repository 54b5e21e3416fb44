//! Environment-driven configuration for the Scheduler binary (§7.1).
//! Variables are prefixed `CLARION_SCHEDULER_`.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    #[serde(flatten)]
    pub common: clarion_core::config::CommonConfig,

    /// Scheduled calls are recorded in the Call Register's `scheduled_calls`
    /// table (§3, §6); the scheduler links into its db layer the same way
    /// `clarion-monitor` and `clarion-recaller` do.
    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    pub dialer_url: String,

    #[serde(default = "default_local_timezone")]
    pub local_timezone: String,

    #[serde(default = "default_timeout_ms")]
    pub client_timeout_total_ms: u64,
}

fn default_local_timezone() -> String {
    "UTC".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl SchedulerConfig {
    pub fn from_env() -> clarion_core::error::Result<Self> {
        clarion_core::config::load("CLARION_SCHEDULER_")
    }
}
