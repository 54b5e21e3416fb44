//! Environment-driven configuration for the Call Register binary (§7.1).
//! Variables are prefixed `CALL_REGISTER_`.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CallRegisterConfig {
    #[serde(flatten)]
    pub common: clarion_core::config::CommonConfig,

    #[serde(default = "default_times_to_dial")]
    pub times_to_dial: i64,

    #[serde(default = "default_seconds_to_forget")]
    pub seconds_to_forget: i64,

    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_local_timezone")]
    pub local_timezone: String,
}

fn default_local_timezone() -> String {
    "UTC".to_string()
}

fn default_times_to_dial() -> i64 {
    3
}

fn default_seconds_to_forget() -> i64 {
    300
}

fn default_max_connections() -> u32 {
    5
}

impl CallRegisterConfig {
    pub fn from_env() -> clarion_core::error::Result<Self> {
        clarion_core::config::load("CALL_REGISTER_")
    }
}
