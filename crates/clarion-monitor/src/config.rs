//! Environment-driven configuration for the PBX Event Monitor binary
//! (§7.1). Variables are prefixed `ASTERISK_WS_MONITOR_`, matching the
//! original `asterisk_ws_monitor.py`'s naming.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    #[serde(flatten)]
    pub common: clarion_core::config::CommonConfig,

    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    pub pbx_host: String,
    pub pbx_web_port: u16,
    pub pbx_username: String,
    pub pbx_password: String,
    pub stasis_app_name: String,

    pub audio_cache_url: String,
    pub dialer_url: String,

    /// §4.4 step 2b / §9 open question: the readiness poll caps at a
    /// configurable number of attempts instead of the original's hardcoded
    /// 12.
    #[serde(default = "default_poll_max_attempts")]
    pub audio_poll_max_attempts: u32,

    #[serde(default = "default_poll_interval_secs")]
    pub audio_poll_interval_secs: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_poll_max_attempts() -> u32 {
    12
}

fn default_poll_interval_secs() -> u64 {
    5
}

impl MonitorConfig {
    pub fn from_env() -> clarion_core::error::Result<Self> {
        clarion_core::config::load("ASTERISK_WS_MONITOR_")
    }

    /// `ws://<pbx>/ari/events?api_key=user:pass&app=<stasis_app_name>` (§4.4).
    pub fn ws_url(&self) -> String {
        format!(
            "ws://{}:{}/ari/events?api_key={}:{}&app={}",
            self.pbx_host, self.pbx_web_port, self.pbx_username, self.pbx_password, self.stasis_app_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_url_matches_the_ari_events_shape() {
        let config = MonitorConfig {
            common: clarion_core::config::CommonConfig {
                bind_address: "0.0.0.0:0".into(),
                database_url: "sqlite::memory:".into(),
                log_level: "info".into(),
            },
            db_max_connections: 5,
            pbx_host: "pbx.internal".into(),
            pbx_web_port: 8088,
            pbx_username: "user".into(),
            pbx_password: "pass".into(),
            stasis_app_name: "clarion".into(),
            audio_cache_url: "http://audio".into(),
            dialer_url: "http://dialer".into(),
            audio_poll_max_attempts: 12,
            audio_poll_interval_secs: 5,
        };
        assert_eq!(config.ws_url(), "ws://pbx.internal:8088/ari/events?api_key=user:pass&app=clarion");
    }
}
