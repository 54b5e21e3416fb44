//! Environment-driven configuration for the Dialer binary (§7.1).
//! Variables are prefixed `ASTERISK_DIALER_`.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct DialerConfig {
    #[serde(flatten)]
    pub common: clarion_core::config::CommonConfig,

    /// Base URL of the PBX's REST control API, e.g. `http://127.0.0.1:8088/ari`.
    pub pbx_base_url: String,
    pub pbx_username: String,
    pub pbx_password: String,

    /// Channel-type template (§4.2 step 2). Supports a `{phone}` placeholder,
    /// a `PREFIX/SUFFIX` form, or a bare prefix.
    #[serde(default = "default_channel_type")]
    pub channel_type_template: String,

    /// Base URL the PBX fetches generated audio from, interpolated into the
    /// `play` media URI as `sound:<audio_url>/<msg_chk_sum>.wav`.
    pub audio_base_url: String,

    /// Call Register base URL (`/register_call`).
    pub register_url: String,

    /// Address Book base URL (`/oncall`), consulted when `phone == "oncall"`.
    pub address_book_url: String,

    /// SMS sink base URL (`/send`, named interface only — §1, §4.2).
    #[serde(default)]
    pub sms_sink_url: Option<String>,

    #[serde(default = "default_timeout_ms")]
    pub client_timeout_total_ms: u64,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Pace of the queue worker when the call register hasn't told it
    /// otherwise: one call per `seconds_to_forget` (§4.2 call_to_queue).
    #[serde(default = "default_seconds_to_forget")]
    pub seconds_to_forget: i64,

    /// §4.8: delay between an SMS and the follow-up call in "SMS-before-call"
    /// dispatch mode.
    #[serde(default = "default_sms_before_call_wait")]
    pub sms_before_call_wait_seconds: u64,
}

fn default_channel_type() -> String {
    "PJSIP/{phone}".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_queue_capacity() -> usize {
    256
}

fn default_seconds_to_forget() -> i64 {
    300
}

fn default_sms_before_call_wait() -> u64 {
    60
}

impl DialerConfig {
    pub fn from_env() -> clarion_core::error::Result<Self> {
        clarion_core::config::load("ASTERISK_DIALER_")
    }
}
