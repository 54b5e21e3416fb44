//! HTTP client for the Call Register's `/register_call` (§4.2 step 4).

#[derive(Clone)]
pub struct RegisterClient {
    client: reqwest::Client,
    base_url: String,
}

impl RegisterClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into() }
    }

    pub async fn register_call(
        &self,
        phone: &str,
        message: &str,
        asterisk_chan: &str,
        oncall: bool,
        backup_callee: bool,
    ) -> clarion_core::error::Result<serde_json::Value> {
        let url = format!("{}/register_call", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .post(&url)
            .query(&[
                ("phone", phone),
                ("message", message),
                ("asterisk_chan", asterisk_chan),
                ("oncall", if oncall { "true" } else { "false" }),
                ("backup_callee", if backup_callee { "true" } else { "false" }),
            ])
            .send()
            .await
            .map_err(|e| clarion_core::Error::UpstreamUnreachable(format!("call register: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(clarion_core::Error::UpstreamRejected {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }
        resp.json()
            .await
            .map_err(|e| clarion_core::Error::UpstreamUnreachable(format!("call register: malformed response: {e}")))
    }
}
