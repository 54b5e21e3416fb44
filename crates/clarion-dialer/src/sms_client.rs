//! SMS sink client (§4.2 send_sms, §1 named-interface-only collaborator).
//!
//! The SMS carrier SDK itself is out of scope; this is a thin HTTP
//! forwarder to whatever sink is configured, matching the shape of the
//! other peer clients in this crate.

#[derive(Clone)]
pub struct SmsClient {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl SmsClient {
    pub fn new(client: reqwest::Client, base_url: Option<String>) -> Self {
        Self { client, base_url }
    }

    /// Returns the sink's HTTP status. If no sink is configured, this is a
    /// no-op that fails closed with `UpstreamUnreachable` rather than
    /// silently pretending to have sent anything.
    pub async fn send(&self, phone: &str, message: &str) -> clarion_core::error::Result<u16> {
        let Some(base_url) = &self.base_url else {
            return Err(clarion_core::Error::UpstreamUnreachable("no SMS sink configured".to_string()));
        };
        let url = format!("{}/send", base_url.trim_end_matches('/'));
        let resp = self
            .client
            .post(&url)
            .query(&[("phone", phone), ("message", message)])
            .send()
            .await
            .map_err(|e| clarion_core::Error::UpstreamUnreachable(format!("sms sink: {e}")))?;
        Ok(resp.status().as_u16())
    }
}
