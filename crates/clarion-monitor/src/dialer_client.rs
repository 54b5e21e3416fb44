//! HTTP client for the Dialer's `/play` (§4.4 step 2c, §4.2 play).

#[derive(Clone)]
pub struct DialerClient {
    client: reqwest::Client,
    base_url: String,
}

impl DialerClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into() }
    }

    pub async fn play(&self, asterisk_chan: &str, msg_chk_sum: &str) -> clarion_core::error::Result<u16> {
        let url = format!("{}/play", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .post(&url)
            .query(&[("asterisk_chan", asterisk_chan), ("msg_chk_sum", msg_chk_sum)])
            .send()
            .await
            .map_err(|e| clarion_core::Error::UpstreamUnreachable(format!("dialer: {e}")))?;
        Ok(resp.status().as_u16())
    }
}
