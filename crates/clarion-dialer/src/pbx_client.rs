//! HTTP client for the PBX's REST control API (§4.2).

use serde::Deserialize;

#[derive(Clone)]
pub struct PbxClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    audio_base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChannelResponse {
    id: String,
}

impl PbxClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, username: impl Into<String>, password: impl Into<String>, audio_base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            audio_base_url: audio_base_url.into(),
        }
    }

    /// §4.2 step 3: POST to the PBX's `channels` endpoint. On HTTP 200,
    /// returns the channel identifier.
    pub async fn create_channel(&self, endpoint: &str) -> clarion_core::error::Result<(u16, Option<String>)> {
        let url = format!("{}/channels", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .query(&[("endpoint", endpoint)])
            .send()
            .await
            .map_err(|e| clarion_core::Error::UpstreamUnreachable(format!("pbx: {e}")))?;

        let status = resp.status().as_u16();
        if status != 200 {
            return Ok((status, None));
        }
        let parsed: ChannelResponse = resp
            .json()
            .await
            .map_err(|e| clarion_core::Error::UpstreamUnreachable(format!("pbx: malformed channel response: {e}")))?;
        Ok((status, Some(parsed.id)))
    }

    /// §4.2 play, step 1: POST `channels/{chan}/play?media=sound:<audio_url>/<msg_chk_sum>.wav`.
    /// Returns the HTTP status; 201 is expected.
    pub async fn play(&self, asterisk_chan: &str, msg_chk_sum: &str) -> clarion_core::error::Result<u16> {
        let url = format!("{}/channels/{}/play", self.base_url.trim_end_matches('/'), asterisk_chan);
        let media = format!("sound:{}/{}.wav", self.audio_base_url.trim_end_matches('/'), msg_chk_sum);
        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .query(&[("media", media.as_str())])
            .send()
            .await
            .map_err(|e| clarion_core::Error::UpstreamUnreachable(format!("pbx: {e}")))?;
        Ok(resp.status().as_u16())
    }

    /// §4.2 play, step 2: POST `channels/{chan}/continue`, expected 204.
    /// Called unconditionally after `play`, regardless of its outcome — the
    /// channel must never be left parked in the control application.
    pub async fn dialplan_continue(&self, asterisk_chan: &str) -> clarion_core::error::Result<u16> {
        let url = format!("{}/channels/{}/continue", self.base_url.trim_end_matches('/'), asterisk_chan);
        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| clarion_core::Error::UpstreamUnreachable(format!("pbx: {e}")))?;
        Ok(resp.status().as_u16())
    }
}
