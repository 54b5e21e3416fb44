//! HTTP client for the Audio Cache's `/make_audio` and `/is_audio_ready`
//! (§4.4 step 2b).

#[derive(Clone)]
pub struct AudioClient {
    client: reqwest::Client,
    base_url: String,
}

impl AudioClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into() }
    }

    /// Dispatches synthesis; does not itself guarantee the file is ready
    /// on return (the caller polls `is_ready` for that, §4.4 step 2b).
    pub async fn make_audio(&self, message: &str, msg_chk_sum: &str) -> clarion_core::error::Result<()> {
        let url = format!("{}/make_audio", self.base_url.trim_end_matches('/'));
        self.client
            .post(&url)
            .query(&[("message", message), ("msg_chk_sum", msg_chk_sum)])
            .send()
            .await
            .map_err(|e| clarion_core::Error::UpstreamUnreachable(format!("audio cache: {e}")))?;
        Ok(())
    }

    pub async fn is_ready(&self, msg_chk_sum: &str) -> clarion_core::error::Result<bool> {
        let url = format!("{}/is_audio_ready", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .get(&url)
            .query(&[("msg_chk_sum", msg_chk_sum)])
            .send()
            .await
            .map_err(|e| clarion_core::Error::UpstreamUnreachable(format!("audio cache: {e}")))?;
        if !resp.status().is_success() {
            return Ok(false);
        }
        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| clarion_core::Error::UpstreamUnreachable(format!("audio cache: malformed response: {e}")))?;
        Ok(body.get("exists").and_then(serde_json::Value::as_bool).unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn is_ready_reports_the_cache_s_answer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/is_audio_ready"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": 200, "exists": true})))
            .mount(&server)
            .await;

        let client = AudioClient::new(reqwest::Client::new(), server.uri());
        assert!(client.is_ready("abc123").await.unwrap());
    }
}
