//! HTTP client for the Dialer's `/place_call`, fired once a scheduled
//! call's delivery time arrives (§4.7). Same capability-trait shape as
//! `clarion-recaller`'s `PlaceCaller` (§9 design note).

use async_trait::async_trait;

#[async_trait]
pub trait PlaceCaller: Send + Sync {
    async fn place_call(&self, phone: &str, message: &str) -> clarion_core::error::Result<u16>;
}

#[derive(Clone)]
pub struct HttpDialerClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDialerClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into() }
    }
}

#[async_trait]
impl PlaceCaller for HttpDialerClient {
    async fn place_call(&self, phone: &str, message: &str) -> clarion_core::error::Result<u16> {
        let url = format!("{}/place_call", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .post(&url)
            .query(&[("phone", phone), ("message", message), ("backup_callee", "false")])
            .send()
            .await
            .map_err(|e| clarion_core::Error::UpstreamUnreachable(format!("dialer: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(clarion_core::Error::UpstreamRejected {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }
        Ok(status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn place_call_posts_to_the_dialer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/place_call"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": 200})))
            .mount(&server)
            .await;

        let dialer = HttpDialerClient::new(reqwest::Client::new(), server.uri());
        let status = dialer.place_call("+15550001", "fire").await.unwrap();
        assert_eq!(status, 200);
    }
}
