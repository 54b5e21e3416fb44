//! HTTP client for the Address Book's `/oncall` (§4.3 step 2, §4.6).

use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct OnCallContact {
    pub phone_number: String,
}

#[async_trait]
pub trait OnCallDirectory: Send + Sync {
    /// Returns the currently on-call contacts, ordered primary-first
    /// (§4.6). `contacts[0]` is the primary who has already been dialed;
    /// the backup sweep indexes into the remainder.
    async fn oncall(&self) -> clarion_core::error::Result<Vec<OnCallContact>>;
}

#[derive(Clone)]
pub struct HttpDirectoryClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDirectoryClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into() }
    }
}

#[derive(Debug, Deserialize)]
struct OnCallResponse {
    contacts: Vec<OnCallContact>,
}

#[async_trait]
impl OnCallDirectory for HttpDirectoryClient {
    async fn oncall(&self) -> clarion_core::error::Result<Vec<OnCallContact>> {
        let url = format!("{}/oncall", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| clarion_core::Error::UpstreamUnreachable(format!("address book: {e}")))?;

        if !resp.status().is_success() {
            return Err(clarion_core::Error::UpstreamRejected {
                status: resp.status().as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }
        let body: OnCallResponse = resp
            .json()
            .await
            .map_err(|e| clarion_core::Error::UpstreamUnreachable(format!("address book: malformed response: {e}")))?;
        Ok(body.contacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn oncall_parses_the_ordered_contact_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oncall"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": 200,
                "contacts": [
                    {"phone_number": "+15550001"},
                    {"phone_number": "+15550002"},
                    {"phone_number": "+15550003"},
                ]
            })))
            .mount(&server)
            .await;

        let directory = HttpDirectoryClient::new(reqwest::Client::new(), server.uri());
        let contacts = directory.oncall().await.unwrap();
        assert_eq!(contacts.len(), 3);
        assert_eq!(contacts[0].phone_number, "+15550001");
    }
}
