//! On-call alias resolution (§4.2 step 1, §9 design note).
//!
//! The original system mixed "is this the literal alias or a real number"
//! with "go fetch the Address Book over HTTP" in one place. Here that's
//! split into a capability trait so tests can inject a fake without
//! standing up an HTTP server.

use async_trait::async_trait;
use serde::Deserialize;

#[async_trait]
pub trait OnCallResolver: Send + Sync {
    /// Resolves `phone` to a dialable number. `"oncall"` is looked up
    /// against the Address Book; anything else passes through unchanged.
    async fn resolve(&self, phone: &str) -> clarion_core::error::Result<String>;
}

/// The literal alias this system recognizes in place of a phone number.
pub const ONCALL_ALIAS: &str = "oncall";

pub fn is_oncall_alias(phone: &str) -> bool {
    phone == ONCALL_ALIAS
}

#[derive(Debug, Deserialize)]
struct OncallResponse {
    contacts: Vec<OncallContact>,
}

#[derive(Debug, Deserialize)]
struct OncallContact {
    phone_number: String,
}

/// Resolves `"oncall"` by querying the Address Book's `/oncall` endpoint
/// and taking the first (highest-priority) candidate.
pub struct HttpOnCallResolver {
    client: reqwest::Client,
    address_book_url: String,
}

impl HttpOnCallResolver {
    pub fn new(client: reqwest::Client, address_book_url: impl Into<String>) -> Self {
        Self { client, address_book_url: address_book_url.into() }
    }
}

#[async_trait]
impl OnCallResolver for HttpOnCallResolver {
    async fn resolve(&self, phone: &str) -> clarion_core::error::Result<String> {
        if !is_oncall_alias(phone) {
            return Ok(phone.to_string());
        }
        let url = format!("{}/oncall", self.address_book_url.trim_end_matches('/'));
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

        let body: OncallResponse = resp
            .json()
            .await
            .map_err(|e| clarion_core::Error::UpstreamUnreachable(format!("address book: malformed response: {e}")))?;

        body.contacts
            .first()
            .map(|c| c.phone_number.clone())
            .ok_or_else(|| clarion_core::Error::UpstreamRejected { status: 404, body: "no on-call contact available".to_string() })
    }
}

/// A fixed resolution, for tests that don't want to stand up an Address
/// Book stand-in at all.
pub struct FixedOnCallResolver(pub String);

#[async_trait]
impl OnCallResolver for FixedOnCallResolver {
    async fn resolve(&self, phone: &str) -> clarion_core::error::Result<String> {
        if is_oncall_alias(phone) {
            Ok(self.0.clone())
        } else {
            Ok(phone.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_resolver_passes_through_literal_numbers() {
        let resolver = FixedOnCallResolver("+15550099".to_string());
        assert_eq!(resolver.resolve("+15550001").await.unwrap(), "+15550001");
    }

    #[tokio::test]
    async fn fixed_resolver_substitutes_the_alias() {
        let resolver = FixedOnCallResolver("+15550099".to_string());
        assert_eq!(resolver.resolve("oncall").await.unwrap(), "+15550099");
    }
}
