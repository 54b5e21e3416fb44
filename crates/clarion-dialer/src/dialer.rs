//! The Dialer's core logic (§4.2), independent of its HTTP transport so the
//! queue worker and the `/place_call` route share one code path.

use std::sync::Arc;

use crate::oncall::{is_oncall_alias, OnCallResolver};
use crate::pbx_client::PbxClient;
use crate::register_client::RegisterClient;
use crate::channel::build_channel_descriptor;

#[derive(Debug, Clone, serde::Serialize)]
pub struct PlaceCallOutcome {
    pub status: u16,
    pub asterisk_chan: Option<String>,
}

#[derive(Clone)]
pub struct Dialer {
    pub pbx: PbxClient,
    pub register: RegisterClient,
    pub resolver: Arc<dyn OnCallResolver>,
    pub channel_type_template: String,
}

impl Dialer {
    /// §4.2 place_call.
    pub async fn place_call(&self, phone: &str, message: &str, backup_callee: bool) -> clarion_core::error::Result<PlaceCallOutcome> {
        let oncall = is_oncall_alias(phone);
        let resolved_phone = self.resolver.resolve(phone).await?;

        let descriptor = build_channel_descriptor(&self.channel_type_template, &resolved_phone);
        let (status, chan) = self.pbx.create_channel(&descriptor).await?;

        if status != 200 {
            tracing::warn!(status, phone = %resolved_phone, "pbx rejected channel creation");
            return Ok(PlaceCallOutcome { status, asterisk_chan: None });
        }
        let Some(asterisk_chan) = chan else {
            return Ok(PlaceCallOutcome { status, asterisk_chan: None });
        };

        // §4.2 step 4: original alias (or literal phone) propagated so the
        // register's acknowledgement cascade (§4.1) can find it.
        self.register
            .register_call(phone, message, &asterisk_chan, oncall, backup_callee)
            .await?;

        Ok(PlaceCallOutcome { status, asterisk_chan: Some(asterisk_chan) })
    }

    /// §4.2 play: plays the synthesized artifact then unconditionally hands
    /// control back to the PBX dialplan.
    pub async fn play(&self, asterisk_chan: &str, msg_chk_sum: &str) -> clarion_core::error::Result<(u16, u16)> {
        let play_status = self.pbx.play(asterisk_chan, msg_chk_sum).await;
        let play_status = match play_status {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, asterisk_chan, "playback request failed");
                0
            }
        };
        let continue_status = self.pbx.dialplan_continue(asterisk_chan).await?;
        Ok((play_status, continue_status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oncall::FixedOnCallResolver;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn dialer_against(pbx: &MockServer, register: &MockServer) -> Dialer {
        let client = reqwest::Client::new();
        Dialer {
            pbx: PbxClient::new(client.clone(), pbx.uri(), "user", "pass", "http://audio.example"),
            register: RegisterClient::new(client, register.uri()),
            resolver: Arc::new(FixedOnCallResolver("+15559999".to_string())),
            channel_type_template: "PJSIP/{phone}".to_string(),
        }
    }

    #[tokio::test]
    async fn place_call_resolves_oncall_and_registers() {
        let pbx = MockServer::start().await;
        let register = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/channels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "chan-1"})))
            .mount(&pbx)
            .await;
        Mock::given(method("POST"))
            .and(path("/register_call"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": 200, "id": "row-1"})))
            .mount(&register)
            .await;

        let dialer = dialer_against(&pbx, &register).await;
        let outcome = dialer.place_call("oncall", "fire", false).await.unwrap();
        assert_eq!(outcome.status, 200);
        assert_eq!(outcome.asterisk_chan.as_deref(), Some("chan-1"));
    }

    #[tokio::test]
    async fn place_call_surfaces_pbx_rejection_without_registering() {
        let pbx = MockServer::start().await;
        let register = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/channels"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&pbx)
            .await;

        let dialer = dialer_against(&pbx, &register).await;
        let outcome = dialer.place_call("+15550001", "fire", false).await.unwrap();
        assert_eq!(outcome.status, 503);
        assert!(outcome.asterisk_chan.is_none());
    }
}
