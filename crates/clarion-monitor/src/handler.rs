//! Per-frame processing (§4.4 steps 1-3), independent of the WebSocket
//! transport so it can be exercised directly in tests.

use std::time::Duration;

use clarion_register::RegisterDb;

use crate::audio_client::AudioClient;
use crate::dialer_client::DialerClient;
use crate::events::{self, ParsedFrame};

pub struct FrameHandler {
    pub register: RegisterDb,
    pub audio: AudioClient,
    pub dialer: DialerClient,
    pub audio_poll_interval: Duration,
    pub audio_poll_max_attempts: u32,
}

impl FrameHandler {
    /// Handles one raw WebSocket text frame end to end. Returns an error
    /// only for failures that should take the whole connection down
    /// (§4.4 failure semantics: database errors inside the frame loop
    /// exit the process); a malformed frame or a stalled synthesis is
    /// logged and otherwise swallowed.
    pub async fn handle(&self, raw: &str) -> clarion_core::error::Result<()> {
        let frame = match events::parse(raw) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "received a malformed pbx frame, skipping");
                return Ok(());
            }
        };

        // §4.4 step 1: persisted regardless of event type.
        self.register.record_pbx_event(&frame.asterisk_chan, frame.kind.as_str(), &frame.raw).await?;

        if frame.channel_answered {
            self.handle_answered(&frame).await;
        }
        Ok(())
    }

    /// §4.4 step 2: a `StasisStart` whose channel reached `Up`.
    async fn handle_answered(&self, frame: &ParsedFrame) {
        let (message, msg_chk_sum) = match self.register.voice_message(&frame.asterisk_chan).await {
            Ok(Some(pair)) => pair,
            Ok(None) => {
                tracing::warn!(chan = %frame.asterisk_chan, "no registered message for answered channel");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, chan = %frame.asterisk_chan, "voice_message lookup failed");
                return;
            }
        };

        if !self.ensure_audio_ready(&message, &msg_chk_sum).await {
            tracing::warn!(chan = %frame.asterisk_chan, msg_chk_sum = %msg_chk_sum, "audio readiness poll exhausted, not playing");
            return;
        }

        match self.dialer.play(&frame.asterisk_chan, &msg_chk_sum).await {
            Ok(status) => tracing::info!(chan = %frame.asterisk_chan, status, "played audio on answered channel"),
            Err(e) => tracing::warn!(error = %e, chan = %frame.asterisk_chan, "play request failed"),
        }
    }

    /// §4.4 step 2b: dispatch synthesis, then poll readiness at
    /// `audio_poll_interval` up to `audio_poll_max_attempts` times.
    async fn ensure_audio_ready(&self, message: &str, msg_chk_sum: &str) -> bool {
        if let Err(e) = self.audio.make_audio(message, msg_chk_sum).await {
            tracing::warn!(error = %e, msg_chk_sum = %msg_chk_sum, "make_audio request failed");
        }

        for _ in 0..self.audio_poll_max_attempts {
            match self.audio.is_ready(msg_chk_sum).await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => tracing::warn!(error = %e, msg_chk_sum = %msg_chk_sum, "is_audio_ready poll failed"),
            }
            tokio::time::sleep(self.audio_poll_interval).await;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn handler_against(audio: &MockServer, dialer: &MockServer) -> FrameHandler {
        let client = reqwest::Client::new();
        FrameHandler {
            register: RegisterDb::connect_in_memory().await.unwrap(),
            audio: AudioClient::new(client.clone(), audio.uri()),
            dialer: DialerClient::new(client, dialer.uri()),
            audio_poll_interval: Duration::from_millis(1),
            audio_poll_max_attempts: 3,
        }
    }

    #[tokio::test]
    async fn persists_every_frame_type() {
        let audio = MockServer::start().await;
        let dialer = MockServer::start().await;
        let handler = handler_against(&audio, &dialer).await;

        handler.handle(r#"{"type":"ChannelDestroyed","channel":{"id":"chan-1"}}"#).await.unwrap();
        let events = handler.register.recent_pbx_events(10).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "ChannelDestroyed");
    }

    #[tokio::test]
    async fn answered_stasis_start_triggers_synthesis_and_play() {
        let audio = MockServer::start().await;
        let dialer = MockServer::start().await;

        Mock::given(method("POST")).and(path("/make_audio")).respond_with(ResponseTemplate::new(200)).mount(&audio).await;
        Mock::given(method("GET"))
            .and(path("/is_audio_ready"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": 200, "exists": true})))
            .mount(&audio)
            .await;
        Mock::given(method("POST"))
            .and(path("/play"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": 201})))
            .mount(&dialer)
            .await;

        let handler = handler_against(&audio, &dialer).await;
        handler.register.register_call("+15550001", "fire", "chan-1", false, false, 3, 300).await.unwrap();

        handler.handle(r#"{"type":"StasisStart","channel":{"id":"chan-1","state":"Up"}}"#).await.unwrap();

        let events = handler.register.recent_pbx_events(10).await.unwrap();
        assert_eq!(events[0].event_type, "StasisStart");
    }

    #[tokio::test]
    async fn skips_playback_when_no_message_is_registered_for_the_channel() {
        let audio = MockServer::start().await;
        let dialer = MockServer::start().await;
        let handler = handler_against(&audio, &dialer).await;

        // No register_call was ever made for chan-ghost.
        handler.handle(r#"{"type":"StasisStart","channel":{"id":"chan-ghost","state":"Up"}}"#).await.unwrap();
        // Persistence still happens even though there's nothing to play.
        assert_eq!(handler.register.recent_pbx_events(10).await.unwrap().len(), 1);
    }
}
