//! PBX WebSocket frame parsing (§4.4, §9 design note).
//!
//! Known event kinds get a named variant; anything else falls into
//! `Other`, with the raw frame preserved alongside so it can still be
//! persisted to `asterisk_ws_events` untouched (§3 PbxEvent is append-only
//! and never interprets what it stores beyond `event_type`).

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PbxEventKind {
    StasisStart,
    StasisEnd,
    PlaybackStarted,
    PlaybackFinished,
    ChannelStateChange,
    ChannelDestroyed,
    Other(String),
}

impl PbxEventKind {
    fn from_type_str(t: &str) -> Self {
        match t {
            "StasisStart" => Self::StasisStart,
            "StasisEnd" => Self::StasisEnd,
            "PlaybackStarted" => Self::PlaybackStarted,
            "PlaybackFinished" => Self::PlaybackFinished,
            "ChannelStateChange" => Self::ChannelStateChange,
            "ChannelDestroyed" => Self::ChannelDestroyed,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::StasisStart => "StasisStart",
            Self::StasisEnd => "StasisEnd",
            Self::PlaybackStarted => "PlaybackStarted",
            Self::PlaybackFinished => "PlaybackFinished",
            Self::ChannelStateChange => "ChannelStateChange",
            Self::ChannelDestroyed => "ChannelDestroyed",
            Self::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParsedFrame {
    pub kind: PbxEventKind,
    /// Channel identity, extracted per §4.4's two rules. Empty if neither
    /// rule finds anything — the frame is still persisted.
    pub asterisk_chan: String,
    /// True exactly for a `StasisStart` whose channel has reached `Up`
    /// (the callee picked up and entered the control application).
    pub channel_answered: bool,
    pub raw: String,
}

/// Parses one raw WebSocket text frame. Malformed JSON is a caller-level
/// decision (the monitor logs and skips rather than treating it as fatal,
/// since a single bad frame shouldn't take the whole connection down).
pub fn parse(raw: &str) -> Result<ParsedFrame, serde_json::Error> {
    let value: Value = serde_json::from_str(raw)?;
    let type_str = value.get("type").and_then(Value::as_str).unwrap_or("Unknown");
    let kind = PbxEventKind::from_type_str(type_str);

    let asterisk_chan = extract_channel(&kind, &value);
    let channel_answered =
        kind == PbxEventKind::StasisStart && value.pointer("/channel/state").and_then(Value::as_str) == Some("Up");

    Ok(ParsedFrame { kind, asterisk_chan, channel_answered, raw: raw.to_string() })
}

/// §4.4 channel identity extraction rules.
fn extract_channel(kind: &PbxEventKind, value: &Value) -> String {
    match kind {
        PbxEventKind::PlaybackStarted | PbxEventKind::PlaybackFinished => value
            .pointer("/playback/target_uri")
            .and_then(Value::as_str)
            .and_then(|uri| uri.split_once(':').map(|(_, rest)| rest))
            .unwrap_or_default()
            .to_string(),
        _ => value.pointer("/channel/id").and_then(Value::as_str).unwrap_or_default().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_channel_id_from_a_generic_event() {
        let frame = parse(r#"{"type":"ChannelStateChange","channel":{"id":"chan-1","state":"Ringing"}}"#).unwrap();
        assert_eq!(frame.asterisk_chan, "chan-1");
        assert_eq!(frame.kind, PbxEventKind::ChannelStateChange);
        assert!(!frame.channel_answered);
    }

    #[test]
    fn extracts_channel_id_from_playback_target_uri() {
        let frame = parse(r#"{"type":"PlaybackStarted","playback":{"target_uri":"channel:chan-42"}}"#).unwrap();
        assert_eq!(frame.asterisk_chan, "chan-42");
        assert_eq!(frame.kind, PbxEventKind::PlaybackStarted);
    }

    #[test]
    fn recognizes_an_answered_stasis_start() {
        let frame = parse(r#"{"type":"StasisStart","channel":{"id":"chan-1","state":"Up"}}"#).unwrap();
        assert!(frame.channel_answered);
    }

    #[test]
    fn a_stasis_start_that_has_not_answered_yet_does_not_trigger() {
        let frame = parse(r#"{"type":"StasisStart","channel":{"id":"chan-1","state":"Ring"}}"#).unwrap();
        assert!(!frame.channel_answered);
    }

    #[test]
    fn unknown_event_types_fall_into_other_but_keep_the_raw_frame() {
        let raw = r#"{"type":"SomeFutureEvent","channel":{"id":"chan-9"}}"#;
        let frame = parse(raw).unwrap();
        assert_eq!(frame.kind, PbxEventKind::Other("SomeFutureEvent".to_string()));
        assert_eq!(frame.kind.as_str(), "SomeFutureEvent");
        assert_eq!(frame.raw, raw);
    }
}
