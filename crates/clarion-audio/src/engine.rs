//! Text-to-speech engine selection (§4.5 step 3).
//!
//! The engines themselves are named external collaborators (§1) — this
//! system never ships a bundled speech model. What lives here is the
//! selection enum, the `TtsEngine` trait synthesis is dispatched through,
//! and a deterministic stand-in used in tests and whenever no real engine
//! is wired up, so the cache's concurrency contract can be exercised
//! without a network call to a TTS provider.

use async_trait::async_trait;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisEngine {
    GTts,
    FacebookMms,
    Piper,
    AwsPolly,
    Kokoro,
}

impl FromStr for SynthesisEngine {
    type Err = clarion_core::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gtts" => Ok(Self::GTts),
            "facebook-mms" | "facebook_mms" | "mms" => Ok(Self::FacebookMms),
            "piper" => Ok(Self::Piper),
            "aws-polly" | "aws_polly" | "polly" => Ok(Self::AwsPolly),
            "kokoro" => Ok(Self::Kokoro),
            other => Err(clarion_core::Error::Fatal(format!("unknown tts engine: {other}"))),
        }
    }
}

/// Raw PCM produced by a synthesis engine before resampling (§4.5 step 3).
#[derive(Debug, Clone)]
pub struct RawPcm {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

#[async_trait]
pub trait TtsEngine: Send + Sync {
    async fn synthesize(&self, message: &str) -> clarion_core::error::Result<RawPcm>;
}

/// Deterministic placeholder synthesizer: produces a short tone whose
/// duration and pitch are derived from the message, at a native sample
/// rate above the target 8 kHz so the resampling path is always exercised.
/// Stands in for whichever [`SynthesisEngine`] is configured when no real
/// engine is wired up (tests, local development).
pub struct StubTtsEngine {
    pub native_sample_rate: u32,
}

impl Default for StubTtsEngine {
    fn default() -> Self {
        Self { native_sample_rate: 22_050 }
    }
}

#[async_trait]
impl TtsEngine for StubTtsEngine {
    async fn synthesize(&self, message: &str) -> clarion_core::error::Result<RawPcm> {
        if message.is_empty() {
            return Err(clarion_core::Error::SynthesisFailure("empty message".to_string()));
        }
        let duration_secs = (message.len() as f32 / 12.0).clamp(0.3, 5.0);
        let frequency = 220.0 + (message.bytes().map(|b| b as u32).sum::<u32>() % 440) as f32;
        let n_samples = (self.native_sample_rate as f32 * duration_secs) as usize;

        let samples: Vec<i16> = (0..n_samples)
            .map(|i| {
                let t = i as f32 / self.native_sample_rate as f32;
                let amplitude = (2.0 * std::f32::consts::PI * frequency * t).sin();
                (amplitude * i16::MAX as f32 * 0.5) as i16
            })
            .collect();

        Ok(RawPcm { sample_rate: self.native_sample_rate, channels: 1, samples })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_enumerated_engines() {
        assert_eq!("gtts".parse::<SynthesisEngine>().unwrap(), SynthesisEngine::GTts);
        assert_eq!("Facebook-MMS".parse::<SynthesisEngine>().unwrap(), SynthesisEngine::FacebookMms);
        assert_eq!("piper".parse::<SynthesisEngine>().unwrap(), SynthesisEngine::Piper);
        assert_eq!("AWS-Polly".parse::<SynthesisEngine>().unwrap(), SynthesisEngine::AwsPolly);
        assert_eq!("kokoro".parse::<SynthesisEngine>().unwrap(), SynthesisEngine::Kokoro);
    }

    #[test]
    fn rejects_unknown_engine_names() {
        assert!("not-a-real-engine".parse::<SynthesisEngine>().is_err());
    }

    #[tokio::test]
    async fn stub_engine_rejects_empty_messages() {
        let engine = StubTtsEngine::default();
        assert!(engine.synthesize("").await.is_err());
    }

    #[tokio::test]
    async fn stub_engine_produces_nonempty_pcm() {
        let engine = StubTtsEngine::default();
        let pcm = engine.synthesize("fire").await.unwrap();
        assert!(!pcm.samples.is_empty());
        assert_eq!(pcm.channels, 1);
    }
}
