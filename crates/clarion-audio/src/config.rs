//! Environment-driven configuration for the Audio Cache binary (§7.1).
//! Variables are prefixed `AUDIO_CACHE_`.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AudioCacheConfig {
    #[serde(flatten)]
    pub common: clarion_core::config::CommonConfig,

    /// Directory holding `<msg_chk_sum>.wav` artifacts (§3 AudioArtifact).
    pub audio_dir: String,

    /// Worker pool size for synthesis dispatch (§4.5 step 3). Defaults to
    /// the number of available CPUs, matching the original's convention.
    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: usize,

    /// Which named TTS engine to select (§4.5 step 3). The engine itself
    /// is an external collaborator (§1); only the selection and the
    /// post-processing contract (8 kHz mono 16-bit PCM) live here.
    #[serde(default = "default_engine")]
    pub tts_engine: String,
}

fn default_worker_pool_size() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}

fn default_engine() -> String {
    "gtts".to_string()
}

impl AudioCacheConfig {
    pub fn from_env() -> clarion_core::error::Result<Self> {
        clarion_core::config::load("AUDIO_CACHE_")
    }
}
