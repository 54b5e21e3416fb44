//! The Audio Cache's core logic (§4.5): at-most-one synthesis per
//! `msg_chk_sum` under concurrent demand, realised with a per-key inflight
//! map guarded by a mutex (§9 design note), plus a bounded worker pool
//! (`tokio::sync::Semaphore`) standing in for the "size = configured CPU
//! count" synthesis pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, Semaphore};

use crate::engine::TtsEngine;
use crate::resample::to_target_format;
use crate::wav;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MakeAudioOutcome {
    pub status: u16,
    pub cached: bool,
}

#[derive(Clone)]
pub struct AudioCache {
    dir: PathBuf,
    engine: Arc<dyn TtsEngine>,
    inflight: Arc<DashMap<String, Arc<Mutex<()>>>>,
    worker_pool: Arc<Semaphore>,
}

impl AudioCache {
    pub fn new(dir: impl Into<PathBuf>, engine: Arc<dyn TtsEngine>, worker_pool_size: usize) -> Self {
        Self {
            dir: dir.into(),
            engine,
            inflight: Arc::new(DashMap::new()),
            worker_pool: Arc::new(Semaphore::new(worker_pool_size.max(1))),
        }
    }

    pub fn artifact_path(&self, msg_chk_sum: &str) -> PathBuf {
        self.dir.join(format!("{msg_chk_sum}.wav"))
    }

    /// §4.5 is_audio_ready.
    pub async fn is_ready(&self, msg_chk_sum: &str) -> bool {
        wav::is_valid(&self.artifact_path(msg_chk_sum)).await
    }

    /// §4.5 make_audio.
    pub async fn make_audio(&self, message: &str, msg_chk_sum: &str) -> MakeAudioOutcome {
        let path = self.artifact_path(msg_chk_sum);

        // Fast path (§4.5 step 2 / §9): once the first synthesis completes,
        // every later caller observes the file directly and never touches
        // the inflight lock.
        if wav::is_valid(&path).await {
            return MakeAudioOutcome { status: 200, cached: true };
        }

        let lock = self
            .inflight
            .entry(msg_chk_sum.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Re-check inside the lock: another task may have finished
        // synthesising this exact message while we were waiting.
        if wav::is_valid(&path).await {
            self.inflight.remove(msg_chk_sum);
            return MakeAudioOutcome { status: 200, cached: true };
        }

        let outcome = self.synthesize_and_store(message, &path).await;
        self.inflight.remove(msg_chk_sum);
        outcome
    }

    async fn synthesize_and_store(&self, message: &str, path: &Path) -> MakeAudioOutcome {
        let Ok(_permit) = self.worker_pool.acquire().await else {
            return MakeAudioOutcome { status: 500, cached: false };
        };

        let pcm = match self.engine.synthesize(message).await {
            Ok(pcm) => pcm,
            Err(e) => {
                tracing::warn!(error = %e, "synthesis failed");
                return MakeAudioOutcome { status: 500, cached: false };
            }
        };

        let samples = to_target_format(&pcm);
        let bytes = wav::encode(&samples);

        match wav::write_atomic(path, &bytes).await {
            Ok(()) => MakeAudioOutcome { status: 200, cached: false },
            Err(e) => {
                tracing::error!(error = %e, path = %path.display(), "failed to write audio artifact");
                MakeAudioOutcome { status: 500, cached: false }
            }
        }
    }
}
