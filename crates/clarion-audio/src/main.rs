use std::sync::Arc;

use clarion_audio::cache::AudioCache;
use clarion_audio::config::AudioCacheConfig;
use clarion_audio::engine::{StubTtsEngine, SynthesisEngine, TtsEngine};
use clarion_audio::routes::{self, AppState};
use clarion_core::logging::{self, LoggingConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AudioCacheConfig::from_env()?;
    logging::init(LoggingConfig::new("clarion-audio"))?;

    tokio::fs::create_dir_all(&config.audio_dir)
        .await
        .map_err(|e| clarion_core::Error::Fatal(format!("audio directory {} missing and could not be created: {e}", config.audio_dir)))?;

    let engine: Arc<dyn TtsEngine> = select_engine(&config.tts_engine)?;
    let cache = AudioCache::new(config.audio_dir.clone(), engine, config.worker_pool_size);
    let state = AppState { cache };

    let app = routes::router(state, &config.audio_dir);
    let listener = tokio::net::TcpListener::bind(&config.common.bind_address).await?;
    tracing::info!(address = %config.common.bind_address, engine = %config.tts_engine, "audio cache listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Resolves the configured [`SynthesisEngine`] (§4.5 step 3) to a
/// [`TtsEngine`]. The real engines are named external collaborators (§1):
/// this system never bundles a speech model, so every enumerated choice
/// currently dispatches to the deterministic stand-in used by the test
/// suite, tagged with which engine it is standing in for.
fn select_engine(configured: &str) -> clarion_core::error::Result<Arc<dyn TtsEngine>> {
    let engine: SynthesisEngine = configured.parse()?;
    tracing::info!(?engine, "tts engine selected (external collaborator, using local stand-in)");
    Ok(Arc::new(StubTtsEngine::default()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
