use std::time::Duration;

use clarion_core::logging::{self, LoggingConfig};
use clarion_monitor::audio_client::AudioClient;
use clarion_monitor::config::MonitorConfig;
use clarion_monitor::dialer_client::DialerClient;
use clarion_monitor::handler::FrameHandler;
use clarion_register::RegisterDb;
use futures::StreamExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = MonitorConfig::from_env()?;
    logging::init(LoggingConfig::new("clarion-monitor"))?;

    let register = RegisterDb::connect(&config.common.database_url, config.db_max_connections).await?;
    let http_client = reqwest::Client::new();
    let handler = FrameHandler {
        register,
        audio: AudioClient::new(http_client.clone(), config.audio_cache_url.clone()),
        dialer: DialerClient::new(http_client, config.dialer_url.clone()),
        audio_poll_interval: Duration::from_secs(config.audio_poll_interval_secs),
        audio_poll_max_attempts: config.audio_poll_max_attempts,
    };

    let ws_url = config.ws_url();
    tracing::info!(stasis_app = %config.stasis_app_name, "pbx event monitor starting");

    tokio::select! {
        result = run(&ws_url, &handler) => result,
        () = shutdown_signal() => {
            tracing::info!("monitor shutting down");
            Ok(())
        }
    }
}

/// Connects once and processes frames until the socket closes or a
/// database error occurs; either ends the process non-zero (§4.4 failure
/// semantics — the monitor does not retry its own connection, relying on
/// the surrounding supervisor to restart it).
async fn run(ws_url: &str, handler: &FrameHandler) -> anyhow::Result<()> {
    let (stream, _response) = connect_async(ws_url)
        .await
        .map_err(|e| anyhow::anyhow!("failed to connect to pbx event stream: {e}"))?;
    tracing::info!("connected to pbx event stream");

    let (_write, mut read) = stream.split();
    while let Some(message) = read.next().await {
        match message {
            Ok(Message::Text(text)) => {
                if let Err(e) = handler.handle(&text).await {
                    tracing::error!(error = %e, "frame handling failed, exiting");
                    return Err(anyhow::anyhow!("frame handling failed: {e}"));
                }
            }
            Ok(Message::Close(frame)) => {
                tracing::warn!(?frame, "pbx event stream closed");
                return Err(anyhow::anyhow!("pbx event stream closed by peer"));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "pbx event stream error, exiting");
                return Err(anyhow::anyhow!("pbx event stream error: {e}"));
            }
        }
    }

    Err(anyhow::anyhow!("pbx event stream ended"))
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
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
