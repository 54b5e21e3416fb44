use std::sync::Arc;

use clarion_core::logging::{self, LoggingConfig};
use clarion_dialer::config::DialerConfig;
use clarion_dialer::dialer::Dialer;
use clarion_dialer::oncall::HttpOnCallResolver;
use clarion_dialer::pbx_client::PbxClient;
use clarion_dialer::queue::CallQueue;
use clarion_dialer::register_client::RegisterClient;
use clarion_dialer::routes::{self, AppState};
use clarion_dialer::sms_client::SmsClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = DialerConfig::from_env()?;
    logging::init(LoggingConfig::new("clarion-dialer"))?;

    let http_client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_millis(config.client_timeout_total_ms))
        .build()?;

    let resolver = Arc::new(HttpOnCallResolver::new(http_client.clone(), config.address_book_url.clone()));
    let dialer = Dialer {
        pbx: PbxClient::new(http_client.clone(), config.pbx_base_url.clone(), config.pbx_username.clone(), config.pbx_password.clone(), config.audio_base_url.clone()),
        register: RegisterClient::new(http_client.clone(), config.register_url.clone()),
        resolver,
        channel_type_template: config.channel_type_template.clone(),
    };

    let queue = CallQueue::spawn(dialer.clone(), config.queue_capacity, config.seconds_to_forget);
    let sms = Arc::new(SmsClient::new(http_client, config.sms_sink_url.clone()));

    let state = AppState { dialer, queue, sms };
    let app = routes::router(state);
    let listener = tokio::net::TcpListener::bind(&config.common.bind_address).await?;
    tracing::info!(address = %config.common.bind_address, "dialer listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
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
