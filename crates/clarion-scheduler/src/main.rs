use std::sync::Arc;
use std::time::Duration;

use clarion_core::logging::{self, LoggingConfig};
use clarion_register::RegisterDb;
use clarion_scheduler::config::SchedulerConfig;
use clarion_scheduler::dialer_client::HttpDialerClient;
use clarion_scheduler::dispatcher::{DelayedDispatcher, InMemoryDispatcher};
use clarion_scheduler::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = SchedulerConfig::from_env()?;
    logging::init(LoggingConfig::new("clarion-scheduler"))?;

    let register = Arc::new(RegisterDb::connect(&config.common.database_url, config.db_max_connections).await?);

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_millis(config.client_timeout_total_ms))
        .build()?;
    let dialer = Arc::new(HttpDialerClient::new(http_client, config.dialer_url.clone()));
    let dispatcher: Arc<dyn DelayedDispatcher> = Arc::new(InMemoryDispatcher::new(dialer));

    let state = AppState {
        register,
        dispatcher,
        config: Arc::new(config.clone()),
    };

    let app = routes::router(state);
    let listener = tokio::net::TcpListener::bind(&config.common.bind_address).await?;
    tracing::info!(address = %config.common.bind_address, "scheduler listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
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
