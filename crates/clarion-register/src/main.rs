use std::sync::Arc;

use clarion_core::logging::{self, LoggingConfig};
use clarion_register::config::CallRegisterConfig;
use clarion_register::routes::{self, AppState};
use clarion_register::RegisterDb;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CallRegisterConfig::from_env()?;
    logging::init(LoggingConfig::new("clarion-register"))?;

    let db = RegisterDb::connect(&config.common.database_url, config.db_max_connections).await?;
    let state = AppState {
        db: Arc::new(db),
        config: Arc::new(config.clone()),
    };

    let app = routes::router(state);
    let listener = tokio::net::TcpListener::bind(&config.common.bind_address).await?;
    tracing::info!(address = %config.common.bind_address, "call register listening");

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
