use std::time::Duration;

use clarion_core::logging::{self, LoggingConfig};
use clarion_recaller::config::RecallerConfig;
use clarion_recaller::dialer_client::HttpDialerClient;
use clarion_recaller::directory_client::HttpDirectoryClient;
use clarion_recaller::sweep::{backup_escalation_sweep, retry_sweep};
use clarion_register::RegisterDb;

/// Backoff after a database error in a sweep iteration (§4.3 failure
/// semantics).
const DB_ERROR_BACKOFF: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RecallerConfig::from_env()?;
    logging::init(LoggingConfig::new("clarion-recaller"))?;

    let register = RegisterDb::connect(&config.common.database_url, config.db_max_connections).await?;

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_millis(config.client_timeout_total_ms))
        .build()?;
    let dialer = HttpDialerClient::new(http_client.clone(), config.dialer_url.clone());
    let directory = HttpDirectoryClient::new(http_client, config.address_book_url.clone());

    let sleep_and_retry = config.sleep_and_retry();
    let sleep_before_querying = Duration::from_secs(config.sleep_before_querying_secs);

    tracing::info!(
        sleep_and_retry_ms = sleep_and_retry.as_millis() as u64,
        sleep_before_querying_secs = config.sleep_before_querying_secs,
        "recaller starting"
    );

    loop {
        tokio::select! {
            () = run_iteration(&register, &dialer, &directory, &config, sleep_and_retry) => {}
            () = shutdown_signal() => {
                tracing::info!("recaller shutting down");
                return Ok(());
            }
        }

        tokio::select! {
            () = tokio::time::sleep(sleep_before_querying) => {}
            () = shutdown_signal() => {
                tracing::info!("recaller shutting down");
                return Ok(());
            }
        }
    }
}

async fn run_iteration(
    register: &RegisterDb,
    dialer: &HttpDialerClient,
    directory: &HttpDirectoryClient,
    config: &RecallerConfig,
    sleep_and_retry: Duration,
) {
    match retry_sweep(register, dialer, config.seconds_to_forget, sleep_and_retry).await {
        Ok(count) => tracing::info!(count, "retry sweep complete"),
        Err(e) => {
            tracing::error!(error = %e, "retry sweep failed, backing off");
            tokio::time::sleep(DB_ERROR_BACKOFF).await;
            return;
        }
    }

    match backup_escalation_sweep(register, dialer, directory, config.call_backup_callee_max_times).await {
        Ok(count) => tracing::info!(count, "backup escalation sweep complete"),
        Err(e) => {
            tracing::error!(error = %e, "backup escalation sweep failed, backing off");
            tokio::time::sleep(DB_ERROR_BACKOFF).await;
        }
    }
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
