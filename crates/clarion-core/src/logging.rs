//! Structured logging setup, shared by every clarion binary (§7.2).
//!
//! Mirrors the builder shape used elsewhere in this workspace: a small
//! config struct with chained `with_*` setters, an `EnvFilter` seeded from
//! `RUST_LOG` (falling back to the component's configured level), and a
//! choice between human-readable and JSON output for production log
//! shipping.

use tracing::Level;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: Level,
    pub json: bool,
    pub app_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: Level::INFO,
            json: false,
            app_name: "clarion".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn new(app_name: impl Into<String>) -> Self {
        LoggingConfig {
            app_name: app_name.into(),
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_json(mut self) -> Self {
        self.json = true;
        self
    }
}

/// Installs the global `tracing` subscriber. Call once, at the top of
/// `main`, before anything else logs.
pub fn init(config: LoggingConfig) -> crate::error::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true);

    if config.json {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    }
    .map_err(|e| crate::error::Error::Fatal(format!("failed to install logging subscriber: {e}")))?;

    tracing::info!(app = %config.app_name, "starting");
    Ok(())
}

/// Parses a log level from a string, e.g. the `CALL_REGISTER_LOG_LEVEL`
/// configuration field.
pub fn parse_level(level: &str) -> crate::error::Result<Level> {
    level
        .parse()
        .map_err(|_| crate::error::Error::Fatal(format!("invalid log level: {level}")))
}
