//! Typed, environment-driven configuration (§7.1).
//!
//! Every binary calls [`load`] once at startup: it loads a `.env` file if
//! one is present (development convenience only — production deployments
//! set real environment variables) and then deserializes the process
//! environment into a component-specific config struct with `envy`,
//! prefixed per component (`CALL_REGISTER_`, `ASTERISK_DIALER_`, ...).

use serde::de::DeserializeOwned;

/// Loads `.env` (if present) and deserializes the environment into `T`
/// using the given variable prefix, e.g. `load::<CallRegisterConfig>("CALL_REGISTER_")`.
pub fn load<T: DeserializeOwned>(prefix: &str) -> crate::error::Result<T> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(dotenvy::Error::Io(_)) => {}
        Err(e) => tracing::warn!(error = %e, "failed to parse .env, ignoring"),
    }
    envy::prefixed(prefix)
        .from_env::<T>()
        .map_err(|e| crate::error::Error::Fatal(format!("configuration error: {e}")))
}

/// Shared knobs every service's config embeds: its own bind address and the
/// base URLs of the peers it talks to. Components `#[serde(flatten)]` this
/// alongside their own fields.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CommonConfig {
    pub bind_address: String,
    pub database_url: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[derive(Debug, serde::Deserialize)]
    struct Probe {
        #[serde(flatten)]
        common: CommonConfig,
        times_to_dial: u32,
    }

    #[test]
    #[serial]
    fn load_reads_prefixed_environment_variables() {
        std::env::set_var("PROBE_BIND_ADDRESS", "0.0.0.0:9000");
        std::env::set_var("PROBE_DATABASE_URL", "sqlite://probe.db");
        std::env::set_var("PROBE_TIMES_TO_DIAL", "3");
        let cfg: Probe = envy::prefixed("PROBE_").from_env().unwrap();
        assert_eq!(cfg.common.bind_address, "0.0.0.0:9000");
        assert_eq!(cfg.times_to_dial, 3);
        std::env::remove_var("PROBE_BIND_ADDRESS");
        std::env::remove_var("PROBE_DATABASE_URL");
        std::env::remove_var("PROBE_TIMES_TO_DIAL");
    }
}
