//! API configuration

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use core_kernel::{StoreSettings, Timezone};
use infra_db::DatabaseConfig;

/// Where orders, products and commission batches are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    /// Process-local; data is lost on restart
    Memory,
}

/// API configuration
///
/// Every field can be set through an `API_`-prefixed environment variable,
/// e.g. `API_PORT=9000` or `API_STORAGE=memory`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    pub storage: StorageBackend,
    /// Database URL
    pub database_url: String,
    pub max_connections: u32,
    /// Upper bound on every storage call
    pub query_timeout_ms: u64,
    /// Log level, overridden by `RUST_LOG`
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// IANA name of the store's timezone
    pub timezone: String,
    /// Global installment cap
    pub max_installments: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            storage: StorageBackend::Postgres,
            database_url: "postgres://localhost/adc_pro".to_string(),
            max_connections: 10,
            query_timeout_ms: 5_000,
            log_level: "info".to_string(),
            log_json: false,
            timezone: "America/Sao_Paulo".to_string(),
            max_installments: 24,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(&self.database_url)
            .max_connections(self.max_connections)
            .query_timeout(self.query_timeout())
    }

    /// Store settings handed to the domain services
    ///
    /// # Errors
    ///
    /// Returns a message naming the timezone if it is not a known IANA zone
    pub fn store_settings(&self) -> Result<StoreSettings, String> {
        let timezone = Timezone::from_str(&self.timezone).map_err(|e| e.to_string())?;
        Ok(StoreSettings {
            timezone,
            max_installments: self.max_installments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_build_store_settings() {
        let config = ApiConfig::default();
        let settings = config.store_settings().unwrap();
        assert_eq!(settings.max_installments, 24);
        assert_eq!(settings.timezone.name(), "America/Sao_Paulo");
        assert_eq!(config.database_config().query_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_unknown_timezone_is_rejected() {
        let config = ApiConfig {
            timezone: "Mars/Olympus".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.store_settings().is_err());
    }
}
