//! API configuration

use serde::Deserialize;

use crate::auth::MAX_TOKEN_LIFETIME_SECS;

/// Where users and invoices are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local maps; everything is lost on restart
    #[default]
    Memory,
    Postgres,
}

/// API configuration
///
/// Missing keys fall back to [`ApiConfig::default`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL, used when `storage` is `postgres`
    pub database_url: String,
    /// Log level
    pub log_level: String,
    pub storage: StorageBackend,
    /// Currency assigned to accounts registered without one
    pub default_currency: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/invoicegen".to_string(),
            log_level: "info".to_string(),
            storage: StorageBackend::Memory,
            default_currency: "USD".to_string(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `API_*` environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the server cannot run with
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.jwt_expiration_secs == 0 || self.jwt_expiration_secs > MAX_TOKEN_LIFETIME_SECS {
            return Err(config::ConfigError::Message(format!(
                "jwt_expiration_secs must be between 1 and {}, got {}",
                MAX_TOKEN_LIFETIME_SECS, self.jwt_expiration_secs
            )));
        }
        Ok(())
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_memory_storage() {
        let config = ApiConfig::default();
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.default_currency, "USD");
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn token_lifetime_is_bounded() {
        for secs in [0, MAX_TOKEN_LIFETIME_SECS + 1, u64::MAX] {
            let config = ApiConfig {
                jwt_expiration_secs: secs,
                ..ApiConfig::default()
            };
            assert!(config.validate().is_err(), "{} accepted", secs);
        }
    }

    #[test]
    fn partial_sources_keep_defaults() {
        let config: ApiConfig = config::Config::builder()
            .set_override("port", 9090)
            .unwrap()
            .set_override("storage", "postgres")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.storage, StorageBackend::Postgres);
        assert_eq!(config.jwt_expiration_secs, 3600);
        assert_eq!(config.default_currency, "USD");
    }
}
