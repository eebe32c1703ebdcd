/// Configuration management for GroupWarden
use crate::error::{WardenError, WardenResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardenConfig {
    pub storage: StorageConfig,
    pub flood: FloodConfig,
    pub jobs: JobsConfig,
    pub logging: LoggingConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
    pub max_connections: u32,
}

/// Flood tracker window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloodConfig {
    /// Sliding window length in seconds
    pub window_secs: u64,
}

/// Background job intervals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// How often expired mutes/bans are purged, in seconds
    pub sanction_purge_interval_secs: u64,
    /// How often the database is pinged, in seconds
    pub health_check_interval_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl WardenConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> WardenResult<Self> {
        dotenv::dotenv().ok();

        let data_directory: PathBuf = env::var("WARDEN_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database = env::var("WARDEN_DB_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("warden.sqlite"));
        let max_connections = env::var("WARDEN_DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);

        let window_secs = env::var("WARDEN_FLOOD_WINDOW_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map_err(|_| WardenError::Validation("Invalid flood window".to_string()))?;

        let sanction_purge_interval_secs = env::var("WARDEN_SANCTION_PURGE_INTERVAL_SECS")
            .unwrap_or_else(|_| "900".to_string())
            .parse()
            .unwrap_or(900);
        let health_check_interval_secs = env::var("WARDEN_HEALTH_CHECK_INTERVAL_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .unwrap_or(300);

        let level = env::var("WARDEN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            storage: StorageConfig {
                data_directory,
                database,
                max_connections,
            },
            flood: FloodConfig { window_secs },
            jobs: JobsConfig {
                sanction_purge_interval_secs,
                health_check_interval_secs,
            },
            logging: LoggingConfig { level },
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> WardenResult<()> {
        if self.flood.window_secs == 0 {
            return Err(WardenError::Validation(
                "Flood window must be at least one second".to_string(),
            ));
        }
        if self.storage.max_connections == 0 {
            return Err(WardenError::Validation(
                "Database pool needs at least one connection".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> WardenConfig {
        WardenConfig {
            storage: StorageConfig {
                data_directory: "./data".into(),
                database: "./data/warden.sqlite".into(),
                max_connections: 10,
            },
            flood: FloodConfig { window_secs: 5 },
            jobs: JobsConfig {
                sanction_purge_interval_secs: 900,
                health_check_interval_secs: 300,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    #[test]
    fn test_zero_window_rejected() {
        let mut config = base_config();
        assert!(config.validate().is_ok());

        config.flood.window_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_pool_rejected() {
        let mut config = base_config();
        config.storage.max_connections = 0;
        assert!(config.validate().is_err());
    }
}
