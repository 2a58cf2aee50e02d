//! Configuration for the ballot registry
//!
//! Loads registry and logging settings from environment variables, with a
//! `.env` file honoured when present.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default broadcast buffer for registry observers
const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Registry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Title stored at creation
    pub title: String,

    /// Events buffered per observer before slow receivers start lagging
    pub event_capacity: usize,

    /// Keep every journal entry, not just the latest
    ///
    /// Retained entries are never evicted, so memory grows with each
    /// operation. Disable for long-lived registries whose observers persist
    /// the event stream themselves.
    pub retain_journal: bool,
}

impl RegistryConfig {
    /// Load registry configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let title = std::env::var("BALLOT_TITLE").unwrap_or_else(|_| "Election".to_string());
        if title.trim().is_empty() {
            return Err(Error::internal("BALLOT_TITLE must not be blank"));
        }

        let event_capacity = std::env::var("BALLOT_EVENT_CAPACITY")
            .unwrap_or_else(|_| DEFAULT_EVENT_CAPACITY.to_string())
            .parse()
            .map_err(|_| Error::internal("Invalid BALLOT_EVENT_CAPACITY"))?;
        Self::validate_capacity(event_capacity)?;

        let retain_journal = std::env::var("BALLOT_JOURNAL")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .map_err(|_| Error::internal("BALLOT_JOURNAL must be true or false"))?;

        Ok(Self {
            title,
            event_capacity,
            retain_journal,
        })
    }

    /// Create configuration for testing
    pub fn for_testing() -> Self {
        Self {
            title: "Test Election".to_string(),
            event_capacity: 64,
            retain_journal: true,
        }
    }

    fn validate_capacity(capacity: usize) -> Result<()> {
        if capacity == 0 {
            return Err(Error::internal("BALLOT_EVENT_CAPACITY must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            title: "Election".to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            retain_journal: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `compact`
    pub format: String,
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self> {
        let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

        if !matches!(format.as_str(), "pretty" | "compact") {
            return Err(Error::internal(format!(
                "LOG_FORMAT must be pretty or compact, got {format}"
            )));
        }

        Ok(Self { level, format })
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub registry: RegistryConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment
    pub fn from_env() -> Result<Self> {
        let registry = RegistryConfig::from_env()?;
        let logging = LoggingConfig::from_env()?;

        Ok(Self { registry, logging })
    }

    /// Create configuration for testing
    pub fn for_testing() -> Result<Self> {
        let registry = RegistryConfig::for_testing();

        let logging = LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        };

        Ok(Self { registry, logging })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_testing_config() {
        let config = Config::for_testing().unwrap();

        assert!(!config.registry.title.is_empty());
        assert!(config.registry.event_capacity > 0);
        assert!(config.registry.retain_journal);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_capacity_validation() {
        assert!(RegistryConfig::validate_capacity(1).is_ok());
        assert!(RegistryConfig::validate_capacity(0).is_err());
    }

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::default();
        assert_eq!(config.title, "Election");
        assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
    }
}
