//! Storefront Configuration System
//!
//! TOML-based configuration with environment variable overrides. Every
//! section has defaults, so an empty file (or no file) is a valid setup for
//! local development: in-memory document store and in-memory cache.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub transaction: TransactionConfig,
    pub cart: CartConfig,

    /// Enable development mode (seeds sample catalog data)
    pub dev_mode: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
            transaction: TransactionConfig::default(),
            cart: CartConfig::default(),
            dev_mode: false,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            cors_origins: vec!["http://localhost:4200".to_string()],
        }
    }
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Provider type: memory, mongodb
    pub provider: String,
    pub uri: String,
    pub name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            provider: "memory".to_string(),
            uri: "mongodb://localhost:27017/?replicaSet=rs0&directConnection=true".to_string(),
            name: "storefront".to_string(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Provider type: memory, redis
    pub provider: String,
    pub redis_url: String,
    /// Prefix applied to every key written to Redis
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            provider: "memory".to_string(),
            redis_url: "redis://localhost:6379".to_string(),
            key_prefix: "storefront:".to_string(),
        }
    }
}

/// Unit of work retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionConfig {
    /// Extra attempts after a transient fault
    pub max_retries: u32,
    /// Base delay between attempts in milliseconds (multiplied by attempt number)
    pub retry_delay_ms: u64,
}

impl TransactionConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

/// Cart business rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CartConfig {
    /// Maximum total quantity held in one cart
    pub max_items: u32,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self { max_items: 50 }
    }
}

const DATABASE_PROVIDERS: &[&str] = &["memory", "mongodb"];
const CACHE_PROVIDERS: &[&str] = &["memory", "redis"];

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// Reject settings the server cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !DATABASE_PROVIDERS.contains(&self.database.provider.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "unknown database provider '{}' (expected one of {:?})",
                self.database.provider, DATABASE_PROVIDERS
            )));
        }
        if !CACHE_PROVIDERS.contains(&self.cache.provider.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "unknown cache provider '{}' (expected one of {:?})",
                self.cache.provider, CACHE_PROVIDERS
            )));
        }
        if self.cart.max_items == 0 {
            return Err(ConfigError::ValidationError(
                "cart.max_items must be greater than zero".to_string(),
            ));
        }
        if self.database.provider == "mongodb" && self.database.uri.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.uri is required for the mongodb provider".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# Storefront Configuration
# Environment variables (SHOP_*) override these settings

dev_mode = false

[http]
port = 8080
host = "0.0.0.0"
cors_origins = ["http://localhost:4200"]

[database]
provider = "memory"  # memory or mongodb
uri = "mongodb://localhost:27017/?replicaSet=rs0&directConnection=true"
name = "storefront"

[cache]
provider = "memory"  # memory or redis
redis_url = "redis://localhost:6379"
key_prefix = "storefront:"

[transaction]
max_retries = 3
retry_delay_ms = 100

[cart]
max_items = 50
"#
        .to_string()
    }
}
