//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "storefront.toml",
    "./config/config.toml",
    "./config/storefront.toml",
    "/etc/storefront/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = match self.find_config_file() {
            Some(path) => {
                info!(?path, "Loading configuration from file");
                AppConfig::from_file(&path)?
            }
            None => AppConfig::default(),
        };

        apply_overrides(&mut config, |key| env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
        }

        if let Ok(path) = env::var("SHOP_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `SHOP_*` overrides using the given variable lookup.
///
/// Values that fail to parse are ignored and the file/default value is kept.
pub(crate) fn apply_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    // HTTP
    if let Some(port) = lookup("SHOP_HTTP_PORT").and_then(|v| v.parse().ok()) {
        config.http.port = port;
    }
    if let Some(val) = lookup("SHOP_HTTP_HOST") {
        config.http.host = val;
    }
    if let Some(val) = lookup("SHOP_CORS_ORIGINS") {
        config.http.cors_origins = val.split(',').map(|s| s.trim().to_string()).collect();
    }

    // Database
    if let Some(val) = lookup("SHOP_DATABASE_PROVIDER") {
        config.database.provider = val;
    }
    if let Some(val) = lookup("SHOP_DATABASE_URI") {
        config.database.uri = val;
    }
    if let Some(val) = lookup("SHOP_DATABASE_NAME") {
        config.database.name = val;
    }

    // Cache
    if let Some(val) = lookup("SHOP_CACHE_PROVIDER") {
        config.cache.provider = val;
    }
    if let Some(val) = lookup("SHOP_REDIS_URL") {
        config.cache.redis_url = val;
    }
    if let Some(val) = lookup("SHOP_CACHE_KEY_PREFIX") {
        config.cache.key_prefix = val;
    }

    // Transaction
    if let Some(retries) = lookup("SHOP_TRANSACTION_MAX_RETRIES").and_then(|v| v.parse().ok()) {
        config.transaction.max_retries = retries;
    }
    if let Some(delay) = lookup("SHOP_TRANSACTION_RETRY_DELAY_MS").and_then(|v| v.parse().ok()) {
        config.transaction.retry_delay_ms = delay;
    }

    // Cart
    if let Some(max) = lookup("SHOP_CART_MAX_ITEMS").and_then(|v| v.parse().ok()) {
        config.cart.max_items = max;
    }

    // General
    if let Some(val) = lookup("SHOP_DEV_MODE") {
        config.dev_mode = val == "true" || val == "1";
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_overrides_replace_values() {
        let mut config = AppConfig::default();
        apply_overrides(
            &mut config,
            lookup_from(&[
                ("SHOP_HTTP_PORT", "9000"),
                ("SHOP_DATABASE_PROVIDER", "mongodb"),
                ("SHOP_CACHE_PROVIDER", "redis"),
                ("SHOP_TRANSACTION_MAX_RETRIES", "5"),
                ("SHOP_CART_MAX_ITEMS", "10"),
                ("SHOP_DEV_MODE", "1"),
                ("SHOP_CORS_ORIGINS", "http://a.test, http://b.test"),
            ]),
        );

        assert_eq!(config.http.port, 9000);
        assert_eq!(config.database.provider, "mongodb");
        assert_eq!(config.cache.provider, "redis");
        assert_eq!(config.transaction.max_retries, 5);
        assert_eq!(config.cart.max_items, 10);
        assert!(config.dev_mode);
        assert_eq!(config.http.cors_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_unparseable_values_are_ignored() {
        let mut config = AppConfig::default();
        apply_overrides(
            &mut config,
            lookup_from(&[("SHOP_HTTP_PORT", "not-a-port"), ("SHOP_CART_MAX_ITEMS", "-1")]),
        );

        assert_eq!(config.http.port, 8080);
        assert_eq!(config.cart.max_items, 50);
    }

    #[test]
    fn test_explicit_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storefront.toml");
        std::fs::write(&path, "[transaction]\nmax_retries = 7\n").unwrap();

        let config = ConfigLoader::with_path(&path).load().unwrap();
        assert_eq!(config.transaction.max_retries, 7);
    }
}
