//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (HOARD_*)
//! 2. TOML config file (if HOARD_CONFIG_FILE set)
//! 3. Built-in defaults

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (HOARD_*)
/// 2. TOML config file (if HOARD_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding cache records.
    ///
    /// Set via HOARD_CACHE_ROOT environment variable.
    #[serde(default = "default_cache_root")]
    pub cache_root: PathBuf,

    /// Address the proxy listens on.
    ///
    /// Set via HOARD_HOST environment variable.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the proxy listens on.
    ///
    /// Set via HOARD_PORT environment variable.
    #[serde(default = "default_port")]
    pub port: u16,

    /// User-Agent sent to origins when the client did not send one.
    ///
    /// Set via HOARD_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Collapse concurrent misses for the same request into one origin call.
    ///
    /// Set via HOARD_SINGLE_FLIGHT environment variable.
    #[serde(default)]
    pub single_flight: bool,
}

fn default_cache_root() -> PathBuf {
    PathBuf::from("./cache")
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    8080
}

fn default_user_agent() -> String {
    "hoard/0.1".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_root: default_cache_root(),
            host: default_host(),
            port: default_port(),
            user_agent: default_user_agent(),
            single_flight: false,
        }
    }
}

impl AppConfig {
    /// Listener address built from `host` and `port`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `host` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|e| ConfigError::Invalid { field: "host".into(), reason: format!("{e}") })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `HOARD_`
    /// 2. TOML file from `HOARD_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("HOARD_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("HOARD_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.cache_root, PathBuf::from("./cache"));
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.user_agent, "hoard/0.1");
        assert!(!config.single_flight);
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig::default();
        assert_eq!(config.socket_addr().unwrap(), "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_socket_addr_bad_host() {
        let config = AppConfig { host: "localhost".into(), ..Default::default() };
        assert!(matches!(config.socket_addr(), Err(ConfigError::Invalid { field, .. }) if field == "host"));
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let figment = Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(
            r#"
            cache_root = "/var/cache/hoard"
            port = 9090
            single_flight = true
            "#,
        ));

        let config = AppConfig::extract(figment).unwrap();
        assert_eq!(config.cache_root, PathBuf::from("/var/cache/hoard"));
        assert_eq!(config.port, 9090);
        assert!(config.single_flight);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_extract_rejects_invalid_values() {
        let figment = Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string("port = 0"));
        assert!(matches!(AppConfig::extract(figment), Err(ConfigError::Invalid { field, .. }) if field == "port"));
    }

    #[test]
    fn test_extract_rejects_wrong_types() {
        let figment =
            Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string("port = \"eighty\""));
        assert!(matches!(AppConfig::extract(figment), Err(ConfigError::LoadFailed(_))));
    }
}
