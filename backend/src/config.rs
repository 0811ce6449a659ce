//! # Configuration
//!
//! Everything is environment driven. `.env` and then `.env.local` are loaded
//! first (the latter overriding), after that the process environment is read.
//! Each key also accepts its `VITE_`-prefixed spelling so one env file can be
//! shared with the web client.

use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::storage::sqlite::DEFAULT_DATABASE_URL;

pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_AI_PROXY_URL: &str = "http://localhost:5001/api/ai";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_SYNC_DEBOUNCE: Duration = Duration::from_millis(1000);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Connection settings of the remote profile store. Both values are needed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteStoreConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStoreStatus<'a> {
    Enabled { url: &'a str, anon_key: &'a str },
    /// Local-only mode
    MissingConfig,
}

impl RemoteStoreConfig {
    pub fn status(&self) -> RemoteStoreStatus<'_> {
        match (self.url.as_deref(), self.anon_key.as_deref()) {
            (Some(url), Some(anon_key)) => RemoteStoreStatus::Enabled { url, anon_key },
            _ => RemoteStoreStatus::MissingConfig,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.status(), RemoteStoreStatus::Enabled { .. })
    }
}

/// Settings of the client side of the AI gateway
#[derive(Debug, Clone, PartialEq)]
pub struct AiClientConfig {
    pub endpoint: String,
    pub default_model: String,
}

impl Default for AiClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_AI_PROXY_URL.to_string(),
            default_model: DEFAULT_AI_MODEL.to_string(),
        }
    }
}

/// Settings of the AI proxy server
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyConfig {
    pub port: u16,
    /// Server-held credential; the proxy answers 500 while it is missing
    pub api_key: Option<String>,
    pub upstream_url: String,
    pub default_model: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_key: None,
            upstream_url: DEFAULT_OPENAI_URL.to_string(),
            default_model: DEFAULT_AI_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Quiet period before a remote upload
    pub debounce: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_SYNC_DEBOUNCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub remote: RemoteStoreConfig,
    pub ai: AiClientConfig,
    pub proxy: ProxyConfig,
    pub sync: SyncConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            remote: RemoteStoreConfig::default(),
            ai: AiClientConfig::default(),
            proxy: ProxyConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load env files, then read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::from_filename(".env") {
            debug!(error = %e, "No .env loaded");
        }
        if let Err(e) = dotenvy::from_filename_override(".env.local") {
            debug!(error = %e, "No .env.local loaded");
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as missing
        let get = |key: &str| {
            lookup(key)
                .or_else(|| lookup(&format!("VITE_{}", key)))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let model = get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_AI_MODEL.to_string());

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                key: "PORT",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let debounce = match get("SYNC_DEBOUNCE_MS") {
            Some(raw) => Duration::from_millis(raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue {
                    key: "SYNC_DEBOUNCE_MS",
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?),
            None => DEFAULT_SYNC_DEBOUNCE,
        };

        let config = Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            remote: RemoteStoreConfig {
                url: get("SUPABASE_URL"),
                anon_key: get("SUPABASE_ANON_KEY"),
            },
            ai: AiClientConfig {
                endpoint: get("AI_PROXY_URL").unwrap_or_else(|| DEFAULT_AI_PROXY_URL.to_string()),
                default_model: model.clone(),
            },
            proxy: ProxyConfig {
                port,
                api_key: lookup("OPENAI_API_KEY")
                    .map(|value| value.trim().to_string())
                    .filter(|value| !value.is_empty()),
                upstream_url: get("OPENAI_URL").unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string()),
                default_model: model,
            },
            sync: SyncConfig { debounce },
        };

        if !config.remote.is_enabled() {
            warn!("Supabase is not configured, running with local storage only");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.remote.status(), RemoteStoreStatus::MissingConfig);
        assert_eq!(config.sync.debounce, Duration::from_secs(1));
    }

    #[test]
    fn test_remote_needs_both_values() {
        let config = AppConfig::from_lookup(lookup(&[("SUPABASE_URL", "https://x.supabase.co")])).unwrap();
        assert!(!config.remote.is_enabled());

        let config = AppConfig::from_lookup(lookup(&[
            ("VITE_SUPABASE_URL", "https://x.supabase.co"),
            ("VITE_SUPABASE_ANON_KEY", "anon"),
        ]))
        .unwrap();
        assert_eq!(
            config.remote.status(),
            RemoteStoreStatus::Enabled {
                url: "https://x.supabase.co",
                anon_key: "anon"
            }
        );
    }

    #[test]
    fn test_blank_values_are_missing() {
        let config = AppConfig::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://x.supabase.co"),
            ("SUPABASE_ANON_KEY", "   "),
            ("OPENAI_API_KEY", ""),
        ]))
        .unwrap();
        assert!(!config.remote.is_enabled());
        assert_eq!(config.proxy.api_key, None);
    }

    #[test]
    fn test_model_and_port() {
        let config = AppConfig::from_lookup(lookup(&[
            ("OPENAI_MODEL", "gpt-4o"),
            ("PORT", "8080"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap();
        assert_eq!(config.ai.default_model, "gpt-4o");
        assert_eq!(config.proxy.default_model, "gpt-4o");
        assert_eq!(config.proxy.port, 8080);
        assert_eq!(config.proxy.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_invalid_port() {
        let result = AppConfig::from_lookup(lookup(&[("PORT", "not-a-port")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { key: "PORT", .. })
        ));
    }
}
