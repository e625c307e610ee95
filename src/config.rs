//! Runtime configuration.
//!
//! Each key is looked up in the process environment first (a `.env` file is
//! loaded into it at startup), then in the config bundled into the binary.

use crate::types::{ChatModel, UnknownModel};
use std::time::Duration;

/// Bundled defaults, used when nothing overrides them.
const BUNDLED_CONFIG: &str = include_str!("../assets/config.env");

pub const API_URL_KEY: &str = "DOCUCHAT_API_URL";
pub const TIMEOUT_KEY: &str = "DOCUCHAT_TIMEOUT_SECS";
pub const MODEL_KEY: &str = "DOCUCHAT_MODEL";
pub const MAX_UPLOAD_KEY: &str = "DOCUCHAT_MAX_UPLOAD_MB";

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_UPLOAD_MB: u64 = 25;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a positive whole number, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key}: {source}")]
    InvalidModel {
        key: &'static str,
        #[source]
        source: UnknownModel,
    },

    #[error("{key} must be an http(s) URL, got {value:?}")]
    InvalidUrl { key: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub api_url: String,
    pub request_timeout: Duration,
    pub default_model: ChatModel,
    pub max_upload_bytes: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_model: ChatModel::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}

impl AppConfig {
    /// Loads `.env` (if any) and resolves every key.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            tracing::warn!("ignoring unreadable .env file: {}", err);
        }
        Self::resolve(|key| std::env::var(key).ok())
    }

    /// Resolves each key through `lookup`, falling back to the bundled config.
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .or_else(|| bundled_value(key))
        };
        let defaults = Self::default();

        let api_url = match get(API_URL_KEY) {
            Some(url) => parse_url(&url)?,
            None => defaults.api_url,
        };
        let request_timeout = match get(TIMEOUT_KEY) {
            Some(raw) => Duration::from_secs(parse_number(TIMEOUT_KEY, &raw)?),
            None => defaults.request_timeout,
        };
        let default_model = match get(MODEL_KEY) {
            Some(raw) => raw.parse::<ChatModel>().map_err(|source| ConfigError::InvalidModel {
                key: MODEL_KEY,
                source,
            })?,
            None => defaults.default_model,
        };
        let max_upload_bytes = match get(MAX_UPLOAD_KEY) {
            Some(raw) => parse_number(MAX_UPLOAD_KEY, &raw)?.saturating_mul(1024 * 1024),
            None => defaults.max_upload_bytes,
        };

        Ok(Self {
            api_url,
            request_timeout,
            default_model,
            max_upload_bytes,
        })
    }
}

fn bundled_value(wanted: &str) -> Option<String> {
    BUNDLED_CONFIG.lines().find_map(|line| {
        let line = line.trim();
        // Skip comments and empty lines
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let (key, value) = line.split_once('=')?;
        (key.trim() == wanted).then(|| value.trim().to_string())
    })
}

/// Zero is rejected: a zero timeout fails every request and a zero size cap
/// rejects every file.
fn parse_number(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidNumber {
            key,
            value: raw.to_string(),
        }),
    }
}

fn parse_url(raw: &str) -> Result<String, ConfigError> {
    let url = raw.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.trim_end_matches('/').to_string())
    } else {
        Err(ConfigError::InvalidUrl {
            key: API_URL_KEY,
            value: raw.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_bundled_defaults_apply() {
        let config = AppConfig::resolve(|_| None).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_environment_overrides_bundled() {
        let config = AppConfig::resolve(lookup_from(&[
            (API_URL_KEY, "https://rag.example.com/"),
            (TIMEOUT_KEY, "30"),
            (MODEL_KEY, "gpt-3.5-turbo"),
            (MAX_UPLOAD_KEY, "2"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "https://rag.example.com");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.default_model, ChatModel::Gpt35Turbo);
        assert_eq!(config.max_upload_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn test_blank_value_falls_back() {
        let config = AppConfig::resolve(lookup_from(&[(API_URL_KEY, "  ")])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_invalid_values_name_the_key() {
        let err = AppConfig::resolve(lookup_from(&[(TIMEOUT_KEY, "soon")])).unwrap_err();
        assert!(err.to_string().contains(TIMEOUT_KEY));

        let err = AppConfig::resolve(lookup_from(&[(TIMEOUT_KEY, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { key: TIMEOUT_KEY, .. }));

        let err = AppConfig::resolve(lookup_from(&[(MAX_UPLOAD_KEY, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { key: MAX_UPLOAD_KEY, .. }));

        let err = AppConfig::resolve(lookup_from(&[(MODEL_KEY, "llama")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidModel { .. }));

        let err = AppConfig::resolve(lookup_from(&[(API_URL_KEY, "localhost:8000")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }
}
