//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::util::rate_limit::DEFAULT_INPUT_RATE_LIMIT;

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log line format
    pub log_format: LogFormat,

    /// Allowed client origins for CORS; empty allows any origin
    pub client_origins: Vec<String>,

    /// Max inbound messages per connection per second
    pub input_rate_limit: u32,
    /// Outbound queue depth per connection
    pub outbox_capacity: usize,

    /// Optional cap on the magnitude of a single move delta
    pub max_move_delta: Option<f64>,
    /// Chat messages longer than this are truncated
    pub max_chat_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            client_origins: Vec::new(),
            input_rate_limit: DEFAULT_INPUT_RATE_LIMIT,
            outbox_capacity: 128,
            max_move_delta: None,
            max_chat_length: 200,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // PORT wins over SERVER_ADDR so hosted platforms can inject it
        let server_addr = match (lookup("PORT"), lookup("SERVER_ADDR")) {
            (Some(port), _) => format!("0.0.0.0:{}", port),
            (None, Some(addr)) => addr,
            (None, None) => defaults.server_addr.to_string(),
        };

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let client_origins = lookup("CLIENT_ORIGIN")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress(server_addr.clone()))?,
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format,
            client_origins,
            input_rate_limit: parse_or(&lookup, "INPUT_RATE_LIMIT", defaults.input_rate_limit)?,
            outbox_capacity: parse_or(&lookup, "OUTBOX_CAPACITY", defaults.outbox_capacity)?,
            max_move_delta: lookup("MAX_MOVE_DELTA")
                .map(|raw| parse_value("MAX_MOVE_DELTA", &raw))
                .transpose()?,
            max_chat_length: parse_or(&lookup, "MAX_CHAT_LENGTH", defaults.max_chat_length)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key, raw.to_string()))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format: {0}")]
    InvalidAddress(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
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
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.server_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.client_origins.is_empty());
        assert_eq!(config.max_move_delta, None);
    }

    #[test]
    fn port_overrides_server_addr() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "9000"),
            ("SERVER_ADDR", "127.0.0.1:7000"),
        ]))
        .unwrap();
        assert_eq!(config.server_addr.port(), 9000);
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        let config = Config::from_lookup(lookup_from(&[(
            "CLIENT_ORIGIN",
            "http://a.test, http://b.test,,",
        )]))
        .unwrap();
        assert_eq!(config.client_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn optional_move_cap_is_parsed() {
        let config =
            Config::from_lookup(lookup_from(&[("MAX_MOVE_DELTA", "12.5"), ("LOG_FORMAT", "json")]))
                .unwrap();
        assert_eq!(config.max_move_delta, Some(12.5));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn bad_values_are_reported() {
        let err = Config::from_lookup(lookup_from(&[("INPUT_RATE_LIMIT", "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue("INPUT_RATE_LIMIT", _)));

        let err = Config::from_lookup(lookup_from(&[("SERVER_ADDR", "nowhere")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddress(_)));
    }
}
