//! Client configuration loaded from environment variables.

use crate::errors::{ClientError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Backend REST base URL (e.g. https://api.example.org/api)
    pub api_base_url: String,
    /// Durable client storage; a SQLite URL or file path
    pub storage_url: String,
    /// Port for the payment callback listener
    pub callback_port: u16,
    /// Per-request HTTP timeout, in seconds
    pub request_timeout_secs: u64,
    /// Route the navigator is sent to after logout
    pub login_route: String,
    /// Attempts per payout step before the saga gives up
    pub payout_max_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let api_base_url = lookup("API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                ClientError::Config("API_BASE_URL environment variable is required".to_string())
            })?;

        Ok(Config {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            storage_url: var("STORAGE_URL", "sqlite:./crowdfund_client.db"),
            callback_port: var("CALLBACK_PORT", "3000")
                .parse()
                .map_err(|_| ClientError::Config("Invalid CALLBACK_PORT".to_string()))?,
            request_timeout_secs: var("REQUEST_TIMEOUT_SECS", "30")
                .parse()
                .map_err(|_| ClientError::Config("Invalid REQUEST_TIMEOUT_SECS".to_string()))?,
            login_route: var("LOGIN_ROUTE", "/login"),
            payout_max_attempts: match var("PAYOUT_MAX_ATTEMPTS", "3").parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ClientError::Config(
                        "Invalid PAYOUT_MAX_ATTEMPTS".to_string(),
                    ))
                }
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&[("API_BASE_URL", "http://api.test/")])).unwrap();
        assert_eq!(config.api_base_url, "http://api.test");
        assert_eq!(config.storage_url, "sqlite:./crowdfund_client.db");
        assert_eq!(config.callback_port, 3000);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.login_route, "/login");
        assert_eq!(config.payout_max_attempts, 3);
    }

    #[test]
    fn base_url_is_required() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("API_BASE_URL", "http://api.test"),
            ("CALLBACK_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: Invalid CALLBACK_PORT");

        let err = Config::from_lookup(lookup(&[
            ("API_BASE_URL", "http://api.test"),
            ("PAYOUT_MAX_ATTEMPTS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }
}
