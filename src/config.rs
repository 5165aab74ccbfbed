//! Configuration management for the Kiva bot

use anyhow::Result;
use std::env;
use std::time::Duration;

/// Browser user-agent sent with every API request
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36";

/// Bot configuration loaded from environment
#[derive(Debug, Clone)]
pub struct Config {
    /// File with one bearer token per line
    pub token_file: String,

    /// File with one proxy per line. `None` means requests go out directly.
    pub proxy_file: Option<String>,

    /// Seconds between poll cycles
    pub poll_interval_seconds: u64,

    /// Timeout for a single HTTP request
    pub request_timeout_seconds: u64,

    /// Upper bound for collecting one account's three calls
    pub account_timeout_seconds: u64,

    /// API root, without trailing slash
    pub api_base_url: String,

    /// Appended to balances in the table
    pub currency_suffix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token_file: "token.txt".to_string(),
            proxy_file: None,
            poll_interval_seconds: 60,
            request_timeout_seconds: 30,
            account_timeout_seconds: 120,
            api_base_url: KivaApi::DEFAULT_BASE_URL.to_string(),
            currency_suffix: "Kiva".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let parse_secs = |key: &str, default: u64| -> Result<u64> {
            match get(key) {
                Some(v) => v
                    .parse()
                    .map_err(|_| anyhow::anyhow!("{} must be a whole number of seconds, got '{}'", key, v)),
                None => Ok(default),
            }
        };

        let config = Self {
            token_file: get("TOKEN_FILE").unwrap_or(defaults.token_file),
            proxy_file: get("PROXY_FILE"),
            poll_interval_seconds: parse_secs("POLL_INTERVAL_SECONDS", defaults.poll_interval_seconds)?,
            request_timeout_seconds: parse_secs("REQUEST_TIMEOUT_SECONDS", defaults.request_timeout_seconds)?,
            account_timeout_seconds: parse_secs("ACCOUNT_TIMEOUT_SECONDS", defaults.account_timeout_seconds)?,
            api_base_url: get("KIVA_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            currency_suffix: get("CURRENCY_SUFFIX").unwrap_or(defaults.currency_suffix),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject zero intervals and timeouts
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_seconds == 0 {
            anyhow::bail!("POLL_INTERVAL_SECONDS must be greater than zero");
        }
        if self.request_timeout_seconds == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECONDS must be greater than zero");
        }
        if self.account_timeout_seconds == 0 {
            anyhow::bail!("ACCOUNT_TIMEOUT_SECONDS must be greater than zero");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn account_timeout(&self) -> Duration {
        Duration::from_secs(self.account_timeout_seconds)
    }

    pub fn api(&self) -> KivaApi {
        KivaApi::new(&self.api_base_url)
    }
}

/// Kivanet API endpoints
#[derive(Debug, Clone)]
pub struct KivaApi {
    base_url: String,
}

impl KivaApi {
    pub const DEFAULT_BASE_URL: &'static str = "https://app.kivanet.com";

    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn user_info_url(&self) -> String {
        format!("{}/api/user/getUserInfo", self.base_url)
    }

    pub fn account_info_url(&self) -> String {
        format!("{}/api/user/getMyAccountInfo", self.base_url)
    }

    pub fn sign_info_url(&self) -> String {
        format!("{}/api/user/getSignInfo", self.base_url)
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
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.token_file, "token.txt");
        assert_eq!(config.proxy_file, None);
        assert_eq!(config.poll_interval(), Duration::from_secs(60));
        assert_eq!(config.currency_suffix, "Kiva");
        assert_eq!(
            config.api().user_info_url(),
            "https://app.kivanet.com/api/user/getUserInfo"
        );
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("TOKEN_FILE", "accounts.txt"),
            ("PROXY_FILE", "proxy.txt"),
            ("POLL_INTERVAL_SECONDS", "15"),
            ("KIVA_API_BASE_URL", "http://localhost:9000/"),
        ]))
        .unwrap();

        assert_eq!(config.token_file, "accounts.txt");
        assert_eq!(config.proxy_file.as_deref(), Some("proxy.txt"));
        assert_eq!(config.poll_interval_seconds, 15);
        assert_eq!(
            config.api().sign_info_url(),
            "http://localhost:9000/api/user/getSignInfo"
        );
    }

    #[test]
    fn test_blank_proxy_file_means_direct() {
        let config = Config::from_lookup(lookup(&[("PROXY_FILE", "   ")])).unwrap();
        assert_eq!(config.proxy_file, None);
    }

    #[test]
    fn test_rejects_zero_and_garbage() {
        assert!(Config::from_lookup(lookup(&[("POLL_INTERVAL_SECONDS", "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[("ACCOUNT_TIMEOUT_SECONDS", "soon")])).is_err());
    }
}
