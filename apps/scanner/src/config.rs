use std::net::IpAddr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::llm_client::DEFAULT_API_URL;
use crate::session::ThemePreference;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub anthropic_api_url: String,
    pub bind_addr: IpAddr,
    pub port: u16,
    pub rust_log: String,
    pub theme: ThemePreference,
    pub max_upload_bytes: usize,
    pub llm_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            anthropic_api_url: std::env::var("ANTHROPIC_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            bind_addr: std::env::var("BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1".to_string())
                .parse::<IpAddr>()
                .context("BIND_ADDR must be a valid IP address")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            theme: std::env::var("SCANNER_THEME")
                .unwrap_or_default()
                .parse::<ThemePreference>()
                .map_err(|e| anyhow!("SCANNER_THEME: {e}"))?,
            max_upload_bytes: optional_number("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            llm_timeout: Duration::from_secs(optional_number(
                "LLM_TIMEOUT_SECS",
                DEFAULT_LLM_TIMEOUT_SECS,
            )?),
        })
    }

    /// Request body limit. Leaves room for base64 inflation and the text fields.
    pub fn body_limit(&self) -> usize {
        self.max_upload_bytes.saturating_mul(2).max(1024 * 1024)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_number<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a positive number")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            anthropic_api_key: "test-key".to_string(),
            anthropic_api_url: DEFAULT_API_URL.to_string(),
            bind_addr: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            rust_log: "debug".to_string(),
            theme: ThemePreference::Light,
            max_upload_bytes: 1024,
            llm_timeout: Duration::from_secs(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_limit_covers_base64_payload() {
        let config = Config::for_tests();
        assert!(config.body_limit() >= config.max_upload_bytes * 4 / 3);
    }

    #[test]
    fn test_body_limit_has_floor_for_text_fields() {
        let config = Config::for_tests();
        assert_eq!(config.body_limit(), 1024 * 1024);
    }
}
