// config.rs
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_OLX_URL: &str = "https://www.olx.com.br/autos-e-pecas/carros-vans-e-utilitarios";
pub const DEFAULT_FIPE_URL: &str = "https://parallelum.com.br/fipe/api/v1";

pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Upper bound on pages a single search may request.
pub const MAX_PAGES: u32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a whole number, got '{value}'")]
    NotANumber { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub olx_url: String,
    pub fipe_url: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    /// Pause between listing pages.
    pub page_delay: Duration,
    /// Extra random pause added on top of `page_delay`, up to this much.
    pub page_jitter: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            olx_url: DEFAULT_OLX_URL.to_string(),
            fipe_url: DEFAULT_FIPE_URL.to_string(),
            user_agent: BROWSER_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(15),
            page_delay: Duration::from_millis(1500),
            page_jitter: Duration::from_millis(500),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from defaults, overridden by whatever `lookup` returns.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Config::default();

        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(url) = get("MOTOR_SCOUT_OLX_URL") {
            cfg.olx_url = url;
        }
        if let Some(url) = get("MOTOR_SCOUT_FIPE_URL") {
            cfg.fipe_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = get("MOTOR_SCOUT_TIMEOUT_SECS") {
            cfg.request_timeout = Duration::from_secs(parse_u64("MOTOR_SCOUT_TIMEOUT_SECS", secs)?);
        }
        if let Some(ms) = get("MOTOR_SCOUT_PAGE_DELAY_MS") {
            cfg.page_delay = Duration::from_millis(parse_u64("MOTOR_SCOUT_PAGE_DELAY_MS", ms)?);
        }

        Ok(cfg)
    }
}

fn parse_u64(key: &'static str, value: String) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::NotANumber { key, value })
}
