use std::env;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "0.0.0.0:8000";
pub const DEFAULT_ADMIN_KEY: &str = "dev-arogya-key";

/// Service settings, read once from `AROGYA_*` environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind: String,
    pub database_url: Option<String>,
    pub admin_key: String,
    pub content_path: Option<String>,
    pub sender_url: Option<String>,
    pub sender_token: Option<String>,
    pub rate_limit_window: Duration,
    pub rate_limit_max: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            database_url: None,
            admin_key: DEFAULT_ADMIN_KEY.to_string(),
            content_path: None,
            sender_url: None,
            sender_token: None,
            rate_limit_window: Duration::from_secs(60),
            rate_limit_max: 120,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            bind: non_empty("AROGYA_BIND").unwrap_or(defaults.bind),
            database_url: non_empty("AROGYA_DATABASE_URL"),
            admin_key: non_empty("AROGYA_ADMIN_KEY").unwrap_or(defaults.admin_key),
            content_path: non_empty("AROGYA_CONTENT_PATH"),
            sender_url: non_empty("AROGYA_SENDER_URL"),
            sender_token: non_empty("AROGYA_SENDER_TOKEN"),
            rate_limit_window: non_empty("AROGYA_RATE_LIMIT_WINDOW_SECONDS")
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.rate_limit_window),
            rate_limit_max: non_empty("AROGYA_RATE_LIMIT_MAX")
                .and_then(|value| value.parse::<usize>().ok())
                .unwrap_or(defaults.rate_limit_max),
        }
    }
}
