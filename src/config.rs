use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const DEFAULT_LEAFONE_BASE_URL: &str = "https://api.leafone.cn/api/icp";
const DEFAULT_VVHAN_BASE_URL: &str = "https://api.vvhan.com/api/icp";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub cache_path: Option<String>,  // None keeps the cache in memory
    pub cache_max_entries: u64,
    pub primary_provider: String,
    pub fallback_provider: Option<String>,
    pub leafone_base_url: String,
    pub leafone_retry_count: usize,
    pub leafone_cache_ttl_seconds: u64,
    pub vvhan_base_url: String,
    pub vvhan_retry_count: usize,
    pub vvhan_cache_ttl_seconds: u64,
    pub request_timeout_seconds: u64,  // 0 leaves the transport default in place
    pub user_agent: String,
    pub start_time: Instant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigData {
    pub port: u16,
    pub cache_path: String,
    pub cache_max_entries: u64,
    pub primary_provider: String,
    pub fallback_provider: String,
    pub leafone_base_url: String,
    pub leafone_retry_count: usize,
    pub leafone_cache_ttl_seconds: u64,
    pub vvhan_base_url: String,
    pub vvhan_retry_count: usize,
    pub vvhan_cache_ttl_seconds: u64,
    pub request_timeout_seconds: u64,
    pub user_agent: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut settings = config::Config::builder()
            .set_default("port", 3000)?
            .set_default("cache_path", "icp_cache.json")?
            .set_default("cache_max_entries", 10_000)?
            .set_default("primary_provider", "leafone")?
            .set_default("fallback_provider", "vvhan")?
            .set_default("leafone_base_url", DEFAULT_LEAFONE_BASE_URL)?
            .set_default("leafone_retry_count", 3)?
            .set_default("leafone_cache_ttl_seconds", 24 * 60 * 60)?
            .set_default("vvhan_base_url", DEFAULT_VVHAN_BASE_URL)?
            .set_default("vvhan_retry_count", 3)?
            .set_default("vvhan_cache_ttl_seconds", 30 * 24 * 60 * 60)?
            .set_default("request_timeout_seconds", 0)?
            .set_default("user_agent", concat!("icp-lookup/", env!("CARGO_PKG_VERSION")))?;

        // Override with environment variables if present
        settings = Self::apply_env_overrides(settings)?;

        let config_data: ConfigData = settings.build()?.try_deserialize()?;

        Ok(Config {
            port: config_data.port,
            cache_path: non_empty(config_data.cache_path),
            cache_max_entries: config_data.cache_max_entries,
            primary_provider: config_data.primary_provider,
            fallback_provider: non_empty(config_data.fallback_provider),
            leafone_base_url: config_data.leafone_base_url,
            leafone_retry_count: config_data.leafone_retry_count,
            leafone_cache_ttl_seconds: config_data.leafone_cache_ttl_seconds,
            vvhan_base_url: config_data.vvhan_base_url,
            vvhan_retry_count: config_data.vvhan_retry_count,
            vvhan_cache_ttl_seconds: config_data.vvhan_cache_ttl_seconds,
            request_timeout_seconds: config_data.request_timeout_seconds,
            user_agent: config_data.user_agent,
            start_time: Instant::now(),
        })
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    fn apply_env_overrides(mut settings: config::ConfigBuilder<config::builder::DefaultState>) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        let env_mappings = [
            ("PORT", "port"),
            ("CACHE_PATH", "cache_path"),
            ("CACHE_MAX_ENTRIES", "cache_max_entries"),
            ("PRIMARY_PROVIDER", "primary_provider"),
            ("FALLBACK_PROVIDER", "fallback_provider"),
            ("LEAFONE_BASE_URL", "leafone_base_url"),
            ("LEAFONE_RETRY_COUNT", "leafone_retry_count"),
            ("LEAFONE_CACHE_TTL_SECONDS", "leafone_cache_ttl_seconds"),
            ("VVHAN_BASE_URL", "vvhan_base_url"),
            ("VVHAN_RETRY_COUNT", "vvhan_retry_count"),
            ("VVHAN_CACHE_TTL_SECONDS", "vvhan_cache_ttl_seconds"),
            ("REQUEST_TIMEOUT_SECONDS", "request_timeout_seconds"),
            ("USER_AGENT", "user_agent"),
        ];

        for (env_var, config_key) in env_mappings {
            if let Ok(value) = std::env::var(env_var) {
                settings = settings.set_override(config_key, value)?;
            }
        }

        // CACHE_TTL is shorthand for the TTL of whichever provider is primary
        if let Ok(value) = std::env::var("CACHE_TTL") {
            let primary = std::env::var("PRIMARY_PROVIDER").unwrap_or_else(|_| "leafone".to_string());
            settings = settings.set_override(format!("{}_cache_ttl_seconds", primary.trim().to_lowercase()), value)?;
        }

        Ok(settings)
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            port: 3000,
            cache_path: None,
            cache_max_entries: 100,
            primary_provider: "leafone".to_string(),
            fallback_provider: Some("vvhan".to_string()),
            leafone_base_url: DEFAULT_LEAFONE_BASE_URL.to_string(),
            leafone_retry_count: 3,
            leafone_cache_ttl_seconds: 86_400,
            vvhan_base_url: DEFAULT_VVHAN_BASE_URL.to_string(),
            vvhan_retry_count: 3,
            vvhan_cache_ttl_seconds: 2_592_000,
            request_timeout_seconds: 0,
            user_agent: "icp-lookup-test".to_string(),
            start_time: Instant::now(),
        }
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("".to_string()), None);
        assert_eq!(non_empty("   ".to_string()), None);
        assert_eq!(non_empty(" vvhan ".to_string()), Some("vvhan".to_string()));
    }

    #[test]
    fn test_request_timeout_zero_means_transport_default() {
        let mut config = test_config();
        config.request_timeout_seconds = 0;
        assert!(config.request_timeout().is_none());

        config.request_timeout_seconds = 7;
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(7)));
    }
}
