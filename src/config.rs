use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Web Server
    pub web_host: String,
    pub web_port: u16,

    // Community feed
    pub reddit_base_url: String,
    pub http_timeout: Duration,
    pub default_post_limit: u32,
    pub max_post_limit: u32,
    pub feed_cache_ttl: Duration,

    // Headless browser
    pub browser_executable_path: Option<String>,
    pub browser_launch_timeout: Duration,
    pub browser_nav_timeout: Duration,
    pub browser_ready_timeout: Duration,

    // AI provider
    pub gemini_api_base: String,
    pub gemini_model: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Web Server
            web_host: env_or_default("WEB_HOST", "0.0.0.0"),
            web_port: parse_env_u16("WEB_PORT", 3000)?,

            // Community feed
            reddit_base_url: trim_trailing_slash(env_or_default(
                "REDDIT_BASE_URL",
                crate::constants::REDDIT_ORIGIN,
            )),
            http_timeout: Duration::from_secs(parse_env_u64("HTTP_TIMEOUT_SECS", 30)?),
            default_post_limit: parse_env_u32("DEFAULT_POST_LIMIT", 5)?,
            max_post_limit: parse_env_u32("MAX_POST_LIMIT", 100)?,
            feed_cache_ttl: Duration::from_secs(parse_env_u64("FEED_CACHE_TTL_SECS", 300)?),

            // Headless browser
            browser_executable_path: optional_env("BROWSER_EXECUTABLE_PATH"),
            browser_launch_timeout: Duration::from_secs(parse_env_u64(
                "BROWSER_LAUNCH_TIMEOUT_SECS",
                60,
            )?),
            browser_nav_timeout: Duration::from_secs(parse_env_u64(
                "BROWSER_NAV_TIMEOUT_SECS",
                30,
            )?),
            browser_ready_timeout: Duration::from_secs(parse_env_u64(
                "BROWSER_READY_TIMEOUT_SECS",
                10,
            )?),

            // AI provider
            gemini_api_base: trim_trailing_slash(env_or_default(
                "GEMINI_API_BASE",
                "https://generativelanguage.googleapis.com",
            )),
            gemini_model: env_or_default("GEMINI_MODEL", "gemini-1.5-flash"),
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_post_limit == 0 {
            return Err(ConfigError::InvalidValue {
                name: "DEFAULT_POST_LIMIT".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.max_post_limit < self.default_post_limit {
            return Err(ConfigError::InvalidValue {
                name: "MAX_POST_LIMIT".to_string(),
                message: format!(
                    "must be at least DEFAULT_POST_LIMIT ({})",
                    self.default_post_limit
                ),
            });
        }
        for (name, value) in [
            ("REDDIT_BASE_URL", &self.reddit_base_url),
            ("GEMINI_API_BASE", &self.gemini_api_base),
        ] {
            if url::Url::parse(value).is_err() {
                return Err(ConfigError::InvalidValue {
                    name: name.to_string(),
                    message: format!("not an absolute URL: '{value}'"),
                });
            }
        }
        if self.browser_nav_timeout.is_zero() || self.browser_launch_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "BROWSER_*_TIMEOUT_SECS".to_string(),
                message: "browser timeouts must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    /// Configuration with production defaults, independent of the environment.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            web_host: "127.0.0.1".to_string(),
            web_port: 0,
            reddit_base_url: crate::constants::REDDIT_ORIGIN.to_string(),
            http_timeout: Duration::from_secs(10),
            default_post_limit: 5,
            max_post_limit: 100,
            feed_cache_ttl: Duration::from_secs(300),
            browser_executable_path: None,
            browser_launch_timeout: Duration::from_secs(60),
            browser_nav_timeout: Duration::from_secs(30),
            browser_ready_timeout: Duration::from_secs(10),
            gemini_api_base: "https://generativelanguage.googleapis.com".to_string(),
            gemini_model: "gemini-1.5-flash".to_string(),
        }
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn trim_trailing_slash(mut value: String) -> String {
    while value.ends_with('/') {
        value.pop();
    }
    value
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u32(name: &str, default: u32) -> Result<u32, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}
