//! Configuration and settings management
//!
//! Loads settings from config files and environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default upstream listing host
pub const DEFAULT_REDDIT_BASE_URL: &str = "https://www.reddit.com";
/// Default allow-list of direct-image hosts
pub const DEFAULT_IMAGE_HOSTS: &str = "i.redd.it,catbox.moe";
/// Number of posts requested per listing
pub const DEFAULT_LISTING_LIMIT: u32 = 100;
/// Upstream HTTP timeout in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
/// Prefix in front of `show` and `help`
pub const DEFAULT_COMMAND_PREFIX: &str = ".";

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Base URL of the listing endpoint
    #[serde(default = "default_reddit_base_url")]
    pub reddit_base_url: String,

    /// Comma-separated list of accepted image-host substrings
    #[serde(rename = "image_hosts", default = "default_image_hosts")]
    pub image_hosts_str: String,

    /// `limit` query parameter sent with every listing request
    #[serde(default = "default_listing_limit")]
    pub listing_limit: u32,

    /// Timeout for a single listing request
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// `User-Agent` header sent upstream
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Prefix for text commands (`.show`, `.help`)
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

fn default_reddit_base_url() -> String {
    DEFAULT_REDDIT_BASE_URL.to_string()
}

fn default_image_hosts() -> String {
    DEFAULT_IMAGE_HOSTS.to_string()
}

const fn default_listing_limit() -> u32 {
    DEFAULT_LISTING_LIMIT
}

const fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    format!("subreddit-relay/{}", env!("CARGO_PKG_VERSION"))
}

fn default_command_prefix() -> String {
    DEFAULT_COMMAND_PREFIX.to_string()
}

/// Build the layered configuration source.
///
/// Order (later wins): `config/default`, `config/{RUN_MODE}`, `config/local`,
/// `APP__*` variables, plain environment variables.
///
/// # Errors
///
/// Returns a `ConfigError` if any present source fails to load.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Not checked into git
        .add_source(File::with_name("config/local").required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        // UPPER_SNAKE_CASE maps to snake_case; empty vars count as unset
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use subreddit_relay::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or `telegram_token` is missing.
    pub fn new() -> Result<Self, ConfigError> {
        build_config()?.try_deserialize()
    }

    /// Returns the accepted image-host substrings, in configured order
    #[must_use]
    pub fn image_hosts(&self) -> Vec<String> {
        let mut hosts: Vec<String> = Vec::new();
        for token in self
            .image_hosts_str
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|token| !token.is_empty())
        {
            if !hosts.iter().any(|h| h == token) {
                hosts.push(token.to_string());
            }
        }
        hosts
    }

    /// Upstream request timeout
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
