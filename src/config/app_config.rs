//! Top-level application configuration.

use std::{path::PathBuf, time::Duration};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use url::Url;

use super::{
    CooldownConfig, ExtractorConfig, FilterConfig, GroupingConfig, HttpRetryConfig,
    WebhookConfig, deserialize_duration_from_seconds,
};

fn default_poll_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(8)
}

fn default_page_size() -> u32 {
    500
}

fn default_concurrency() -> usize {
    8
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    600
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("state")
}

fn default_search_url() -> String {
    "https://www.goofish.com/search".to_string()
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Application configuration for seekwatch.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Base URL of the marketplace (listing and detail endpoints hang off
    /// this).
    pub site_url: Url,

    /// Session cookie presented to the marketplace.
    #[serde(default)]
    pub session_cookie: String,

    /// Directory holding the persisted JSON documents (history, cooldown,
    /// counters).
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// Optional append-only log of every pushed report.
    #[serde(default)]
    pub report_log_path: Option<PathBuf>,

    /// The interval between polling cycles.
    #[serde(
        deserialize_with = "deserialize_duration_from_seconds",
        default = "default_poll_interval",
        rename = "poll_interval_secs"
    )]
    pub poll_interval: Duration,

    /// Per-request timeout for marketplace fetches.
    #[serde(
        deserialize_with = "deserialize_duration_from_seconds",
        default = "default_fetch_timeout",
        rename = "fetch_timeout_secs"
    )]
    pub fetch_timeout: Duration,

    /// Listing page size.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Number of products processed concurrently per cycle.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Bounded retry count for a single size fetch.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base of the linear per-size retry backoff (`backoff * attempt`).
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Base URL of the search site linked from reports.
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Maximum time to wait for graceful shutdown.
    #[serde(
        deserialize_with = "deserialize_duration_from_seconds",
        default = "default_shutdown_timeout",
        rename = "shutdown_timeout_secs"
    )]
    pub shutdown_timeout: Duration,

    /// Brand/size/price eligibility filters.
    #[serde(default)]
    pub filters: FilterConfig,

    /// Detail-page extraction patterns.
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Notification cooldown policy.
    #[serde(default)]
    pub cooldown: CooldownConfig,

    /// Output-group thresholds.
    #[serde(default)]
    pub grouping: GroupingConfig,

    /// Webhook endpoints per output group.
    #[serde(default)]
    pub webhooks: WebhookConfig,

    /// Retry policy for webhook delivery.
    #[serde(default)]
    pub webhook_retry: HttpRetryConfig,
}

impl AppConfig {
    /// Creates a new `AppConfig` by reading from the configuration directory,
    /// with `SEEKWATCH__`-prefixed environment variables layered on top.
    pub fn new(config_dir: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir_str = config_dir.unwrap_or("configs");
        let s = Config::builder()
            .add_source(File::with_name(&format!("{config_dir_str}/app.yaml")))
            .add_source(Environment::with_prefix("SEEKWATCH").separator("__"))
            .build()?;
        s.try_deserialize()
    }

    /// Resolves one of the persisted document paths under `state_dir`.
    pub fn state_file(&self, name: &str) -> PathBuf {
        self.state_dir.join(name)
    }
}

#[cfg(test)]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            site_url: Url::parse("https://marketplace.invalid").unwrap(),
            session_cookie: String::new(),
            state_dir: default_state_dir(),
            report_log_path: None,
            poll_interval: default_poll_interval(),
            fetch_timeout: default_fetch_timeout(),
            page_size: default_page_size(),
            concurrency: default_concurrency(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            search_url: default_search_url(),
            shutdown_timeout: default_shutdown_timeout(),
            filters: FilterConfig::default(),
            extractor: ExtractorConfig::default(),
            cooldown: CooldownConfig::default(),
            grouping: GroupingConfig::default(),
            webhooks: WebhookConfig::default(),
            webhook_retry: HttpRetryConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_content = r#"
site_url: "https://market.example.com"
session_cookie: "JSESSIONID=abc"
poll_interval_secs: 3
concurrency: 4
filters:
  price_min: 300
  price_max: 900
cooldown:
  window_secs: 86400
  scope: per_product
webhooks:
  group_1:
    - "https://hooks.example.com/send?key=a"
"#;
        std::fs::write(dir.path().join("app.yaml"), config_content).unwrap();

        let config = AppConfig::new(Some(dir.path().to_str().unwrap())).unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.filters.price_min, 300.0);
        assert_eq!(config.cooldown.window, Duration::from_secs(86_400));
        assert_eq!(config.cooldown.scope, crate::config::CooldownScope::PerProduct);
        assert_eq!(config.webhooks.group_1.len(), 1);
        // Untouched fields fall back to defaults.
        assert_eq!(config.page_size, 500);
        assert_eq!(config.max_retries, 3);
    }
}
