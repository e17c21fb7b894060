//! Application configuration for seekwatch.

mod app_config;
mod filters;
mod http_retry;
mod notify;

pub use app_config::AppConfig;
pub use filters::{ExtractorConfig, FilterConfig};
pub use http_retry::{HttpRetryConfig, JitterSetting};
pub use notify::{CooldownConfig, CooldownScope, GroupingConfig, WebhookConfig};

use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Deserializes a `Duration` from a value in milliseconds.
pub(crate) fn deserialize_duration_from_ms<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let ms = u64::deserialize(deserializer)?;
    Ok(Duration::from_millis(ms))
}

/// Deserializes a `Duration` from a value in seconds.
pub(crate) fn deserialize_duration_from_seconds<'de, D>(
    deserializer: D,
) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = u64::deserialize(deserializer)?;
    Ok(Duration::from_secs(secs))
}
