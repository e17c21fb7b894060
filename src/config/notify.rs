//! Cooldown, grouping and webhook delivery configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::deserialize_duration_from_seconds;

/// Cooldown window of 3.5 days.
fn default_cooldown_window() -> Duration {
    Duration::from_secs(302_400)
}

/// Which identity a cooldown entry is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CooldownScope {
    /// One key per product; a push for any size cools the whole product.
    PerProduct,
    /// One key per (product, size); sizes cool independently.
    #[default]
    PerSize,
}

/// Notification cooldown policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooldownConfig {
    /// Suppression window after a successful push.
    #[serde(
        deserialize_with = "deserialize_duration_from_seconds",
        default = "default_cooldown_window",
        rename = "window_secs"
    )]
    pub window: Duration,

    /// Cooldown key granularity.
    #[serde(default)]
    pub scope: CooldownScope,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self { window: default_cooldown_window(), scope: CooldownScope::default() }
    }
}

fn default_group_small_max() -> usize {
    2
}

fn default_group_medium_max() -> usize {
    5
}

/// Size-count thresholds that pick the output group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Products with at most this many allowed sizes go to group 1.
    #[serde(default = "default_group_small_max")]
    pub small_max: usize,

    /// Products with at most this many allowed sizes go to group 2;
    /// anything above goes to group 3.
    #[serde(default = "default_group_medium_max")]
    pub medium_max: usize,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self { small_max: default_group_small_max(), medium_max: default_group_medium_max() }
    }
}

/// Outbound webhook endpoints, one URL list per output group. Within a group
/// deliveries round-robin across the listed bots.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WebhookConfig {
    /// Bots receiving group-1 reports (few-size products).
    #[serde(default)]
    pub group_1: Vec<Url>,

    /// Bots receiving group-2 reports.
    #[serde(default)]
    pub group_2: Vec<Url>,

    /// Bots receiving group-3 reports (many-size products).
    #[serde(default)]
    pub group_3: Vec<Url>,
}

impl WebhookConfig {
    /// The URL list for a zero-based group index.
    pub fn urls(&self, index: usize) -> &[Url] {
        match index {
            0 => &self.group_1,
            1 => &self.group_2,
            _ => &self.group_3,
        }
    }
}
