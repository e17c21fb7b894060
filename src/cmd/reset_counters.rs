//! Resets the persisted daily report counters.

use std::sync::Arc;

use tracing::info;

use crate::{
    config::AppConfig, engine::DailyCounters, models::GroupId, persistence::JsonFileStore,
};

/// Resets one group's counter, or all of them, back to 1.
pub async fn execute(
    config: AppConfig,
    group: Option<u8>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(JsonFileStore::new(&config.state_dir).await?);
    let counters = DailyCounters::load(store).await?;

    match group {
        Some(g) => {
            if !(1..=3).contains(&g) {
                return Err(format!("invalid group {g}, expected 1..=3").into());
            }
            counters.reset_group(GroupId(g)).await;
            info!(group = g, "Counter reset.");
        }
        None => {
            counters.reset_all().await;
            info!("All counters reset.");
        }
    }
    Ok(())
}
