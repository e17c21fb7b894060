//! Seeds the product history from a full listing pass.
//!
//! Run this once before the first `run` on a fresh state directory: every
//! currently listed product gets a history record, so the monitor's first
//! real cycle only reacts to changes that happen after the bootstrap instead
//! of pushing the entire backlog.

use std::{sync::Arc, time::Duration};

use futures::StreamExt;
use tracing::info;

use crate::{
    config::AppConfig,
    engine::{HistoryBook, SizeAggregator},
    models::{ProductHistory, ProductSummary},
    persistence::JsonFileStore,
    providers::{
        extract::PageExtractor, http::MarketplaceClient, session::SharedSession,
        traits::DataSource,
    },
};

/// Executes the bootstrap pass.
pub async fn execute(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(JsonFileStore::new(&config.state_dir).await?);
    let extractor = PageExtractor::new(&config.extractor)?;
    let session = Arc::new(SharedSession::new(config.session_cookie.clone()));
    let data_source: Arc<dyn DataSource> = Arc::new(MarketplaceClient::new(
        config.site_url.clone(),
        session,
        extractor,
        config.fetch_timeout,
    )?);

    let history = Arc::new(HistoryBook::load(store).await?);
    let aggregator = SizeAggregator::new(
        Arc::clone(&data_source),
        config.filters.clone(),
        config.max_retries,
        Duration::from_millis(config.retry_backoff_ms),
    );

    let mut rows: Vec<ProductSummary> = Vec::new();
    let mut page_num = 1;
    loop {
        let page = data_source.fetch_listing_page(page_num, config.page_size).await?;
        let last = (page.len() as u32) < config.page_size;
        rows.extend(page);
        if last {
            break;
        }
        page_num += 1;
    }
    info!(products = rows.len(), "Listing fetched, seeding history.");

    futures::stream::iter(rows)
        .for_each_concurrent(config.concurrency, |summary| {
            let aggregator = &aggregator;
            let history = Arc::clone(&history);
            async move {
                let Some(detail) = aggregator.collect(&summary).await else {
                    return;
                };
                let mut record = ProductHistory::default();
                record.update(&detail.full, &detail.kept);
                history.commit(summary, record).await;
            }
        })
        .await;

    info!(products = history.len().await, "Bootstrap complete.");
    Ok(())
}
