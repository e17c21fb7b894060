//! The size aggregator: turns one product into full and kept snapshots.

use std::{sync::Arc, time::Duration};

use crate::{
    config::FilterConfig,
    models::{FullSnapshot, KeptSnapshot, ProductSummary, SizeLabel, SizeQuote},
    providers::traits::DataSource,
};

/// The aggregated per-size state of one product after a detail pass.
#[derive(Debug, Clone, Default)]
pub struct ProductDetail {
    /// Every size the remote reports, brand exclusion aside.
    pub full: FullSnapshot,
    /// The actionable subset: whitelisted, ordered, priced in range or zero.
    pub kept: KeptSnapshot,
}

/// Fetches and filters per-size snapshots for one product.
///
/// Individual size fetches retry transient failures with linearly increasing
/// backoff; a size whose retries are exhausted is recorded as a degraded
/// zero-order entry instead of failing the whole product.
pub struct SizeAggregator {
    data_source: Arc<dyn DataSource>,
    filters: FilterConfig,
    max_retries: u32,
    retry_backoff: Duration,
}

impl SizeAggregator {
    /// Creates a new aggregator.
    pub fn new(
        data_source: Arc<dyn DataSource>,
        filters: FilterConfig,
        max_retries: u32,
        retry_backoff: Duration,
    ) -> Self {
        Self { data_source, filters, max_retries, retry_backoff }
    }

    /// Collects the full and kept snapshots for a product.
    ///
    /// Returns `None` when the title matches the brand denylist; such
    /// products are skipped entirely.
    pub async fn collect(&self, product: &ProductSummary) -> Option<ProductDetail> {
        if self.filters.is_excluded_brand(product.title.trim()) {
            tracing::debug!(product_id = %product.id, title = %product.title, "Skipping excluded brand.");
            return None;
        }

        let mut detail = ProductDetail::default();
        let mut seen = std::collections::HashSet::new();

        for size in &product.sizes {
            if !seen.insert(size.clone()) {
                continue;
            }
            let quote = if size.is_empty() {
                SizeQuote::degraded()
            } else {
                self.fetch_with_retry(&product.id, &product.listing_type, size).await
            };

            let label = SizeLabel::from(size.as_str());
            if self.qualifies(&label, &quote) {
                detail.kept.insert(label.clone(), quote.clone());
            }
            detail.full.insert(label, quote);
        }

        Some(detail)
    }

    /// A size qualifies for the kept snapshot iff it is whitelisted, has at
    /// least one open order, and its price is zero/unpriced or inside the
    /// configured range.
    fn qualifies(&self, size: &SizeLabel, quote: &SizeQuote) -> bool {
        self.filters.is_size_allowed(size.as_str())
            && quote.count > 0
            && quote.price.in_range_or_zero(self.filters.price_min, self.filters.price_max)
    }

    async fn fetch_with_retry(&self, product_id: &str, listing_type: &str, size: &str) -> SizeQuote {
        for attempt in 0..=self.max_retries {
            match self.data_source.fetch_size(product_id, listing_type, size).await {
                Ok(quote) => return quote,
                Err(e) if attempt < self.max_retries => {
                    let backoff = self.retry_backoff * (attempt + 1);
                    tracing::debug!(
                        product_id,
                        size,
                        attempt,
                        error = %e,
                        "Size fetch failed, retrying after {:?}.",
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    tracing::warn!(
                        product_id,
                        size,
                        error = %e,
                        "Size fetch exhausted retries, recording degraded entry."
                    );
                }
            }
        }
        SizeQuote::degraded()
    }
}
