//! This module defines the `DataSource` trait for marketplace access.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

use crate::models::{ProductSummary, SizeQuote};

/// Errors that can occur while fetching marketplace data.
#[derive(Debug, Error)]
pub enum DataSourceError {
    /// A transient failure: network error, non-200 status or empty body.
    /// Size fetches retry these with bounded linear backoff; listing fetches
    /// surface them to the poller, which skips the cycle.
    #[error("Transient fetch failure: {0}")]
    Transient(String),

    /// The remote returned a body that could not be interpreted.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Read access to the marketplace.
///
/// The monitoring core only ever sees this trait; session handling, request
/// shaping and page extraction live behind it.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetches one page of the seek list, newest first. An empty vector marks
    /// the end of pagination.
    async fn fetch_listing_page(
        &self,
        page_num: u32,
        page_size: u32,
    ) -> Result<Vec<ProductSummary>, DataSourceError>;

    /// Fetches the market state of one size of one product.
    async fn fetch_size(
        &self,
        product_id: &str,
        listing_type: &str,
        size: &str,
    ) -> Result<SizeQuote, DataSourceError>;
}
