//! Reqwest-backed implementation of the [`DataSource`] trait.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::header;
use serde::Deserialize;
use url::Url;

use super::{
    extract::PageExtractor,
    session::SessionProvider,
    traits::{DataSource, DataSourceError},
};
use crate::models::{ProductSummary, SizeQuote};

/// Path of the paginated seek-list endpoint, relative to the site URL.
const LISTING_PATH: &str = "tgc/gxPc/seek/list";

/// Path of the per-size detail page, relative to the site URL.
const DETAIL_PATH: &str = "tgc/gxPc/seek/work/seeks";

/// Envelope wrapping every listing response.
#[derive(Debug, Deserialize)]
struct ListingEnvelope {
    code: i64,
    #[serde(default)]
    rows: Vec<ProductSummary>,
}

/// HTTP client for one marketplace site.
pub struct MarketplaceClient {
    client: reqwest::Client,
    site_url: Url,
    session: Arc<dyn SessionProvider>,
    extractor: PageExtractor,
}

impl MarketplaceClient {
    /// Creates a client with a per-request timeout.
    pub fn new(
        site_url: Url,
        session: Arc<dyn SessionProvider>,
        extractor: PageExtractor,
        timeout: Duration,
    ) -> Result<Self, DataSourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64)")
            .build()
            .map_err(|e| DataSourceError::Transient(e.to_string()))?;
        Ok(Self { client, site_url, session, extractor })
    }

    fn endpoint(&self, path: &str) -> Result<Url, DataSourceError> {
        self.site_url
            .join(path)
            .map_err(|e| DataSourceError::InvalidResponse(format!("Bad endpoint URL: {e}")))
    }
}

#[async_trait]
impl DataSource for MarketplaceClient {
    #[tracing::instrument(skip(self), level = "debug")]
    async fn fetch_listing_page(
        &self,
        page_num: u32,
        page_size: u32,
    ) -> Result<Vec<ProductSummary>, DataSourceError> {
        let url = self.endpoint(LISTING_PATH)?;
        let cookie = self.session.cookie().await;
        let form = [
            ("pageSize", page_size.to_string()),
            ("pageNum", page_num.to_string()),
            ("orderByColumn", "updateTime".to_string()),
            ("isAsc", "desc".to_string()),
        ];

        let response = self
            .client
            .post(url)
            .header(header::COOKIE, cookie)
            .form(&form)
            .send()
            .await
            .map_err(|e| DataSourceError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataSourceError::Transient(format!(
                "Listing page {page_num} returned status {status}"
            )));
        }

        let envelope: ListingEnvelope = response
            .json()
            .await
            .map_err(|e| DataSourceError::InvalidResponse(e.to_string()))?;
        if envelope.code != 0 {
            return Err(DataSourceError::Transient(format!(
                "Listing page {page_num} returned code {}",
                envelope.code
            )));
        }

        Ok(envelope.rows)
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn fetch_size(
        &self,
        product_id: &str,
        listing_type: &str,
        size: &str,
    ) -> Result<SizeQuote, DataSourceError> {
        let url = self.endpoint(DETAIL_PATH)?;
        let cookie = self.session.cookie().await;

        let response = self
            .client
            .get(url)
            .header(header::COOKIE, cookie)
            .query(&[("pid", product_id), ("type", listing_type), ("size", size)])
            .send()
            .await
            .map_err(|e| DataSourceError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataSourceError::Transient(format!(
                "Detail page for product {product_id} size {size} returned status {status}"
            )));
        }

        let body =
            response.text().await.map_err(|e| DataSourceError::Transient(e.to_string()))?;
        if body.is_empty() {
            return Err(DataSourceError::Transient(format!(
                "Empty detail body for product {product_id} size {size}"
            )));
        }

        Ok(self.extractor.extract(&body))
    }
}
