//! Listing-page product rows.

use serde::{Deserialize, Serialize};

/// The stable remote key of a product.
pub type ProductId = String;

/// One row of the marketplace's seek-list response.
///
/// Field names mirror the remote JSON (`articleNum`, `updateTime`, `logoUrl`)
/// so the listing page deserializes directly into this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    /// Stable remote key.
    pub id: ProductId,

    /// Human SKU, may be empty.
    #[serde(rename = "articleNum", default)]
    pub article_num: String,

    /// Product title.
    #[serde(default)]
    pub title: String,

    /// Remote freshness marker; a change means the listing was touched.
    #[serde(rename = "updateTime", default)]
    pub update_time: String,

    /// Representative image URL.
    #[serde(rename = "logoUrl", default)]
    pub logo_url: String,

    /// Listing type discriminator forwarded to the detail endpoint.
    #[serde(rename = "type", default = "default_listing_type")]
    pub listing_type: String,

    /// Sizes the listing advertises.
    #[serde(default)]
    pub sizes: Vec<String>,
}

fn default_listing_type() -> String {
    "0".to_string()
}

impl ProductSummary {
    /// The cooldown key base for this product: article number when present,
    /// otherwise the remote id.
    pub fn cooldown_base(&self) -> &str {
        let article = self.article_num.trim();
        if article.is_empty() { &self.id } else { article }
    }
}
