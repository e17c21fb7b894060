//! In-memory product registry backed by the state store.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

use crate::{
    models::{ProductHistory, ProductId, ProductSummary},
    persistence::{PersistenceError, StateStore},
};

/// State-store document holding every known product.
const HISTORY_DOC: &str = "history.json";

/// A product's summary row and its last completed observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// The listing row as last seen.
    pub summary: ProductSummary,
    /// Snapshot history from the last completed decision.
    #[serde(default)]
    pub history: ProductHistory,
}

/// A product selected for processing in the current cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeJob {
    /// The fresh listing row.
    pub summary: ProductSummary,
    /// Whether the product was never seen before.
    pub is_new: bool,
}

/// Tracks every product the listing has ever shown and decides, per cycle,
/// which ones need a fresh look.
///
/// The in-memory map is the source of truth between cycles; the store document
/// is its durable mirror, rewritten after each product completes.
pub struct HistoryBook<S: StateStore> {
    records: Mutex<HashMap<ProductId, ProductRecord>>,
    store: Arc<S>,
}

impl<S: StateStore> HistoryBook<S> {
    /// Loads the registry from the store. A missing document starts empty.
    pub async fn load(store: Arc<S>) -> Result<Self, PersistenceError> {
        let records: HashMap<ProductId, ProductRecord> =
            store.load_document(HISTORY_DOC).await?.unwrap_or_default();
        Ok(Self { records: Mutex::new(records), store })
    }

    /// Compares a fresh listing page against the registry and returns the
    /// products that are new or whose `updateTime` moved.
    ///
    /// Rows that merely repeat their last `updateTime` are skipped without
    /// touching the registry.
    pub async fn detect_changes(&self, rows: &[ProductSummary]) -> Vec<ChangeJob> {
        let records = self.records.lock().await;
        rows.iter()
            .filter_map(|row| match records.get(&row.id) {
                None => Some(ChangeJob { summary: row.clone(), is_new: true }),
                Some(record) if record.summary.update_time != row.update_time => {
                    Some(ChangeJob { summary: row.clone(), is_new: false })
                }
                Some(_) => None,
            })
            .collect()
    }

    /// Last completed observation for a product, if any.
    pub async fn history_of(&self, id: &str) -> ProductHistory {
        let records = self.records.lock().await;
        records.get(id).map(|r| r.history.clone()).unwrap_or_default()
    }

    /// Records a completed decision for one product and rewrites the store
    /// document.
    ///
    /// A persistence failure is logged and swallowed: the in-memory registry
    /// stays authoritative for the rest of the run, and the next successful
    /// write catches the document up.
    pub async fn commit(&self, summary: ProductSummary, history: ProductHistory) {
        let mut records = self.records.lock().await;
        records.insert(summary.id.clone(), ProductRecord { summary, history });
        if let Err(e) = self.store.save_document(HISTORY_DOC, &*records).await {
            warn!(error = %e, "failed to persist product history");
        }
    }

    /// Number of tracked products.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }
}
