//! The cooldown ledger: suppresses repeat notifications within a window.

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;

use crate::{
    config::{CooldownConfig, CooldownScope},
    models::SizeLabel,
    persistence::{error::PersistenceError, traits::StateStore},
};

/// Persisted document name for the cooldown map.
const COOLDOWN_DOC: &str = "cooldown.json";

/// Tracks, per cooldown key, the Unix timestamp of the last successful
/// notification. A key is cooled while `now - timestamp < window`.
///
/// The map is loaded once at startup and rewritten wholesale after every
/// mark; writes serialize through the same lock that guards the in-memory
/// map.
pub struct CooldownLedger<S: StateStore> {
    window: Duration,
    scope: CooldownScope,
    entries: Mutex<HashMap<String, i64>>,
    store: Arc<S>,
}

impl<S: StateStore> CooldownLedger<S> {
    /// Loads the ledger from the state store.
    pub async fn load(store: Arc<S>, config: &CooldownConfig) -> Result<Self, PersistenceError> {
        let entries = store
            .load_document::<HashMap<String, i64>>(COOLDOWN_DOC)
            .await?
            .unwrap_or_default();
        Ok(Self {
            window: config.window,
            scope: config.scope,
            entries: Mutex::new(entries),
            store,
        })
    }

    /// Builds the cooldown key for a product/size pair under the configured
    /// granularity. `base` is the article number, or the product id when the
    /// article number is empty.
    pub fn key(&self, base: &str, size: &SizeLabel) -> String {
        match self.scope {
            CooldownScope::PerProduct => base.to_string(),
            CooldownScope::PerSize => format!("{base}|{size}"),
        }
    }

    /// True while the key's last notification is inside the window.
    pub async fn is_cooled(&self, key: &str) -> bool {
        let entries = self.entries.lock().await;
        match entries.get(key) {
            Some(ts) => self.elapsed_since(*ts) < self.window,
            None => false,
        }
    }

    /// Remaining suppression time for a key, zero when not cooled.
    pub async fn remaining(&self, key: &str) -> Duration {
        let entries = self.entries.lock().await;
        match entries.get(key) {
            Some(ts) => self.window.saturating_sub(self.elapsed_since(*ts)),
            None => Duration::ZERO,
        }
    }

    /// Records a successful notification for each key and rewrites the
    /// persisted map. Persistence failure is logged, not fatal: the in-memory
    /// ledger stays authoritative for the rest of the run.
    pub async fn mark(&self, keys: &[String]) {
        if keys.is_empty() {
            return;
        }
        let now = chrono::Utc::now().timestamp();
        let mut entries = self.entries.lock().await;
        for key in keys {
            entries.insert(key.clone(), now);
        }
        if let Err(e) = self.store.save_document(COOLDOWN_DOC, &*entries).await {
            tracing::warn!(error = %e, "Failed to persist cooldown ledger.");
        }
    }

    fn elapsed_since(&self, ts: i64) -> Duration {
        let elapsed = chrono::Utc::now().timestamp().saturating_sub(ts);
        Duration::from_secs(elapsed.max(0) as u64)
    }

    #[cfg(test)]
    pub(crate) async fn insert_raw(&self, key: &str, ts: i64) {
        self.entries.lock().await.insert(key.to_string(), ts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::traits::MockStateStore;

    fn config(window_secs: u64, scope: CooldownScope) -> CooldownConfig {
        CooldownConfig { window: Duration::from_secs(window_secs), scope }
    }

    fn store_expecting_load() -> MockStateStore {
        let mut store = MockStateStore::new();
        store
            .expect_load_document::<HashMap<String, i64>>()
            .returning(|_| Ok(None));
        store
    }

    #[tokio::test]
    async fn unknown_key_is_not_cooled() {
        let ledger = CooldownLedger::load(
            Arc::new(store_expecting_load()),
            &config(3600, CooldownScope::PerSize),
        )
        .await
        .unwrap();
        assert!(!ledger.is_cooled("AB-1|40").await);
        assert_eq!(ledger.remaining("AB-1|40").await, Duration::ZERO);
    }

    #[tokio::test]
    async fn mark_cools_key_and_persists() {
        let mut store = store_expecting_load();
        store
            .expect_save_document::<HashMap<String, i64>>()
            .withf(|name, map| name == "cooldown.json" && map.contains_key("AB-1|40"))
            .times(1)
            .returning(|_, _| Ok(()));

        let ledger =
            CooldownLedger::load(Arc::new(store), &config(3600, CooldownScope::PerSize))
                .await
                .unwrap();

        ledger.mark(&["AB-1|40".to_string()]).await;
        assert!(ledger.is_cooled("AB-1|40").await);
        assert!(ledger.remaining("AB-1|40").await > Duration::ZERO);
    }

    #[tokio::test]
    async fn expired_entry_is_no_longer_cooled() {
        let ledger = CooldownLedger::load(
            Arc::new(store_expecting_load()),
            &config(60, CooldownScope::PerSize),
        )
        .await
        .unwrap();
        ledger.insert_raw("AB-1|40", chrono::Utc::now().timestamp() - 120).await;
        assert!(!ledger.is_cooled("AB-1|40").await);
    }

    #[tokio::test]
    async fn key_shape_follows_scope() {
        let per_size = CooldownLedger::load(
            Arc::new(store_expecting_load()),
            &config(60, CooldownScope::PerSize),
        )
        .await
        .unwrap();
        assert_eq!(per_size.key("AB-1", &"40".into()), "AB-1|40");

        let per_product = CooldownLedger::load(
            Arc::new(store_expecting_load()),
            &config(60, CooldownScope::PerProduct),
        )
        .await
        .unwrap();
        assert_eq!(per_product.key("AB-1", &"40".into()), "AB-1");
    }

    #[tokio::test]
    async fn empty_mark_does_not_persist() {
        // No save_document expectation: a call would panic the mock.
        let ledger = CooldownLedger::load(
            Arc::new(store_expecting_load()),
            &config(60, CooldownScope::PerSize),
        )
        .await
        .unwrap();
        ledger.mark(&[]).await;
    }
}
