//! This module provides the `SupervisorBuilder` for constructing a `Supervisor`.

use std::sync::Arc;

use crate::{
    config::AppConfig,
    delivery::ReportSink,
    engine::{CooldownLedger, DailyCounters, HistoryBook, Poller},
    persistence::StateStore,
    providers::traits::DataSource,
};

use super::{Supervisor, SupervisorError};

/// A builder for creating a `Supervisor` instance.
pub struct SupervisorBuilder<S: StateStore + 'static> {
    config: Option<AppConfig>,
    store: Option<Arc<S>>,
    data_source: Option<Arc<dyn DataSource>>,
    sink: Option<Arc<dyn ReportSink>>,
}

impl<S: StateStore + 'static> Default for SupervisorBuilder<S> {
    fn default() -> Self {
        Self { config: None, store: None, data_source: None, sink: None }
    }
}

impl<S: StateStore + 'static> SupervisorBuilder<S> {
    /// Creates a new, empty `SupervisorBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the application configuration for the `Supervisor`.
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the state store for the `Supervisor`.
    pub fn store(mut self, store: Arc<S>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the marketplace data source for the `Supervisor`.
    pub fn data_source(mut self, data_source: Arc<dyn DataSource>) -> Self {
        self.data_source = Some(data_source);
        self
    }

    /// Sets the report sink for the `Supervisor`.
    pub fn sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Assembles and validates the components to build a `Supervisor`.
    ///
    /// Loads the persisted history, cooldown and counter documents so the
    /// poller starts with the state the previous run left behind.
    pub async fn build(self) -> Result<Supervisor<S>, SupervisorError> {
        let config = self.config.ok_or(SupervisorError::MissingConfig)?;
        let store = self.store.ok_or(SupervisorError::MissingStateStore)?;
        let data_source = self.data_source.ok_or(SupervisorError::MissingDataSource)?;
        let sink = self.sink.ok_or(SupervisorError::MissingReportSink)?;

        let history = Arc::new(HistoryBook::load(Arc::clone(&store)).await?);
        tracing::info!(products = history.len().await, "Product history loaded.");
        let cooldown = Arc::new(CooldownLedger::load(Arc::clone(&store), &config.cooldown).await?);
        let counters = Arc::new(DailyCounters::load(Arc::clone(&store)).await?);

        let poller =
            Poller::new(config.clone(), data_source, sink, history, cooldown, counters);
        Ok(Supervisor::new(config, poller))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        delivery::sink::MockReportSink, persistence::MockStateStore,
        providers::traits::MockDataSource,
    };
    use std::collections::HashMap;

    use crate::{
        engine::{counters::CounterState, history::ProductRecord},
        models::ProductId,
    };

    fn empty_store() -> Arc<MockStateStore> {
        let mut store = MockStateStore::new();
        store
            .expect_load_document::<HashMap<ProductId, ProductRecord>>()
            .returning(|_| Ok(None));
        store.expect_load_document::<HashMap<String, i64>>().returning(|_| Ok(None));
        store.expect_load_document::<CounterState>().returning(|_| Ok(None));
        store.expect_save_document::<CounterState>().returning(|_, _| Ok(()));
        Arc::new(store)
    }

    #[tokio::test]
    async fn build_succeeds_with_all_components() {
        let builder = SupervisorBuilder::new()
            .config(AppConfig::default())
            .store(empty_store())
            .data_source(Arc::new(MockDataSource::new()))
            .sink(Arc::new(MockReportSink::new()));

        assert!(builder.build().await.is_ok());
    }

    #[tokio::test]
    async fn build_fails_if_config_is_missing() {
        let builder = SupervisorBuilder::new()
            .store(empty_store())
            .data_source(Arc::new(MockDataSource::new()))
            .sink(Arc::new(MockReportSink::new()));

        assert!(matches!(builder.build().await, Err(SupervisorError::MissingConfig)));
    }

    #[tokio::test]
    async fn build_fails_if_store_is_missing() {
        let builder: SupervisorBuilder<MockStateStore> = SupervisorBuilder::new()
            .config(AppConfig::default())
            .data_source(Arc::new(MockDataSource::new()))
            .sink(Arc::new(MockReportSink::new()));

        assert!(matches!(builder.build().await, Err(SupervisorError::MissingStateStore)));
    }

    #[tokio::test]
    async fn build_fails_if_data_source_is_missing() {
        let builder = SupervisorBuilder::new()
            .config(AppConfig::default())
            .store(empty_store())
            .sink(Arc::new(MockReportSink::new()));

        assert!(matches!(builder.build().await, Err(SupervisorError::MissingDataSource)));
    }

    #[tokio::test]
    async fn build_fails_if_sink_is_missing() {
        let builder = SupervisorBuilder::new()
            .config(AppConfig::default())
            .store(empty_store())
            .data_source(Arc::new(MockDataSource::new()));

        assert!(matches!(builder.build().await, Err(SupervisorError::MissingReportSink)));
    }
}
