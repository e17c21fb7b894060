//! The polling loop that drives the whole monitor.

use std::{sync::Arc, time::Duration};

use dashmap::{DashMap, DashSet};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::AppConfig,
    delivery::ReportSink,
    models::{ChangeKind, ProductId, ProductSummary, Report},
    persistence::StateStore,
    providers::traits::{DataSource, DataSourceError},
};

use super::{
    aggregator::SizeAggregator,
    cooldown::CooldownLedger,
    counters::DailyCounters,
    history::{ChangeJob, HistoryBook},
    policy::{self, Decision, EligibilityInput},
    renderer,
};

/// Polls the seek list on an interval, diffs every changed product against
/// its history and pushes eligible reports.
///
/// One `Poller` owns the per-cycle orchestration: pagination, change
/// detection, bounded-concurrency product processing, and the delivery
/// bookkeeping (sequence counters, cooldown marks, history commits).
pub struct Poller<S: StateStore> {
    config: AppConfig,
    data_source: Arc<dyn DataSource>,
    aggregator: SizeAggregator,
    sink: Arc<dyn ReportSink>,
    history: Arc<HistoryBook<S>>,
    cooldown: Arc<CooldownLedger<S>>,
    counters: Arc<DailyCounters<S>>,
    /// Products currently being processed; a listing row whose product is
    /// already in flight is dropped for this cycle.
    in_flight: DashSet<ProductId>,
    /// One delivery lock per output group. Held across reserve, deliver and
    /// commit/rollback so sequence numbers land contiguously per group.
    group_locks: DashMap<u8, Arc<Mutex<()>>>,
}

impl<S: StateStore> Poller<S> {
    /// Creates a new poller.
    pub fn new(
        config: AppConfig,
        data_source: Arc<dyn DataSource>,
        sink: Arc<dyn ReportSink>,
        history: Arc<HistoryBook<S>>,
        cooldown: Arc<CooldownLedger<S>>,
        counters: Arc<DailyCounters<S>>,
    ) -> Self {
        let aggregator = SizeAggregator::new(
            Arc::clone(&data_source),
            config.filters.clone(),
            config.max_retries,
            Duration::from_millis(config.retry_backoff_ms),
        );
        Self {
            config,
            data_source,
            aggregator,
            sink,
            history,
            cooldown,
            counters,
            in_flight: DashSet::new(),
            group_locks: DashMap::new(),
        }
    }

    /// Runs polling cycles until the token is cancelled.
    pub async fn run(&self, cancellation_token: CancellationToken) {
        info!(interval = ?self.config.poll_interval, "Poller started.");
        loop {
            self.run_cycle().await;
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    info!("Poller shutting down.");
                    return;
                }
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }
    }

    /// One full pass: fetch the listing, diff it against the registry and
    /// process every changed product.
    pub async fn run_cycle(&self) {
        let rows = match self.fetch_all_rows().await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "Listing fetch failed, skipping cycle.");
                return;
            }
        };

        let jobs = self.history.detect_changes(&rows).await;
        if jobs.is_empty() {
            debug!(rows = rows.len(), "No changed products this cycle.");
            return;
        }
        info!(rows = rows.len(), changed = jobs.len(), "Processing changed products.");

        futures::stream::iter(jobs)
            .for_each_concurrent(self.config.concurrency, |job| self.process_product(job))
            .await;
    }

    /// Pages through the seek list until a short page marks the end.
    ///
    /// A failure on the first page aborts the cycle; a failure on a later
    /// page truncates it, which only delays products to the next cycle.
    async fn fetch_all_rows(&self) -> Result<Vec<ProductSummary>, DataSourceError> {
        let mut rows = Vec::new();
        let mut page_num = 1;
        loop {
            let page = match self.data_source.fetch_listing_page(page_num, self.config.page_size).await {
                Ok(page) => page,
                Err(e) if page_num == 1 => return Err(e),
                Err(e) => {
                    warn!(page = page_num, error = %e, "Listing page failed, truncating cycle.");
                    break;
                }
            };
            let last = (page.len() as u32) < self.config.page_size;
            rows.extend(page);
            if last {
                break;
            }
            page_num += 1;
        }
        Ok(rows)
    }

    async fn process_product(&self, job: ChangeJob) {
        if !self.in_flight.insert(job.summary.id.clone()) {
            debug!(product_id = %job.summary.id, "Product already in flight, skipping.");
            return;
        }
        let id = job.summary.id.clone();
        self.handle_job(job).await;
        self.in_flight.remove(&id);
    }

    async fn handle_job(&self, job: ChangeJob) {
        let summary = job.summary;
        let Some(detail) = self.aggregator.collect(&summary).await else {
            return;
        };

        let old_history = self.history.history_of(&summary.id).await;
        let base = summary.cooldown_base();
        let mut cooled = std::collections::HashSet::new();
        for size in detail.kept.keys() {
            if self.cooldown.is_cooled(&self.cooldown.key(base, size)).await {
                cooled.insert(size.clone());
            }
        }

        let input = EligibilityInput {
            change: if job.is_new { ChangeKind::NewProduct } else { ChangeKind::Updated },
            old_full: &old_history.full_size_price_counts,
            new_full: &detail.full,
            kept: &detail.kept,
            cooled: &cooled,
        };
        let decision = policy::decide(&input, &self.config.filters, &self.config.grouping);

        match decision {
            Decision::Skip(reason) => {
                debug!(product_id = %summary.id, ?reason, "Not pushing.");
                if let Some(size) = cooled.iter().next() {
                    let remaining =
                        self.cooldown.remaining(&self.cooldown.key(base, size)).await;
                    debug!(product_id = %summary.id, ?remaining, "Cooldown in effect.");
                }
                let mut history = old_history;
                history.update(&detail.full, &detail.kept);
                self.history.commit(summary, history).await;
            }
            Decision::Push(plan) => {
                let lock = self
                    .group_locks
                    .entry(plan.group.0)
                    .or_insert_with(|| Arc::new(Mutex::new(())))
                    .clone();
                let _guard = lock.lock().await;

                let sequence = self.counters.reserve(plan.group).await;
                let report = renderer::render(
                    &summary,
                    &detail.full,
                    &plan.emit_kept,
                    &old_history,
                    sequence,
                    plan.group,
                    |s| self.config.filters.is_size_allowed(s),
                    &self.config.search_url,
                );
                let Some(report) = report else {
                    self.counters.rollback(plan.group, sequence).await;
                    let mut history = old_history;
                    history.update(&detail.full, &detail.kept);
                    self.history.commit(summary, history).await;
                    return;
                };

                match self.sink.deliver(&report).await {
                    Ok(()) => {
                        info!(
                            product_id = %summary.id,
                            group = %plan.group,
                            sequence,
                            "Report delivered."
                        );
                        self.append_report_log(&report).await;
                        let keys: Vec<String> = plan
                            .mark_sizes
                            .iter()
                            .map(|size| self.cooldown.key(base, size))
                            .collect();
                        self.cooldown.mark(&keys).await;
                        let mut history = old_history;
                        history.update(&detail.full, &detail.kept);
                        self.history.commit(summary, history).await;
                    }
                    Err(e) => {
                        // History stays untouched so the next cycle retries
                        // this product.
                        warn!(product_id = %summary.id, error = %e, "Delivery failed.");
                        self.counters.rollback(plan.group, sequence).await;
                    }
                }
            }
        }
    }

    /// Appends a delivered report to the local report log, if configured.
    async fn append_report_log(&self, report: &Report) {
        let Some(path) = &self.config.report_log_path else {
            return;
        };
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let ruler = "=".repeat(50);
        let entry = format!("[{stamp}] group {}\n{}{ruler}\n", report.group, report.text);
        let result = tokio::fs::OpenOptions::new().create(true).append(true).open(path).await;
        match result {
            Ok(mut file) => {
                use tokio::io::AsyncWriteExt;
                if let Err(e) = file.write_all(entry.as_bytes()).await {
                    warn!(error = %e, "Failed to append report log.");
                }
            }
            Err(e) => warn!(error = %e, path = %path.display(), "Failed to open report log."),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{
        delivery::sink::MockReportSink,
        engine::{counters::CounterState, history::ProductRecord},
        models::{Price, SizeQuote},
        persistence::MockStateStore,
        providers::traits::MockDataSource,
    };

    fn summary(id: &str, update_time: &str, sizes: &[&str]) -> ProductSummary {
        ProductSummary {
            id: id.into(),
            article_num: format!("SKU-{id}"),
            title: format!("Sneaker {id}"),
            update_time: update_time.into(),
            logo_url: String::new(),
            listing_type: "0".into(),
            sizes: sizes.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn permissive_store() -> Arc<MockStateStore> {
        let mut store = MockStateStore::new();
        store
            .expect_load_document::<HashMap<ProductId, ProductRecord>>()
            .returning(|_| Ok(None));
        store
            .expect_save_document::<HashMap<ProductId, ProductRecord>>()
            .returning(|_, _| Ok(()));
        store.expect_load_document::<HashMap<String, i64>>().returning(|_| Ok(None));
        store.expect_save_document::<HashMap<String, i64>>().returning(|_, _| Ok(()));
        store.expect_load_document::<CounterState>().returning(|_| Ok(None));
        store.expect_save_document::<CounterState>().returning(|_, _| Ok(()));
        Arc::new(store)
    }

    async fn poller_with(
        data_source: MockDataSource,
        sink: MockReportSink,
    ) -> Poller<MockStateStore> {
        let store = permissive_store();
        let config = AppConfig { retry_backoff_ms: 0, ..AppConfig::default() };
        let history = Arc::new(HistoryBook::load(Arc::clone(&store)).await.unwrap());
        let cooldown =
            Arc::new(CooldownLedger::load(Arc::clone(&store), &config.cooldown).await.unwrap());
        let counters = Arc::new(DailyCounters::load(Arc::clone(&store)).await.unwrap());
        Poller::new(config, Arc::new(data_source), Arc::new(sink), history, cooldown, counters)
    }

    fn listing_once(rows: Vec<ProductSummary>) -> MockDataSource {
        let mut source = MockDataSource::new();
        source
            .expect_fetch_listing_page()
            .returning(move |_, _| Ok(rows.clone()));
        source
    }

    #[tokio::test]
    async fn new_product_with_active_size_is_delivered_once() {
        let mut source = listing_once(vec![summary("p1", "t1", &["40"])]);
        source.expect_fetch_size().returning(|_, _, _| {
            Ok(SizeQuote { price: Price::Priced(600.0), count: 1, time: "now".into() })
        });

        let mut sink = MockReportSink::new();
        sink.expect_deliver()
            .withf(|report| report.text.starts_with("【NO.1】(group 1)"))
            .times(1)
            .returning(|_| Ok(()));

        let poller = poller_with(source, sink).await;
        poller.run_cycle().await;
        // Same listing state again: updateTime unchanged, nothing to do.
        poller.run_cycle().await;
    }

    #[tokio::test]
    async fn delivery_failure_rolls_back_and_retries_next_cycle() {
        let mut source = listing_once(vec![summary("p1", "t1", &["40"])]);
        source.expect_fetch_size().returning(|_, _, _| {
            Ok(SizeQuote { price: Price::Priced(600.0), count: 1, time: "now".into() })
        });

        let mut sink = MockReportSink::new();
        let mut attempts = mockall::Sequence::new();
        sink.expect_deliver()
            .times(1)
            .in_sequence(&mut attempts)
            .returning(|_| Err(crate::delivery::DeliveryError::DeliveryFailed("503".into())));
        // The retry reuses sequence number 1: the rollback reclaimed it.
        sink.expect_deliver()
            .withf(|report| report.text.starts_with("【NO.1】"))
            .times(1)
            .in_sequence(&mut attempts)
            .returning(|_| Ok(()));

        let poller = poller_with(source, sink).await;
        poller.run_cycle().await;
        poller.run_cycle().await;
    }

    #[tokio::test]
    async fn cooled_product_is_not_delivered_but_history_advances() {
        let mut source = listing_once(vec![summary("p1", "t1", &["40"])]);
        source.expect_fetch_size().returning(|_, _, _| {
            Ok(SizeQuote { price: Price::Priced(600.0), count: 1, time: "now".into() })
        });

        let mut sink = MockReportSink::new();
        sink.expect_deliver().times(0);

        let poller = poller_with(source, sink).await;
        poller
            .cooldown
            .insert_raw(&poller.cooldown.key("SKU-p1", &"40".into()), chrono::Utc::now().timestamp())
            .await;

        poller.run_cycle().await;
        assert_eq!(poller.history.len().await, 1);
    }

    #[tokio::test]
    async fn listing_failure_skips_cycle() {
        let mut source = MockDataSource::new();
        source
            .expect_fetch_listing_page()
            .returning(|_, _| Err(DataSourceError::Transient("down".into())));
        source.expect_fetch_size().times(0);

        let mut sink = MockReportSink::new();
        sink.expect_deliver().times(0);

        let poller = poller_with(source, sink).await;
        poller.run_cycle().await;
        assert_eq!(poller.history.len().await, 0);
    }

    #[tokio::test]
    async fn excluded_brand_is_ignored() {
        let mut row = summary("p1", "t1", &["40"]);
        row.title = "Under Armour Curry 11".into();
        let mut source = listing_once(vec![row]);
        source.expect_fetch_size().times(0);

        let mut sink = MockReportSink::new();
        sink.expect_deliver().times(0);

        let poller = poller_with(source, sink).await;
        poller.run_cycle().await;
    }

    #[tokio::test]
    async fn paginates_until_short_page() {
        let mut source = MockDataSource::new();
        let page_size = AppConfig::default().page_size;
        source.expect_fetch_listing_page().times(2).returning(move |page_num, _| {
            if page_num == 1 {
                // A full page forces a second fetch.
                Ok((0..page_size).map(|i| summary(&format!("p{i}"), "t1", &[])).collect())
            } else {
                Ok(vec![])
            }
        });

        let mut sink = MockReportSink::new();
        sink.expect_deliver().times(0);

        let poller = poller_with(source, sink).await;
        poller.run_cycle().await;
        assert_eq!(poller.history.len().await, page_size as usize);
    }
}
