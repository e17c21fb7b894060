//! Per-group daily sequence counters.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    models::GroupId,
    persistence::{error::PersistenceError, traits::StateStore},
};

/// Persisted document name for the counter state.
const COUNTERS_DOC: &str = "counters.json";

fn one() -> u64 {
    1
}

/// The persisted counter document: one monotonically increasing sequence per
/// output group, reset to 1 on calendar-day rollover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterState {
    /// Local date the counters belong to, `YYYY-MM-DD`.
    pub date: String,
    /// Next sequence number for group 1.
    #[serde(default = "one")]
    pub counter_group_1: u64,
    /// Next sequence number for group 2.
    #[serde(default = "one")]
    pub counter_group_2: u64,
    /// Next sequence number for group 3.
    #[serde(default = "one")]
    pub counter_group_3: u64,
}

impl CounterState {
    fn fresh(date: String) -> Self {
        Self { date, counter_group_1: 1, counter_group_2: 1, counter_group_3: 1 }
    }

    fn slot(&mut self, group: GroupId) -> &mut u64 {
        match group.index() {
            0 => &mut self.counter_group_1,
            1 => &mut self.counter_group_2,
            _ => &mut self.counter_group_3,
        }
    }
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Hands out per-group sequence numbers.
///
/// `reserve` and `rollback` take the internal lock, so no two concurrent
/// notifications observe the same value for the same group. Rollback only
/// reclaims the most recent reservation; callers keep reservations contiguous
/// by holding their per-group delivery lock across reserve, deliver and
/// rollback.
pub struct DailyCounters<S: StateStore> {
    state: Mutex<CounterState>,
    store: Arc<S>,
}

impl<S: StateStore> DailyCounters<S> {
    /// Loads the counter state, resetting it when the stored date is not
    /// today.
    pub async fn load(store: Arc<S>) -> Result<Self, PersistenceError> {
        let today = today();
        let state = match store.load_document::<CounterState>(COUNTERS_DOC).await? {
            Some(state) if state.date == today => state,
            _ => CounterState::fresh(today),
        };
        Ok(Self { state: Mutex::new(state), store })
    }

    /// Atomically reserves the next sequence number for a group, persisting
    /// the advanced state. Rolls the counters over first when the local date
    /// has changed.
    pub async fn reserve(&self, group: GroupId) -> u64 {
        let mut state = self.state.lock().await;
        let today = today();
        if state.date != today {
            *state = CounterState::fresh(today);
        }
        let slot = state.slot(group);
        let value = *slot;
        *slot = value + 1;
        self.persist(&state).await;
        value
    }

    /// Returns a failed reservation. Only the most recent reservation for the
    /// group can be reclaimed; anything else would punch a hole in the
    /// sequence.
    pub async fn rollback(&self, group: GroupId, value: u64) {
        let mut state = self.state.lock().await;
        let slot = state.slot(group);
        if *slot == value + 1 {
            *slot = value;
            self.persist(&state).await;
        } else {
            tracing::warn!(
                group = %group,
                value,
                next = *slot,
                "Cannot roll back non-latest counter reservation."
            );
        }
    }

    /// Resets every group counter to 1 for today.
    pub async fn reset_all(&self) {
        let mut state = self.state.lock().await;
        *state = CounterState::fresh(today());
        self.persist(&state).await;
    }

    /// Resets one group counter to 1 for today.
    pub async fn reset_group(&self, group: GroupId) {
        let mut state = self.state.lock().await;
        state.date = today();
        *state.slot(group) = 1;
        self.persist(&state).await;
    }

    async fn persist(&self, state: &CounterState) {
        if let Err(e) = self.store.save_document(COUNTERS_DOC, state).await {
            tracing::warn!(error = %e, "Failed to persist daily counters.");
        }
    }

    #[cfg(test)]
    pub(crate) async fn set_date(&self, date: &str) {
        self.state.lock().await.date = date.to_string();
    }
}
