//! Persisted per-product observation history.

use serde::{Deserialize, Serialize};

use super::snapshot::{FullSnapshot, KeptSnapshot, SizeLabel};

/// The durable record of a product's last completed observation.
///
/// Invariant: `kept_sizes` is always a subset of
/// `full_size_price_counts` keys. Created on first observation, overwritten
/// whenever a notification decision (push or no-push) completes, never
/// removed while the product remains listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProductHistory {
    /// All observed sizes, filtered only by brand exclusion.
    #[serde(default)]
    pub full_size_price_counts: FullSnapshot,

    /// Sizes that passed the whitelist/count/price filters last time, in
    /// ascending size order.
    #[serde(default)]
    pub kept_sizes: Vec<SizeLabel>,
}

impl ProductHistory {
    /// Rebuilds the history from the latest snapshots.
    pub fn update(&mut self, full: &FullSnapshot, kept: &KeptSnapshot) {
        self.full_size_price_counts = full.clone();
        // BTreeMap keys are already in ascending size order.
        self.kept_sizes = kept.keys().cloned().collect();
    }

    /// Order count recorded for a size at the previous observation, zero when
    /// the size was never seen.
    pub fn old_count(&self, size: &SizeLabel) -> u32 {
        self.full_size_price_counts.get(size).map(|q| q.count).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::snapshot::{Price, SizeQuote};

    #[test]
    fn update_keeps_kept_sizes_subset_of_full() {
        let mut full = FullSnapshot::new();
        full.insert("40".into(), SizeQuote { price: Price::Priced(600.0), count: 2, time: String::new() });
        full.insert("41".into(), SizeQuote { price: Price::Unpriced, count: 0, time: String::new() });

        let mut kept = KeptSnapshot::new();
        kept.insert("40".into(), full[&SizeLabel::from("40")].clone());

        let mut history = ProductHistory::default();
        history.update(&full, &kept);

        assert_eq!(history.kept_sizes, vec![SizeLabel::from("40")]);
        for size in &history.kept_sizes {
            assert!(history.full_size_price_counts.contains_key(size));
        }
        assert_eq!(history.old_count(&"41".into()), 0);
        assert_eq!(history.old_count(&"40".into()), 2);
    }
}
