//! Classifies kept sizes against the previous persisted snapshot.

use crate::models::{FullSnapshot, KeptSnapshot, SizeLabel};

/// Returns the kept sizes whose order count transitioned from zero/absent to
/// positive between the previous and current observation, in ascending size
/// order.
///
/// A size absent from the old snapshot counts as zero, so a product's
/// first-ever observation classifies every kept size as newly active.
pub fn newly_active(old_full: &FullSnapshot, kept: &KeptSnapshot) -> Vec<SizeLabel> {
    kept.iter()
        .filter(|(size, quote)| {
            let old_count = old_full.get(size).map(|q| q.count).unwrap_or(0);
            old_count == 0 && quote.count > 0
        })
        .map(|(size, _)| size.clone())
        .collect()
}
