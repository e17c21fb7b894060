//! Notification eligibility and output-group selection.

use std::collections::HashSet;

use crate::{
    config::{FilterConfig, GroupingConfig},
    models::{ChangeKind, FullSnapshot, GroupId, KeptSnapshot, Price, SizeLabel},
};

use super::change_detector;

/// Everything the policy needs to decide one product.
pub struct EligibilityInput<'a> {
    /// How the product entered this cycle.
    pub change: ChangeKind,
    /// Full snapshot from the previous observation (empty on first sight).
    pub old_full: &'a FullSnapshot,
    /// Full snapshot from the current observation.
    pub new_full: &'a FullSnapshot,
    /// Kept snapshot from the current observation.
    pub kept: &'a KeptSnapshot,
    /// Kept sizes whose cooldown key is currently cooled.
    pub cooled: &'a HashSet<SizeLabel>,
}

/// What to push when the policy decides to notify.
#[derive(Debug, Clone, PartialEq)]
pub struct PushPlan {
    /// Destination output group, bucketed by allowed-size count.
    pub group: GroupId,
    /// The kept sizes to emit with markers: the non-cooled subset of the
    /// kept snapshot.
    pub emit_kept: KeptSnapshot,
    /// Sizes whose cooldown keys are marked after a confirmed delivery.
    pub mark_sizes: Vec<SizeLabel>,
}

/// Why a product was not pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Nothing to show: no size passed the whitelist at all.
    NoAllowedSizes,
    /// No size transitioned to active and the product is not actionable.
    NoNewActivity,
    /// Every candidate size is inside its cooldown window.
    AllCooled,
    /// The only newly active size is a lone zero-price slot on a multi-size
    /// product: noise, not signal.
    SingleZeroGuard,
}

/// The policy's verdict for one product observation.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Push a notification.
    Push(PushPlan),
    /// Stay silent; history still advances.
    Skip(SkipReason),
}

/// Maps an allowed-size count onto an output group.
pub fn group_bucket(allowed_size_count: usize, grouping: &GroupingConfig) -> GroupId {
    if allowed_size_count <= grouping.small_max {
        GroupId(1)
    } else if allowed_size_count <= grouping.medium_max {
        GroupId(2)
    } else {
        GroupId(3)
    }
}

/// Decides whether a product observation is push-worthy.
///
/// Cooled sizes never count as newly active. A lone zero-price newly active
/// size on a multi-size product is suppressed. When nothing pushes, the
/// caller must still advance the persisted history so future diffs run
/// against current data.
pub fn decide(
    input: &EligibilityInput<'_>,
    filters: &FilterConfig,
    grouping: &GroupingConfig,
) -> Decision {
    let all_allowed: Vec<&SizeLabel> = input
        .new_full
        .keys()
        .filter(|size| filters.is_size_allowed(size.as_str()))
        .collect();
    if all_allowed.is_empty() {
        return Decision::Skip(SkipReason::NoAllowedSizes);
    }

    let transitioned = change_detector::newly_active(input.old_full, input.kept);
    let newly_active: Vec<SizeLabel> = transitioned
        .into_iter()
        .filter(|size| !input.cooled.contains(size))
        .collect();

    // A globally new product is actionable through any non-cooled kept size;
    // with an empty old snapshot those are exactly the newly active ones.
    if newly_active.is_empty() {
        let had_candidates = match input.change {
            ChangeKind::NewProduct => !input.kept.is_empty(),
            ChangeKind::Updated => {
                input.kept.keys().any(|size| {
                    input.old_full.get(size).map(|q| q.count).unwrap_or(0) == 0
                })
            }
        };
        return if had_candidates {
            Decision::Skip(SkipReason::AllCooled)
        } else {
            Decision::Skip(SkipReason::NoNewActivity)
        };
    }

    if newly_active.len() == 1 && all_allowed.len() > 1 {
        let lone = &newly_active[0];
        let zero_priced = input
            .kept
            .get(lone)
            .map(|q| q.price == Price::Priced(0.0))
            .unwrap_or(false);
        if zero_priced {
            return Decision::Skip(SkipReason::SingleZeroGuard);
        }
    }

    let emit_kept: KeptSnapshot = input
        .kept
        .iter()
        .filter(|(size, _)| !input.cooled.contains(*size))
        .map(|(size, quote)| (size.clone(), quote.clone()))
        .collect();
    let mark_sizes: Vec<SizeLabel> = emit_kept.keys().cloned().collect();

    Decision::Push(PushPlan {
        group: group_bucket(all_allowed.len(), grouping),
        emit_kept,
        mark_sizes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SizeQuote;

    fn quote(price: Price, count: u32) -> SizeQuote {
        SizeQuote { price, count, time: String::new() }
    }

    fn snapshot(entries: &[(&str, Price, u32)]) -> FullSnapshot {
        entries
            .iter()
            .map(|(s, p, c)| (SizeLabel::from(*s), quote(*p, *c)))
            .collect()
    }

    fn decide_default(input: &EligibilityInput<'_>) -> Decision {
        decide(input, &FilterConfig::default(), &GroupingConfig::default())
    }

    #[test]
    fn first_observation_with_kept_size_pushes() {
        // Sizes {40: count 2 price 600, 41: count 0}.
        let old = FullSnapshot::new();
        let new_full = snapshot(&[
            ("40", Price::Priced(600.0), 2),
            ("41", Price::Unpriced, 0),
        ]);
        let kept = snapshot(&[("40", Price::Priced(600.0), 2)]);
        let cooled = HashSet::new();

        let decision = decide_default(&EligibilityInput {
            change: ChangeKind::NewProduct,
            old_full: &old,
            new_full: &new_full,
            kept: &kept,
            cooled: &cooled,
        });

        let Decision::Push(plan) = decision else { panic!("expected push") };
        // Two allowed sizes bucket into group 1.
        assert_eq!(plan.group, GroupId(1));
        assert_eq!(plan.mark_sizes, vec![SizeLabel::from("40")]);
    }

    #[test]
    fn unchanged_snapshot_never_pushes() {
        let old = snapshot(&[("40", Price::Priced(600.0), 2)]);
        let kept = snapshot(&[("40", Price::Priced(600.0), 2)]);
        let cooled = HashSet::new();

        let decision = decide_default(&EligibilityInput {
            change: ChangeKind::Updated,
            old_full: &old,
            new_full: &old.clone(),
            kept: &kept,
            cooled: &cooled,
        });
        assert_eq!(decision, Decision::Skip(SkipReason::NoNewActivity));
    }

    #[test]
    fn cooled_size_is_excluded_regardless_of_transition() {
        let old = snapshot(&[("40", Price::Priced(600.0), 0)]);
        let new_full = snapshot(&[("40", Price::Priced(600.0), 1)]);
        let kept = new_full.clone();
        let cooled: HashSet<SizeLabel> = [SizeLabel::from("40")].into();

        let decision = decide_default(&EligibilityInput {
            change: ChangeKind::Updated,
            old_full: &old,
            new_full: &new_full,
            kept: &kept,
            cooled: &cooled,
        });
        assert_eq!(decision, Decision::Skip(SkipReason::AllCooled));
    }

    #[test]
    fn single_zero_price_on_multi_size_product_is_suppressed() {
        let old = snapshot(&[
            ("40", Price::Priced(0.0), 0),
            ("41", Price::Priced(500.0), 0),
        ]);
        let new_full = snapshot(&[
            ("40", Price::Priced(0.0), 1),
            ("41", Price::Priced(500.0), 0),
        ]);
        let kept = snapshot(&[("40", Price::Priced(0.0), 1)]);
        let cooled = HashSet::new();

        let decision = decide_default(&EligibilityInput {
            change: ChangeKind::Updated,
            old_full: &old,
            new_full: &new_full,
            kept: &kept,
            cooled: &cooled,
        });
        assert_eq!(decision, Decision::Skip(SkipReason::SingleZeroGuard));
    }

    #[test]
    fn single_priced_transition_on_multi_size_product_pushes() {
        let old = snapshot(&[
            ("40", Price::Priced(50.0), 0),
            ("41", Price::Priced(500.0), 0),
        ]);
        let new_full = snapshot(&[
            ("40", Price::Priced(500.0), 1),
            ("41", Price::Priced(500.0), 0),
        ]);
        let kept = snapshot(&[("40", Price::Priced(500.0), 1)]);
        let cooled = HashSet::new();

        let decision = decide_default(&EligibilityInput {
            change: ChangeKind::Updated,
            old_full: &old,
            new_full: &new_full,
            kept: &kept,
            cooled: &cooled,
        });
        assert!(matches!(decision, Decision::Push(_)));
    }

    #[test]
    fn lone_zero_price_on_single_size_product_still_pushes() {
        let old = snapshot(&[("40", Price::Priced(0.0), 0)]);
        let new_full = snapshot(&[("40", Price::Priced(0.0), 1)]);
        let kept = new_full.clone();
        let cooled = HashSet::new();

        let decision = decide_default(&EligibilityInput {
            change: ChangeKind::Updated,
            old_full: &old,
            new_full: &new_full,
            kept: &kept,
            cooled: &cooled,
        });
        assert!(matches!(decision, Decision::Push(_)));
    }

    #[test]
    fn group_bucket_boundaries() {
        let grouping = GroupingConfig::default();
        assert_eq!(group_bucket(1, &grouping), GroupId(1));
        assert_eq!(group_bucket(2, &grouping), GroupId(1));
        assert_eq!(group_bucket(3, &grouping), GroupId(2));
        assert_eq!(group_bucket(5, &grouping), GroupId(2));
        assert_eq!(group_bucket(6, &grouping), GroupId(3));
        assert_eq!(group_bucket(20, &grouping), GroupId(3));
    }

    #[test]
    fn cooled_sizes_are_excluded_from_emit_and_mark() {
        let old = snapshot(&[
            ("40", Price::Priced(600.0), 0),
            ("41", Price::Priced(700.0), 0),
        ]);
        let new_full = snapshot(&[
            ("40", Price::Priced(600.0), 1),
            ("41", Price::Priced(700.0), 2),
        ]);
        let kept = new_full.clone();
        let cooled: HashSet<SizeLabel> = [SizeLabel::from("41")].into();

        let Decision::Push(plan) = decide_default(&EligibilityInput {
            change: ChangeKind::Updated,
            old_full: &old,
            new_full: &new_full,
            kept: &kept,
            cooled: &cooled,
        }) else {
            panic!("expected push");
        };
        assert_eq!(plan.mark_sizes, vec![SizeLabel::from("40")]);
        assert!(!plan.emit_kept.contains_key(&SizeLabel::from("41")));
    }

    #[test]
    fn product_with_no_whitelisted_sizes_skips() {
        let old = FullSnapshot::new();
        let new_full = snapshot(&[("46", Price::Priced(600.0), 1)]);
        let kept = KeptSnapshot::new();
        let cooled = HashSet::new();

        let decision = decide_default(&EligibilityInput {
            change: ChangeKind::NewProduct,
            old_full: &old,
            new_full: &new_full,
            kept: &kept,
            cooled: &cooled,
        });
        assert_eq!(decision, Decision::Skip(SkipReason::NoAllowedSizes));
    }
}
