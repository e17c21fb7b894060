//! Per-size market snapshots and the tagged price value.

use std::{cmp::Ordering, collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// A size label as reported by the marketplace (e.g. `"40.5"`).
///
/// Labels order numerically when they parse as decimals; non-numeric labels
/// sort after all numeric ones, lexicographically among themselves. Snapshots
/// keyed by `SizeLabel` therefore iterate in render order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SizeLabel(pub String);

impl SizeLabel {
    /// Returns the label as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<f64> {
        self.0.trim().parse::<f64>().ok()
    }
}

impl From<&str> for SizeLabel {
    fn from(s: &str) -> Self {
        SizeLabel(s.to_string())
    }
}

impl From<String> for SizeLabel {
    fn from(s: String) -> Self {
        SizeLabel(s)
    }
}

impl fmt::Display for SizeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Ord for SizeLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.total_cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for SizeLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A price observation for one size.
///
/// `Unpriced` stands in for "no bid yet" and is treated as price zero by the
/// range filter. Serialized untagged: a JSON number for `Priced`, `null` for
/// `Unpriced`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Price {
    /// A concrete ask price.
    Priced(f64),
    /// No bid has been placed yet.
    #[default]
    Unpriced,
}

impl Price {
    /// Returns the numeric value, if any.
    pub fn value(&self) -> Option<f64> {
        match self {
            Price::Priced(p) => Some(*p),
            Price::Unpriced => None,
        }
    }

    /// True when the price carries no usable signal: unpriced or exactly zero.
    pub fn is_zero_or_unknown(&self) -> bool {
        match self {
            Price::Priced(p) => *p == 0.0,
            Price::Unpriced => true,
        }
    }

    /// The range filter used for kept-snapshot eligibility: unpriced and zero
    /// pass unconditionally, otherwise the value must fall within
    /// `[min, max]`.
    pub fn in_range_or_zero(&self, min: f64, max: f64) -> bool {
        match self.value() {
            None => true,
            Some(p) if p == 0.0 => true,
            Some(p) => (min..=max).contains(&p),
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Priced(p) if p.fract() == 0.0 => write!(f, "{}", *p as i64),
            Price::Priced(p) => write!(f, "{p}"),
            Price::Unpriced => f.write_str("no bid"),
        }
    }
}

/// One size's market state at one observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SizeQuote {
    /// Current hand price for the size.
    pub price: Price,
    /// Number of open orders for the size.
    pub count: u32,
    /// Latest order timestamp as reported by the page, empty when unknown.
    #[serde(default)]
    pub time: String,
}

impl SizeQuote {
    /// The entry recorded when all fetch attempts for a size failed: no
    /// signal, never a crash.
    pub fn degraded() -> Self {
        SizeQuote { price: Price::Unpriced, count: 0, time: String::new() }
    }
}

/// Every size the remote reports for a product, filtered only by brand
/// exclusion. This is the durable memory used for diffing across polls.
pub type FullSnapshot = BTreeMap<SizeLabel, SizeQuote>;

/// The subset of a [`FullSnapshot`] that is currently actionable: whitelisted
/// size, positive order count, price in range or zero.
pub type KeptSnapshot = BTreeMap<SizeLabel, SizeQuote>;
