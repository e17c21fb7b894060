//! Regex extraction of price, order count and latest order time from a
//! detail page body.

use regex::Regex;
use thiserror::Error;

use crate::{
    config::ExtractorConfig,
    models::{Price, SizeQuote},
};

/// An error that occurs while compiling extraction patterns.
#[derive(Debug, Error)]
#[error("Invalid extraction pattern: {0}")]
pub struct ExtractorError(#[from] regex::Error);

/// Anchor text counted as a fallback when the explicit order-count phrase is
/// missing from the page.
const CONTACT_ANCHOR: &str = "联系TA";

/// Compiled extraction patterns for one marketplace's detail pages.
pub struct PageExtractor {
    price_patterns: Vec<Regex>,
    count_pattern: Regex,
    time_pattern: Regex,
}

impl PageExtractor {
    /// Compiles the configured patterns.
    pub fn new(config: &ExtractorConfig) -> Result<Self, ExtractorError> {
        let price_patterns = config
            .price_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            price_patterns,
            count_pattern: Regex::new(&config.count_pattern)?,
            time_pattern: Regex::new(&config.time_pattern)?,
        })
    }

    /// Turns one fetched detail page into the market state of one size.
    ///
    /// Missing price means no bid yet; missing count and time degrade to
    /// zero/empty rather than failing.
    pub fn extract(&self, html: &str) -> SizeQuote {
        SizeQuote {
            price: self.extract_price(html),
            count: self.extract_count(html),
            time: self.extract_latest_time(html),
        }
    }

    fn extract_price(&self, html: &str) -> Price {
        for pattern in &self.price_patterns {
            if let Some(captures) = pattern.captures(html) {
                if let Some(value) = captures.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) {
                    return Price::Priced(value);
                }
            }
        }
        Price::Unpriced
    }

    fn extract_count(&self, html: &str) -> u32 {
        if let Some(captures) = self.count_pattern.captures(html) {
            if let Some(count) = captures.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) {
                return count;
            }
        }
        // Pages without the count phrase still list one contact anchor per
        // open order.
        html.matches(CONTACT_ANCHOR).count() as u32
    }

    fn extract_latest_time(&self, html: &str) -> String {
        self.time_pattern
            .find_iter(html)
            .map(|m| m.as_str().to_string())
            .max()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> PageExtractor {
        PageExtractor::new(&ExtractorConfig::default()).unwrap()
    }

    #[test]
    fn extracts_price_count_and_latest_time() {
        let html = "<div>3.5 到手： 635</div><span>3 人</span>\
                    <td>2026-08-01 09:00:00</td><td>2026-08-02 11:30:00</td>";
        let quote = extractor().extract(html);
        assert_eq!(quote.price, Price::Priced(635.0));
        assert_eq!(quote.count, 3);
        assert_eq!(quote.time, "2026-08-02 11:30:00");
    }

    #[test]
    fn missing_price_degrades_to_unpriced() {
        let quote = extractor().extract("<div>2 人</div>");
        assert_eq!(quote.price, Price::Unpriced);
        assert_eq!(quote.count, 2);
        assert_eq!(quote.time, "");
    }

    #[test]
    fn zero_price_is_captured_not_unpriced() {
        let quote = extractor().extract("3.5 到手： 0");
        assert_eq!(quote.price, Price::Priced(0.0));
    }

    #[test]
    fn falls_back_to_contact_anchor_count() {
        let html = "<a>联系TA</a><a>联系TA</a>";
        let quote = extractor().extract(html);
        assert_eq!(quote.count, 2);
    }
}
