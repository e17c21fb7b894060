//! Deterministic rendering of push reports.
//!
//! The line ordering of a report is an external contract: the humans reading
//! the webhook channels parse these blocks visually.

use crate::models::{
    FullSnapshot, GroupId, KeptSnapshot, Price, ProductHistory, ProductSummary, Report,
};

/// Suggested-range low bound is 30% of the cheapest kept price...
const RANGE_LOW_FACTOR: f64 = 0.3;
/// ...but never below this floor.
const RANGE_LOW_FLOOR: f64 = 150.0;
/// Suggested-range high bound sits this far under the dearest kept price.
const RANGE_HIGH_MARGIN: f64 = 30.0;

/// Marker for a size whose order count just transitioned from zero.
const MARK_NEW: &str = "🆕";
/// Marker for a kept size that was already active.
const MARK_ACTIVE: &str = "📌";

/// Renders one push-worthy product observation into a report.
///
/// Pure function of its inputs. Returns `None` when no size passes the
/// whitelist at all, so there is nothing to show.
pub fn render(
    product: &ProductSummary,
    full: &FullSnapshot,
    kept: &KeptSnapshot,
    history: &ProductHistory,
    sequence: u64,
    group: GroupId,
    allowed: impl Fn(&str) -> bool,
    search_url: &str,
) -> Option<Report> {
    let title = product.title.trim();
    let article = product.article_num.trim();

    let all_allowed: Vec<_> = full
        .iter()
        .filter(|(size, _)| allowed(size.as_str()))
        .collect();
    if all_allowed.is_empty() {
        return None;
    }

    let search_link = |query: &str| format!("{search_url}?q={}", urlencoding::encode(query.trim()));

    let mut size_blocks = Vec::new();
    let mut prices_for_range: Vec<f64> = Vec::new();

    for (size, quote) in &all_allowed {
        let in_kept = kept.contains_key(size);
        let old_count = history.old_count(size);

        // Fall back to the last known positive historical price when the
        // current price carries no signal.
        let mut display_price = quote.price;
        let mut stale = false;
        if quote.price.is_zero_or_unknown() {
            if let Some(old_price) = history
                .full_size_price_counts
                .get(size)
                .and_then(|q| q.price.value())
                .filter(|p| *p > 0.0)
            {
                display_price = Price::Priced(old_price);
                stale = true;
            }
        }

        let mark = if in_kept {
            if old_count == 0 && quote.count > 0 { MARK_NEW } else { MARK_ACTIVE }
        } else {
            ""
        };

        let price_text = if stale {
            format!("{display_price}(stale)")
        } else {
            display_price.to_string()
        };
        size_blocks.push(format!(
            "{mark}【{size}】{price_text}({old_count}→{new_count})  ⏱{time}",
            new_count = quote.count,
            time = quote.time
        ));

        let query_key = if article.is_empty() { title } else { article };
        if !query_key.is_empty() {
            size_blocks.push(search_link(&format!("{query_key} {size}")));
        }

        if in_kept && quote.count > 0 {
            if let Some(price) = display_price.value().filter(|p| *p > 0.0) {
                prices_for_range.push(price);
            }
        }
    }

    let price_line = price_range_line(&prices_for_range);
    let kept_line = if kept.is_empty() {
        None
    } else {
        let joined: Vec<String> = kept.keys().map(|s| s.to_string()).collect();
        Some(format!("Sizes in range: 【{}】", joined.join(", ")))
    };

    let mut lines = Vec::new();
    lines.push(format!("【NO.{sequence}】(group {group})"));
    lines.extend(size_blocks);
    lines.push(String::new());
    lines.push(if article.is_empty() { title.to_string() } else { format!("{title}{article}") });
    if !article.is_empty() {
        lines.push(search_link(article));
    }
    if let Some(line) = price_line {
        lines.push(line);
    }
    if let Some(line) = kept_line {
        lines.push(line);
    }
    if !title.is_empty() {
        lines.push(search_link(title));
    }

    let text = format!("{}\n", lines.join("\n").trim_end());
    Some(Report { text, image_url: product.logo_url.clone(), group })
}

/// Suggested price range from the kept, priced sizes. `None` when no valid
/// price was collected.
fn price_range_line(prices: &[f64]) -> Option<String> {
    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if prices.is_empty() {
        return None;
    }

    let high = max - RANGE_HIGH_MARGIN;
    let low = (min * RANGE_LOW_FACTOR).max(RANGE_LOW_FLOOR).min(high);
    Some(format!("Price range: 【{}-{}】", low as i64, high as i64))
}
