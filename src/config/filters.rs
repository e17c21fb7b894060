//! Brand, size and price filters plus detail-page extraction patterns.

use serde::{Deserialize, Serialize};

fn default_excluded_brands() -> Vec<String> {
    [
        "under armour",
        "hoka",
        "saucony",
        "salomon",
        "puma",
        "lining",
        "new balance",
        "ugg",
        "asics",
        "reebok",
        "anta",
        "361°",
        "fila",
        "pop mart",
        "crocs",
        "on昂跑",
        "birkenstock",
        "arcteryx始祖鸟",
        "mlb",
        "onitsuka tiger",
        "dr.martens",
        "ecco",
        "timberland",
        "michael kors",
        "特步",
        "迪桑特",
        "mizuno",
        "斯凯奇",
        "yonex尤尼斯",
        "p-6000",
        "pro 4",
        "nike sabrina",
        "adidas originals samba",
        "air zoom vomero 5",
        "a.e. 1",
        "nike ja 1",
        "g.t. cut 3",
        "adizero evo sl",
        "nike ja 3",
        "nike ja 2",
        "skechers",
        "vans",
        "converse",
        "louis vuitton",
        "北面",
        "迪卡侬",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_allowed_sizes() -> Vec<String> {
    [
        "35.5", "36", "36.5", "37", "37.5", "38", "38.5", "39", "39.5", "40", "40.5", "41",
        "41.5", "42", "42.5", "43", "43.5", "44", "44.5", "45",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_price_min() -> f64 {
    270.0
}

fn default_price_max() -> f64 {
    1800.0
}

/// Eligibility filters applied by the size aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Case-insensitive substring denylist matched against product titles.
    #[serde(default = "default_excluded_brands")]
    pub excluded_brands: Vec<String>,

    /// Size whitelist. An empty list allows every size.
    #[serde(default = "default_allowed_sizes")]
    pub allowed_sizes: Vec<String>,

    /// Lower bound of the actionable price range.
    #[serde(default = "default_price_min")]
    pub price_min: f64,

    /// Upper bound of the actionable price range.
    #[serde(default = "default_price_max")]
    pub price_max: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            excluded_brands: default_excluded_brands(),
            allowed_sizes: default_allowed_sizes(),
            price_min: default_price_min(),
            price_max: default_price_max(),
        }
    }
}

impl FilterConfig {
    /// True when the title matches the brand denylist.
    pub fn is_excluded_brand(&self, title: &str) -> bool {
        if title.is_empty() {
            return false;
        }
        let lowered = title.to_lowercase();
        self.excluded_brands.iter().any(|b| lowered.contains(b.as_str()))
    }

    /// True when the size is in the whitelist (or the whitelist is empty).
    pub fn is_size_allowed(&self, size: &str) -> bool {
        self.allowed_sizes.is_empty() || self.allowed_sizes.iter().any(|s| s == size)
    }
}

fn default_price_patterns() -> Vec<String> {
    vec![
        r"3\.5\s*到手：\s*(\d+(?:\.\d+)?)".to_string(),
        r"到手价?：\s*(\d+(?:\.\d+)?)".to_string(),
        r"到手\s*(\d+(?:\.\d+)?)".to_string(),
    ]
}

fn default_count_pattern() -> String {
    r"(\d+)\s*人".to_string()
}

fn default_time_pattern() -> String {
    r"(\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}(?::\d{2})?)".to_string()
}

/// Regex patterns used to pull price, order count and latest order time out
/// of a detail page body. Defaults match the target site's markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Hand-price patterns, tried in order; the first capture wins.
    #[serde(default = "default_price_patterns")]
    pub price_patterns: Vec<String>,

    /// Order-count pattern; its first capture is the count.
    #[serde(default = "default_count_pattern")]
    pub count_pattern: String,

    /// Order-timestamp pattern; the lexicographic maximum of all matches is
    /// taken as the latest order time.
    #[serde(default = "default_time_pattern")]
    pub time_pattern: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            price_patterns: default_price_patterns(),
            count_pattern: default_count_pattern(),
            time_pattern: default_time_pattern(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_exclusion_is_case_insensitive_substring() {
        let filters = FilterConfig::default();
        assert!(filters.is_excluded_brand("HOKA Bondi 8"));
        assert!(filters.is_excluded_brand("New Balance 990v6"));
        assert!(!filters.is_excluded_brand("Air Jordan 4"));
        assert!(!filters.is_excluded_brand(""));
    }

    #[test]
    fn empty_whitelist_allows_everything() {
        let filters = FilterConfig { allowed_sizes: vec![], ..Default::default() };
        assert!(filters.is_size_allowed("46"));
        let filters = FilterConfig::default();
        assert!(filters.is_size_allowed("40"));
        assert!(!filters.is_size_allowed("46"));
    }
}
