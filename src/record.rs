//! Catalog record types flowing through the tiering pipeline

use std::fmt;
use std::str::FromStr;

/// One raw catalog row as delivered by the table source
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub product_code: String,
    /// `None` when the source row carried no category
    pub category: Option<String>,
    pub display_name: Option<String>,
    /// Popularity metric (e.g. accumulated rating count)
    pub metric: f64,
}

impl ProductRecord {
    pub fn new(
        product_code: impl Into<String>,
        category: Option<&str>,
        display_name: Option<&str>,
        metric: f64,
    ) -> Self {
        Self {
            product_code: product_code.into(),
            category: category.map(str::to_string),
            display_name: display_name.map(str::to_string),
            metric,
        }
    }

    /// Key used by the aggregator to detect duplicate rows
    pub fn key(&self) -> (String, Option<String>) {
        (self.product_code.clone(), self.category.clone())
    }

    /// Category this record is classified under
    pub fn category_key(&self) -> CategoryKey {
        match &self.category {
            Some(name) => CategoryKey::Named(name.clone()),
            None => CategoryKey::Uncategorized(self.product_code.clone()),
        }
    }
}

/// A product after duplicate rows have been merged.
///
/// Same shape as [`ProductRecord`]; `(product_code, category)` is unique
/// across the aggregator's output.
pub type AggregatedRecord = ProductRecord;

/// Identity of a classification partition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CategoryKey {
    Named(String),
    /// Product without a category, holding the product code
    Uncategorized(String),
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryKey::Named(name) => write!(f, "{}", name),
            CategoryKey::Uncategorized(code) => write!(f, "<uncategorized:{}>", code),
        }
    }
}

/// Performance tier of a product within its own category.
///
/// Ordered `Longtail < Good < Hit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Longtail,
    Good,
    Hit,
}

impl Tier {
    /// Tiers in ascending order, matching ascending cluster means
    pub const ASCENDING: [Tier; 3] = [Tier::Longtail, Tier::Good, Tier::Hit];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Longtail => "Longtail",
            Tier::Good => "Good",
            Tier::Hit => "Hit",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Hit" => Ok(Tier::Hit),
            // "Dobry" is the label older exports used for the middle tier
            "Good" | "Dobry" => Ok(Tier::Good),
            "Longtail" => Ok(Tier::Longtail),
            other => anyhow::bail!("Unknown tier label: {}", other),
        }
    }
}

/// Aggregated record with its assigned tier
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRecord {
    pub record: AggregatedRecord,
    pub tier: Tier,
}
