//! Collapsing duplicate catalog rows into one record per product and category

use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::record::{AggregatedRecord, ProductRecord};

/// Merge rows sharing `(product_code, category)`.
///
/// Metrics are summed; the display name comes from the first occurrence.
/// Output order is the first-seen order of each key, so re-running on an
/// already aggregated slice returns it unchanged. Rows without a category
/// only merge with other uncategorized rows of the same product code.
pub fn aggregate(records: &[ProductRecord]) -> Vec<AggregatedRecord> {
    let mut grouped: IndexMap<(String, Option<String>), AggregatedRecord> =
        IndexMap::with_capacity(records.len());

    for record in records {
        match grouped.entry(record.key()) {
            Entry::Occupied(mut e) => {
                e.get_mut().metric += record.metric;
            }
            Entry::Vacant(e) => {
                e.insert(record.clone());
            }
        }
    }

    grouped.into_values().collect()
}
