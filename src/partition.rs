//! Grouping aggregated records into independent per-category partitions

use indexmap::IndexMap;

use crate::record::{AggregatedRecord, CategoryKey};

/// All records of one category, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub key: CategoryKey,
    /// Index of each record in the aggregated sequence
    pub positions: Vec<usize>,
    pub records: Vec<AggregatedRecord>,
}

impl Partition {
    fn new(key: CategoryKey) -> Self {
        Self {
            key,
            positions: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Original-scale metric of every record
    pub fn metrics(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.metric).collect()
    }
}

/// Split the aggregated sequence by category.
///
/// Partitions come out in the order their category is first seen and keep
/// the relative order of their records. Uncategorized products each form a
/// partition of their own.
pub fn partition(records: &[AggregatedRecord]) -> Vec<Partition> {
    let mut partitions: IndexMap<CategoryKey, Partition> = IndexMap::new();

    for (position, record) in records.iter().enumerate() {
        let key = record.category_key();
        let partition = partitions
            .entry(key.clone())
            .or_insert_with(|| Partition::new(key));
        partition.positions.push(position);
        partition.records.push(record.clone());
    }

    partitions.into_values().collect()
}
