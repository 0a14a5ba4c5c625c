//! Pipeline orchestration: aggregate, partition, classify and merge

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::aggregate::aggregate;
use crate::config::{ClassifierConfig, FailurePolicy, PipelineConfig};
use crate::error::{PartitionError, PipelineError};
use crate::model::{classify, Classification};
use crate::partition::{partition, Partition};
use crate::record::{LabeledRecord, ProductRecord, Tier};
use crate::tier::map_tiers;

/// Result of classifying one partition
#[derive(Debug, Clone, PartialEq)]
pub enum PartitionOutcome {
    Clustered { tiers: Vec<Tier>, inertia: f64 },
    BelowThreshold,
    Failed(PartitionError),
}

/// Number of records per tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierCounts {
    pub hit: usize,
    pub good: usize,
    pub longtail: usize,
}

impl TierCounts {
    pub fn from_tiers<'a>(tiers: impl IntoIterator<Item = &'a Tier>) -> Self {
        let mut counts = Self::default();
        for tier in tiers {
            counts.add(*tier);
        }
        counts
    }

    pub fn add(&mut self, tier: Tier) {
        match tier {
            Tier::Hit => self.hit += 1,
            Tier::Good => self.good += 1,
            Tier::Longtail => self.longtail += 1,
        }
    }

    pub fn merge(&mut self, other: &TierCounts) {
        self.hit += other.hit;
        self.good += other.good;
        self.longtail += other.longtail;
    }

    pub fn total(&self) -> usize {
        self.hit + self.good + self.longtail
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CategoryStatus {
    Clustered,
    BelowThreshold,
    /// Classification failed and the records fell back to Longtail
    Failed(String),
}

/// Per-category line of the run summary
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStats {
    pub category: String,
    pub status: CategoryStatus,
    pub counts: TierCounts,
    /// Within-cluster sum of squares, for clustered categories
    pub inertia: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub raw_rows: usize,
    pub aggregated_rows: usize,
    pub categories: Vec<CategoryStats>,
    pub tiers: TierCounts,
}

impl RunSummary {
    pub fn clustered(&self) -> usize {
        self.count_status(|s| matches!(s, CategoryStatus::Clustered))
    }

    pub fn below_threshold(&self) -> usize {
        self.count_status(|s| matches!(s, CategoryStatus::BelowThreshold))
    }

    pub fn failed(&self) -> Vec<&CategoryStats> {
        self.categories
            .iter()
            .filter(|c| matches!(c.status, CategoryStatus::Failed(_)))
            .collect()
    }

    fn count_status(&self, pred: impl Fn(&CategoryStatus) -> bool) -> usize {
        self.categories.iter().filter(|c| pred(&c.status)).count()
    }
}

/// Labeled catalog plus its run summary
#[derive(Debug, Clone)]
pub struct TierOutcome {
    /// One record per aggregated product, in aggregation order
    pub labeled: Vec<LabeledRecord>,
    pub summary: RunSummary,
}

/// Run the classifier and tier mapper on one partition
pub fn classify_partition(partition: &Partition, config: &ClassifierConfig) -> PartitionOutcome {
    match classify(&partition.records, config) {
        Ok(Classification::BelowThreshold) => PartitionOutcome::BelowThreshold,
        Ok(Classification::Clustered(assignment)) => PartitionOutcome::Clustered {
            tiers: map_tiers(&assignment, &partition.metrics()),
            inertia: assignment.inertia,
        },
        Err(e) => PartitionOutcome::Failed(e),
    }
}

/// Classify a raw catalog into per-category tiers
///
/// # Arguments
/// * `raw` - Catalog rows, possibly with duplicate products
/// * `config` - Classifier settings, failure policy and parallelism
///
/// # Returns
/// * Every aggregated record with its tier, plus a run summary
/// * `PipelineError::InvalidConfig` before any work if the classifier
///   settings are rejected
pub fn classify_catalog(
    raw: &[ProductRecord],
    config: &PipelineConfig,
) -> Result<TierOutcome, PipelineError> {
    config.classifier.validate()?;

    let aggregated = aggregate(raw);
    info!(
        "Aggregated {} rows into {} products",
        raw.len(),
        aggregated.len()
    );

    let partitions = partition(&aggregated);
    info!("Found {} categories", partitions.len());

    let outcomes: Vec<PartitionOutcome> = if config.parallel {
        partitions
            .par_iter()
            .map(|p| classify_partition(p, &config.classifier))
            .collect()
    } else {
        partitions
            .iter()
            .map(|p| classify_partition(p, &config.classifier))
            .collect()
    };

    let expected = aggregated.len();
    let mut slots: Vec<Option<LabeledRecord>> = vec![None; expected];
    let mut written = 0usize;
    let mut summary = RunSummary {
        raw_rows: raw.len(),
        aggregated_rows: expected,
        ..Default::default()
    };

    for (partition, outcome) in partitions.iter().zip(outcomes) {
        let category = partition.key.to_string();

        let (tiers, status, inertia) = match outcome {
            PartitionOutcome::Clustered { tiers, inertia } => {
                (tiers, CategoryStatus::Clustered, Some(inertia))
            }
            PartitionOutcome::BelowThreshold => {
                debug!(
                    "Category {} has fewer than {} products, all labeled Longtail",
                    category, config.classifier.min_partition_size
                );
                (
                    vec![Tier::Longtail; partition.len()],
                    CategoryStatus::BelowThreshold,
                    None,
                )
            }
            PartitionOutcome::Failed(source) => match config.failure_policy {
                FailurePolicy::Abort => {
                    return Err(PipelineError::Partition { category, source });
                }
                FailurePolicy::Fallback => {
                    warn!(
                        "Category {} could not be classified ({}), labeling {} products Longtail",
                        category,
                        source,
                        partition.len()
                    );
                    (
                        vec![Tier::Longtail; partition.len()],
                        CategoryStatus::Failed(source.to_string()),
                        None,
                    )
                }
            },
        };

        let counts = TierCounts::from_tiers(&tiers);
        if status == CategoryStatus::Clustered {
            info!(
                "  Category {}: Hit={}, Good={}, Longtail={}",
                category, counts.hit, counts.good, counts.longtail
            );
        }

        for ((&position, record), tier) in partition
            .positions
            .iter()
            .zip(&partition.records)
            .zip(tiers)
        {
            match slots.get_mut(position) {
                Some(slot) if slot.is_none() => {
                    *slot = Some(LabeledRecord {
                        record: record.clone(),
                        tier,
                    });
                    written += 1;
                }
                _ => {
                    return Err(PipelineError::IncompleteLabeling {
                        expected,
                        labeled: written,
                    })
                }
            }
        }

        summary.tiers.merge(&counts);
        summary.categories.push(CategoryStats {
            category,
            status,
            counts,
            inertia,
        });
    }

    let labeled: Vec<LabeledRecord> = slots.into_iter().flatten().collect();
    if labeled.len() != expected {
        return Err(PipelineError::IncompleteLabeling {
            expected,
            labeled: labeled.len(),
        });
    }

    Ok(TierOutcome { labeled, summary })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str, category: Option<&str>, metric: f64) -> ProductRecord {
        ProductRecord::new(code, category, None, metric)
    }

    fn mixed_catalog() -> Vec<ProductRecord> {
        let mut rows = Vec::new();
        for (i, m) in [1.0, 2.0, 3.0, 10.0, 11.0, 12.0, 20.0, 21.0, 22.0]
            .iter()
            .enumerate()
        {
            rows.push(row(&format!("A{}", i), Some("Big"), *m));
            if i % 4 == 0 {
                rows.push(row(&format!("B{}", i), Some("Small"), *m));
            }
        }
        rows.push(row("A0", Some("Big"), 1.0));
        rows.push(row("X1", None, 500.0));
        rows
    }

    fn tier_of(outcome: &TierOutcome, code: &str) -> Tier {
        outcome
            .labeled
            .iter()
            .find(|l| l.record.product_code == code)
            .map(|l| l.tier)
            .unwrap()
    }

    #[test]
    fn test_small_category_scenario() {
        let raw = vec![
            row("P1", Some("A"), 5.0),
            row("P1", Some("A"), 3.0),
            row("P2", Some("A"), 8.0),
        ];

        let outcome = classify_catalog(&raw, &PipelineConfig::default()).unwrap();
        assert_eq!(outcome.labeled.len(), 2);
        assert_eq!(outcome.labeled[0].record.product_code, "P1");
        assert_eq!(outcome.labeled[0].record.metric, 8.0);
        assert_eq!(outcome.labeled[1].record.metric, 8.0);
        assert!(outcome.labeled.iter().all(|l| l.tier == Tier::Longtail));
        assert_eq!(outcome.summary.below_threshold(), 1);
    }

    #[test]
    fn test_completeness_and_order() {
        let raw = mixed_catalog();
        let aggregated = aggregate(&raw);
        let outcome = classify_catalog(&raw, &PipelineConfig::default()).unwrap();

        assert_eq!(outcome.labeled.len(), aggregated.len());
        let records: Vec<_> = outcome.labeled.iter().map(|l| l.record.clone()).collect();
        assert_eq!(records, aggregated);
        assert_eq!(outcome.summary.tiers.total(), aggregated.len());
    }

    #[test]
    fn test_mixed_catalog_tiers() {
        let outcome = classify_catalog(&mixed_catalog(), &PipelineConfig::default()).unwrap();

        // A0 was duplicated: 1 + 1 = 2, still in the bottom group
        assert_eq!(tier_of(&outcome, "A0"), Tier::Longtail);
        assert_eq!(tier_of(&outcome, "A4"), Tier::Good);
        assert_eq!(tier_of(&outcome, "A8"), Tier::Hit);

        // Small holds B0, B4, B8: enough to cluster, one per tier
        assert_eq!(tier_of(&outcome, "B0"), Tier::Longtail);
        assert_eq!(tier_of(&outcome, "B4"), Tier::Good);
        assert_eq!(tier_of(&outcome, "B8"), Tier::Hit);

        assert_eq!(tier_of(&outcome, "X1"), Tier::Longtail);

        let summary = &outcome.summary;
        assert_eq!(summary.categories.len(), 3);
        assert_eq!(summary.clustered(), 2);
        assert_eq!(summary.below_threshold(), 1);
        assert!(summary.failed().is_empty());
        assert_eq!(summary.raw_rows, 14);
        assert_eq!(summary.aggregated_rows, 13);
    }

    #[test]
    fn test_category_tiers_are_disjoint_and_complete() {
        let outcome = classify_catalog(&mixed_catalog(), &PipelineConfig::default()).unwrap();
        let big = outcome
            .summary
            .categories
            .iter()
            .find(|c| c.category == "Big")
            .unwrap();
        assert_eq!(big.counts.total(), 9);
        assert_eq!(
            big.counts,
            TierCounts {
                hit: 3,
                good: 3,
                longtail: 3
            }
        );
        assert!(big.inertia.is_some());
    }

    #[test]
    fn test_failed_category_falls_back() {
        let mut raw = mixed_catalog();
        raw.extend([
            row("N1", Some("Broken"), 1.0),
            row("N2", Some("Broken"), f64::NAN),
            row("N3", Some("Broken"), 3.0),
        ]);

        let outcome = classify_catalog(&raw, &PipelineConfig::default()).unwrap();
        assert_eq!(tier_of(&outcome, "N1"), Tier::Longtail);
        assert_eq!(tier_of(&outcome, "N3"), Tier::Longtail);
        assert_eq!(tier_of(&outcome, "A8"), Tier::Hit);

        let failed = outcome.summary.failed();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].category, "Broken");
    }

    #[test]
    fn test_failed_category_aborts() {
        let raw = vec![
            row("N1", Some("Broken"), 1.0),
            row("N2", Some("Broken"), f64::INFINITY),
            row("N3", Some("Broken"), 3.0),
        ];
        let config = PipelineConfig {
            failure_policy: FailurePolicy::Abort,
            ..Default::default()
        };

        match classify_catalog(&raw, &config) {
            Err(PipelineError::Partition { category, source }) => {
                assert_eq!(category, "Broken");
                assert!(matches!(source, PartitionError::NonFiniteMetric { .. }));
            }
            other => panic!("unexpected result: {:?}", other.map(|o| o.summary)),
        }
    }

    #[test]
    fn test_nan_in_small_category_is_longtail() {
        let raw = vec![row("N1", Some("Tiny"), f64::NAN)];
        let config = PipelineConfig {
            failure_policy: FailurePolicy::Abort,
            ..Default::default()
        };
        let outcome = classify_catalog(&raw, &config).unwrap();
        assert_eq!(outcome.labeled[0].tier, Tier::Longtail);
    }

    #[test]
    fn test_invalid_classifier_config_is_rejected() {
        let raw: Vec<ProductRecord> = [1.0, 2.0, 3.0, 10.0, 11.0, 12.0, 20.0, 21.0, 22.0]
            .iter()
            .enumerate()
            .map(|(i, &m)| row(&format!("A{}", i), Some("Big"), m))
            .collect();

        for classifier in [
            ClassifierConfig {
                n_runs: 1,
                ..Default::default()
            },
            ClassifierConfig {
                tolerance: 0.0,
                ..Default::default()
            },
        ] {
            let config = PipelineConfig {
                classifier,
                ..Default::default()
            };
            assert!(matches!(
                classify_catalog(&raw, &config),
                Err(PipelineError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_extreme_metric_span_gets_three_tiers() {
        let raw: Vec<ProductRecord> = [-1e308, -1e308, 0.0, 0.0, 1e308, 1e308]
            .iter()
            .enumerate()
            .map(|(i, &m)| row(&format!("E{}", i), Some("Extreme"), m))
            .collect();
        let config = PipelineConfig {
            failure_policy: FailurePolicy::Abort,
            ..Default::default()
        };

        let outcome = classify_catalog(&raw, &config).unwrap();
        let tiers: Vec<Tier> = outcome.labeled.iter().map(|l| l.tier).collect();
        assert_eq!(
            tiers,
            vec![
                Tier::Longtail,
                Tier::Longtail,
                Tier::Good,
                Tier::Good,
                Tier::Hit,
                Tier::Hit
            ]
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let raw = mixed_catalog();
        let sequential = classify_catalog(&raw, &PipelineConfig::default()).unwrap();
        let parallel = classify_catalog(
            &raw,
            &PipelineConfig {
                parallel: true,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(sequential.labeled, parallel.labeled);
        assert_eq!(sequential.summary, parallel.summary);
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let raw = mixed_catalog();
        let first = classify_catalog(&raw, &PipelineConfig::default()).unwrap();
        let second = classify_catalog(&raw, &PipelineConfig::default()).unwrap();
        assert_eq!(first.labeled, second.labeled);
    }

    #[test]
    fn test_empty_catalog() {
        let outcome = classify_catalog(&[], &PipelineConfig::default()).unwrap();
        assert!(outcome.labeled.is_empty());
        assert!(outcome.summary.categories.is_empty());
    }
}
