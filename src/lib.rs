//! TierForge: per-category product tiering with K-Means clustering
//!
//! This library sorts catalog products into Hit, Good and Longtail tiers by
//! clustering a popularity metric independently within each category.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod partition;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod tier;

// Re-export public items for easier access
pub use aggregate::aggregate;
pub use cli::Args;
pub use config::{ClassifierConfig, ColumnConfig, FailurePolicy, MissingMetricPolicy, PipelineConfig};
pub use data::{load_catalog, load_labeled, write_labeled};
pub use error::{PartitionError, PipelineError};
pub use model::{classify, ClusterAssignment, Classification};
pub use partition::{partition, Partition};
pub use pipeline::{classify_catalog, RunSummary, TierOutcome};
pub use record::{AggregatedRecord, CategoryKey, LabeledRecord, ProductRecord, Tier};
pub use tier::map_tiers;

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
