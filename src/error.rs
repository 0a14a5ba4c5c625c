//! Error types for partition classification and pipeline assembly

use thiserror::Error;

/// Failure scoped to a single category partition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PartitionError {
    #[error("product '{product_code}' has non-finite metric {value}")]
    NonFiniteMetric { product_code: String, value: f64 },
    #[error("min-max scaling failed: {0}")]
    Scaling(String),
    #[error("k-means fit failed: {0}")]
    Clustering(String),
}

/// Fatal pipeline error.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("classification of category '{category}' failed: {source}")]
    Partition {
        category: String,
        #[source]
        source: PartitionError,
    },
    #[error("invalid classifier configuration: {0}")]
    InvalidConfig(String),
    #[error("incomplete labeling: {labeled} of {expected} aggregated records received a tier")]
    IncompleteLabeling { expected: usize, labeled: usize },
}
