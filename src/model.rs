//! K-Means classification of a category's popularity metric

use linfa::prelude::*;
use linfa_clustering::KMeans;
use linfa_nn::distance::L2Dist;
use linfa_preprocessing::linear_scaling::LinearScaler;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{ClassifierConfig, N_TIERS};
use crate::error::PartitionError;
use crate::record::AggregatedRecord;

/// Unranked 3-way grouping of one partition.
///
/// Cluster ids carry no order; they only mean something once
/// [`crate::tier::map_tiers`] has ranked them by mean metric.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterAssignment {
    /// Cluster id per record, in partition order
    pub labels: Vec<usize>,
    /// Cluster centers in scaled space, indexed by cluster id
    pub centroids: Vec<f64>,
    /// Within-cluster sum of squares in scaled space
    pub inertia: f64,
}

/// Result of running the classifier on one partition
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Too few records to cluster; every record is Longtail
    BelowThreshold,
    Clustered(ClusterAssignment),
}

/// Cluster one partition's records by their metric
///
/// # Arguments
/// * `records` - Aggregated records of a single category
/// * `config` - Seed, restart count and convergence settings
///
/// # Returns
/// * `Classification::BelowThreshold` for small partitions, otherwise the
///   cluster assignment of every record
pub fn classify(
    records: &[AggregatedRecord],
    config: &ClassifierConfig,
) -> Result<Classification, PartitionError> {
    if records.len() < config.min_partition_size {
        return Ok(Classification::BelowThreshold);
    }

    if let Some(bad) = records.iter().find(|r| !r.metric.is_finite()) {
        return Err(PartitionError::NonFiniteMetric {
            product_code: bad.product_code.clone(),
            value: bad.metric,
        });
    }

    let raw: Array1<f64> = records.iter().map(|r| r.metric).collect();
    let scaled = min_max_scale(&raw)?;

    // K-Means++ cannot seed three distinct centers from fewer distinct points
    let distinct = distinct_values(&scaled);
    let assignment = if distinct.len() < N_TIERS {
        assign_by_rank(&scaled, distinct)
    } else {
        fit_kmeans(&scaled, config)?
    };

    Ok(Classification::Clustered(assignment))
}

/// Rescale values linearly onto [0, 1] with a fitted min-max scaler.
///
/// A zero range maps every value to 0. A span too wide for `f64` is halved
/// before fitting, which leaves the scaled result unchanged.
pub fn min_max_scale(values: &Array1<f64>) -> Result<Array1<f64>, PartitionError> {
    let n_samples = values.len();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if !(max > min) {
        return Ok(Array1::zeros(n_samples));
    }

    let mut raw_features: Array2<f64> = values.view().insert_axis(Axis(1)).to_owned();
    if !(max - min).is_finite() {
        raw_features.mapv_inplace(|v| v * 0.5);
    }

    // Create and fit min-max scaler
    let dataset = Dataset::new(raw_features.clone(), Array1::<usize>::zeros(n_samples));
    let scaler = LinearScaler::min_max()
        .fit(&dataset)
        .map_err(|e| PartitionError::Scaling(e.to_string()))?;

    let scaled: Array2<f64> = scaler.transform(raw_features);
    Ok(scaled.column(0).to_owned())
}

fn distinct_values(values: &Array1<f64>) -> Vec<f64> {
    let mut distinct = values.to_vec();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();
    distinct
}

/// Cluster id = rank of the record's value among the distinct values
fn assign_by_rank(scaled: &Array1<f64>, distinct: Vec<f64>) -> ClusterAssignment {
    let labels = scaled
        .iter()
        .map(|&v| distinct.partition_point(|&d| d < v))
        .collect();

    ClusterAssignment {
        labels,
        centroids: distinct,
        inertia: 0.0,
    }
}

/// Fit seeded, multi-restart K-Means on the scaled metric
fn fit_kmeans(
    scaled: &Array1<f64>,
    config: &ClassifierConfig,
) -> Result<ClusterAssignment, PartitionError> {
    let n_samples = scaled.len();
    let observations: Array2<f64> = scaled.view().insert_axis(Axis(1)).to_owned();

    // Dummy targets for unsupervised learning
    let targets: Array1<usize> = Array1::zeros(n_samples);
    let dataset = Dataset::new(observations.clone(), targets);

    let rng = StdRng::seed_from_u64(config.seed);
    let model = KMeans::params_with(N_TIERS, rng, L2Dist)
        .n_runs(config.n_runs)
        .max_n_iterations(config.max_iters as u64)
        .tolerance(config.tolerance)
        .fit(&dataset)
        .map_err(|e| PartitionError::Clustering(e.to_string()))?;

    let labels: Array1<usize> = model.predict(&observations);
    let centroids: Vec<f64> = model.centroids().column(0).to_vec();
    let inertia = compute_inertia(scaled, &labels, &centroids);

    log::debug!(
        "k-means fitted on {} records: centroids={:?}, inertia={:.4}",
        n_samples,
        centroids,
        inertia
    );

    Ok(ClusterAssignment {
        labels: labels.to_vec(),
        centroids,
        inertia,
    })
}

/// Compute within-cluster sum of squares (inertia)
fn compute_inertia(scaled: &Array1<f64>, labels: &Array1<usize>, centroids: &[f64]) -> f64 {
    let mut inertia = 0.0;

    for (&value, &cluster) in scaled.iter().zip(labels.iter()) {
        if let Some(&center) = centroids.get(cluster) {
            inertia += (value - center).powi(2);
        }
    }

    inertia
}
