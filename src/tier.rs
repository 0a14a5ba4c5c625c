//! Ranking clusters by mean metric and assigning tiers

use crate::config::N_TIERS;
use crate::model::ClusterAssignment;
use crate::record::Tier;

/// Mean original-scale metric of each cluster id, `None` for empty clusters
pub fn cluster_means(assignment: &ClusterAssignment, metrics: &[f64]) -> Vec<Option<f64>> {
    let mut sums = vec![0.0; N_TIERS];
    let mut counts = vec![0usize; N_TIERS];

    for (&label, &metric) in assignment.labels.iter().zip(metrics) {
        if label < N_TIERS {
            sums[label] += metric;
            counts[label] += 1;
        }
    }

    sums.into_iter()
        .zip(counts)
        .map(|(sum, count)| (count > 0).then(|| sum / count as f64))
        .collect()
}

/// Tier per cluster id.
///
/// Non-empty clusters are ranked by ascending mean and given tiers from the
/// bottom up. Equal means rank the lower cluster id lower.
pub fn rank_clusters(means: &[Option<f64>]) -> Vec<Option<Tier>> {
    let mut ranked: Vec<(usize, f64)> = means
        .iter()
        .enumerate()
        .filter_map(|(id, mean)| mean.map(|m| (id, m)))
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

    let mut tiers = vec![None; means.len()];
    for ((id, _), tier) in ranked.into_iter().zip(Tier::ASCENDING) {
        tiers[id] = Some(tier);
    }
    tiers
}

/// Label every record of a clustered partition.
///
/// Ranking uses the original metric, not the scaled one.
pub fn map_tiers(assignment: &ClusterAssignment, metrics: &[f64]) -> Vec<Tier> {
    let tiers = rank_clusters(&cluster_means(assignment, metrics));

    assignment
        .labels
        .iter()
        .map(|&label| {
            tiers
                .get(label)
                .copied()
                .flatten()
                .unwrap_or(Tier::Longtail)
        })
        .collect()
}
