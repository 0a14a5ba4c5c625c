//! Classifier, column and pipeline configuration

use crate::error::PipelineError;

/// Number of tiers, and therefore K-Means clusters, per category
pub const N_TIERS: usize = 3;

/// Lowest restart count that still gives stable cluster identities
pub const MIN_RUNS: usize = 10;

/// K-Means settings applied to every category partition
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Categories with fewer records are labeled Longtail without clustering
    pub min_partition_size: usize,
    /// Seed for the K-Means++ initialization RNG
    pub seed: u64,
    /// Number of K-Means restarts; the lowest-inertia run wins
    pub n_runs: usize,
    /// Maximum Lloyd iterations per run
    pub max_iters: usize,
    /// Convergence tolerance on centroid movement
    pub tolerance: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_partition_size: N_TIERS,
            seed: 42,
            n_runs: MIN_RUNS,
            max_iters: 300,
            tolerance: 1e-4,
        }
    }
}

impl ClassifierConfig {
    /// Reject settings that would make clustering unstable or meaningless
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.n_runs < MIN_RUNS {
            return Err(PipelineError::InvalidConfig(format!(
                "n_runs must be at least {} for deterministic clustering, got {}",
                MIN_RUNS, self.n_runs
            )));
        }
        if self.max_iters == 0 {
            return Err(PipelineError::InvalidConfig(
                "max_iters must be positive".to_string(),
            ));
        }
        if !(self.tolerance > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.min_partition_size < N_TIERS {
            return Err(PipelineError::InvalidConfig(format!(
                "min_partition_size must be at least {}, got {}",
                N_TIERS, self.min_partition_size
            )));
        }
        Ok(())
    }
}

/// What to do when a row has no metric value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingMetricPolicy {
    /// Count the row as zero popularity
    #[default]
    Zero,
    /// Refuse to load the table
    Reject,
}

/// Column names of the catalog table
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnConfig {
    pub product_code: String,
    pub category: String,
    pub display_name: String,
    pub metric: String,
    /// Output column holding the tier label
    pub tier: String,
    /// Prefixes stripped from incoming column names
    pub strip_prefixes: Vec<String>,
    pub missing_metric: MissingMetricPolicy,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            product_code: "TOW_KOD".to_string(),
            category: "NAZWA".to_string(),
            display_name: "LONG_NAME_CLEAN".to_string(),
            metric: "RATING".to_string(),
            tier: "TIER".to_string(),
            strip_prefixes: vec!["p.".to_string(), "kat.".to_string(), "so.".to_string()],
            missing_metric: MissingMetricPolicy::Zero,
        }
    }
}

impl ColumnConfig {
    /// Input columns in output order
    pub fn expected(&self) -> [&str; 4] {
        [
            self.product_code.as_str(),
            self.category.as_str(),
            self.display_name.as_str(),
            self.metric.as_str(),
        ]
    }
}

/// How the orchestrator reacts to a failed partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the whole run on the first failed category
    Abort,
    /// Label the failed category Longtail and keep going
    #[default]
    Fallback,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub classifier: ClassifierConfig,
    pub failure_policy: FailurePolicy,
    /// Classify partitions on the rayon thread pool
    pub parallel: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_classifier_is_valid() {
        assert!(ClassifierConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_classifier_settings() {
        let config = ClassifierConfig {
            n_runs: 3,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));

        let config = ClassifierConfig {
            tolerance: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ClassifierConfig {
            max_iters: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ClassifierConfig {
            min_partition_size: 2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expected_columns() {
        let columns = ColumnConfig::default();
        assert_eq!(
            columns.expected(),
            ["TOW_KOD", "NAZWA", "LONG_NAME_CLEAN", "RATING"]
        );
    }
}
