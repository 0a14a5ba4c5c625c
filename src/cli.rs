//! Command-line interface definitions and argument parsing

use clap::Parser;

use crate::config::{
    ClassifierConfig, ColumnConfig, FailurePolicy, MissingMetricPolicy, PipelineConfig,
};

/// Per-category Hit/Good/Longtail product tiering using K-Means clustering
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input catalog CSV file
    #[arg(short, long, default_value = "catalog.csv")]
    pub input: String,

    /// Path for the labeled output CSV file
    #[arg(short, long, default_value = "catalog_tiers.csv")]
    pub output: String,

    /// Seed for K-Means initialization
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Number of K-Means restarts per category (at least 10)
    #[arg(long, default_value = "10")]
    pub n_runs: usize,

    /// Maximum iterations for K-Means algorithm
    #[arg(long, default_value = "300")]
    pub max_iters: usize,

    /// Tolerance for K-Means convergence
    #[arg(long, default_value = "1e-4")]
    pub tolerance: f64,

    /// Abort the run when any category fails to classify
    #[arg(long)]
    pub abort_on_failure: bool,

    /// Classify categories in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Fail on rows without a metric value instead of counting them as 0
    #[arg(long)]
    pub reject_missing_metric: bool,

    /// Product code column
    #[arg(long, default_value = "TOW_KOD")]
    pub code_column: String,

    /// Category name column
    #[arg(long, default_value = "NAZWA")]
    pub category_column: String,

    /// Product display name column
    #[arg(long, default_value = "LONG_NAME_CLEAN")]
    pub name_column: String,

    /// Popularity metric column
    #[arg(long, default_value = "RATING")]
    pub metric_column: String,

    /// Output column for the tier label
    #[arg(long, default_value = "TIER")]
    pub tier_column: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Build and validate the pipeline configuration
    pub fn pipeline_config(&self) -> crate::Result<PipelineConfig> {
        let classifier = ClassifierConfig {
            seed: self.seed,
            n_runs: self.n_runs,
            max_iters: self.max_iters,
            tolerance: self.tolerance,
            ..Default::default()
        };
        classifier.validate()?;

        let failure_policy = if self.abort_on_failure {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Fallback
        };

        Ok(PipelineConfig {
            classifier,
            failure_policy,
            parallel: self.parallel,
        })
    }

    pub fn column_config(&self) -> ColumnConfig {
        ColumnConfig {
            product_code: self.code_column.clone(),
            category: self.category_column.clone(),
            display_name: self.name_column.clone(),
            metric: self.metric_column.clone(),
            tier: self.tier_column.clone(),
            missing_metric: if self.reject_missing_metric {
                MissingMetricPolicy::Reject
            } else {
                MissingMetricPolicy::Zero
            },
            ..Default::default()
        }
    }
}
