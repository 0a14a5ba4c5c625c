//! TierForge: per-category Hit/Good/Longtail tiering of a product catalog
//!
//! This is the main entrypoint that orchestrates catalog loading,
//! classification, reporting and output.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::time::Instant;
use tierforge::{classify_catalog, load_catalog, report, write_labeled, Args};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::init_from_env(env_logger::Env::default().default_filter_or(default_level));

    run_pipeline(&args)
}

/// Run full tiering pipeline
fn run_pipeline(args: &Args) -> Result<()> {
    let config = args.pipeline_config()?;
    let columns = args.column_config();

    info!("Starting catalog tiering for {}", args.input);
    let start_time = Instant::now();

    // Step 1: Load catalog
    let raw = load_catalog(&args.input, &columns)
        .with_context(|| format!("Failed to load catalog from {}", args.input))?;
    info!("Loaded {} catalog rows", raw.len());

    // Step 2: Aggregate, partition and classify
    let classify_start = Instant::now();
    let outcome = classify_catalog(&raw, &config).context("Catalog classification failed")?;
    info!(
        "Classification finished in {:.2}s",
        classify_start.elapsed().as_secs_f64()
    );

    // Step 3: Write results
    write_labeled(&args.output, &outcome.labeled, &columns)
        .with_context(|| format!("Failed to write results to {}", args.output))?;

    report::print_run_summary(&outcome.summary, args.verbose);

    println!("\n=== Pipeline Complete ===");
    println!(
        "Total processing time: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    println!("Results saved to: {}", args.output);

    Ok(())
}
