//! Run summary reporting

use crate::pipeline::{CategoryStatus, RunSummary, TierCounts};

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Format the tier distribution as table rows
pub fn tier_distribution(counts: &TierCounts) -> Vec<String> {
    let total = counts.total();
    [
        ("Hit", counts.hit),
        ("Good", counts.good),
        ("Longtail", counts.longtail),
    ]
    .iter()
    .map(|(label, count)| {
        format!(
            "  {:8}: {} products ({:.1}%)",
            label,
            count,
            percentage(*count, total)
        )
    })
    .collect()
}

/// Format one line per category
pub fn category_lines(summary: &RunSummary) -> Vec<String> {
    summary
        .categories
        .iter()
        .map(|c| {
            let status = match &c.status {
                CategoryStatus::Clustered => "clustered".to_string(),
                CategoryStatus::BelowThreshold => "below threshold".to_string(),
                CategoryStatus::Failed(reason) => format!("failed: {}", reason),
            };
            let inertia = c
                .inertia
                .map(|i| format!("{:.4}", i))
                .unwrap_or_else(|| "-".to_string());
            format!(
                "  {:30} | {:4} | {:4} | {:8} | {:8} | {}",
                c.category, c.counts.hit, c.counts.good, c.counts.longtail, inertia, status
            )
        })
        .collect()
}

/// Print run statistics to console
pub fn print_run_summary(summary: &RunSummary, verbose: bool) {
    println!("\n=== Tier Statistics ===");
    println!("Input rows: {}", summary.raw_rows);
    println!("Products after aggregation: {}", summary.aggregated_rows);
    println!(
        "Categories: {} ({} clustered, {} below threshold, {} failed)",
        summary.categories.len(),
        summary.clustered(),
        summary.below_threshold(),
        summary.failed().len()
    );

    println!("\nTier distribution:");
    for line in tier_distribution(&summary.tiers) {
        println!("{}", line);
    }

    let failed = summary.failed();
    if !failed.is_empty() {
        println!("\nFailed categories (labeled Longtail):");
        for stats in failed {
            if let CategoryStatus::Failed(reason) = &stats.status {
                println!("  {}: {}", stats.category, reason);
            }
        }
    }

    if verbose {
        println!("\nPer-category tiers:");
        println!(
            "  {:30} | {:4} | {:4} | {:8} | {:8} | status",
            "Category", "Hit", "Good", "Longtail", "Inertia"
        );
        for line in category_lines(summary) {
            println!("{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::CategoryStats;

    fn summary() -> RunSummary {
        let big = TierCounts {
            hit: 1,
            good: 1,
            longtail: 2,
        };
        let small = TierCounts {
            hit: 0,
            good: 0,
            longtail: 2,
        };
        RunSummary {
            raw_rows: 7,
            aggregated_rows: 6,
            categories: vec![
                CategoryStats {
                    category: "Big".to_string(),
                    status: CategoryStatus::Clustered,
                    counts: big,
                    inertia: Some(0.125),
                },
                CategoryStats {
                    category: "Small".to_string(),
                    status: CategoryStatus::Failed("bad metric".to_string()),
                    counts: small,
                    inertia: None,
                },
            ],
            tiers: TierCounts {
                hit: 1,
                good: 1,
                longtail: 4,
            },
        }
    }

    #[test]
    fn test_tier_distribution() {
        let lines = tier_distribution(&summary().tiers);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Hit"));
        assert!(lines[2].contains("4 products (66.7%)"));
    }

    #[test]
    fn test_empty_distribution() {
        let lines = tier_distribution(&TierCounts::default());
        assert!(lines.iter().all(|l| l.contains("(0.0%)")));
    }

    #[test]
    fn test_category_lines() {
        let lines = category_lines(&summary());
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("0.1250"));
        assert!(lines[0].contains("clustered"));
        assert!(lines[1].contains("failed: bad metric"));
    }
}
