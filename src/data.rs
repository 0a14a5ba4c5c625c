//! Catalog table loading, column normalization and CSV output using Polars

use std::fs::File;
use std::path::Path;

use anyhow::Context;
use log::{info, warn};
use polars::prelude::*;

use crate::config::{ColumnConfig, MissingMetricPolicy};
use crate::record::{LabeledRecord, ProductRecord, Tier};

/// Load a catalog CSV into raw product records
///
/// # Arguments
/// * `file_path` - Path to the CSV file
/// * `columns` - Column names and missing-value policy
///
/// # Returns
/// * One `ProductRecord` per CSV row, in file order
pub fn load_catalog(
    file_path: impl AsRef<Path>,
    columns: &ColumnConfig,
) -> crate::Result<Vec<ProductRecord>> {
    let mut df = read_csv(file_path.as_ref())?;
    info!("Columns in file: {:?}", column_names(&df));

    normalize_columns(&mut df, columns)?;
    records_from_frame(&df, columns)
}

/// Read a previously written tier table back into labeled records
pub fn load_labeled(
    file_path: impl AsRef<Path>,
    columns: &ColumnConfig,
) -> crate::Result<Vec<LabeledRecord>> {
    let df = read_csv(file_path.as_ref())?;
    let records = records_from_frame(&df, columns)?;
    let tiers = string_column(&df, &columns.tier)?;

    records
        .into_iter()
        .zip(tiers)
        .enumerate()
        .map(|(row, (record, tier))| -> crate::Result<LabeledRecord> {
            let tier: Tier = tier
                .with_context(|| format!("Row {} has no tier", row + 1))?
                .parse()?;
            Ok(LabeledRecord { record, tier })
        })
        .collect()
}

/// Every column is read as text so product codes keep leading zeros
fn read_csv(path: &Path) -> crate::Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to open {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to parse CSV {}", path.display()))?;

    info!("Loaded {} rows from {}", df.height(), path.display());
    Ok(df)
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

/// Strip source prefixes from column names and report missing columns.
///
/// Returns the expected columns that are still absent afterwards. Absence is
/// only warned about here; conversion decides which columns are required.
pub fn normalize_columns(df: &mut DataFrame, columns: &ColumnConfig) -> crate::Result<Vec<String>> {
    for name in column_names(df) {
        let stripped = columns
            .strip_prefixes
            .iter()
            .find_map(|prefix| name.strip_prefix(prefix.as_str()));

        let Some(stripped) = stripped.filter(|s| !s.is_empty()) else {
            continue;
        };

        if df.get_column_index(stripped).is_some() {
            warn!(
                "Column {} would collide with existing column {}, keeping its name",
                name, stripped
            );
            continue;
        }
        df.rename(&name, stripped)?;
    }

    let present = column_names(df);
    let mut missing = Vec::new();

    for expected in columns.expected() {
        if present.iter().any(|c| c == expected) {
            continue;
        }

        let needle = expected.to_lowercase();
        let similar: Vec<&String> = present
            .iter()
            .filter(|c| c.to_lowercase().contains(&needle))
            .collect();

        if similar.is_empty() {
            warn!("Column {} not found in data", expected);
        } else {
            warn!(
                "Column {} not found, but found similar columns: {:?}",
                expected, similar
            );
        }
        missing.push(expected.to_string());
    }

    Ok(missing)
}

/// Convert a normalized frame into product records
pub fn records_from_frame(
    df: &DataFrame,
    columns: &ColumnConfig,
) -> crate::Result<Vec<ProductRecord>> {
    let codes = string_column(df, &columns.product_code)?;
    let categories = string_column(df, &columns.category)?;
    let metrics = string_column(df, &columns.metric)?;
    let names = if df.get_column_index(&columns.display_name).is_some() {
        string_column(df, &columns.display_name)?
    } else {
        vec![None; df.height()]
    };

    let mut missing_metrics = 0usize;
    let mut records = Vec::with_capacity(df.height());

    for (row, (((code, category), name), metric)) in codes
        .into_iter()
        .zip(categories)
        .zip(names)
        .zip(metrics)
        .enumerate()
    {
        let product_code = code.with_context(|| {
            format!(
                "Row {} has no value in column {}",
                row + 1,
                columns.product_code
            )
        })?;

        let metric = match metric {
            Some(raw) => raw.trim().parse::<f64>().with_context(|| {
                format!(
                    "Row {} (product {}): invalid {} value '{}'",
                    row + 1,
                    product_code,
                    columns.metric,
                    raw
                )
            })?,
            None => match columns.missing_metric {
                MissingMetricPolicy::Zero => {
                    missing_metrics += 1;
                    0.0
                }
                MissingMetricPolicy::Reject => anyhow::bail!(
                    "Row {} (product {}) has no value in column {}",
                    row + 1,
                    product_code,
                    columns.metric
                ),
            },
        };

        records.push(ProductRecord {
            product_code,
            category,
            display_name: name,
            metric,
        });
    }

    if missing_metrics > 0 {
        warn!(
            "{} rows have no {} value, counted as 0",
            missing_metrics, columns.metric
        );
    }

    Ok(records)
}

/// Column values as written; nulls and whitespace-only cells become `None`
fn string_column(df: &DataFrame, name: &str) -> crate::Result<Vec<Option<String>>> {
    let series = df
        .column(name)
        .with_context(|| format!("Missing required column {}", name))?
        .cast(&DataType::String)?;

    let values = series
        .str()?
        .into_iter()
        .map(|v| v.filter(|s| !s.trim().is_empty()).map(str::to_string))
        .collect();

    Ok(values)
}

/// Build the output table: the four input columns plus the tier label
pub fn labeled_to_frame(
    labeled: &[LabeledRecord],
    columns: &ColumnConfig,
) -> crate::Result<DataFrame> {
    let codes: Vec<&str> = labeled
        .iter()
        .map(|l| l.record.product_code.as_str())
        .collect();
    let categories: Vec<Option<&str>> = labeled
        .iter()
        .map(|l| l.record.category.as_deref())
        .collect();
    let names: Vec<Option<&str>> = labeled
        .iter()
        .map(|l| l.record.display_name.as_deref())
        .collect();
    let metrics: Vec<f64> = labeled.iter().map(|l| l.record.metric).collect();
    let tiers: Vec<&str> = labeled.iter().map(|l| l.tier.as_str()).collect();

    let df = DataFrame::new(vec![
        Series::new(&columns.product_code, codes),
        Series::new(&columns.category, categories),
        Series::new(&columns.display_name, names),
        Series::new(&columns.metric, metrics),
        Series::new(&columns.tier, tiers),
    ])?;

    Ok(df)
}

/// Write labeled records as CSV with a header row
pub fn write_labeled(
    file_path: impl AsRef<Path>,
    labeled: &[LabeledRecord],
    columns: &ColumnConfig,
) -> crate::Result<()> {
    let path = file_path.as_ref();
    let mut df = labeled_to_frame(labeled, columns)?;

    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Saved {} labeled products to {}", df.height(), path.display());
    Ok(())
}
