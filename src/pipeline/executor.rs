//! Pipeline execution.
//!
//! Runs the analysis stages in order and writes progress to a text sink:
//!
//! ```text
//! type analysis -> load -> drop sparse columns -> date filter
//!     -> drop incomplete rows -> star schema -> report
//! ```
//!
//! Deployment is not part of this module; see [`crate::warehouse`].

use super::cleaning::{clean_missing_values, drop_incomplete_rows};
use super::dates::{filter_date_range, is_date_column};
use super::io::load_source;
use super::report::{write_report, write_rule};
use super::star_schema::{StarSchema, build_star_schema};
use super::types::{ColumnTypes, guess_column_types};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::utils::format_count;
use std::io::Write;

/// Column types echoed to the console before the rest are summarised.
const SHOWN_COLUMN_TYPES: usize = 5;

/// What a successful run produced, stage by stage.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub column_types: ColumnTypes,

    /// Rows and columns as loaded
    pub rows_loaded: usize,
    pub columns_loaded: usize,

    /// After dropping sparse columns
    pub rows_cleaned: usize,
    pub columns_cleaned: usize,

    /// After the date range filter
    pub rows_in_range: usize,

    /// After dropping incomplete rows
    pub rows_final: usize,
    pub columns_final: usize,

    pub schema: StarSchema,

    pub duration: std::time::Duration,
}

impl RunReport {
    pub fn summary(&self) -> String {
        format!(
            "Pipeline completed: {} -> {} rows, {} -> {} columns, {} dimensions, {} fact records, {:.2}s",
            self.rows_loaded,
            self.rows_final,
            self.columns_loaded,
            self.columns_final,
            self.schema.dimensions.len(),
            self.schema.fact.height(),
            self.duration.as_secs_f64()
        )
    }

    /// The closing lines printed after a successful run.
    pub fn write_completion<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "\nETL Pipeline completed successfully!")?;
        writeln!(out, "   - Original data: {} rows", format_count(self.rows_loaded))?;
        writeln!(out, "   - Final data: {} rows", format_count(self.rows_final))?;
        writeln!(out, "   - Dimension tables: {}", self.schema.dimensions.len())?;
        writeln!(out, "   - Fact table records: {}", format_count(self.schema.fact.height()))?;
        Ok(())
    }
}

/// Runs every analysis stage and the report.
///
/// # Errors
///
/// An inference failure aborts before loading. Any other stage error is
/// returned unchanged; nothing is retried.
pub fn run_pipeline<W: Write>(config: &PipelineConfig, out: &mut W) -> Result<RunReport> {
    let start = std::time::Instant::now();
    let path = config.data_file.as_path();

    writeln!(out, "Starting ETL Pipeline")?;
    write_rule(out)?;

    writeln!(out, "\nStep 1: Analysing column types...")?;
    let column_types = guess_column_types(path)?;
    writeln!(out, "Analysed {} columns", column_types.len())?;
    writeln!(out, "   Sample column types:")?;
    for column in column_types.iter().take(SHOWN_COLUMN_TYPES) {
        writeln!(out, "     - {}: {} ({})", column.name, column.kind, column.dtype)?;
    }
    if column_types.len() > SHOWN_COLUMN_TYPES {
        writeln!(out, "     ... and {} more", column_types.len() - SHOWN_COLUMN_TYPES)?;
    }

    writeln!(out, "\nStep 2: Loading data from {}...", path.display())?;
    let raw = load_source(path)?;
    let rows_loaded = raw.height();
    let columns_loaded = raw.width();
    writeln!(
        out,
        "Loaded: {} rows, {} columns",
        format_count(rows_loaded),
        columns_loaded
    )?;

    writeln!(out, "\nStep 3: Cleaning missing values...")?;
    let cleaned = clean_missing_values(raw, config.max_null_percentage)?;
    let rows_cleaned = cleaned.height();
    let columns_cleaned = cleaned.width();
    writeln!(
        out,
        "After cleaning: {} rows, {} columns",
        format_count(rows_cleaned),
        columns_cleaned
    )?;

    writeln!(out, "\nStep 4: Filtering date range...")?;
    let in_range = match cleaned.column(&config.date_column).map(is_date_column) {
        Ok(true) => {
            let filtered = filter_date_range(cleaned, &config.date_column, &config.date_range)?;
            writeln!(out, "After date filtering: {} rows", format_count(filtered.height()))?;
            filtered
        }
        Ok(false) => {
            writeln!(
                out,
                "'{}' does not hold dates, skipping date filtering",
                config.date_column
            )?;
            filter_date_range(cleaned, &config.date_column, &config.date_range)?
        }
        Err(_) => {
            writeln!(out, "No '{}' column found, skipping date filtering", config.date_column)?;
            filter_date_range(cleaned, &config.date_column, &config.date_range)?
        }
    };
    let rows_in_range = in_range.height();

    writeln!(out, "\nStep 5: Final data cleanup...")?;
    let complete = drop_incomplete_rows(in_range)?;
    writeln!(
        out,
        "Final dataset: {} rows, {} columns",
        format_count(complete.height()),
        complete.width()
    )?;

    writeln!(out, "\nStep 6: Creating star schema...")?;
    let schema = build_star_schema(&complete)?;
    for dim in &schema.dimensions {
        writeln!(out, "   {}: {} records", dim.name(), format_count(dim.len()))?;
    }
    writeln!(
        out,
        "   Fact table: {} records, {} columns",
        format_count(schema.fact.height()),
        schema.fact.width()
    )?;

    write_report(out, &schema)?;

    let report = RunReport {
        column_types,
        rows_loaded,
        columns_loaded,
        rows_cleaned,
        columns_cleaned,
        rows_in_range,
        rows_final: complete.height(),
        columns_final: complete.width(),
        schema,
        duration: start.elapsed(),
    };
    tracing::info!("{}", report.summary());

    Ok(report)
}
