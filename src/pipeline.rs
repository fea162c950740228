//! The analysis half of the ETL: from a loan-records CSV to a star schema.
//!
//! Stages run strictly in order and each produces a new `DataFrame`:
//!
//! - [`types`]: infer a [`ColumnKind`] per column (failure aborts the run)
//! - [`io`]: load the CSV as polars infers it
//! - [`cleaning`]: drop sparse columns, later drop incomplete rows
//! - [`dates`]: parse the issue date and keep rows inside the configured range
//! - [`star_schema`]: split into a fact table and dimension tables
//! - [`report`]: write a human-readable summary
//!
//! # Example
//!
//! ```no_run
//! use loan_etl::config::PipelineConfig;
//! use loan_etl::pipeline::run_pipeline;
//!
//! let config = PipelineConfig::default();
//! let report = run_pipeline(&config, &mut std::io::stdout())?;
//! println!("{}", report.summary());
//! # Ok::<(), loan_etl::error::EtlError>(())
//! ```

pub mod cleaning;
pub mod dates;
pub mod executor;
pub mod io;
pub mod report;
pub mod star_schema;
pub mod types;

pub use cleaning::{clean_missing_values, drop_incomplete_rows};
pub use dates::filter_date_range;
pub use executor::{RunReport, run_pipeline};
pub use io::load_source;
pub use report::write_report;
pub use star_schema::{DIMENSIONS, DimensionTable, MEASURE_COLUMNS, StarSchema, build_star_schema};
pub use types::{ColumnKind, ColumnType, ColumnTypes, guess_column_types};

#[cfg(test)]
mod tests;
