//! # loan-etl
//!
//! A batch ETL for loan-records CSV exports. One run analyses column types,
//! cleans the table, reshapes it into a star schema (a fact table of measures
//! plus keyed dimension tables), prints a report and, on request, loads the
//! schema into PostgreSQL.
//!
//! ```no_run
//! use loan_etl::config::PipelineConfig;
//! use loan_etl::pipeline::run_pipeline;
//!
//! let config = PipelineConfig::default();
//! let report = run_pipeline(&config, &mut std::io::stdout())?;
//! for dim in &report.schema.dimensions {
//!     println!("{}: {} records", dim.name(), dim.len());
//! }
//! # Ok::<(), loan_etl::error::EtlError>(())
//! ```
//!
//! ## Modules
//!
//! - [`pipeline`]: type analysis, cleaning, date filtering, star schema, report
//! - [`warehouse`]: database deployment and verification
//! - [`config`]: run configuration and connection settings
//! - [`error`]: error types and handling utilities
//! - [`logging`]: `tracing` subscriber setup
//! - [`utils`]: number formatting helpers

#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod utils;
pub mod warehouse;
