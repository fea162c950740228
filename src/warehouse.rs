//! Loading the star schema into a relational store (PostgreSQL via `sqlx`).
//!
//! ```no_run
//! use loan_etl::config::PipelineConfig;
//! use loan_etl::pipeline::run_pipeline;
//! use loan_etl::warehouse::deploy;
//!
//! # async fn example() -> loan_etl::error::Result<()> {
//! let config = PipelineConfig::default();
//! let mut out = std::io::stdout();
//! let report = run_pipeline(&config, &mut out)?;
//! let ok = deploy(&report.schema, &config.database, &mut out).await;
//! # let _ = ok;
//! # Ok(())
//! # }
//! ```

pub mod db;
pub mod deploy;

pub use db::DbClient;
pub use deploy::{DeploymentReport, FACT_TABLE, TableNames, deploy, try_deploy};
