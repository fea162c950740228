//! Loads a built star schema into PostgreSQL.
//!
//! Each table is fully replaced (drop, create, `COPY`). There is no transaction
//! around the whole load: a failure part way leaves the tables written so far.

use super::db::DbClient;
use crate::config::DatabaseConfig;
use crate::error::{EtlError, Result};
use crate::pipeline::StarSchema;
use crate::utils::format_count;
use polars::prelude::DataFrame;
use std::io::Write;

pub const FACT_TABLE: &str = "loans_fact";

/// Produces every deployed table name, so writes and verification never disagree.
#[derive(Debug, Clone, Default)]
pub struct TableNames {
    suffix: Option<String>,
}

impl TableNames {
    pub fn new(suffix: Option<&str>) -> Self {
        Self {
            suffix: suffix
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned),
        }
    }

    pub fn resolve(&self, base: &str) -> String {
        match &self.suffix {
            Some(suffix) => format!("{base}_{suffix}"),
            None => base.to_owned(),
        }
    }

    /// Dimension tables in schema order, then the fact table.
    pub fn for_schema(&self, schema: &StarSchema) -> Vec<String> {
        schema
            .dimensions
            .iter()
            .map(|d| self.resolve(d.name()))
            .chain(std::iter::once(self.resolve(FACT_TABLE)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedTable {
    pub name: String,
    pub rows_written: usize,
    pub rows_verified: i64,
}

#[derive(Debug, Clone, Default)]
pub struct DeploymentReport {
    pub tables: Vec<DeployedTable>,
}

impl DeploymentReport {
    pub fn is_consistent(&self) -> bool {
        self.tables
            .iter()
            .all(|t| i64::try_from(t.rows_written).is_ok_and(|w| w == t.rows_verified))
    }
}

/// Deploys `schema` and reports the outcome as a flag.
///
/// Every error (connect, write, verify) is logged and printed as a deployment
/// failure; nothing propagates to the caller.
pub async fn deploy<W: Write>(schema: &StarSchema, config: &DatabaseConfig, out: &mut W) -> bool {
    match try_deploy(schema, config, out).await {
        Ok(report) => {
            if !report.is_consistent() {
                tracing::warn!(?report, "Verified row counts differ from rows written");
            }
            true
        }
        Err(e) => {
            tracing::error!(target_db = %config.display_target(), "{e}");
            if let Err(io) = write_failure(out, &e) {
                tracing::warn!(error = %io, "Could not write deployment failure to output");
            }
            false
        }
    }
}

fn write_failure<W: Write>(out: &mut W, e: &EtlError) -> std::io::Result<()> {
    // Display of EtlError::Deployment already reads "Database deployment failed: ..."
    writeln!(out, "   {e}")?;
    writeln!(out, "   Note: this might be expected if the database is not accessible")
}

/// Connects, replaces every table, then re-counts what landed.
///
/// The pool is closed before returning, whether the load succeeded or not.
pub async fn try_deploy<W: Write>(
    schema: &StarSchema,
    config: &DatabaseConfig,
    out: &mut W,
) -> Result<DeploymentReport> {
    writeln!(out, "\nDeploying to database...")?;
    writeln!(out, "   Connecting to {}...", config.display_target())?;

    let client = DbClient::connect(config.connect_options(), config.connect_timeout())
        .await
        .map_err(|e| EtlError::Deployment(e.to_string()))?;

    let result = load_and_verify(&client, schema, &TableNames::new(config.table_suffix.as_deref()), out).await;
    client.close().await;

    result.map_err(|e| match e {
        EtlError::Deployment(_) => e,
        other => EtlError::Deployment(other.to_string()),
    })
}

async fn load_and_verify<W: Write>(
    client: &DbClient,
    schema: &StarSchema,
    names: &TableNames,
    out: &mut W,
) -> Result<DeploymentReport> {
    client.ping().await?;
    writeln!(out, "   Database connection successful")?;

    let frames = schema
        .dimensions
        .iter()
        .map(|d| &d.frame)
        .chain(std::iter::once(&schema.fact));
    let mut written: Vec<(String, usize)> = Vec::new();

    writeln!(out, "\n   Deploying dimension tables...")?;
    for (i, (table, frame)) in names.for_schema(schema).into_iter().zip(frames).enumerate() {
        if i == schema.dimensions.len() {
            writeln!(out, "\n   Deploying fact table...")?;
        }
        written.push(replace(client, &table, frame, out).await?);
    }

    writeln!(out, "\nDatabase deployment completed successfully!")?;

    writeln!(out, "\nVerifying deployment...")?;
    let mut report = DeploymentReport::default();
    for (name, rows_written) in written {
        let rows_verified = client.count_rows(&name).await?;
        writeln!(out, "   {name}: {} records in database", format_count(rows_verified.max(0) as usize))?;
        tracing::info!(table = %name, rows_written, rows_verified, "Verified deployed table");
        report.tables.push(DeployedTable {
            name,
            rows_written,
            rows_verified,
        });
    }

    Ok(report)
}

async fn replace<W: Write>(
    client: &DbClient,
    table: &str,
    df: &DataFrame,
    out: &mut W,
) -> Result<(String, usize)> {
    client.replace_table(table, df).await?;
    writeln!(out, "     {table}: {} records", format_count(df.height()))?;
    tracing::info!(table, rows = df.height(), "Replaced table");
    Ok((table.to_owned(), df.height()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::build_star_schema;
    use polars::prelude::*;

    #[test]
    fn test_table_names_without_suffix() {
        let names = TableNames::new(None);
        assert_eq!(names.resolve("issue_d_dim"), "issue_d_dim");
        assert_eq!(names.resolve(FACT_TABLE), "loans_fact");
        assert_eq!(TableNames::new(Some("  ")).resolve(FACT_TABLE), "loans_fact");
    }

    #[test]
    fn test_suffix_applies_to_every_table() -> anyhow::Result<()> {
        let df = df!(
            "home_ownership" => &["RENT"],
            "loan_status" => &["Current"],
            "loan_amnt" => &[1000i64]
        )?;
        let schema = build_star_schema(&df)?;
        let names = TableNames::new(Some("nightly"));
        assert_eq!(
            names.for_schema(&schema),
            vec![
                "home_ownership_dim_nightly",
                "loan_status_dim_nightly",
                "loans_fact_nightly"
            ]
        );
        Ok(())
    }

    #[test]
    fn test_report_consistency() {
        let mut report = DeploymentReport {
            tables: vec![DeployedTable {
                name: FACT_TABLE.to_owned(),
                rows_written: 3,
                rows_verified: 3,
            }],
        };
        assert!(report.is_consistent());
        report.tables.push(DeployedTable {
            name: "issue_d_dim".to_owned(),
            rows_written: 2,
            rows_verified: 0,
        });
        assert!(!report.is_consistent());
    }

    #[tokio::test]
    async fn test_unreachable_store_returns_false() -> anyhow::Result<()> {
        let df = df!("loan_status" => &["Current"], "loan_amnt" => &[1000i64])?;
        let schema = build_star_schema(&df)?;
        let config = DatabaseConfig {
            host: "127.0.0.1".to_owned(),
            // Nothing listens on port 1
            port: 1,
            connect_timeout_secs: 2,
            ..DatabaseConfig::default()
        };

        let mut out = Vec::new();
        let deployed = deploy(&schema, &config, &mut out).await;

        assert!(!deployed);
        let text = String::from_utf8(out)?;
        assert!(text.contains("Database deployment failed"));
        Ok(())
    }
}
