use crate::error::{Result, ResultExt as _};
use polars::prelude::*;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};
use std::time::Duration;

/// Rows serialised per `COPY` chunk.
const COPY_CHUNK_ROWS: usize = 10_000;

pub struct DbClient {
    pool: Pool<Postgres>,
}

pub fn quote_ident(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub fn sql_type(dtype: &DataType) -> &'static str {
    match dtype {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => "BIGINT",
        DataType::Float32 | DataType::Float64 => "DOUBLE PRECISION",
        DataType::Boolean => "BOOLEAN",
        DataType::Date => "DATE",
        DataType::Datetime(_, _) => "TIMESTAMPTZ",
        _ => "TEXT",
    }
}

/// `CREATE TABLE` statement matching the frame's columns.
pub fn create_table_sql(table: &str, df: &DataFrame) -> String {
    let column_definitions: Vec<String> = df
        .get_columns()
        .iter()
        .map(|c| format!("{} {}", quote_ident(c.name()), sql_type(c.dtype())))
        .collect();
    format!(
        "CREATE TABLE {} ({})",
        quote_ident(table),
        column_definitions.join(", ")
    )
}

impl DbClient {
    pub async fn connect(options: PgConnectOptions, timeout: Duration) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(timeout)
            .connect_with(options)
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to PostgreSQL (timeout after {}s)",
                    timeout.as_secs()
                )
            })?;
        Ok(Self { pool })
    }

    /// Round trip confirming the connection works.
    pub async fn ping(&self) -> Result<()> {
        let value = sqlx::query_scalar::<_, i32>("SELECT 1 AS test")
            .fetch_one(&self.pool)
            .await
            .context("Connectivity check failed")?;
        if value == 1 {
            Ok(())
        } else {
            Err(crate::error::EtlError::Database(format!(
                "Connectivity check returned {value}"
            )))
        }
    }

    /// Drops `table` if it exists and recreates it with the contents of `df`.
    pub async fn replace_table(&self, table: &str, df: &DataFrame) -> Result<()> {
        let identifier = quote_ident(table);

        sqlx::query(&format!("DROP TABLE IF EXISTS {identifier}"))
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to drop table {identifier}"))?;

        sqlx::query(&create_table_sql(table, df))
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to create table {identifier}"))?;

        if df.height() == 0 {
            return Ok(());
        }

        // Bulk load with COPY in chunks so a large frame is never serialised whole
        let mut conn = self.pool.acquire().await?;
        let mut writer = conn
            .copy_in_raw(&format!(
                "COPY {identifier} FROM STDIN WITH (FORMAT csv, NULL '')"
            ))
            .await
            .context("Failed to initiate COPY command")?;

        let height = df.height();
        for offset in (0..height).step_by(COPY_CHUNK_ROWS) {
            let len = std::cmp::min(COPY_CHUNK_ROWS, height - offset);
            let mut chunk = df.slice(offset as i64, len);

            let mut buf = Vec::new();
            CsvWriter::new(&mut buf)
                .include_header(false)
                .with_separator(b',')
                .with_null_value(String::new())
                .finish(&mut chunk)
                .context("Failed to serialise chunk to CSV")?;

            writer
                .send(buf)
                .await
                .context("Failed to send data chunk via COPY")?;
        }

        writer
            .finish()
            .await
            .context("Failed to finish COPY command")?;

        Ok(())
    }

    pub async fn count_rows(&self, table: &str) -> Result<i64> {
        let identifier = quote_ident(table);
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {identifier}"))
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to count rows in {identifier}"))
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("loans_fact"), "\"loans_fact\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_create_table_sql() -> anyhow::Result<()> {
        let mut df = df!(
            "issue_d" => &[0i32],
            "issue_d_id" => &[1i64],
            "int_rate" => &["10.5%"],
            "installment" => &[325.0]
        )?;
        let dates = df.column("issue_d")?.as_materialized_series().cast(&DataType::Date)?;
        df.with_column(dates)?;

        assert_eq!(
            create_table_sql("issue_d_dim", &df),
            "CREATE TABLE \"issue_d_dim\" (\"issue_d\" DATE, \"issue_d_id\" BIGINT, \
             \"int_rate\" TEXT, \"installment\" DOUBLE PRECISION)"
        );
        Ok(())
    }
}
