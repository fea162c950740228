#![expect(
    clippy::unwrap_used,
    clippy::panic,
    clippy::expect_used,
    clippy::indexing_slicing
)]
use super::dates::parse_date_column;
use anyhow::Result;
use polars::prelude::*;

mod dates;
mod report;
mod types;

/// Three fully populated loans spread over two quarters of 2018.
fn scenario_frame() -> Result<DataFrame> {
    let df = df!(
        "home_ownership" => &["RENT", "OWN", "RENT"],
        "loan_status" => &["Current", "Current", "Default"],
        "issue_d" => &["2018-01-01", "2018-01-01", "2018-04-01"],
        "loan_amnt" => &[1000i64, 2000, 3000]
    )?;
    Ok(parse_date_column(df, "issue_d")?)
}

fn i64_values(df: &DataFrame, name: &str) -> Result<Vec<i64>> {
    Ok(df
        .column(name)?
        .as_materialized_series()
        .i64()?
        .into_no_null_iter()
        .collect())
}

fn i32_values(df: &DataFrame, name: &str) -> Result<Vec<i32>> {
    Ok(df
        .column(name)?
        .as_materialized_series()
        .i32()?
        .into_no_null_iter()
        .collect())
}

fn text_values(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let s = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    Ok(s.str()?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_owned())
        .collect())
}

/// Writes `content` to a uniquely named CSV in the temp directory.
fn temp_csv(stem: &str, content: &str) -> Result<std::path::PathBuf> {
    let path = std::env::temp_dir().join(format!("loan_etl_{stem}_{}.csv", std::process::id()));
    std::fs::write(&path, content)?;
    Ok(path)
}
