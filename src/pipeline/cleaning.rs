use crate::error::Result;
use polars::prelude::*;

/// Percentage (0..=100) of missing values in `column` given `height` rows.
pub fn null_percentage(column: &Column, height: usize) -> f64 {
    if height == 0 {
        0.0
    } else {
        (column.null_count() as f64 / height as f64) * 100.0
    }
}

/// Treats blank and whitespace-only strings as missing.
pub fn standardise_blank_strings(df: DataFrame) -> Result<DataFrame> {
    let exprs: Vec<Expr> = df
        .get_columns()
        .iter()
        .map(|column| {
            let name = column.name().as_str();
            if column.dtype() == &DataType::String {
                when(col(name).str().strip_chars(lit(NULL)).eq(lit("")))
                    .then(lit(NULL).cast(DataType::String))
                    .otherwise(col(name))
                    .alias(name)
            } else {
                col(name)
            }
        })
        .collect();

    Ok(df.lazy().select(exprs).collect()?)
}

/// Drops every column whose share of missing values is strictly above
/// `max_null_percentage`. Rows are untouched.
pub fn clean_missing_values(df: DataFrame, max_null_percentage: f64) -> Result<DataFrame> {
    let df = standardise_blank_strings(df)?;
    let height = df.height();

    let mut keep = Vec::new();
    let mut dropped = Vec::new();
    for column in df.get_columns() {
        let pct = null_percentage(column, height);
        if pct > max_null_percentage {
            dropped.push(format!("{} ({pct:.1}%)", column.name()));
        } else {
            keep.push(col(column.name().as_str()));
        }
    }

    if dropped.is_empty() {
        tracing::info!(max_null_percentage, "No sparse columns to drop");
        return Ok(df);
    }

    tracing::info!(
        max_null_percentage,
        dropped = dropped.len(),
        columns = %dropped.join(", "),
        "Dropped sparse columns"
    );
    Ok(df.lazy().select(keep).collect()?)
}

/// Drops every row that still has a missing value in any column.
pub fn drop_incomplete_rows(df: DataFrame) -> Result<DataFrame> {
    let rows_before = df.height();
    let complete = df.lazy().drop_nulls(None).collect()?;
    tracing::info!(
        rows_before,
        rows_after = complete.height(),
        "Dropped incomplete rows"
    );
    Ok(complete)
}
