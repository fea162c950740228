//! Date parsing and the date-range filter.
//!
//! Polars stores `Date` as days since the Unix epoch (`i32`). Everything here
//! converts through that physical representation so string columns and already
//! parsed `Date`/`Datetime` columns go through the same path.

use crate::config::DateRange;
use crate::error::{EtlError, Result};
use chrono::{Datelike as _, NaiveDate, NaiveDateTime};
use polars::prelude::*;

/// 1970-01-01 expressed as days from 0001-01-01 (chrono's CE day numbering).
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Parses a single date cell.
///
/// Accepts ISO dates, US-style `m/d/Y`, datetimes (time part dropped) and the
/// month-year form used in loan exports (`Dec-2018`, read as the 1st of the month).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    NaiveDate::parse_from_str(&format!("01-{s}"), "%d-%b-%Y").ok()
}

pub fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

/// Calendar quarter (1..=4) of a date.
pub fn quarter(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

/// Whether `column` can hold dates at all: strings, `Date` or `Datetime`.
///
/// A date column polars inferred as something else (e.g. `201801` read as
/// `i64`) is treated as unusable and skipped by the date stages.
pub fn is_date_column(column: &Column) -> bool {
    matches!(
        column.dtype(),
        DataType::String | DataType::Date | DataType::Datetime(_, _)
    )
}

/// Reads a column as days since the epoch. Unparseable cells become `None`.
pub fn column_days(column: &Column) -> Result<Vec<Option<i32>>> {
    let series = column.as_materialized_series();
    match series.dtype() {
        DataType::Date => {
            let physical = series.cast(&DataType::Int32)?;
            Ok(physical.i32()?.into_iter().collect())
        }
        DataType::Datetime(_, _) => {
            let physical = series.cast(&DataType::Date)?.cast(&DataType::Int32)?;
            Ok(physical.i32()?.into_iter().collect())
        }
        DataType::String => Ok(series
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_date).map(date_to_days))
            .collect()),
        other => Err(EtlError::DataProcessing(format!(
            "column '{}' of type {other} cannot be read as dates",
            series.name()
        ))),
    }
}

/// Replaces `name` with a polars `Date` column. A no-op when the column is
/// missing, already a `Date`, or of a type that cannot hold dates.
pub fn parse_date_column(mut df: DataFrame, name: &str) -> Result<DataFrame> {
    let Ok(column) = df.column(name) else {
        return Ok(df);
    };
    if column.dtype() == &DataType::Date || !is_date_column(column) {
        return Ok(df);
    }

    let days = column_days(column)?;
    let unparsed = days
        .iter()
        .filter(|d| d.is_none())
        .count()
        .saturating_sub(column.null_count());
    if unparsed > 0 {
        tracing::warn!(column = name, unparsed, "Some date values could not be parsed");
    }

    let parsed = Series::new(name.into(), days).cast(&DataType::Date)?;
    df.with_column(parsed)?;
    Ok(df)
}

/// Keeps only rows whose `column` date lies inside `range` (inclusive).
/// Rows with a missing or unparseable date are dropped.
///
/// When `column` is absent or cannot hold dates the table is returned unchanged.
pub fn filter_date_range(df: DataFrame, column: &str, range: &DateRange) -> Result<DataFrame> {
    let present = df
        .column(column)
        .ok()
        .map(|c| (is_date_column(c), c.dtype().clone()));
    match present {
        Some((true, _)) => {}
        Some((false, dtype)) => {
            tracing::warn!(column, %dtype, "Not a date column, skipping date filter");
            return Ok(df);
        }
        None => {
            tracing::warn!(column, "Date column absent, skipping date filter");
            return Ok(df);
        }
    }

    let df = parse_date_column(df, column)?;
    let rows_before = df.height();

    let days = col(column).cast(DataType::Int32);
    let filtered = df
        .lazy()
        .filter(
            days.clone()
                .gt_eq(lit(date_to_days(range.start)))
                .and(days.lt_eq(lit(date_to_days(range.end)))),
        )
        .collect()?;

    tracing::info!(
        column,
        start = %range.start,
        end = %range.end,
        rows_before,
        rows_after = filtered.height(),
        "Applied date range filter"
    );
    Ok(filtered)
}
