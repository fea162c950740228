//! Star-schema construction.
//!
//! The cleaned table is split into one fact table and a dimension table per
//! categorical/date column from [`DIMENSIONS`] that is present in the input.
//!
//! For every dimension the builder:
//!
//! 1. extracts the distinct values in first-seen order,
//! 2. numbers them `1..=n` (the surrogate keys),
//! 3. for the date dimension, adds `month`, `year` and `quarter`,
//! 4. maps each row of the input to its key through a plain `HashMap`.
//!
//! Keys are only stable within a single run.

use super::dates::{column_days, days_to_date, is_date_column, quarter};
use crate::error::{EtlError, Result};
use chrono::Datelike as _;
use polars::prelude::*;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;

/// Measure columns copied into the fact table, in output order, when present.
pub const MEASURE_COLUMNS: [&str; 5] = ["loan_amnt", "funded_amnt", "term", "int_rate", "installment"];

pub const FACT_ID_COLUMN: &str = "fact_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionKind {
    Categorical,
    Date,
}

/// A candidate dimension: where its values come from and what it is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionSpec {
    pub source: &'static str,
    pub table: &'static str,
    pub key: &'static str,
    pub kind: DimensionKind,
}

pub const DIMENSIONS: [DimensionSpec; 3] = [
    DimensionSpec {
        source: "home_ownership",
        table: "home_ownership_dim",
        key: "home_ownership_id",
        kind: DimensionKind::Categorical,
    },
    DimensionSpec {
        source: "loan_status",
        table: "loan_status_dim",
        key: "loan_status_id",
        kind: DimensionKind::Categorical,
    },
    DimensionSpec {
        source: "issue_d",
        table: "issue_d_dim",
        key: "issue_d_id",
        kind: DimensionKind::Date,
    },
];

#[derive(Debug, Clone)]
pub struct DimensionTable {
    pub spec: DimensionSpec,
    /// Columns: the source value, its key, then derived attributes for dates.
    pub frame: DataFrame,
}

impl DimensionTable {
    pub fn name(&self) -> &str {
        self.spec.table
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Surrogate key to the source value rendered as text (dates as `YYYY-MM-DD`).
    pub fn values_by_key(&self) -> Result<HashMap<i64, String>> {
        let keys = self.frame.column(self.spec.key)?.as_materialized_series();
        let keys = keys.i64()?;
        let values = self
            .frame
            .column(self.spec.source)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let values = values.str()?;

        Ok(keys
            .into_iter()
            .zip(values)
            .filter_map(|(k, v)| Some((k?, v?.to_owned())))
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct StarSchema {
    pub fact: DataFrame,
    /// Dimension tables in [`DIMENSIONS`] order.
    pub dimensions: Vec<DimensionTable>,
    /// Rows whose value had no key in its dimension. Always zero for a cleaned input.
    pub unmapped: usize,
}

impl StarSchema {
    pub fn dimension(&self, name: &str) -> Option<&DimensionTable> {
        self.dimensions.iter().find(|d| d.name() == name)
    }
}

/// Distinct values in first-seen order and each row's key.
struct KeyAssignment<K> {
    distinct: Vec<K>,
    keys: Vec<Option<i64>>,
    unmapped: usize,
}

fn assign_keys<K: Eq + Hash + Clone>(values: &[Option<K>]) -> KeyAssignment<K> {
    let mut lookup: HashMap<K, i64> = HashMap::new();
    let mut distinct = Vec::new();
    for value in values.iter().flatten() {
        if let Entry::Vacant(slot) = lookup.entry(value.clone()) {
            distinct.push(value.clone());
            slot.insert(distinct.len() as i64);
        }
    }

    let mut unmapped = 0;
    let keys = values
        .iter()
        .map(|value| {
            let key = value.as_ref().and_then(|v| lookup.get(v).copied());
            if key.is_none() {
                unmapped += 1;
            }
            key
        })
        .collect();

    KeyAssignment {
        distinct,
        keys,
        unmapped,
    }
}

fn key_series(name: &str, n: usize) -> Series {
    Series::new(name.into(), (1..=n as i64).collect::<Vec<i64>>())
}

fn categorical_dimension(
    spec: DimensionSpec,
    column: &Column,
) -> Result<(DimensionTable, Series, usize)> {
    let text = column.as_materialized_series().cast(&DataType::String)?;
    let values: Vec<Option<String>> = text.str()?.into_iter().map(|v| v.map(str::to_owned)).collect();
    let assigned = assign_keys(&values);

    let n = assigned.distinct.len();
    let frame = DataFrame::new(vec![
        Column::from(Series::new(spec.source.into(), assigned.distinct)),
        Column::from(key_series(spec.key, n)),
    ])?;

    Ok((
        DimensionTable { spec, frame },
        Series::new(spec.key.into(), assigned.keys),
        assigned.unmapped,
    ))
}

fn date_dimension(spec: DimensionSpec, column: &Column) -> Result<(DimensionTable, Series, usize)> {
    let days = column_days(column)?;
    let assigned = assign_keys(&days);

    let n = assigned.distinct.len();
    let mut months = Vec::with_capacity(n);
    let mut years = Vec::with_capacity(n);
    let mut quarters = Vec::with_capacity(n);
    for &d in &assigned.distinct {
        let date = days_to_date(d).ok_or_else(|| {
            EtlError::DataProcessing(format!("'{}' holds an out-of-range date ({d} days)", spec.source))
        })?;
        months.push(date.month() as i32);
        years.push(date.year());
        quarters.push(quarter(date) as i32);
    }

    let dates = Series::new(spec.source.into(), assigned.distinct).cast(&DataType::Date)?;
    let frame = DataFrame::new(vec![
        Column::from(dates),
        Column::from(key_series(spec.key, n)),
        Column::from(Series::new("month".into(), months)),
        Column::from(Series::new("year".into(), years)),
        Column::from(Series::new("quarter".into(), quarters)),
    ])?;

    Ok((
        DimensionTable { spec, frame },
        Series::new(spec.key.into(), assigned.keys),
        assigned.unmapped,
    ))
}

/// Splits a cleaned table into a fact table and its dimension tables.
///
/// The input is not modified. Dimensions whose source column is absent, or for
/// the date dimension cannot hold dates, are skipped; measure columns that are
/// absent are left out of the fact table.
pub fn build_star_schema(df: &DataFrame) -> Result<StarSchema> {
    let mut dimensions = Vec::new();
    let mut key_columns = Vec::new();
    let mut unmapped = 0;

    for spec in DIMENSIONS {
        let Ok(column) = df.column(spec.source) else {
            tracing::debug!(column = spec.source, "Dimension source column absent, skipping");
            continue;
        };

        if spec.kind == DimensionKind::Date && !is_date_column(column) {
            tracing::warn!(
                column = spec.source,
                dtype = %column.dtype(),
                "Dimension source does not hold dates, skipping"
            );
            continue;
        }

        let (table, keys, missed) = match spec.kind {
            DimensionKind::Categorical => categorical_dimension(spec, column)?,
            DimensionKind::Date => date_dimension(spec, column)?,
        };

        if missed > 0 {
            tracing::error!(
                dimension = spec.table,
                unmapped = missed,
                "Fact rows without a dimension key"
            );
        }
        tracing::info!(dimension = spec.table, records = table.len(), "Built dimension");

        unmapped += missed;
        key_columns.push(Column::from(keys));
        dimensions.push(table);
    }

    let mut fact_columns: Vec<Column> = MEASURE_COLUMNS
        .iter()
        .filter_map(|name| df.column(name).ok().cloned())
        .collect();
    let measures = fact_columns.len();
    fact_columns.extend(key_columns);
    fact_columns.push(Column::from(key_series(FACT_ID_COLUMN, df.height())));

    let fact = DataFrame::new(fact_columns)?;
    tracing::info!(records = fact.height(), measures, "Built fact table");

    Ok(StarSchema {
        fact,
        dimensions,
        unmapped,
    })
}
