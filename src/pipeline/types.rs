use super::dates::parse_date;
use crate::error::{EtlError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Rows polars scans to infer CSV dtypes.
const INFER_SCHEMA_ROWS: usize = 10_000;
/// Rows sampled to classify string columns.
const SAMPLE_ROWS: IdxSize = 10_000;
/// Share of non-null string values that must parse as dates for a Temporal column.
const DATE_LIKE_SHARE: f64 = 0.9;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Numeric,
    Text,
    Categorical,
    Temporal,
    Boolean,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "Numeric",
            Self::Text => "Text",
            Self::Categorical => "Categorical",
            Self::Temporal => "Temporal",
            Self::Boolean => "Boolean",
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ColumnType {
    pub name: String,
    pub kind: ColumnKind,
    /// Storage dtype polars inferred, e.g. `i64` or `str`.
    pub dtype: String,
}

/// Inferred column types in file order.
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct ColumnTypes {
    columns: Vec<ColumnType>,
}

impl ColumnTypes {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnType> {
        self.columns.iter()
    }

    pub fn get(&self, name: &str) -> Option<&ColumnType> {
        self.columns.iter().find(|c| c.name == name)
    }
}

impl<'a> IntoIterator for &'a ColumnTypes {
    type Item = &'a ColumnType;
    type IntoIter = std::slice::Iter<'a, ColumnType>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Infers a [`ColumnKind`] for every column of the CSV at `path`.
///
/// # Errors
///
/// Any failure to open, scan or classify the file is reported as
/// [`EtlError::Inference`]; the caller is expected to abort the run.
pub fn guess_column_types(path: &Path) -> Result<ColumnTypes> {
    if !path.is_file() {
        return Err(EtlError::Inference(format!(
            "{} does not exist or is not a file",
            path.display()
        )));
    }

    let inference_error = |e: PolarsError| EtlError::Inference(format!("{}: {e}", path.display()));

    let sample = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_has_header(true)
        .finish()
        .and_then(|lf| lf.limit(SAMPLE_ROWS).collect())
        .map_err(inference_error)?;

    if sample.width() == 0 {
        return Err(EtlError::Inference(format!(
            "{} has no columns",
            path.display()
        )));
    }

    let columns = sample
        .get_columns()
        .iter()
        .map(|column| {
            Ok(ColumnType {
                name: column.name().to_string(),
                kind: classify_column(column).map_err(inference_error)?,
                dtype: column.dtype().to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(
        path = %path.display(),
        columns = columns.len(),
        sampled_rows = sample.height(),
        "Inferred column types"
    );

    Ok(ColumnTypes { columns })
}

/// Classifies a single column from its dtype and, for strings, its contents.
pub fn classify_column(column: &Column) -> PolarsResult<ColumnKind> {
    let dtype = column.dtype();
    if dtype.is_bool() {
        return Ok(ColumnKind::Boolean);
    }
    if dtype.is_primitive_numeric() {
        return Ok(ColumnKind::Numeric);
    }
    if dtype.is_temporal() {
        return Ok(ColumnKind::Temporal);
    }

    let series = column.as_materialized_series().cast(&DataType::String)?;
    let values = series.drop_nulls();
    let count = values.len();
    if count == 0 {
        return Ok(ColumnKind::Text);
    }

    let date_like = values.str()?.into_iter().flatten().filter(|v| parse_date(v).is_some()).count();
    if date_like as f64 / count as f64 >= DATE_LIKE_SHARE {
        return Ok(ColumnKind::Temporal);
    }

    // Low number of distinct values relative to count
    let distinct = values.n_unique()?;
    let is_categorical = distinct < 100 || (distinct as f64 / count as f64) < 0.05;
    if is_categorical {
        Ok(ColumnKind::Categorical)
    } else {
        Ok(ColumnKind::Text)
    }
}
