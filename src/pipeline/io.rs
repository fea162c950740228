use crate::error::{EtlError, Result, ResultExt as _};
use polars::prelude::*;
use std::path::Path;

const INFER_SCHEMA_ROWS: usize = 10_000;

/// Reads the source CSV into memory.
///
/// Values are kept as polars inferred them; date columns stay text until the
/// date filter parses them, so an unparseable date never counts as missing.
///
/// # Errors
///
/// Returns [`EtlError::InvalidPath`] when the file does not exist and
/// [`EtlError::DataProcessing`] when polars cannot read it.
pub fn load_source(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(EtlError::InvalidPath(path.display().to_string()));
    }

    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();

    let df = match ext.as_str() {
        // Delimited exports sometimes ship as .txt
        "csv" | "txt" | "" => LazyCsvReader::new(path)
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .with_has_header(true)
            .finish()
            .and_then(LazyFrame::collect)
            .with_context(|| format!("Failed to read CSV {}", path.display()))?,
        _ => return Err(EtlError::InvalidPath(format!("Unsupported file extension: {ext}"))),
    };

    tracing::info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "Loaded source file"
    );

    Ok(df)
}
