//! Error types for the ETL pipeline.
//!
//! Three failure families matter to the run:
//!
//! - **Inference** failures come from the column-type analysis stage and abort
//!   the run before any data is loaded.
//! - **I/O and data processing** failures are not caught per stage; they bubble
//!   up with `?` to the entry point, which reports them and exits non-zero.
//! - **Deployment** failures are caught inside the deployer and surface as a
//!   boolean result (see [`crate::warehouse::deploy()`]).
//!
//! ```no_run
//! use loan_etl::error::{EtlError, Result};
//! use std::fs;
//!
//! fn read_header(path: &str) -> Result<String> {
//!     // std::io::Error converts into EtlError via From
//!     let content = fs::read_to_string(path)?;
//!     Ok(content.lines().next().unwrap_or_default().to_owned())
//! }
//! ```

use std::fmt;

/// Main error type for pipeline operations.
#[derive(Debug)]
pub enum EtlError {
    /// I/O errors (file operations)
    Io(std::io::Error),

    /// Data processing errors (Polars, parsing, etc.)
    DataProcessing(String),

    /// Database operation errors
    Database(String),

    /// Configuration errors
    Config(String),

    /// File not found or invalid path
    InvalidPath(String),

    /// Column-type analysis could not process the input file
    Inference(String),

    /// Loading the star schema into the store failed
    Deployment(String),

    /// Generic error with context
    Other(String),
}

impl fmt::Display for EtlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Database(msg) => write!(f, "Database error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::InvalidPath(msg) => write!(f, "Invalid path: {msg}"),
            Self::Inference(msg) => write!(f, "Column type analysis failed: {msg}"),
            Self::Deployment(msg) => write!(f, "Database deployment failed: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for EtlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EtlError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for EtlError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(format!("{err:#}"))
    }
}

impl From<serde_json::Error> for EtlError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for EtlError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

impl From<sqlx::Error> for EtlError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, EtlError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<EtlError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| wrap(msg.into(), e.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| wrap(f(), e.into()))
    }
}

// Keeps the variant so callers can still tell an I/O failure from a database one.
fn wrap(msg: String, err: EtlError) -> EtlError {
    match err {
        EtlError::Io(e) => EtlError::Io(std::io::Error::new(e.kind(), format!("{msg}: {e}"))),
        EtlError::DataProcessing(m) => EtlError::DataProcessing(format!("{msg}: {m}")),
        EtlError::Database(m) => EtlError::Database(format!("{msg}: {m}")),
        EtlError::Config(m) => EtlError::Config(format!("{msg}: {m}")),
        EtlError::InvalidPath(m) => EtlError::InvalidPath(format!("{msg}: {m}")),
        EtlError::Inference(m) => EtlError::Inference(format!("{msg}: {m}")),
        EtlError::Deployment(m) => EtlError::Deployment(format!("{msg}: {m}")),
        EtlError::Other(m) => EtlError::Other(format!("{msg}: {m}")),
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_error_display() {
        let err = EtlError::DataProcessing("column not found".to_owned());
        assert_eq!(err.to_string(), "Data processing error: column not found");
    }

    #[test]
    fn test_inference_display() {
        let err = EtlError::Inference("data/missing.csv".to_owned());
        assert_eq!(
            err.to_string(),
            "Column type analysis failed: data/missing.csv"
        );
    }

    #[test]
    fn test_result_context_keeps_variant() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file.csv",
        ));

        let err = result.context("Failed to read file").unwrap_err();
        assert!(matches!(err, EtlError::Io(_)), "I/O errors stay I/O errors");
        assert!(err.to_string().contains("Failed to read file"));
        assert!(err.to_string().contains("file.csv"));
    }

    #[test]
    fn test_with_context_on_data_error() {
        let result: Result<()> = Err(EtlError::DataProcessing("bad cast".to_owned()));
        let err = result
            .with_context(|| format!("column {}", "loan_amnt"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Data processing error: column loan_amnt: bad cast"
        );
    }
}
