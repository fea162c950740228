//! Logging setup for the ETL binary.
//!
//! Logs go to stderr and to daily-rotated files in the platform data directory:
//!
//! - `loan-etl.<date>.log`: everything that passes the filter
//! - `error.<date>.log`: warnings and errors only
//!
//! The filter defaults to `info` and can be overridden with `RUST_LOG`.
//!
//! ```no_run
//! loan_etl::logging::init();
//! tracing::info!(rows = 42, "Loaded source file");
//! ```

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

const APP_DIR: &str = "loan-etl";

/// Gets the log directory path based on platform conventions
///
/// Returns:
/// - Windows: `%APPDATA%/loan-etl/logs`
/// - macOS: `~/Library/Application Support/loan-etl/logs`
/// - Linux: `~/.local/share/loan-etl/logs`
pub fn get_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().context("Failed to determine data directory")?;
    let log_dir = base_dir.join(APP_DIR).join("logs");

    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialises stderr and file logging.
///
/// If the log directory or file appenders cannot be set up, logging continues on
/// stderr only and a warning is emitted once the subscriber is live.
pub fn init() {
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact();

    match file_appenders() {
        Ok((log_dir, all_logs_appender, error_logs_appender)) => {
            let all_logs_layer = fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .with_ansi(false)
                .with_writer(all_logs_appender);

            let error_logs_layer = fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .with_ansi(false)
                .with_writer(error_logs_appender)
                .with_filter(EnvFilter::new("warn"));

            let initialised = tracing_subscriber::registry()
                .with(env_filter("info"))
                .with(stderr_layer)
                .with(all_logs_layer)
                .with(error_logs_layer)
                .try_init();

            if initialised.is_ok() {
                tracing::debug!("Logging initialised, log directory: {}", log_dir.display());
            }
        }
        Err(e) => {
            let initialised = tracing_subscriber::registry()
                .with(env_filter("info"))
                .with(stderr_layer)
                .try_init();

            if initialised.is_ok() {
                tracing::warn!("File logging disabled: {e:#}");
            }
        }
    }
}

fn file_appenders() -> Result<(PathBuf, RollingFileAppender, RollingFileAppender)> {
    let log_dir = get_log_dir()?;

    let all_logs_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(10)
        .filename_prefix(APP_DIR)
        .filename_suffix("log")
        .build(&log_dir)
        .context("Failed to create all-logs file appender")?;

    let error_logs_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(10)
        .filename_prefix("error")
        .filename_suffix("log")
        .build(&log_dir)
        .context("Failed to create error-logs file appender")?;

    Ok((log_dir, all_logs_appender, error_logs_appender))
}
