//! Run configuration.
//!
//! Everything the pipeline needs is carried in a [`PipelineConfig`] that is built
//! once (defaults, then an optional JSON file, then CLI overrides) and passed down.
//! The store credential is the one value taken from the environment.

use crate::error::{EtlError, Result, ResultExt as _};
use chrono::NaiveDate;
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_FILE: &str = "data/LoanStats_web_small.csv";
pub const DEFAULT_MAX_NULL_PERCENTAGE: f64 = 30.0;
pub const DEFAULT_DATE_COLUMN: &str = "issue_d";

/// Environment variable holding the store password.
pub const PASSWORD_ENV_VAR: &str = "DB_PASSWORD";
const DEFAULT_PASSWORD: &str = "Passw0rd123456";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    pub data_file: PathBuf,
    /// Columns with a strictly higher percentage of missing values are dropped.
    pub max_null_percentage: f64,
    pub date_column: String,
    pub date_range: DateRange,
    pub database: DatabaseConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            max_null_percentage: DEFAULT_MAX_NULL_PERCENTAGE,
            date_column: DEFAULT_DATE_COLUMN.to_owned(),
            date_range: DateRange::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a config from a JSON file. Missing keys fall back to defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.max_null_percentage) {
            return Err(EtlError::Config(format!(
                "max_null_percentage must be within 0..=100, got {}",
                self.max_null_percentage
            )));
        }
        if self.date_range.start > self.date_range.end {
            return Err(EtlError::Config(format!(
                "date range start {} is after end {}",
                self.date_range.start, self.date_range.end
            )));
        }
        if self.date_column.trim().is_empty() {
            return Err(EtlError::Config("date_column must not be empty".to_owned()));
        }
        Ok(())
    }
}

/// Inclusive calendar range used by the date filter.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Default for DateRange {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2007, 1, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(2030, 12, 31).unwrap_or(NaiveDate::MAX),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    #[serde(
        serialize_with = "serialize_password",
        deserialize_with = "deserialize_password"
    )]
    pub password: SecretString,
    /// Appended to every deployed table name, on write and on verification alike.
    pub table_suffix: Option<String>,
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 5432,
            database: "TestDB".to_owned(),
            username: "etl".to_owned(),
            password: password_from_env(),
            table_suffix: None,
            connect_timeout_secs: 10,
        }
    }
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.username)
            .password(self.password.expose_secret())
    }

    pub fn connect_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.connect_timeout_secs)
    }

    /// `host:port/database`, safe to log.
    pub fn display_target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

/// `DB_PASSWORD` if set and non-empty, otherwise the built-in default.
pub fn password_from_env() -> SecretString {
    let pwd = std::env::var(PASSWORD_ENV_VAR)
        .ok()
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_PASSWORD.to_owned());
    SecretString::new(pwd.into())
}

// The password never goes to disk; a config file may not carry one either.
fn serialize_password<S>(_password: &SecretString, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str("")
}

fn deserialize_password<'de, D>(deserializer: D) -> std::result::Result<SecretString, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let _ignored = String::deserialize(deserializer)?;
    Ok(password_from_env())
}
