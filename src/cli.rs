use anyhow::{Context as _, Result};
use clap::Parser;
use loan_etl::config::PipelineConfig;
use loan_etl::pipeline::run_pipeline;
use loan_etl::warehouse::deploy;
use std::io::Write as _;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "loan-etl",
    version,
    about = "Loan records ETL: clean a CSV export and build a star schema"
)]
pub struct Cli {
    /// Load the star schema into the configured database after the report
    #[arg(long)]
    pub deploy: bool,

    /// Loan records CSV. Overrides the configuration file.
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Path to a JSON pipeline configuration file
    #[arg(long, env = "LOAN_ETL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Drop columns whose null percentage exceeds this value
    #[arg(long, value_name = "PCT")]
    pub max_null_pct: Option<f64>,
}

impl Cli {
    /// Defaults, then the configuration file, then command-line overrides.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
            None => PipelineConfig::default(),
        };

        if let Some(file) = &self.file {
            config.data_file.clone_from(file);
        }
        if let Some(pct) = self.max_null_pct {
            config.max_null_percentage = pct;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Runs the pipeline and, with `--deploy`, the database load.
///
/// Returns `Ok(false)` when the pipeline succeeded but deployment did not;
/// a failed deployment never fails the run.
pub fn run(cli: &Cli) -> Result<bool> {
    let config = cli.pipeline_config()?;
    tracing::info!(
        data_file = %config.data_file.display(),
        max_null_pct = config.max_null_percentage,
        deploy = cli.deploy,
        "Starting ETL run"
    );

    let mut out = std::io::stdout().lock();
    let report = run_pipeline(&config, &mut out)?;

    let deployed = if cli.deploy {
        tokio::runtime::Runtime::new()?.block_on(deploy(&report.schema, &config.database, &mut out))
    } else {
        writeln!(out, "\nTip: Run with '--deploy' flag to deploy to database")?;
        true
    };

    report.write_completion(&mut out)?;
    out.flush()?;
    Ok(deployed)
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used)]

    use super::*;
    use clap::CommandFactory as _;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "loan-etl",
            "--deploy",
            "-f",
            "other.csv",
            "--max-null-pct",
            "50",
        ])
        .unwrap();
        assert!(cli.deploy);

        let config = cli.pipeline_config().unwrap();
        assert_eq!(config.data_file, PathBuf::from("other.csv"));
        assert!((config.max_null_percentage - 50.0).abs() < f64::EPSILON);
    }

    fn cli_for_fixture(deploy: bool, config: Option<PathBuf>) -> Cli {
        Cli {
            deploy,
            file: Some(PathBuf::from("testdata/loans_small.csv")),
            config,
            max_null_pct: None,
        }
    }

    #[test]
    fn test_run_without_deploy_succeeds() {
        assert!(run(&cli_for_fixture(false, None)).unwrap());
    }

    #[test]
    fn test_run_with_unreachable_store_reports_failure() {
        let config = std::env::temp_dir().join(format!("loan_etl_cli_{}.json", std::process::id()));
        std::fs::write(
            &config,
            r#"{ "database": { "host": "127.0.0.1", "port": 1, "connect_timeout_secs": 2 } }"#,
        )
        .unwrap();

        let outcome = run(&cli_for_fixture(true, Some(config.clone())));
        let _removed = std::fs::remove_file(&config);

        // Pipeline succeeds, deployment does not: exit code 1, no error raised
        assert!(!outcome.unwrap());
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let cli = Cli::try_parse_from(["loan-etl", "--max-null-pct", "150"]).unwrap();
        assert!(cli.pipeline_config().is_err());
    }
}
