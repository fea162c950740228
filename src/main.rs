//! # loan-etl entry point
//!
//! ```text
//! main()
//!   ├─> init logging (stderr + rolling files)
//!   ├─> parse CLI arguments (clap)
//!   ├─> run the pipeline, then deploy if `--deploy`
//!   └─> closing banner, exit code 0 (success) or 1 (any failure)
//! ```
//!
//! ```bash
//! loan-etl
//! loan-etl --deploy --file data/LoanStats_web_small.csv
//! DB_PASSWORD=secret loan-etl --deploy --config etl.json
//! ```

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::Parser as _;
use std::process::ExitCode;

const BANNER_WIDTH: usize = 80;

fn main() -> ExitCode {
    loan_etl::logging::init();

    let cli = cli::Cli::parse();

    let success = match cli::run(&cli) {
        Ok(deployed) => deployed,
        Err(e) => {
            tracing::error!("ETL pipeline failed: {e:#}");
            eprintln!("\nETL pipeline failed: {e:#}");
            false
        }
    };

    println!("\n{}", "=".repeat(BANNER_WIDTH));
    println!("ETL Pipeline Execution Complete");
    println!("{}", "=".repeat(BANNER_WIDTH));

    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
