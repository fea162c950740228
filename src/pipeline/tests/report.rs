use super::scenario_frame;
use crate::pipeline::report::*;
use crate::pipeline::star_schema::build_star_schema;
use anyhow::Result;
use polars::prelude::*;

fn render(df: &DataFrame) -> Result<String> {
    let schema = build_star_schema(df)?;
    let mut out = Vec::new();
    write_report(&mut out, &schema)?;
    Ok(String::from_utf8(out)?)
}

#[test]
fn test_report_lists_tables_and_stats() -> Result<()> {
    let text = render(&scenario_frame()?)?;

    assert!(text.contains("ETL PIPELINE RESULTS"));
    assert!(text.contains("home_ownership_dim:"));
    assert!(text.contains("loan_status_dim:"));
    assert!(text.contains("issue_d_dim:"));
    assert!(text.contains("Sample: {home_ownership: RENT, home_ownership_id: 1}"));
    assert!(text.contains("   - Records: 3"));
    assert!(text.contains("Sample Fact Records (Top 5)"));
    assert!(text.contains("Min: $1,000.00"));
    assert!(text.contains("Max: $3,000.00"));
    assert!(text.contains("Average: $2,000.00"));
    assert!(text.contains("Total: $6,000.00"));
    Ok(())
}

#[test]
fn test_report_without_amounts_skips_stats() -> Result<()> {
    let df = df!("loan_status" => &["Current", "Default"])?;
    let text = render(&df)?;
    assert!(text.contains("loan_status_dim:"));
    assert!(!text.contains("Loan Amount Statistics"));
    Ok(())
}

#[test]
fn test_report_on_empty_fact_table() -> Result<()> {
    let text = render(&scenario_frame()?.head(Some(0)))?;
    assert!(text.contains("   - Records: 0"));
    assert!(!text.contains("Sample Fact Records"));
    Ok(())
}

#[test]
fn test_amount_stats() -> Result<()> {
    let fact = df!("loan_amnt" => &[500i64, 1500, 4000])?;
    let stats = amount_stats(&fact)?.expect("stats for loan_amnt");
    assert!((stats.min - 500.0).abs() < 1e-9);
    assert!((stats.max - 4000.0).abs() < 1e-9);
    assert!((stats.mean - 2000.0).abs() < 1e-9);
    assert!((stats.sum - 6000.0).abs() < 1e-9);

    let without = df!("funded_amnt" => &[1i64])?;
    assert!(amount_stats(&without)?.is_none());
    Ok(())
}
