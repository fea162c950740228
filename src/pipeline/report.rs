use super::star_schema::{FACT_ID_COLUMN, StarSchema};
use crate::error::Result;
use crate::utils::{format_count, format_currency};
use polars::prelude::*;
use std::io::Write;

/// Fact columns shown in the sample, when present.
pub const SAMPLE_COLUMNS: [&str; 4] = [FACT_ID_COLUMN, "loan_amnt", "funded_amnt", "int_rate"];
pub const SAMPLE_ROWS: usize = 5;
pub const AMOUNT_COLUMN: &str = "loan_amnt";

const RULE_WIDTH: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmountStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub sum: f64,
}

/// Descriptive statistics of `loan_amnt`, or `None` when the column is absent
/// or has no values.
pub fn amount_stats(fact: &DataFrame) -> Result<Option<AmountStats>> {
    let Ok(column) = fact.column(AMOUNT_COLUMN) else {
        return Ok(None);
    };
    let amounts = column.as_materialized_series().cast(&DataType::Float64)?;
    let amounts = amounts.f64()?;

    Ok(match (amounts.min(), amounts.max(), amounts.mean(), amounts.sum()) {
        (Some(min), Some(max), Some(mean), Some(sum)) => Some(AmountStats { min, max, mean, sum }),
        _ => None,
    })
}

fn column_list(df: &DataFrame) -> String {
    let names: Vec<&str> = df.get_column_names().into_iter().map(|n| n.as_str()).collect();
    format!("[{}]", names.join(", "))
}

fn first_row(df: &DataFrame) -> Result<String> {
    let mut cells = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let value = column.as_materialized_series().get(0)?;
        let rendered = value.get_str().map_or_else(|| value.to_string(), ToOwned::to_owned);
        cells.push(format!("{}: {rendered}", column.name()));
    }
    Ok(format!("{{{}}}", cells.join(", ")))
}

pub fn write_rule<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    Ok(())
}

/// Writes the human-readable summary of a built star schema to `out`.
pub fn write_report<W: Write>(out: &mut W, schema: &StarSchema) -> Result<()> {
    writeln!(out)?;
    write_rule(out)?;
    writeln!(out, "ETL PIPELINE RESULTS")?;
    write_rule(out)?;

    writeln!(out, "\nDimension Tables:")?;
    for dim in &schema.dimensions {
        writeln!(out, "   {}:", dim.name())?;
        writeln!(out, "     - Records: {}", format_count(dim.len()))?;
        writeln!(out, "     - Columns: {}", column_list(&dim.frame))?;
        if !dim.is_empty() {
            writeln!(out, "     - Sample: {}", first_row(&dim.frame)?)?;
        }
    }

    let fact = &schema.fact;
    writeln!(out, "\nFact Table:")?;
    writeln!(out, "   - Records: {}", format_count(fact.height()))?;
    writeln!(out, "   - Columns: {}", column_list(fact))?;

    if fact.height() == 0 {
        return Ok(());
    }

    let sample_columns: Vec<&str> = SAMPLE_COLUMNS
        .into_iter()
        .filter(|name| fact.column(name).is_ok())
        .collect();
    writeln!(out, "\nSample Fact Records (Top {SAMPLE_ROWS}):")?;
    writeln!(out, "{}", fact.select(sample_columns)?.head(Some(SAMPLE_ROWS)))?;

    if let Some(stats) = amount_stats(fact)? {
        writeln!(out, "\nLoan Amount Statistics:")?;
        writeln!(out, "   - Min: {}", format_currency(stats.min))?;
        writeln!(out, "   - Max: {}", format_currency(stats.max))?;
        writeln!(out, "   - Average: {}", format_currency(stats.mean))?;
        writeln!(out, "   - Total: {}", format_currency(stats.sum))?;
    }

    Ok(())
}
