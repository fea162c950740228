use super::text_values;
use crate::config::DateRange;
use crate::pipeline::dates::*;
use anyhow::Result;
use chrono::NaiveDate;
use polars::prelude::*;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_parse_date_formats() {
    assert_eq!(parse_date("2018-01-01"), Some(ymd(2018, 1, 1)));
    assert_eq!(parse_date(" Dec-2018 "), Some(ymd(2018, 12, 1)));
    assert_eq!(parse_date("12/31/2017"), Some(ymd(2017, 12, 31)));
    assert_eq!(parse_date("2018-04-01T10:30:00"), Some(ymd(2018, 4, 1)));
    assert_eq!(parse_date("2018-04-01 10:30:00"), Some(ymd(2018, 4, 1)));
    assert_eq!(parse_date(""), None);
    assert_eq!(parse_date("not-a-date"), None);
}

#[test]
fn test_epoch_days_round_trip() {
    assert_eq!(date_to_days(ymd(1970, 1, 1)), 0);
    assert_eq!(date_to_days(ymd(1970, 1, 2)), 1);
    assert_eq!(days_to_date(-1), Some(ymd(1969, 12, 31)));
    assert_eq!(days_to_date(date_to_days(ymd(2018, 4, 1))), Some(ymd(2018, 4, 1)));
}

#[test]
fn test_quarter() {
    let quarters: Vec<u32> = (1..=12).map(|m| quarter(ymd(2020, m, 1))).collect();
    assert_eq!(quarters, vec![1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4]);
}

#[test]
fn test_parse_date_column_converts_strings() -> Result<()> {
    let df = df!("issue_d" => &["Dec-2018", "bogus", "2018-04-01"])?;
    let parsed = parse_date_column(df, "issue_d")?;
    let column = parsed.column("issue_d")?;
    assert_eq!(column.dtype(), &DataType::Date);
    assert_eq!(column.null_count(), 1);
    Ok(())
}

#[test]
fn test_parse_date_column_missing_is_noop() -> Result<()> {
    let df = df!("loan_amnt" => &[1i64, 2])?;
    let parsed = parse_date_column(df.clone(), "issue_d")?;
    assert!(parsed.equals(&df));
    Ok(())
}

#[test]
fn test_filter_date_range_is_inclusive() -> Result<()> {
    let df = df!(
        "issue_d" => &[
            Some("2016-01-01"),
            Some("2015-12-31"),
            Some("2018-12-31"),
            Some("2019-01-01"),
            Some("garbage"),
            None,
            Some("Jun-2017"),
        ],
        "id" => &[1i64, 2, 3, 4, 5, 6, 7]
    )?;
    let range = DateRange {
        start: ymd(2016, 1, 1),
        end: ymd(2018, 12, 31),
    };
    let filtered = filter_date_range(df, "issue_d", &range)?;

    assert_eq!(
        text_values(&filtered, "issue_d")?,
        vec!["2016-01-01", "2018-12-31", "2017-06-01"]
    );
    assert_eq!(filtered.column("issue_d")?.null_count(), 0);
    Ok(())
}

#[test]
fn test_non_date_column_is_left_alone() -> Result<()> {
    let df = df!(
        "issue_d" => &[201801i64, 201804, 200501],
        "id" => &[1i64, 2, 3]
    )?;
    assert!(!is_date_column(df.column("issue_d")?));

    let range = DateRange {
        start: ymd(2016, 1, 1),
        end: ymd(2018, 12, 31),
    };
    let filtered = filter_date_range(df.clone(), "issue_d", &range)?;
    assert!(filtered.equals(&df));

    let parsed = parse_date_column(df.clone(), "issue_d")?;
    assert_eq!(parsed.column("issue_d")?.dtype(), &DataType::Int64);
    Ok(())
}

#[test]
fn test_filter_without_date_column_is_noop() -> Result<()> {
    let df = df!("id" => &[1i64, 2])?;
    let range = DateRange::default();
    let filtered = filter_date_range(df.clone(), "issue_d", &range)?;
    assert!(filtered.equals(&df));
    Ok(())
}
