use super::temp_csv;
use crate::error::EtlError;
use crate::pipeline::types::*;
use anyhow::Result;
use std::fmt::Write as _;
use std::path::Path;

#[test]
fn test_guess_column_types() -> Result<()> {
    let mut csv = String::from("loan_amnt,home_ownership,issue_d,desc,is_joint\n");
    for i in 0..150 {
        let ownership = if i % 2 == 0 { "RENT" } else { "OWN" };
        writeln!(csv, "{},{ownership},Dec-2018,free text number {i},{}", 1000 + i, i % 3 == 0)?;
    }
    let path = temp_csv("types", &csv)?;

    let types = guess_column_types(&path)?;
    let _ = std::fs::remove_file(&path);

    assert_eq!(types.len(), 5);
    let kind = |name: &str| types.get(name).map(|c| c.kind);
    assert_eq!(kind("loan_amnt"), Some(ColumnKind::Numeric));
    assert_eq!(kind("home_ownership"), Some(ColumnKind::Categorical));
    assert_eq!(kind("issue_d"), Some(ColumnKind::Temporal));
    assert_eq!(kind("desc"), Some(ColumnKind::Text));
    assert_eq!(kind("is_joint"), Some(ColumnKind::Boolean));

    let order: Vec<&str> = types.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(order, vec!["loan_amnt", "home_ownership", "issue_d", "desc", "is_joint"]);
    Ok(())
}

#[test]
fn test_missing_file_is_inference_failure() {
    let err = guess_column_types(Path::new("testdata/does_not_exist.csv")).unwrap_err();
    assert!(matches!(err, EtlError::Inference(_)), "got {err}");
}

#[test]
fn test_column_kind_display() {
    assert_eq!(ColumnKind::Categorical.to_string(), "Categorical");
    assert_eq!(ColumnKind::Temporal.as_str(), "Temporal");
}
