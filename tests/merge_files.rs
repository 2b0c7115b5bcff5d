// End-to-end: real workbooks in, merged workbook out

use pav_merger::{
    load_table, run, write_table, CellValue, MergeConfig, MergeError, Row, Table,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const KEY: &str = "Asset Code";
const SHEET: &str = "PAV Sheet";

fn pav_table(rows: &[(&str, &str, &str)]) -> Table {
    let mut table = Table::new(
        "fixture",
        vec![KEY.to_string(), "Status".to_string(), "Location".to_string()],
    );
    for (code, status, location) in rows {
        table.rows.push(
            Row::new()
                .with(KEY, *code)
                .with("Status", *status)
                .with("Location", *location),
        );
    }
    table
}

fn write_fixture(dir: &Path, name: &str, table: Table) -> PathBuf {
    let path = dir.join(name);
    write_table(table, &path, SHEET).unwrap();
    path
}

#[test]
fn test_merge_two_workbooks() {
    let temp_dir = TempDir::new().unwrap();
    let anshu = write_fixture(
        temp_dir.path(),
        "anshu.xlsx",
        pav_table(&[("A1", "Verified", "Floor 1"), ("A2", "", "Lab")]),
    );
    let rohil = write_fixture(
        temp_dir.path(),
        "rohil.xlsx",
        pav_table(&[("A1", "Pending", ""), ("A2", "Verified", "Lab"), ("A3", "Missing", "Store")]),
    );
    let output = temp_dir.path().join("merged.xlsx");
    let report_json = temp_dir.path().join("report.json");

    let config = MergeConfig::new(vec![anshu, rohil])
        .with_output(&output)
        .with_report_json(&report_json);

    let report = run(&config).unwrap();
    let merged = load_table(&output, SHEET).unwrap();
    let json = fs::read_to_string(&report_json).unwrap();

    assert_eq!(merged.columns, vec![KEY, "Status", "Location"]);
    assert_eq!(merged.len(), 3);

    assert_eq!(merged.rows[0].get("Status"), &CellValue::from("Pending"));
    assert_eq!(merged.rows[0].get("Location"), &CellValue::from("Floor 1"));
    assert_eq!(merged.rows[1].get("Status"), &CellValue::from("Verified"));
    assert_eq!(merged.rows[2].get(KEY), &CellValue::from("A3"));

    assert_eq!(report.files_processed, 2);
    assert_eq!(report.total_assets, 2);
    assert_eq!(report.merged_assets, 3);
    // A1/Status conflict, A2/Status fill, A3 appended
    assert_eq!(report.updates_merged, 3);
    assert_eq!(report.conflicts.len(), 1);

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["conflicts"][0]["new_value"], "Pending");
}

#[test]
fn test_csv_inputs_and_output() {
    let temp_dir = TempDir::new().unwrap();
    let a = temp_dir.path().join("a.csv");
    let b = temp_dir.path().join("b.csv");
    fs::write(&a, "Asset Code,Status\nA1,Verified\n").unwrap();
    fs::write(&b, "Asset Code,Status\nA1,\nA2,Verified\n").unwrap();
    let output = temp_dir.path().join("merged.csv");

    let config = MergeConfig::new(vec![a, b]).with_output(&output);
    let report = run(&config).unwrap();
    let content = fs::read_to_string(&output).unwrap();

    assert_eq!(content, "Asset Code,Status\nA1,Verified\nA2,Verified\n");
    assert!(report.conflicts.is_empty());
}

#[test]
fn test_workbook_merged_with_its_own_csv_output() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("numeric.xlsx");
    let table = Table::new("fixture", vec![KEY.to_string(), "Qty".to_string()])
        .with_row(Row::new().with(KEY, 1001_i64).with("Qty", 3_i64));
    write_table(table, &input, SHEET).unwrap();

    let merged_csv = temp_dir.path().join("merged.csv");
    let first = run(&MergeConfig::new(vec![input.clone()]).with_output(&merged_csv)).unwrap();
    assert_eq!(first.merged_assets, 1);

    let again_output = temp_dir.path().join("again.xlsx");
    let again = run(&MergeConfig::new(vec![input, merged_csv]).with_output(&again_output)).unwrap();

    // Numeric key read back from CSV matches the workbook key
    assert_eq!(again.merged_assets, 1);
    assert_eq!(again.new_assets, 0);
    assert_eq!(again.updates_merged, 0);
    assert!(again.conflicts.is_empty());
}

#[test]
fn test_unwritable_report_path_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(temp_dir.path(), "a.xlsx", pav_table(&[("A1", "Verified", "")]));
    let output = temp_dir.path().join("merged.xlsx");
    let report_json = temp_dir.path().join("no_such_dir").join("report.json");

    let config = MergeConfig::new(vec![input])
        .with_output(&output)
        .with_report_json(&report_json);
    let result = run(&config);

    match result {
        Err(MergeError::Write { path, .. }) => assert_eq!(path, report_json),
        other => panic!("expected Write error, got {:?}", other),
    }
    assert!(!output.exists());
}

#[test]
fn test_missing_input_fails_before_writing() {
    let temp_dir = TempDir::new().unwrap();
    let present = write_fixture(temp_dir.path(), "present.xlsx", pav_table(&[("A1", "Verified", "")]));
    let missing = temp_dir.path().join("missing.xlsx");
    let output = temp_dir.path().join("never_written.xlsx");

    let config = MergeConfig::new(vec![present, missing.clone()]).with_output(&output);
    let result = run(&config);

    match result {
        Err(MergeError::FileNotFound { path }) => assert_eq!(path, missing),
        other => panic!("expected FileNotFound, got {:?}", other),
    }
    assert!(!output.exists());
}

#[test]
fn test_missing_sheet_is_a_load_error() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("other_sheet.xlsx");
    write_table(pav_table(&[("A1", "Verified", "")]), &input, "Sheet1").unwrap();
    let output = temp_dir.path().join("not_written.xlsx");

    let config = MergeConfig::new(vec![input.clone()]).with_output(&output);
    let result = run(&config);

    match result {
        Err(MergeError::Load { path, reason }) => {
            assert_eq!(path, input);
            assert!(reason.contains("PAV Sheet"));
        }
        other => panic!("expected Load error, got {:?}", other),
    }
    assert!(!output.exists());
}

#[test]
fn test_empty_input_list_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("empty_run.xlsx");
    let config = MergeConfig::new(Vec::new()).with_output(&output);

    let result = run(&config);

    assert!(matches!(result, Err(MergeError::EmptyInput)));
    assert!(!output.exists());
}
