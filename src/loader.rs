// 📂 Loader - read one named sheet per input file into a Table
// Readers are picked by file extension, the same sheet name is read from every file

use crate::error::{MergeError, Result};
use crate::table::{CellValue, Row, Table};
use anyhow::Context;
use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Sheet read from (and written to) every workbook
pub const DEFAULT_SHEET: &str = "PAV Sheet";

/// Date-time layout written by `CellValue`'s Display (and so by the CSV writer)
const CSV_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Name given to blank header cells: `__EMPTY`, `__EMPTY_1`, ...
pub const PLACEHOLDER_COLUMN: &str = "__EMPTY";

// ============================================================================
// READER TRAIT
// ============================================================================

pub trait TableReader {
    /// Read `sheet` from `path`. Formats without sheets ignore the name.
    fn read(&self, path: &Path, sheet: &str) -> anyhow::Result<Table>;

    fn name(&self) -> &str;
}

/// Pick a reader from the file extension
pub fn reader_for(path: &Path) -> anyhow::Result<Box<dyn TableReader>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Box::new(XlsxReader)),
        "csv" => Ok(Box::new(CsvReader)),
        _ => Err(anyhow::anyhow!(
            "Unsupported file type '{}' (expected .xlsx, .xls, .ods or .csv)",
            extension
        )),
    }
}

// ============================================================================
// WORKBOOK READER (calamine)
// ============================================================================

pub struct XlsxReader;

impl TableReader for XlsxReader {
    fn read(&self, path: &Path, sheet: &str) -> anyhow::Result<Table> {
        let mut workbook = open_workbook_auto(path)
            .with_context(|| format!("Failed to open workbook: {}", path.display()))?;

        let sheet_names = workbook.sheet_names();
        if !sheet_names.iter().any(|s| s == sheet) {
            anyhow::bail!(
                "Sheet '{}' not found (available: {})",
                sheet,
                sheet_names.join(", ")
            );
        }

        let range = workbook
            .worksheet_range(sheet)
            .with_context(|| format!("Failed to read sheet '{}'", sheet))?;

        let mut rows = range.rows();
        let header = rows
            .next()
            .with_context(|| format!("Sheet '{}' has no header row", sheet))?;

        let columns = header_names(header.iter().map(|d| cell_from_data(d).to_string()));
        let mut table = Table::new(path, columns);

        for cells in rows {
            let mut row = Row::new();
            for (column, data) in table.columns.iter().zip(cells.iter()) {
                row.set(column, cell_from_data(data));
            }
            if !row.is_blank() {
                table.rows.push(row);
            }
        }

        Ok(table)
    }

    fn name(&self) -> &str {
        "workbook"
    }
}

/// Keep the raw cell type; error cells count as empty
fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => CellValue::DateTime(naive),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => match NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
            Ok(naive) => CellValue::DateTime(naive),
            Err(_) => CellValue::Text(s.clone()),
        },
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) => CellValue::Empty,
    }
}

// ============================================================================
// CSV READER
// ============================================================================

pub struct CsvReader;

impl TableReader for CsvReader {
    fn read(&self, path: &Path, _sheet: &str) -> anyhow::Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;

        let header = reader
            .headers()
            .with_context(|| format!("Failed to read header of {}", path.display()))?
            .clone();

        let columns = header_names(header.iter().map(|h| h.to_string()));
        let mut table = Table::new(path, columns);

        for (line_num, result) in reader.records().enumerate() {
            let record = result.with_context(|| {
                format!("Failed to parse CSV line {} in {}", line_num + 2, path.display())
            })?;

            let mut row = Row::new();
            for (column, field) in table.columns.iter().zip(record.iter()) {
                row.set(column, cell_from_field(field));
            }
            if !row.is_blank() {
                table.rows.push(row);
            }
        }

        Ok(table)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

/// Infer the cell type of a CSV field. Only exact round-trips are typed,
/// so codes like "007" or "3.50" stay text.
fn cell_from_field(field: &str) -> CellValue {
    if field.is_empty() {
        return CellValue::Empty;
    }

    if let Ok(i) = field.parse::<i64>() {
        if i.to_string() == field {
            return CellValue::Int(i);
        }
    }

    if let Ok(f) = field.parse::<f64>() {
        if f.is_finite() && f.to_string() == field {
            return CellValue::Float(f);
        }
    }

    match field {
        "true" | "TRUE" | "True" => return CellValue::Bool(true),
        "false" | "FALSE" | "False" => return CellValue::Bool(false),
        _ => {}
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(field, CSV_DATETIME_FORMAT) {
        return CellValue::DateTime(dt);
    }

    CellValue::Text(field.to_string())
}

// ============================================================================
// HEADER NORMALIZATION
// ============================================================================

/// Blank headers become placeholders, repeated names get `.1`, `.2`, ...
pub fn header_names(raw: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut blanks = 0;

    for cell in raw {
        let base = if cell.trim().is_empty() {
            let placeholder = if blanks == 0 {
                PLACEHOLDER_COLUMN.to_string()
            } else {
                format!("{}_{}", PLACEHOLDER_COLUMN, blanks)
            };
            blanks += 1;
            placeholder
        } else {
            cell
        };

        let mut name = base.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }

        seen.insert(name.clone());
        names.push(name);
    }

    names
}

// ============================================================================
// LOADING
// ============================================================================

pub fn load_table(path: &Path, sheet: &str) -> anyhow::Result<Table> {
    let reader = reader_for(path)?;
    reader
        .read(path, sheet)
        .with_context(|| format!("{} reader failed", reader.name()))
}

/// Load every file in order, aborting on the first failure.
/// Each table must carry the key column.
pub fn load_tables(paths: &[PathBuf], sheet: &str, key_column: &str) -> Result<Vec<Table>> {
    info!("Loading {} file(s)...", paths.len());

    let mut tables = Vec::with_capacity(paths.len());

    for path in paths {
        let table = load_table(path, sheet).map_err(|e| MergeError::load(path, &e))?;

        if !table.has_column(key_column) {
            return Err(MergeError::Load {
                path: path.clone(),
                reason: format!("key column '{}' not found", key_column),
            });
        }

        info!("✓ Loaded {}: {} rows", path.display(), table.len());
        tables.push(table);
    }

    Ok(tables)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_header_placeholders() {
        let names = header_names(vec![
            "Asset Code".to_string(),
            "".to_string(),
            "Status".to_string(),
            "  ".to_string(),
        ]);

        assert_eq!(names, vec!["Asset Code", "__EMPTY", "Status", "__EMPTY_1"]);
    }

    #[test]
    fn test_header_duplicates_made_unique() {
        let names = header_names(vec![
            "Remarks".to_string(),
            "Remarks".to_string(),
            "Remarks".to_string(),
        ]);

        assert_eq!(names, vec!["Remarks", "Remarks.1", "Remarks.2"]);
    }

    #[test]
    fn test_reader_for_extension() {
        assert_eq!(reader_for(Path::new("a.xlsx")).unwrap().name(), "workbook");
        assert_eq!(reader_for(Path::new("A.XLSX")).unwrap().name(), "workbook");
        assert_eq!(reader_for(Path::new("a.csv")).unwrap().name(), "csv");
        assert!(reader_for(Path::new("a.txt")).is_err());
        assert!(reader_for(Path::new("noext")).is_err());
    }

    #[test]
    fn test_cell_from_data() {
        assert_eq!(cell_from_data(&Data::Empty), CellValue::Empty);
        assert_eq!(cell_from_data(&Data::String("A1".into())), CellValue::from("A1"));
        assert_eq!(cell_from_data(&Data::Float(2.5)), CellValue::Float(2.5));
        assert_eq!(cell_from_data(&Data::Int(7)), CellValue::Int(7));
        assert_eq!(
            cell_from_data(&Data::Error(calamine::CellErrorType::NA)),
            CellValue::Empty
        );
    }

    #[test]
    fn test_csv_reader() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("read.csv");
        fs::write(
            &path,
            "Asset Code,Status,,Notes\nA1,Verified,x,\n,,,\nA2,,,Checked\n",
        )
        .unwrap();

        let table = load_table(&path, DEFAULT_SHEET).unwrap();

        assert_eq!(table.columns, vec!["Asset Code", "Status", "__EMPTY", "Notes"]);
        // Blank line skipped
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].get("Status"), &CellValue::from("Verified"));
        assert!(table.rows[0].get("Notes").is_empty());
        assert_eq!(table.rows[1].get("Notes"), &CellValue::from("Checked"));
    }

    #[test]
    fn test_load_tables_missing_key_column() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nokey.csv");
        fs::write(&path, "Tag,Status\nA1,Verified\n").unwrap();

        let result = load_tables(&[path.clone()], DEFAULT_SHEET, "Asset Code");

        match result {
            Err(MergeError::Load { path: failed, reason }) => {
                assert_eq!(failed, path);
                assert!(reason.contains("Asset Code"));
            }
            other => panic!("expected load error, got {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn test_load_tables_aborts_on_first_failure() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("good.csv");
        fs::write(&good, "Asset Code\nA1\n").unwrap();
        let bad = temp_dir.path().join("does_not_exist.xlsx");

        let result = load_tables(&[good.clone(), bad.clone()], DEFAULT_SHEET, "Asset Code");

        match result {
            Err(MergeError::Load { path, .. }) => assert_eq!(path, bad),
            other => panic!("expected load error, got {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn test_csv_field_type_inference() {
        assert_eq!(cell_from_field(""), CellValue::Empty);
        assert!(matches!(cell_from_field("1001"), CellValue::Int(1001)));
        assert!(matches!(cell_from_field("-4"), CellValue::Int(-4)));
        assert!(matches!(cell_from_field("2.5"), CellValue::Float(f) if f == 2.5));
        assert!(matches!(cell_from_field("TRUE"), CellValue::Bool(true)));
        assert!(matches!(cell_from_field("2024-12-31 10:00:00"), CellValue::DateTime(_)));

        // Not exact round-trips: keep the text as written
        assert!(matches!(cell_from_field("007"), CellValue::Text(ref s) if s == "007"));
        assert!(matches!(cell_from_field("3.50"), CellValue::Text(ref s) if s == "3.50"));
        assert!(matches!(cell_from_field("A1"), CellValue::Text(ref s) if s == "A1"));
    }

    #[test]
    fn test_csv_numeric_keys_match_workbook_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("numeric.csv");
        fs::write(&path, "Asset Code,Qty\n1001,3\n").unwrap();

        let table = load_table(&path, DEFAULT_SHEET).unwrap();

        // Workbook cells carry numbers as floats
        assert_eq!(
            table.rows[0].get("Asset Code").row_key(),
            CellValue::Float(1001.0).row_key()
        );
        assert_eq!(table.rows[0].get("Qty"), &CellValue::Float(3.0));
    }
}
