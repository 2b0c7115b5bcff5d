// 💾 Writer - serialize the merged table to a single named sheet
// Existing output files are overwritten

use crate::error::{MergeError, Result};
use crate::table::{CellValue, Table};
use anyhow::Context;
use chrono::NaiveDateTime;
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;
use tracing::info;

/// Default output file
pub const DEFAULT_OUTPUT: &str = "merged_pav_sheet.xlsx";

const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

pub trait TableWriter {
    fn write(&self, table: &Table, path: &Path, sheet: &str) -> anyhow::Result<()>;

    fn name(&self) -> &str;
}

/// `.csv` gets CSV, everything else is written as a workbook
pub fn writer_for(path: &Path) -> Box<dyn TableWriter> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if is_csv {
        Box::new(CsvWriter)
    } else {
        Box::new(XlsxWriter)
    }
}

// ============================================================================
// WORKBOOK WRITER (rust_xlsxwriter)
// ============================================================================

pub struct XlsxWriter;

impl TableWriter for XlsxWriter {
    fn write(&self, table: &Table, path: &Path, sheet: &str) -> anyhow::Result<()> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();
        let datetime_format = Format::new().set_num_format(DATETIME_FORMAT);

        {
            let worksheet = workbook.add_worksheet();
            worksheet
                .set_name(sheet)
                .with_context(|| format!("Invalid sheet name '{}'", sheet))?;

            for (col_idx, column) in table.columns.iter().enumerate() {
                let col = u16::try_from(col_idx).context("Too many columns for a worksheet")?;
                worksheet.write_string_with_format(0, col, column, &header_format)?;
            }

            for (row_idx, row) in table.rows.iter().enumerate() {
                let excel_row = u32::try_from(row_idx + 1).context("Too many rows for a worksheet")?;

                for (col_idx, column) in table.columns.iter().enumerate() {
                    let col = u16::try_from(col_idx).context("Too many columns for a worksheet")?;
                    let cell = row.get(column);

                    match cell {
                        _ if cell.is_empty() => {}
                        CellValue::Text(s) => {
                            worksheet.write_string(excel_row, col, s)?;
                        }
                        CellValue::Int(i) => {
                            worksheet.write_number(excel_row, col, *i as f64)?;
                        }
                        CellValue::Float(f) if f.is_finite() => {
                            worksheet.write_number(excel_row, col, *f)?;
                        }
                        CellValue::Float(f) => {
                            worksheet.write_string(excel_row, col, f.to_string())?;
                        }
                        CellValue::Bool(b) => {
                            worksheet.write_boolean(excel_row, col, *b)?;
                        }
                        CellValue::DateTime(dt) => {
                            worksheet.write_number_with_format(
                                excel_row,
                                col,
                                excel_serial(dt),
                                &datetime_format,
                            )?;
                        }
                        CellValue::Empty => {}
                    }
                }
            }
        }

        workbook
            .save(path)
            .with_context(|| format!("Failed to save workbook: {}", path.display()))?;

        Ok(())
    }

    fn name(&self) -> &str {
        "workbook"
    }
}

/// Serial of 1970-01-01 in the 1900 date system
const UNIX_EPOCH_SERIAL: f64 = 25569.0;

/// Days since the 1899-12-30 epoch, fraction = time of day
fn excel_serial(dt: &NaiveDateTime) -> f64 {
    dt.and_utc().timestamp_millis() as f64 / 86_400_000.0 + UNIX_EPOCH_SERIAL
}

// ============================================================================
// CSV WRITER
// ============================================================================

pub struct CsvWriter;

impl TableWriter for CsvWriter {
    fn write(&self, table: &Table, path: &Path, _sheet: &str) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create file: {}", path.display()))?;

        writer.write_record(&table.columns)?;

        for row in &table.rows {
            writer.write_record(table.columns.iter().map(|c| row.get(c).to_string()))?;
        }

        writer.flush().context("Failed to flush CSV output")?;
        Ok(())
    }

    fn name(&self) -> &str {
        "csv"
    }
}

// ============================================================================
// WRITING
// ============================================================================

/// Hand the merged table off to the writer for `path`
pub fn write_table(table: Table, path: &Path, sheet: &str) -> Result<()> {
    info!("Saving merged sheet to: {}", path.display());

    let writer = writer_for(path);
    writer
        .write(&table, path, sheet)
        .map_err(|e| MergeError::write(path, &e))?;

    info!("✓ Saved {} rows ({})", table.len(), writer.name());
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
