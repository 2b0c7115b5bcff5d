// 📋 Table Model - in-memory grid of one PAV sheet
// Columns keep their sheet order, rows are maps from column name to cell

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

// ============================================================================
// CELL VALUE
// ============================================================================

/// A single spreadsheet cell, kept in its raw type
#[derive(Debug, Clone, Default, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Missing, null or blank cell
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    DateTime(NaiveDateTime),
    Text(String),
}

impl CellValue {
    /// Emptiness covers missing cells, whitespace-only text and NaN
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Hashable identity used for key lookups. `None` for empty cells,
    /// which never match anything.
    pub fn row_key(&self) -> Option<RowKey> {
        if self.is_empty() {
            return None;
        }

        let key = match self {
            CellValue::Text(s) => RowKey::Text(s.clone()),
            CellValue::Int(i) => RowKey::Int(*i),
            CellValue::Float(f) => match integral(*f) {
                Some(i) => RowKey::Int(i),
                None => RowKey::Float(f.to_bits()),
            },
            CellValue::Bool(b) => RowKey::Bool(*b),
            CellValue::DateTime(dt) => RowKey::DateTime(*dt),
            CellValue::Empty => return None,
        };

        Some(key)
    }
}

/// Float that holds an exact i64 value
fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
        Some(f as i64)
    } else {
        None
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => return true,
            (true, false) | (false, true) => return false,
            _ => {}
        }

        match (self, other) {
            (CellValue::Text(a), CellValue::Text(b)) => a == b,
            (CellValue::Int(a), CellValue::Int(b)) => a == b,
            (CellValue::Float(a), CellValue::Float(b)) => a == b,
            // Same bound as key matching, so equal cells always share a RowKey
            (CellValue::Int(a), CellValue::Float(b)) | (CellValue::Float(b), CellValue::Int(a)) => {
                integral(*b) == Some(*a)
            }
            (CellValue::Bool(a), CellValue::Bool(b)) => a == b,
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

/// Key identity: `Int(5)` and `Float(5.0)` collapse to the same key,
/// text never matches a number
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowKey {
    Text(String),
    Int(i64),
    Float(u64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

// ============================================================================
// ROW
// ============================================================================

static EMPTY_CELL: CellValue = CellValue::Empty;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: HashMap<String, CellValue>,
}

impl Row {
    pub fn new() -> Self {
        Row::default()
    }

    /// Builder pattern: set a cell
    pub fn with(mut self, column: &str, value: impl Into<CellValue>) -> Self {
        self.set(column, value.into());
        self
    }

    /// Absent columns read as empty
    pub fn get(&self, column: &str) -> &CellValue {
        self.values.get(column).unwrap_or(&EMPTY_CELL)
    }

    pub fn set(&mut self, column: &str, value: CellValue) {
        self.values.insert(column.to_string(), value);
    }

    /// True when every cell is empty (blank spreadsheet line)
    pub fn is_blank(&self) -> bool {
        self.values.values().all(CellValue::is_empty)
    }
}

// ============================================================================
// TABLE
// ============================================================================

#[derive(Debug, Clone)]
pub struct Table {
    /// Where this table was loaded from (for logs and errors)
    pub source: PathBuf,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(source: impl Into<PathBuf>, columns: Vec<String>) -> Self {
        Table {
            source: source.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Builder pattern: append a row
    pub fn with_row(mut self, row: Row) -> Self {
        self.rows.push(row);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Append a column at the end if it is not already present
    pub fn ensure_column(&mut self, column: &str) {
        if !self.has_column(column) {
            self.columns.push(column.to_string());
        }
    }

    /// Values of one column, in row order
    pub fn column_values(&self, column: &str) -> Vec<&CellValue> {
        self.rows.iter().map(|r| r.get(column)).collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
