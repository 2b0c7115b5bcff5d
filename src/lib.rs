// PAV Merger - Core Library
// Merge Physical Asset Verification sheets from several engineers into one

pub mod config;
pub mod error;
pub mod loader;
pub mod merge;
pub mod pipeline;
pub mod report;
pub mod table;
pub mod writer;

// Re-export commonly used types
pub use config::{build_exclusions, MergeConfig};
pub use error::{MergeError, Result};
pub use loader::{
    load_table, load_tables, reader_for,
    CsvReader, TableReader, XlsxReader,
    DEFAULT_SHEET,
};
pub use merge::{
    is_conflict, should_update,
    ExclusionSet, MergeEngine, MergeOutcome,
    DEFAULT_EXCLUSION_PATTERN, DEFAULT_KEY_COLUMN,
};
pub use pipeline::run;
pub use report::{ChangeReport, ConflictRecord, Resolution, DEFAULT_CONFLICT_PREVIEW};
pub use table::{CellValue, Row, RowKey, Table};
pub use writer::{write_table, writer_for, CsvWriter, TableWriter, XlsxWriter, DEFAULT_OUTPUT};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
