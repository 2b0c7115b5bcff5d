// 📊 Change Report - what the merge did, and a text view over it
//
// Counters follow the merge fold:
//   files_processed  one per loaded table
//   total_assets     seed table size (captured before any later file is merged)
//   updates_merged   field updates + appended assets

use crate::table::CellValue;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;

/// Number of conflicts shown by the presenter unless asked otherwise
pub const DEFAULT_CONFLICT_PREVIEW: usize = 5;

const RULE: &str = "============================================================";

// ============================================================================
// CONFLICT RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Resolution {
    /// Latest file's non-empty value replaced the earlier one
    #[serde(rename = "Using latest")]
    UsingLatest,
}

impl Resolution {
    pub fn label(&self) -> &str {
        match self {
            Resolution::UsingLatest => "Using latest",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictRecord {
    pub asset: CellValue,
    pub column: String,
    pub old_value: CellValue,
    pub new_value: CellValue,
    pub resolution: Resolution,
}

// ============================================================================
// CHANGE REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ChangeReport {
    pub files_processed: usize,

    /// Row count of the seed table, not of the merged result
    pub total_assets: usize,

    /// Row count of the merged result
    pub merged_assets: usize,

    /// Rows appended because their key was not yet present
    pub new_assets: usize,

    pub updates_merged: usize,
    pub conflicts: Vec<ConflictRecord>,
    pub merged_at: DateTime<Utc>,
}

impl ChangeReport {
    pub fn new() -> Self {
        ChangeReport {
            files_processed: 0,
            total_assets: 0,
            merged_assets: 0,
            new_assets: 0,
            updates_merged: 0,
            conflicts: Vec::new(),
            merged_at: Utc::now(),
        }
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Merged {} file(s): {} seed assets -> {} assets, {} update(s), {} conflict(s)",
            self.files_processed,
            self.total_assets,
            self.merged_assets,
            self.updates_merged,
            self.conflicts.len()
        )
    }

    /// Totals plus the first `limit` conflicts in full detail
    pub fn render(&self, limit: usize) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "{}", RULE);
        let _ = writeln!(out, "MERGE REPORT");
        let _ = writeln!(out, "{}", RULE);
        let _ = writeln!(out, "Files processed: {}", self.files_processed);
        let _ = writeln!(out, "Total assets: {}", self.total_assets);
        let _ = writeln!(out, "Fields updated: {}", self.updates_merged);
        let _ = writeln!(out, "Conflicts resolved: {}", self.conflicts.len());

        if self.has_conflicts() && limit > 0 {
            let _ = writeln!(out, "\nConflicts (showing first {}):", limit);
            for conflict in self.conflicts.iter().take(limit) {
                let _ = writeln!(out, "  - Asset: {}", conflict.asset);
                let _ = writeln!(out, "    Column: {}", conflict.column);
                let _ = writeln!(out, "    Value 1: {}", conflict.old_value);
                let _ = writeln!(out, "    Value 2: {}", conflict.new_value);
                let _ = writeln!(out, "    Resolution: {}", conflict.resolution.label());
            }
        }

        let _ = write!(out, "{}", RULE);
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for ChangeReport {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
