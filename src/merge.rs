// 🔀 Merge Engine - fold N PAV sheets into one, keyed by asset
//
// Seed with the first table, then for every later row:
//   unknown key  → append the row
//   known key    → per eligible column, latest non-empty value wins
//
// Empty values never overwrite anything. Two different non-empty values
// are a conflict: the later file wins and the conflict is recorded.

use crate::error::{MergeError, Result};
use crate::report::{ChangeReport, ConflictRecord, Resolution};
use crate::table::{CellValue, RowKey, Table};
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Column identifying the same asset across files
pub const DEFAULT_KEY_COLUMN: &str = "Asset Code";

/// Placeholder names the loader gives to blank header cells
pub const DEFAULT_EXCLUSION_PATTERN: &str = r"^__EMPTY(_\d+)?$";

// ============================================================================
// EXCLUSION SET
// ============================================================================

/// Columns matching any pattern are carried through but never merged
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    patterns: Vec<Regex>,
}

impl ExclusionSet {
    /// No exclusions at all
    pub fn empty() -> Self {
        ExclusionSet {
            patterns: Vec::new(),
        }
    }

    /// Placeholder-column pattern only
    pub fn with_defaults() -> Self {
        let default = Regex::new(DEFAULT_EXCLUSION_PATTERN).expect("default exclusion pattern is valid");
        ExclusionSet {
            patterns: vec![default],
        }
    }

    pub fn add(&mut self, pattern: &str) -> Result<()> {
        let regex = Regex::new(pattern).map_err(|e| MergeError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        self.patterns.push(regex);
        Ok(())
    }

    pub fn is_excluded(&self, column: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(column))
    }

    pub fn patterns(&self) -> Vec<&str> {
        self.patterns.iter().map(|p| p.as_str()).collect()
    }
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// FIELD-UPDATE RULE
// ============================================================================

/// Should `incoming` replace `current`?
pub fn should_update(current: &CellValue, incoming: &CellValue) -> bool {
    // Empty never overwrites, not even another empty
    if incoming.is_empty() {
        return false;
    }

    if current.is_empty() {
        return true;
    }

    // Both non-empty: latest wins when they differ
    current != incoming
}

/// Both non-empty and different
pub fn is_conflict(current: &CellValue, incoming: &CellValue) -> bool {
    !current.is_empty() && !incoming.is_empty() && current != incoming
}

// ============================================================================
// MERGE ENGINE
// ============================================================================

#[derive(Debug)]
pub struct MergeOutcome {
    pub table: Table,
    pub report: ChangeReport,
}

pub struct MergeEngine {
    /// Column used to match rows across tables (default: "Asset Code")
    pub key_column: String,

    /// Placeholder columns skipped during field updates
    pub exclusions: ExclusionSet,
}

impl MergeEngine {
    /// Create engine with the default placeholder exclusions
    pub fn new(key_column: &str) -> Self {
        MergeEngine {
            key_column: key_column.to_string(),
            exclusions: ExclusionSet::with_defaults(),
        }
    }

    /// Builder pattern: replace the exclusion set
    pub fn with_exclusions(mut self, exclusions: ExclusionSet) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Columns of the seed table that take part in field updates
    pub fn eligible_columns(&self, seed: &Table) -> Vec<String> {
        seed.columns
            .iter()
            .filter(|c| **c != self.key_column && !self.exclusions.is_excluded(c))
            .cloned()
            .collect()
    }

    /// Fold all tables into the first one.
    ///
    /// The seed table is moved in and becomes the merged table, so the
    /// result is exclusively owned by the caller afterwards.
    pub fn merge(&self, tables: Vec<Table>) -> Result<MergeOutcome> {
        let mut tables = tables.into_iter();
        let mut merged = tables.next().ok_or(MergeError::EmptyInput)?;
        self.check_key_column(&merged)?;

        let mut report = ChangeReport::new();
        report.files_processed = 1;
        report.total_assets = merged.len();

        let update_columns = self.eligible_columns(&merged);
        let mut index = self.build_index(&merged);

        for table in tables {
            self.check_key_column(&table)?;
            report.files_processed += 1;

            info!("Processing: {} ({} rows)", table.source.display(), table.len());

            let Table { columns, rows, .. } = table;

            for row in rows {
                let asset = row.get(&self.key_column).clone();
                let key = asset.row_key();

                let existing = key.as_ref().and_then(|k| index.get(k).copied());

                let Some(target_idx) = existing else {
                    // New asset: keep every column it brings along
                    if key.is_none() {
                        warn!("Row without {} appended unmatched", self.key_column);
                    }
                    for column in &columns {
                        merged.ensure_column(column);
                    }
                    if let Some(k) = key {
                        index.insert(k, merged.rows.len());
                    }
                    merged.rows.push(row);
                    report.updates_merged += 1;
                    report.new_assets += 1;
                    debug!("+ Added new asset: {}", asset);
                    continue;
                };

                let target = &mut merged.rows[target_idx];
                let mut updates_count = 0;

                for column in &update_columns {
                    let incoming = row.get(column);
                    let current = target.get(column);

                    if !should_update(current, incoming) {
                        continue;
                    }

                    if is_conflict(current, incoming) {
                        warn!(
                            "Conflict on {} / {}: '{}' -> '{}'",
                            asset, column, current, incoming
                        );
                        report.conflicts.push(ConflictRecord {
                            asset: asset.clone(),
                            column: column.clone(),
                            old_value: current.clone(),
                            new_value: incoming.clone(),
                            resolution: Resolution::UsingLatest,
                        });
                    }

                    target.set(column, incoming.clone());
                    updates_count += 1;
                }

                if updates_count > 0 {
                    debug!("↻ Updated {} field(s) for: {}", updates_count, asset);
                    report.updates_merged += updates_count;
                }
            }
        }

        report.merged_assets = merged.len();

        Ok(MergeOutcome {
            table: merged,
            report,
        })
    }

    fn check_key_column(&self, table: &Table) -> Result<()> {
        if table.has_column(&self.key_column) {
            return Ok(());
        }

        Err(MergeError::Load {
            path: table.source.clone(),
            reason: format!("key column '{}' not found", self.key_column),
        })
    }

    /// Key → row position. First occurrence wins on duplicate keys.
    fn build_index(&self, table: &Table) -> HashMap<RowKey, usize> {
        let mut index = HashMap::new();

        for (idx, row) in table.rows.iter().enumerate() {
            if let Some(key) = row.get(&self.key_column).row_key() {
                index.entry(key).or_insert(idx);
            }
        }

        index
    }
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_COLUMN)
    }
}

// ============================================================================
// TESTS
// ============================================================================
