// 🚀 Merge run - pre-flight → load → merge → write
// Nothing is written unless every file loaded and merged

use crate::config::MergeConfig;
use crate::error::{MergeError, Result};
use crate::loader::load_tables;
use crate::report::ChangeReport;
use crate::writer::write_table;
use std::fs;
use std::path::Path;
use tracing::info;

pub fn run(config: &MergeConfig) -> Result<ChangeReport> {
    config.validate_inputs()?;
    if let Some(path) = &config.report_json {
        check_report_path(path)?;
    }

    let tables = load_tables(&config.inputs, &config.sheet, &config.key_column)?;

    info!("Merging sheets...");
    let outcome = config.engine().merge(tables)?;

    // Serialize before the workbook lands so a report failure leaves no output
    let report_json = match &config.report_json {
        Some(path) => {
            let json = outcome.report.to_json().map_err(|e| MergeError::Write {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            Some((path, json))
        }
        None => None,
    };

    write_table(outcome.table, &config.output, &config.sheet)?;

    if let Some((path, json)) = report_json {
        fs::write(path, json).map_err(|e| MergeError::Write {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        info!("Report written to {}", path.display());
    }

    info!("{}", outcome.report.summary());
    Ok(outcome.report)
}

/// The report must land in an existing directory and not on top of one
fn check_report_path(path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    if !parent.is_dir() {
        return Err(MergeError::Write {
            path: path.to_path_buf(),
            reason: format!("directory {} does not exist", parent.display()),
        });
    }

    if path.is_dir() {
        return Err(MergeError::Write {
            path: path.to_path_buf(),
            reason: "path is a directory".to_string(),
        });
    }

    Ok(())
}
