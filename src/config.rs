// ⚙️ Run configuration - resolved from the CLI, usable without it

use crate::error::{MergeError, Result};
use crate::loader::DEFAULT_SHEET;
use crate::merge::{ExclusionSet, MergeEngine, DEFAULT_KEY_COLUMN};
use crate::report::DEFAULT_CONFLICT_PREVIEW;
use crate::writer::DEFAULT_OUTPUT;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Input files, oldest first (later files win conflicts)
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub key_column: String,
    pub sheet: String,
    pub exclusions: ExclusionSet,

    /// Optional JSON copy of the change report
    pub report_json: Option<PathBuf>,

    /// Conflicts shown in full by the presenter
    pub conflict_preview: usize,
}

impl MergeConfig {
    pub fn new(inputs: Vec<PathBuf>) -> Self {
        MergeConfig {
            inputs,
            output: PathBuf::from(DEFAULT_OUTPUT),
            key_column: DEFAULT_KEY_COLUMN.to_string(),
            sheet: DEFAULT_SHEET.to_string(),
            exclusions: ExclusionSet::with_defaults(),
            report_json: None,
            conflict_preview: DEFAULT_CONFLICT_PREVIEW,
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_key_column(mut self, key_column: &str) -> Self {
        self.key_column = key_column.to_string();
        self
    }

    pub fn with_sheet(mut self, sheet: &str) -> Self {
        self.sheet = sheet.to_string();
        self
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionSet) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn with_report_json(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_json = Some(path.into());
        self
    }

    /// Pre-flight: every input must exist before anything is loaded
    pub fn validate_inputs(&self) -> Result<()> {
        for path in &self.inputs {
            if !path.exists() {
                return Err(MergeError::FileNotFound { path: path.clone() });
            }
        }
        Ok(())
    }

    pub fn engine(&self) -> MergeEngine {
        MergeEngine::new(&self.key_column).with_exclusions(self.exclusions.clone())
    }
}

/// Defaults (unless disabled) plus any extra patterns
pub fn build_exclusions(extra: &[String], use_defaults: bool) -> Result<ExclusionSet> {
    let mut exclusions = if use_defaults {
        ExclusionSet::with_defaults()
    } else {
        ExclusionSet::empty()
    };

    for pattern in extra {
        exclusions.add(pattern)?;
    }

    Ok(exclusions)
}
