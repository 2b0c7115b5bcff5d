// ❗ Error types - every failure is fatal, nothing is retried

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    /// Pre-flight check: input path does not exist
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Sheet missing, unreadable, or the wrong shape
    #[error("Error loading {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    #[error("No tables to merge")]
    EmptyInput,

    #[error("Error writing {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },

    #[error("Invalid exclusion pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl MergeError {
    /// Flatten an adapter error (with its context chain) into a load failure
    pub fn load(path: impl Into<PathBuf>, err: &anyhow::Error) -> Self {
        MergeError::Load {
            path: path.into(),
            reason: format!("{:#}", err),
        }
    }

    pub fn write(path: impl Into<PathBuf>, err: &anyhow::Error) -> Self {
        MergeError::Write {
            path: path.into(),
            reason: format!("{:#}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, MergeError>;
