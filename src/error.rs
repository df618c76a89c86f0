//! Error types for the inverted-index build pipeline.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

/// All fatal conditions the pipeline can hit. Nothing here is retried: a
/// build that hits any of these aborts without attempting to salvage
/// partial output, and the next build's prefix-delete step cleans up
/// after it.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {file}:{line}: {reason}")]
    Format {
        file: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("out-of-order document: expected docID {expected}, got {actual}")]
    Ordering { expected: u64, actual: u64 },

    #[error("assertion failed: {0}")]
    Assertion(String),
}

impl IndexError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IndexError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn format(file: impl Into<PathBuf>, line: u64, reason: impl Into<String>) -> Self {
        IndexError::Format {
            file: file.into(),
            line,
            reason: reason.into(),
        }
    }
}
