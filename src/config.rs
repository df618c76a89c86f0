//! Build configuration.
//!
//! Carries the tunable build limits (`MAX_WORD_CAP`, `TITLE_FILE_CAP`,
//! `INVERTED_INDEX_TEMP_FILE_CAP`, `FINAL_INDEX_FILE_CAP`) as a typed,
//! serde-backed record instead of globals, so a build can be configured and
//! run without process-wide state. Loadable from a TOML file (`from_toml_str`/
//! `load`) or built programmatically via `new`/the `with_*` builders.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{IndexError, Result};

/// Configuration for one index build. Every field has a default matching
/// the original's constants, so a TOML file only needs to set the fields it
/// wants to override (see `from_toml_str`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Directory for all build outputs (runs, partitions, secondary index,
    /// title table, statistics report). Owned exclusively by one build.
    #[serde(default = "default_index_folder_path")]
    pub index_folder_path: PathBuf,

    /// Byte threshold at which the posting accumulator flushes a run.
    #[serde(default = "default_temp_file_cap")]
    pub inverted_index_temp_file_cap: u64,

    /// Byte cap per primary partition file (also the secondary index's cap).
    #[serde(default = "default_final_index_file_cap")]
    pub final_index_file_cap: u64,

    /// Maximum accepted token length. Enforced at ingestion: see
    /// `Ingestor::add_document`, which rejects any field token longer than
    /// this as a `FormatError` rather than silently truncating it; see
    /// DESIGN.md for the reasoning.
    #[serde(default = "default_max_word_cap")]
    pub max_word_cap: usize,

    /// Entry cap per title-table file. Counts entries, not bytes.
    #[serde(default = "default_title_file_cap")]
    pub title_file_cap: usize,
}

fn default_index_folder_path() -> PathBuf {
    PathBuf::from("index")
}

fn default_temp_file_cap() -> u64 {
    100_000_000
}

fn default_final_index_file_cap() -> u64 {
    100_000_000
}

fn default_max_word_cap() -> usize {
    30
}

fn default_title_file_cap() -> usize {
    20_000
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            index_folder_path: default_index_folder_path(),
            inverted_index_temp_file_cap: default_temp_file_cap(),
            final_index_file_cap: default_final_index_file_cap(),
            max_word_cap: default_max_word_cap(),
            title_file_cap: default_title_file_cap(),
        }
    }
}

impl BuildConfig {
    pub fn new(index_folder_path: impl Into<PathBuf>) -> Self {
        Self {
            index_folder_path: index_folder_path.into(),
            ..Default::default()
        }
    }

    pub fn with_temp_file_cap(mut self, cap: u64) -> Self {
        self.inverted_index_temp_file_cap = cap;
        self
    }

    pub fn with_final_index_file_cap(mut self, cap: u64) -> Self {
        self.final_index_file_cap = cap;
        self
    }

    pub fn with_max_word_cap(mut self, cap: usize) -> Self {
        self.max_word_cap = cap;
        self
    }

    pub fn with_title_file_cap(mut self, cap: usize) -> Self {
        self.title_file_cap = cap;
        self
    }

    /// Parse a `BuildConfig` from TOML text. Any field absent from `text`
    /// falls back to its `Default`, so a config file only needs to name the
    /// caps it wants to change.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text)
            .map_err(|e| IndexError::format("<config>", 0, format!("invalid config TOML: {e}")))
    }

    /// Load a `BuildConfig` from a TOML file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| IndexError::io(path, e))?;
        toml::from_str(&text)
            .map_err(|e| IndexError::format(path, 0, format!("invalid config TOML: {e}")))
    }
}
