//! Statistics sink and human-readable report writer.
//!
//! Earlier prior art collected these counts in a process-wide `STATS` dict.
//! That is re-architected here as an explicit record threaded through the
//! build orchestrator, with no ambient state. Serialization mirrors
//! `manifest.rs`'s pattern of a plain serde record written out with
//! `serde_json`, and the human-readable report format mirrors the
//! reference `fileStat.txt` layout.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Statistics {
    pub total_docs: u64,
    pub total_tokens_encountered: u64,
    pub total_tokens_indexed: u64,
    pub unique_tokens: u64,
    pub title_file_count: u64,
    pub primary_partition_count: u64,
    pub secondary_partition_count: u64,
    pub ingest_elapsed_ms: u64,
    pub merge_elapsed_ms: u64,
    pub secondary_index_elapsed_ms: u64,
    pub total_index_bytes: u64,
}

impl Statistics {
    pub fn set_ingest_elapsed(&mut self, d: Duration) {
        self.ingest_elapsed_ms = d.as_millis() as u64;
    }

    pub fn set_merge_elapsed(&mut self, d: Duration) {
        self.merge_elapsed_ms = d.as_millis() as u64;
    }

    pub fn set_secondary_index_elapsed(&mut self, d: Duration) {
        self.secondary_index_elapsed_ms = d.as_millis() as u64;
    }

    /// Sum the on-disk size of every file matching the build's output
    /// prefixes (`index_`, `secondary_index`, `title_`) plus the
    /// statistics report itself, mirroring the original's `get_index_size`.
    pub fn measure_index_size(&mut self, dir: &Path, report_path: &Path) -> Result<()> {
        let mut total = 0u64;
        for entry in std::fs::read_dir(dir).map_err(|e| IndexError::io(dir, e))? {
            let entry = entry.map_err(|e| IndexError::io(dir, e))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with("index_") || name.starts_with("secondary_index") || name.starts_with("title_") {
                let meta = entry.metadata().map_err(|e| IndexError::io(dir, e))?;
                total += meta.len();
            }
        }
        if let Ok(meta) = std::fs::metadata(report_path) {
            total += meta.len();
        }
        self.total_index_bytes = total;
        Ok(())
    }

    /// Render as a human-readable report, one `label: value` pair per
    /// line, matching the original's `fileStat.txt` layout.
    pub fn write_report(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| IndexError::io(path, e))?;
        let mut w = std::io::BufWriter::new(file);
        writeln!(w, "Total Documents: {}", self.total_docs).map_err(|e| IndexError::io(path, e))?;
        writeln!(w, "Total Tokens Encountered: {}", self.total_tokens_encountered)
            .map_err(|e| IndexError::io(path, e))?;
        writeln!(w, "Total Tokens Indexed: {}", self.total_tokens_indexed)
            .map_err(|e| IndexError::io(path, e))?;
        writeln!(w, "Total Unique Tokens: {}", self.unique_tokens).map_err(|e| IndexError::io(path, e))?;
        writeln!(w, "Title File Count: {}", self.title_file_count).map_err(|e| IndexError::io(path, e))?;
        writeln!(w, "Primary Index File Count: {}", self.primary_partition_count)
            .map_err(|e| IndexError::io(path, e))?;
        writeln!(w, "Secondary Index File Count: {}", self.secondary_partition_count)
            .map_err(|e| IndexError::io(path, e))?;
        writeln!(w, "Index Size (bytes): {}", self.total_index_bytes).map_err(|e| IndexError::io(path, e))?;
        writeln!(w, "Ingest Time (ms): {}", self.ingest_elapsed_ms).map_err(|e| IndexError::io(path, e))?;
        writeln!(w, "Primary Index Creation Time (ms): {}", self.merge_elapsed_ms)
            .map_err(|e| IndexError::io(path, e))?;
        writeln!(w, "Secondary Index Creation Time (ms): {}", self.secondary_index_elapsed_ms)
            .map_err(|e| IndexError::io(path, e))?;
        w.flush().map_err(|e| IndexError::io(path, e))?;
        Ok(())
    }
}

/// Purge all files in `dir` matching the build's output prefixes, plus the
/// statistics report file itself. Run once at the start of every build so
/// the output directory is owned exclusively by the build in progress.
pub fn purge_stale_outputs(dir: &Path, report_path: &Path) -> Result<()> {
    const PREFIXES: [&str; 4] = ["temp_index_", "index_", "secondary_index", "title_"];
    if dir.exists() {
        for entry in std::fs::read_dir(dir).map_err(|e| IndexError::io(dir, e))? {
            let entry = entry.map_err(|e| IndexError::io(dir, e))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if PREFIXES.iter().any(|p| name.starts_with(p)) {
                std::fs::remove_file(entry.path()).map_err(|e| IndexError::io(entry.path(), e))?;
            }
        }
    } else {
        std::fs::create_dir_all(dir).map_err(|e| IndexError::io(dir, e))?;
    }
    if report_path.exists() {
        std::fs::remove_file(report_path).map_err(|e| IndexError::io(report_path, e))?;
    }
    Ok(())
}

/// Compute the on-disk size of a single file, for summary logging only.
pub fn file_size(path: &PathBuf) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purge_removes_only_matching_prefixes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("temp_index_0.txt"), "x").unwrap();
        std::fs::write(dir.path().join("index_0.txt"), "x").unwrap();
        std::fs::write(dir.path().join("secondary_index_0.txt"), "x").unwrap();
        std::fs::write(dir.path().join("title_0.txt"), "x").unwrap();
        std::fs::write(dir.path().join("keep_me.txt"), "x").unwrap();
        let report = dir.path().join("stats.txt");
        std::fs::write(&report, "old").unwrap();

        purge_stale_outputs(dir.path(), &report).unwrap();

        let remaining: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(remaining, vec!["keep_me.txt".to_string()]);
    }

    #[test]
    fn report_contains_all_fields() {
        let dir = tempfile::tempdir().unwrap();
        let report_path = dir.path().join("stats.txt");
        let mut stats = Statistics::default();
        stats.total_docs = 3;
        stats.unique_tokens = 2;
        stats.write_report(&report_path).unwrap();
        let content = std::fs::read_to_string(&report_path).unwrap();
        assert!(content.contains("Total Documents: 3"));
        assert!(content.contains("Total Unique Tokens: 2"));
    }
}
