//! Ingestion façade.
//!
//! Receives one `(docID, fields)` call per document, updates the posting
//! accumulator, and triggers a run flush at the configured byte threshold
//! or on an explicit `finish()`. Grounded on the trigger-then-rotate shape
//! of `LSMEngine::put`'s `memtable.should_flush()` check in
//! `storage/lsm/engine.rs`, single-threaded and without the background
//! flush queue that engine carries: ingestion here is strictly sequential,
//! so there is never more than one accumulator in flight.
//!
//! Earlier prior art signaled a final flush with a sentinel "null token,
//! isLast=true" call. That is re-architected here as the explicit
//! `finish()` method below, with no sentinel values and no nullable
//! payload fields; see DESIGN.md.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::accumulator::{Accumulator, DocumentFields};
use crate::config::BuildConfig;
use crate::error::{IndexError, Result};
use crate::model::{check_token_len, DocId};
use crate::run::{run_file_name, write_run};
use crate::stats::file_size;

/// Observable statistics the façade exposes once ingestion is complete.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestStats {
    pub total_docs: u64,
    pub run_count: u64,
}

pub struct Ingestor<'a> {
    index_folder_path: &'a Path,
    max_word_cap: usize,
    temp_file_cap: u64,
    accumulator: Accumulator,
    next_doc_id: DocId,
    run_count: u64,
    run_paths: Vec<PathBuf>,
}

impl<'a> Ingestor<'a> {
    pub fn new(config: &'a BuildConfig) -> Self {
        Self {
            index_folder_path: &config.index_folder_path,
            max_word_cap: config.max_word_cap,
            temp_file_cap: config.inverted_index_temp_file_cap,
            accumulator: Accumulator::new(),
            next_doc_id: 0,
            run_count: 0,
            run_paths: Vec::new(),
        }
    }

    /// Add one document. `doc_id` must equal the previous docID + 1 (or 0
    /// on the first call); an out-of-order or repeated docID is a fatal
    /// `OrderingError`. Every token across all six fields is checked
    /// against `max_word_cap` before being added; an over-long token is a
    /// fatal `FormatError`.
    pub fn add_document(&mut self, doc_id: DocId, fields: DocumentFields) -> Result<()> {
        if doc_id != self.next_doc_id {
            return Err(IndexError::Ordering {
                expected: self.next_doc_id,
                actual: doc_id,
            });
        }

        for token in fields
            .title
            .iter()
            .chain(&fields.infobox)
            .chain(&fields.body)
            .chain(&fields.category)
            .chain(&fields.link)
            .chain(&fields.reference)
        {
            check_token_len(token, self.max_word_cap, doc_id)?;
        }

        self.accumulator.add(doc_id, &fields);
        self.next_doc_id = doc_id + 1;

        if self.accumulator.size_bytes() >= self.temp_file_cap {
            self.flush()?;
        }

        Ok(())
    }

    /// Force a flush of whatever the accumulator currently holds, even if
    /// empty-but-for-completeness this is idempotent on an empty
    /// accumulator (no run file is written in that case).
    fn flush(&mut self) -> Result<()> {
        if self.accumulator.is_empty() {
            return Ok(());
        }
        let path = run_file_name(self.index_folder_path, self.run_count);
        debug!(run = self.run_count, path = %path.display(), "flushing accumulator to run");
        write_run(&path, self.accumulator.drain_sorted())?;
        debug!(run = self.run_count, bytes = file_size(&path), "run written");
        self.run_paths.push(path);
        self.run_count += 1;
        Ok(())
    }

    /// Finish ingestion: flush any residual accumulator contents and
    /// return the run file paths plus observable statistics, ready for the
    /// k-way merger.
    pub fn finish(mut self) -> Result<(Vec<PathBuf>, IngestStats)> {
        self.flush()?;
        let stats = IngestStats {
            total_docs: self.next_doc_id,
            run_count: self.run_count,
        };
        info!(
            total_docs = stats.total_docs,
            run_count = stats.run_count,
            "ingestion complete"
        );
        Ok((self.run_paths, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn forced_run_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig::new(dir.path()).with_temp_file_cap(1);
        let mut ingestor = Ingestor::new(&config);

        ingestor
            .add_document(
                0,
                DocumentFields {
                    body: toks(&["a"]),
                    ..Default::default()
                },
            )
            .unwrap();
        ingestor
            .add_document(
                1,
                DocumentFields {
                    body: toks(&["b"]),
                    ..Default::default()
                },
            )
            .unwrap();
        ingestor
            .add_document(
                2,
                DocumentFields {
                    body: toks(&["a"]),
                    ..Default::default()
                },
            )
            .unwrap();

        let (runs, stats) = ingestor.finish().unwrap();
        assert!(runs.len() >= 3, "expected at least 3 runs, got {}", runs.len());
        assert_eq!(stats.total_docs, 3);
        assert_eq!(stats.run_count as usize, runs.len());
    }

    #[test]
    fn out_of_order_doc_id_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig::new(dir.path());
        let mut ingestor = Ingestor::new(&config);
        ingestor
            .add_document(0, DocumentFields::default())
            .unwrap();
        let err = ingestor.add_document(2, DocumentFields::default()).unwrap_err();
        match err {
            IndexError::Ordering { expected, actual } => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 2);
            }
            other => panic!("expected Ordering error, got {other:?}"),
        }
    }

    #[test]
    fn over_long_token_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig::new(dir.path()).with_max_word_cap(3);
        let mut ingestor = Ingestor::new(&config);
        let err = ingestor
            .add_document(
                0,
                DocumentFields {
                    body: toks(&["toolong"]),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, IndexError::Format { .. }));
    }

    #[test]
    fn empty_document_still_advances_doc_count() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig::new(dir.path());
        let mut ingestor = Ingestor::new(&config);
        ingestor
            .add_document(0, DocumentFields::default())
            .unwrap();
        let (runs, stats) = ingestor.finish().unwrap();
        assert_eq!(stats.total_docs, 1);
        assert!(runs.is_empty());
    }
}
