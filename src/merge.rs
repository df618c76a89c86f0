//! K-way merger, the dense part of the pipeline.
//!
//! Streams all R sorted run files through a min-heap of `(token,
//! run_index)` pairs, merging same-token groups across runs and emitting
//! FinalLines into byte-capped primary partitions with IDF attached.
//!
//! Grounded on `storage/lsm/merging_iterator.rs`'s `MergingIterator`
//! (`BinaryHeap<Reverse<HeapItem>>`, one entry per source, refill-on-pop)
//! generalized from two-way key/value dedup with MVCC timestamps to
//! R-way same-token aggregation, and on `storage/lsm/compaction.rs`'s
//! buffer-then-flush-at-cap emission into `Level` files. The tie-break on
//! equal tokens is pinned to ascending run index; see DESIGN.md.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::BuildConfig;
use crate::error::{IndexError, Result};
use crate::run::{ParsedLine, RunReader};

/// Name of primary partition `k` inside `index_folder_path`.
pub fn partition_file_name(dir: &Path, k: u64) -> PathBuf {
    dir.join(format!("index_{k}.txt"))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MergeStats {
    pub unique_tokens: u64,
    pub total_tokens_indexed: u64,
    pub partition_count: u64,
}

/// One run's current position: the parsed line last read from it, still
/// pending consumption by the heap.
struct RunCursor {
    reader: RunReader,
    current: Option<ParsedLine>,
}

impl RunCursor {
    fn open(path: &Path) -> Result<Self> {
        let mut reader = RunReader::open(path)?;
        let current = reader.next_line()?;
        Ok(Self { reader, current })
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.reader.next_line()?;
        Ok(())
    }
}

/// Heap key: token ascending, ties broken by run index ascending. Wrapped
/// in `Reverse` so `BinaryHeap` (a max-heap) behaves as a min-heap.
#[derive(Debug, Clone, Eq, PartialEq)]
struct HeapKey {
    token: String,
    run_index: usize,
}

impl Ord for HeapKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.token.cmp(&other.token).then(self.run_index.cmp(&other.run_index))
    }
}

impl PartialOrd for HeapKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Accumulator for the current merge group (one token's aggregate across
/// however many runs contain it).
struct MergeGroup {
    token: String,
    doc_count: u64,
    total_count: u64,
    posting_list: String,
}

impl MergeGroup {
    fn format(&self, total_docs: u64) -> Result<String> {
        if self.doc_count == 0 {
            return Err(IndexError::Assertion(format!(
                "doc_count == 0 computing IDF for token {:?}",
                self.token
            )));
        }
        let idf = (total_docs as f64 / self.doc_count as f64).log10();
        Ok(format!(
            "{}={}={}={}={}",
            self.token, idf, self.doc_count, self.total_count, self.posting_list
        ))
    }
}

/// Partition writer: buffers FinalLines and rotates into a new partition
/// file once the buffer reaches `final_index_file_cap` bytes.
struct PartitionWriter<'a> {
    dir: &'a Path,
    cap: u64,
    index: u64,
    buffer: String,
    paths: Vec<PathBuf>,
}

impl<'a> PartitionWriter<'a> {
    fn new(dir: &'a Path, cap: u64) -> Self {
        Self {
            dir,
            cap,
            index: 0,
            buffer: String::new(),
            paths: Vec::new(),
        }
    }

    fn push_line(&mut self, line: &str) -> Result<()> {
        self.buffer.push_str(line);
        self.buffer.push('\n');
        if self.buffer.len() as u64 >= self.cap {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let path = partition_file_name(self.dir, self.index);
        let file = File::create(&path).map_err(|e| IndexError::io(&path, e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(self.buffer.as_bytes())
            .map_err(|e| IndexError::io(&path, e))?;
        writer.flush().map_err(|e| IndexError::io(&path, e))?;
        debug!(partition = self.index, bytes = self.buffer.len(), "flushed primary partition");
        self.paths.push(path);
        self.index += 1;
        self.buffer.clear();
        Ok(())
    }
}

/// Merge all run files into the final partitioned index. Opens every run,
/// seeds the heap with each run's first line (closing any run that is
/// empty), then repeatedly pops the minimum `(token, run_index)`,
/// aggregates same-token groups, and emits FinalLines as groups close.
/// Run files are never deleted here; that is the ingestion façade's
/// responsibility once the merge completes successfully.
pub fn merge_runs(run_paths: &[PathBuf], total_docs: u64, config: &BuildConfig) -> Result<(Vec<PathBuf>, MergeStats)> {
    let mut cursors: Vec<RunCursor> = Vec::with_capacity(run_paths.len());
    let mut heap: BinaryHeap<Reverse<HeapKey>> = BinaryHeap::new();

    for path in run_paths {
        let cursor = RunCursor::open(path)?;
        if let Some(line) = &cursor.current {
            heap.push(Reverse(HeapKey {
                token: line.token.clone(),
                run_index: cursors.len(),
            }));
        }
        cursors.push(cursor);
    }

    let mut writer = PartitionWriter::new(&config.index_folder_path, config.final_index_file_cap);
    let mut stats = MergeStats::default();
    let mut current: Option<MergeGroup> = None;

    while let Some(Reverse(HeapKey { token, run_index })) = heap.pop() {
        let parsed = cursors[run_index]
            .current
            .take()
            .expect("heap entry without a buffered line");

        debug_assert_eq!(parsed.token, token);

        match &mut current {
            Some(group) if group.token == token => {
                group.doc_count += parsed.doc_count;
                group.total_count += parsed.total_count;
                group.posting_list.push('|');
                group.posting_list.push_str(&parsed.posting_list);
            }
            _ => {
                if let Some(group) = current.take() {
                    emit(&group, total_docs, &mut writer, &mut stats)?;
                }
                current = Some(MergeGroup {
                    token: parsed.token.clone(),
                    doc_count: parsed.doc_count,
                    total_count: parsed.total_count,
                    posting_list: parsed.posting_list.clone(),
                });
            }
        }

        cursors[run_index].advance()?;
        if let Some(next) = &cursors[run_index].current {
            heap.push(Reverse(HeapKey {
                token: next.token.clone(),
                run_index,
            }));
        }
    }

    if let Some(group) = current.take() {
        emit(&group, total_docs, &mut writer, &mut stats)?;
    }
    writer.flush()?;
    stats.partition_count = writer.paths.len() as u64;

    info!(
        unique_tokens = stats.unique_tokens,
        partitions = stats.partition_count,
        "k-way merge complete"
    );

    Ok((writer.paths, stats))
}

fn emit(group: &MergeGroup, total_docs: u64, writer: &mut PartitionWriter, stats: &mut MergeStats) -> Result<()> {
    let line = group.format(total_docs)?;
    writer.push_line(&line)?;
    stats.unique_tokens += 1;
    stats.total_tokens_indexed += group.total_count;
    Ok(())
}

/// Parse one FinalLine's `idf` field back out, for the secondary index
/// builder's callers and for tests that check the IDF law. Not on the hot
/// merge path.
pub fn parse_final_line_token(line: &str, file: &Path, line_no: u64) -> Result<String> {
    line.split_once('=')
        .map(|(tok, _)| tok.to_string())
        .ok_or_else(|| IndexError::format(file, line_no, "missing token field"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::write_run;
    use crate::accumulator::TermBlock;
    use crate::model::{Field, FieldCounts, PostingEntry};

    fn block(doc_count: u64, total_count: u64, postings: &[(u64, &[(Field, u32)])]) -> TermBlock {
        let posting_list = postings
            .iter()
            .map(|(doc_id, counts)| {
                let mut fc = FieldCounts::new();
                for (f, c) in *counts {
                    fc.add(*f, *c);
                }
                PostingEntry::new(*doc_id, fc)
            })
            .collect();
        TermBlock {
            doc_count,
            total_count,
            posting_list,
        }
    }

    #[test]
    fn single_document_single_token() {
        let dir = tempfile::tempdir().unwrap();
        let run_path = dir.path().join("temp_index_0.txt");
        write_run(
            &run_path,
            vec![("alpha".to_string(), block(1, 1, &[(0, &[(Field::Body, 1)])]))],
        )
        .unwrap();

        let config = BuildConfig::new(dir.path());
        let (partitions, stats) = merge_runs(&[run_path], 1, &config).unwrap();
        assert_eq!(partitions.len(), 1);
        assert_eq!(stats.unique_tokens, 1);

        let content = std::fs::read_to_string(&partitions[0]).unwrap();
        assert_eq!(content.trim(), "alpha=0=1=1=0 b1");
    }

    #[test]
    fn two_documents_overlapping_token_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let run0 = dir.path().join("temp_index_0.txt");
        let run1 = dir.path().join("temp_index_1.txt");
        write_run(
            &run0,
            vec![("beta".to_string(), block(1, 1, &[(0, &[(Field::Title, 1)])]))],
        )
        .unwrap();
        write_run(
            &run1,
            vec![("beta".to_string(), block(1, 2, &[(1, &[(Field::Body, 2)])]))],
        )
        .unwrap();

        let config = BuildConfig::new(dir.path());
        let (partitions, stats) = merge_runs(&[run0, run1], 2, &config).unwrap();
        assert_eq!(stats.unique_tokens, 1);
        let content = std::fs::read_to_string(&partitions[0]).unwrap();
        assert_eq!(content.trim(), "beta=0=2=3=0 t1|1 b2");
    }

    #[test]
    fn partition_split_on_small_cap() {
        let dir = tempfile::tempdir().unwrap();
        let run0 = dir.path().join("temp_index_0.txt");
        write_run(
            &run0,
            vec![
                ("alpha".to_string(), block(1, 1, &[(0, &[(Field::Body, 1)])])),
                ("beta".to_string(), block(1, 1, &[(0, &[(Field::Body, 1)])])),
                ("gamma".to_string(), block(1, 1, &[(0, &[(Field::Body, 1)])])),
            ],
        )
        .unwrap();

        let config = BuildConfig::new(dir.path()).with_final_index_file_cap(1);
        let (partitions, _stats) = merge_runs(&[run0], 1, &config).unwrap();
        assert!(partitions.len() >= 2, "expected a partition split, got {}", partitions.len());

        let mut first_tokens = Vec::new();
        for p in &partitions {
            let content = std::fs::read_to_string(p).unwrap();
            let first_line = content.lines().next().unwrap();
            first_tokens.push(parse_final_line_token(first_line, p, 1).unwrap());
        }
        let mut sorted = first_tokens.clone();
        sorted.sort();
        assert_eq!(first_tokens, sorted, "partitions must be produced in ascending token order");
    }

    #[test]
    fn idf_law_holds() {
        let dir = tempfile::tempdir().unwrap();
        let run0 = dir.path().join("temp_index_0.txt");
        write_run(
            &run0,
            vec![("x".to_string(), block(2, 2, &[(0, &[(Field::Body, 1)]), (1, &[(Field::Body, 1)])]))],
        )
        .unwrap();
        let config = BuildConfig::new(dir.path());
        let (partitions, _) = merge_runs(&[run0], 4, &config).unwrap();
        let content = std::fs::read_to_string(&partitions[0]).unwrap();
        let idf: f64 = content.trim().split('=').nth(1).unwrap().parse().unwrap();
        let expected = (4.0_f64 / 2.0).log10();
        assert!((idf - expected).abs() < 1e-12);
    }
}
