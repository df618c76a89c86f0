//! Run writer and reader.
//!
//! A run is a sorted, on-disk partial index: one RunLine per token,
//! `token=doc_count=total_count=p1|p2|…`. Grounded on the open/write/close
//! discipline of `storage/lsm/sstable.rs`'s `SSTable`/builder, simplified
//! from a block-indexed binary format down to a flat UTF-8 text file: this
//! index has no random-access read requirement during the build, only
//! sequential merge reads, so the block index and bloom filter apparatus
//! SSTable carries has no counterpart here.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::accumulator::TermBlock;
use crate::checksum;
use crate::error::{IndexError, Result};

/// Name of run file `k` inside `index_folder_path`.
pub fn run_file_name(dir: &Path, k: u64) -> PathBuf {
    dir.join(format!("temp_index_{k}.txt"))
}

/// Write every `(token, TermBlock)` pair yielded by the accumulator's
/// drain, in order, to a new run file. One line per token, `\n` terminated,
/// UTF-8. Failure to open or write is fatal to the build. Alongside the run
/// itself, writes a CRC32 sidecar file that `RunReader` checks on read.
pub fn write_run<I>(path: &Path, lines: I) -> Result<()>
where
    I: IntoIterator<Item = (String, TermBlock)>,
{
    let file = File::create(path).map_err(|e| IndexError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    let mut hasher = crc32fast::Hasher::new();
    for (token, block) in lines {
        let line = format!("{token}={}\n", block.format_tail());
        hasher.update(line.as_bytes());
        writer.write_all(line.as_bytes()).map_err(|e| IndexError::io(path, e))?;
    }
    writer.flush().map_err(|e| IndexError::io(path, e))?;
    checksum::write_sidecar(path, hasher.finalize())?;
    Ok(())
}

/// One parsed RunLine (and FinalLine body, which shares this shape minus
/// the `idf` field the merger inserts on emission).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub token: String,
    pub doc_count: u64,
    pub total_count: u64,
    /// Raw `p1|p2|…` posting-list string, kept unparsed: the merger only
    /// ever concatenates these with `|`, it never needs the structured
    /// `PostingEntry` form until a final consumer reads the index back.
    pub posting_list: String,
}

/// Parse one RunLine: `token=doc_count=total_count=p1|p2|…`. A malformed
/// line (wrong field count, non-integer counts) is a fatal `FormatError`
/// naming the file and line number.
pub fn parse_run_line(line: &str, file: &Path, line_no: u64) -> Result<ParsedLine> {
    let mut parts = line.splitn(4, '=');
    let token = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| IndexError::format(file, line_no, "missing token field"))?
        .to_string();
    let doc_count: u64 = parts
        .next()
        .ok_or_else(|| IndexError::format(file, line_no, "missing doc_count field"))?
        .parse()
        .map_err(|_| IndexError::format(file, line_no, "doc_count is not an integer"))?;
    let total_count: u64 = parts
        .next()
        .ok_or_else(|| IndexError::format(file, line_no, "missing total_count field"))?
        .parse()
        .map_err(|_| IndexError::format(file, line_no, "total_count is not an integer"))?;
    let posting_list = parts
        .next()
        .ok_or_else(|| IndexError::format(file, line_no, "missing posting_list field"))?
        .to_string();

    if parts.next().is_some() {
        return Err(IndexError::format(file, line_no, "too many '=' separated fields"));
    }

    Ok(ParsedLine {
        token,
        doc_count,
        total_count,
        posting_list,
    })
}

/// Sequential reader over one run file, buffering one line at a time: this
/// is exactly the access pattern the k-way merger needs (one read per heap
/// pop for the winning run).
pub struct RunReader {
    path: PathBuf,
    reader: BufReader<File>,
    line_no: u64,
    hasher: crc32fast::Hasher,
    verified: bool,
}

impl RunReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| IndexError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            line_no: 0,
            hasher: crc32fast::Hasher::new(),
            verified: false,
        })
    }

    /// Read and parse the next line, or `None` at end of file. Hashes
    /// every byte read along the way and, on reaching end of file, checks
    /// the accumulated checksum against the run's sidecar file before
    /// reporting `None`.
    pub fn next_line(&mut self) -> Result<Option<ParsedLine>> {
        let mut buf = String::new();
        let n = self
            .reader
            .read_line(&mut buf)
            .map_err(|e| IndexError::io(&self.path, e))?;
        if n == 0 {
            self.verify_at_eof()?;
            return Ok(None);
        }
        self.hasher.update(buf.as_bytes());
        self.line_no += 1;
        let trimmed = buf.trim_end_matches('\n').trim_end_matches('\r');
        if trimmed.is_empty() {
            self.verify_at_eof()?;
            return Ok(None);
        }
        parse_run_line(trimmed, &self.path, self.line_no).map(Some)
    }

    fn verify_at_eof(&mut self) -> Result<()> {
        if self.verified {
            return Ok(());
        }
        self.verified = true;
        let hasher = std::mem::replace(&mut self.hasher, crc32fast::Hasher::new());
        checksum::check(&self.path, hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn write_then_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = run_file_name(dir.path(), 0);

        let lines = vec![
            (
                "alpha".to_string(),
                block(1, 1, &[(0, &[(Field::Body, 1)])]),
            ),
            (
                "beta".to_string(),
                block(2, 3, &[(0, &[(Field::Title, 1)]), (1, &[(Field::Body, 2)])]),
            ),
        ];
        write_run(&path, lines).unwrap();

        let mut reader = RunReader::open(&path).unwrap();
        let first = reader.next_line().unwrap().unwrap();
        assert_eq!(first.token, "alpha");
        assert_eq!(first.doc_count, 1);
        assert_eq!(first.posting_list, "0 b1");

        let second = reader.next_line().unwrap().unwrap();
        assert_eq!(second.token, "beta");
        assert_eq!(second.posting_list, "0 t1|1 b2");

        assert!(reader.next_line().unwrap().is_none());
    }

    #[test]
    fn tampered_run_file_fails_checksum_at_eof() {
        let dir = tempfile::tempdir().unwrap();
        let path = run_file_name(dir.path(), 0);
        write_run(
            &path,
            vec![("alpha".to_string(), block(1, 1, &[(0, &[(Field::Body, 1)])]))],
        )
        .unwrap();

        // Append a byte after the sidecar was written, simulating corruption.
        let mut contents = std::fs::read_to_string(&path).unwrap();
        contents.push_str("beta=1=1=0 b1\n");
        std::fs::write(&path, contents).unwrap();

        let mut reader = RunReader::open(&path).unwrap();
        let first = reader.next_line().unwrap().unwrap();
        assert_eq!(first.token, "alpha");
        let second = reader.next_line().unwrap().unwrap();
        assert_eq!(second.token, "beta");
        let eof_err = reader.next_line().unwrap_err();
        assert!(matches!(eof_err, IndexError::Format { .. }));
    }

    #[test]
    fn malformed_line_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, "alpha=notanumber=1=0 b1\n").unwrap();

        let mut reader = RunReader::open(&path).unwrap();
        let err = reader.next_line().unwrap_err();
        match err {
            IndexError::Format { line, .. } => assert_eq!(line, 1),
            other => panic!("expected Format error, got {other:?}"),
        }
    }
}
