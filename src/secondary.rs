//! Secondary (sparse) index builder.
//!
//! Reads only the first line of each primary partition, in ascending
//! partition order, and records `(first_token, partition_index)`. The
//! resulting table supports binary search over first-tokens to locate the
//! partition that may contain a queried token.
//!
//! Grounded on the chunked, paginated layout of `index/text_dictionary.rs`'s
//! `ChunkedDictionary` (entries split across capped chunk files, looked up
//! by a sparse index over chunk boundaries), generalized from a
//! token-to-TermId dictionary to a sparse first-token-to-partition table,
//! and simplified to a flat append. The dictionary's LRU chunk cache has no
//! counterpart here: this index is built once, read sequentially, and kept
//! in memory by whatever process queries it.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{IndexError, Result};
use crate::merge::parse_final_line_token;

/// Name of secondary-index file `k` inside `index_folder_path`.
pub fn secondary_file_name(dir: &Path, k: u64) -> PathBuf {
    dir.join(format!("secondary_index_{k}.txt"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryEntry {
    pub first_token: String,
    pub partition_index: u64,
}

/// Build the secondary index over `partitions` (already in ascending
/// partition order) and write it to one or more files capped at
/// `final_index_file_cap` bytes, the same cap the primary partitions use.
pub fn build_secondary_index(
    partitions: &[PathBuf],
    index_folder_path: &Path,
    final_index_file_cap: u64,
) -> Result<(Vec<PathBuf>, Vec<SecondaryEntry>)> {
    let mut entries = Vec::with_capacity(partitions.len());

    for (k, partition) in partitions.iter().enumerate() {
        let file = File::open(partition).map_err(|e| IndexError::io(partition, e))?;
        let mut reader = BufReader::new(file);
        let mut first_line = String::new();
        reader
            .read_line(&mut first_line)
            .map_err(|e| IndexError::io(partition, e))?;
        let trimmed = first_line.trim_end_matches(['\n', '\r']);
        if trimmed.is_empty() {
            continue; // an empty partition contributes no secondary entry
        }
        let token = parse_final_line_token(trimmed, partition, 1)?;
        entries.push(SecondaryEntry {
            first_token: token,
            partition_index: k as u64,
        });
    }

    let paths = write_secondary_files(&entries, index_folder_path, final_index_file_cap)?;
    Ok((paths, entries))
}

fn write_secondary_files(
    entries: &[SecondaryEntry],
    dir: &Path,
    cap: u64,
) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    let mut file_index = 0u64;
    let mut buffer = String::new();

    for entry in entries {
        buffer.push_str(&format!("{}={}\n", entry.first_token, entry.partition_index));
        if buffer.len() as u64 >= cap {
            paths.push(flush_buffer(&mut buffer, dir, file_index)?);
            file_index += 1;
        }
    }
    if !buffer.is_empty() {
        paths.push(flush_buffer(&mut buffer, dir, file_index)?);
    }
    Ok(paths)
}

fn flush_buffer(buffer: &mut String, dir: &Path, index: u64) -> Result<PathBuf> {
    let path = secondary_file_name(dir, index);
    let file = File::create(&path).map_err(|e| IndexError::io(&path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(buffer.as_bytes())
        .map_err(|e| IndexError::io(&path, e))?;
    writer.flush().map_err(|e| IndexError::io(&path, e))?;
    buffer.clear();
    Ok(path)
}

/// Binary search over a fully-loaded secondary index for the partition
/// that may contain `token`: the greatest `k` such that
/// `first_token(partition k) <= token`, or `None` if `token` sorts before
/// every partition's first token.
pub fn find_partition(entries: &[SecondaryEntry], token: &str) -> Option<u64> {
    match entries.binary_search_by(|e| e.first_token.as_str().cmp(token)) {
        Ok(i) => Some(entries[i].partition_index),
        Err(0) => None,
        Err(i) => Some(entries[i - 1].partition_index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_partition(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, lines.join("\n") + "\n").unwrap();
        path
    }

    #[test]
    fn secondary_entries_ascending_and_lookup_correct() {
        let dir = tempfile::tempdir().unwrap();
        let p0 = write_partition(dir.path(), "index_0.txt", &["apple=0=1=1=0 b1", "banana=0=1=1=0 b1"]);
        let p1 = write_partition(dir.path(), "index_1.txt", &["cherry=0=1=1=0 b1", "date=0=1=1=0 b1"]);

        let (_files, entries) = build_secondary_index(&[p0, p1], dir.path(), 1_000_000).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].first_token, "apple");
        assert_eq!(entries[1].first_token, "cherry");

        assert_eq!(find_partition(&entries, "apple"), Some(0));
        assert_eq!(find_partition(&entries, "banana"), Some(0));
        assert_eq!(find_partition(&entries, "cherry"), Some(1));
        assert_eq!(find_partition(&entries, "date"), Some(1));
        assert_eq!(find_partition(&entries, "zebra"), Some(1));
        assert_eq!(find_partition(&entries, "aardvark"), None);
    }

    #[test]
    fn secondary_index_respects_byte_cap() {
        let dir = tempfile::tempdir().unwrap();
        let p0 = write_partition(dir.path(), "index_0.txt", &["apple=0=1=1=0 b1"]);
        let p1 = write_partition(dir.path(), "index_1.txt", &["banana=0=1=1=0 b1"]);
        let p2 = write_partition(dir.path(), "index_2.txt", &["cherry=0=1=1=0 b1"]);

        let (files, _entries) = build_secondary_index(&[p0, p1, p2], dir.path(), 1).unwrap();
        assert!(files.len() >= 2, "small cap should force multiple secondary-index files");
    }
}
