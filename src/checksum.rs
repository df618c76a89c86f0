//! Run-file integrity checking.
//!
//! Runs sit on disk between the ingestion flush that writes them and the
//! merge pass that reads them back; nothing else in this crate re-derives
//! their content, so a silently truncated or corrupted run would otherwise
//! surface as a confusing `FormatError` deep inside the k-way merge.
//! Grounded on `storage/checksum.rs`'s CRC32 wrapper around `crc32fast`,
//! narrowed to the one algorithm this crate needs.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{IndexError, Result};

/// CRC32 of `data`.
pub fn compute(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Sidecar checksum file path for a given run or partition file.
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".crc32");
    PathBuf::from(name)
}

/// Write `checksum` as decimal text to `path`'s sidecar file.
pub fn write_sidecar(path: &Path, checksum: u32) -> Result<()> {
    let sidecar = sidecar_path(path);
    let mut file = File::create(&sidecar).map_err(|e| IndexError::io(&sidecar, e))?;
    write!(file, "{checksum}").map_err(|e| IndexError::io(&sidecar, e))
}

/// Read the checksum recorded in `path`'s sidecar file.
pub fn read_sidecar(path: &Path) -> Result<u32> {
    let sidecar = sidecar_path(path);
    let recorded = std::fs::read_to_string(&sidecar).map_err(|e| IndexError::io(&sidecar, e))?;
    recorded
        .trim()
        .parse()
        .map_err(|_| IndexError::format(&sidecar, 0, "checksum sidecar is not a valid u32"))
}

/// Compare an `actual` checksum against the one recorded for `path`. A
/// mismatch (including a missing sidecar) is a fatal `FormatError`: every
/// run this crate reads was written by `write_run` in the same crate, so
/// its sidecar is always present unless the file was corrupted or
/// truncated out from under the build.
pub fn check(path: &Path, actual: u32) -> Result<()> {
    let recorded = read_sidecar(path)?;
    if actual != recorded {
        return Err(IndexError::format(
            path,
            0,
            format!("checksum mismatch: expected {recorded}, got {actual}"),
        ));
    }
    Ok(())
}

/// Verify `data` in full against the checksum recorded in `path`'s sidecar
/// file. Used where the whole buffer is already in memory; the run reader
/// instead hashes incrementally as it streams lines, to stay within the
/// bounded-memory design the rest of this crate follows.
pub fn verify_sidecar(path: &Path, data: &[u8]) -> Result<()> {
    check(path, compute(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_matches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temp_index_0.txt");
        let data = b"alpha=1=1=0 b1\n";
        write_sidecar(&path, compute(data)).unwrap();
        verify_sidecar(&path, data).unwrap();
    }

    #[test]
    fn tampered_data_fails_verification() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temp_index_0.txt");
        write_sidecar(&path, compute(b"alpha=1=1=0 b1\n")).unwrap();
        let err = verify_sidecar(&path, b"alpha=9=9=0 b1\n").unwrap_err();
        assert!(matches!(err, IndexError::Format { .. }));
    }
}
