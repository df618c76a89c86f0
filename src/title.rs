//! Title-table writer.
//!
//! An independent sink from the posting pipeline: receives `(docID,
//! title)` pairs in docID order and rotates them into `title_<k>.txt`
//! files once the buffered entry count reaches `title_file_cap` (an entry
//! count, not a byte cap, unlike the primary/secondary index caps).
//! Failures here are fatal the same way run-writer and merge-emitter
//! failures are: this sink has no retry path either.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{IndexError, Result};
use crate::model::DocId;

pub fn title_file_name(dir: &Path, k: u64) -> PathBuf {
    dir.join(format!("title_{k}.txt"))
}

pub struct TitleWriter<'a> {
    dir: &'a Path,
    cap: usize,
    buffer: Vec<(DocId, String)>,
    file_index: u64,
    paths: Vec<PathBuf>,
}

impl<'a> TitleWriter<'a> {
    pub fn new(dir: &'a Path, cap: usize) -> Self {
        Self {
            dir,
            cap: cap.max(1),
            buffer: Vec::new(),
            file_index: 0,
            paths: Vec::new(),
        }
    }

    pub fn add(&mut self, doc_id: DocId, title: &str) -> Result<()> {
        self.buffer.push((doc_id, title.to_string()));
        if self.buffer.len() >= self.cap {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let path = title_file_name(self.dir, self.file_index);
        let file = File::create(&path).map_err(|e| IndexError::io(&path, e))?;
        let mut writer = BufWriter::new(file);
        for (doc_id, title) in self.buffer.drain(..) {
            writeln!(writer, "{doc_id}={title}").map_err(|e| IndexError::io(&path, e))?;
        }
        writer.flush().map_err(|e| IndexError::io(&path, e))?;
        self.paths.push(path);
        self.file_index += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<Vec<PathBuf>> {
        self.flush()?;
        Ok(self.paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotates_at_cap() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = TitleWriter::new(dir.path(), 2);
        writer.add(0, "Alpha").unwrap();
        writer.add(1, "Beta").unwrap();
        writer.add(2, "Gamma").unwrap();
        let paths = writer.finish().unwrap();
        assert_eq!(paths.len(), 2);

        let first = std::fs::read_to_string(&paths[0]).unwrap();
        assert_eq!(first, "0=Alpha\n1=Beta\n");
        let second = std::fs::read_to_string(&paths[1]).unwrap();
        assert_eq!(second, "2=Gamma\n");
    }
}
