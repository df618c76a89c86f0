//! Reference document reader.
//!
//! Reads a simple one-JSON-object-per-line document format and feeds it
//! through the reference tokenizer into `DocumentFields`. This stands in
//! for the out-of-scope MediaWiki XML/SAX parser: it is not a dump parser,
//! just enough of a line-oriented reader to drive the ingestion façade and
//! CLI end to end with a real `Read` source instead of hand-built
//! `DocumentFields` values.

use std::io::BufRead;

use serde::Deserialize;

use crate::accumulator::DocumentFields;
use crate::error::{IndexError, Result};
use crate::tokenizer::Tokenizer;

/// One line's raw JSON shape: free text per field, tokenized on read.
#[derive(Debug, Deserialize, Default)]
struct RawDocument {
    #[serde(default)]
    title: String,
    #[serde(default)]
    infobox: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    reference: String,
}

/// A document plus the title to hand to the title-table writer.
pub struct ReadDocument {
    pub fields: DocumentFields,
    pub title: String,
}

/// Reads one JSON document per line from `reader`, tokenizing each field
/// with `tokenizer`. DocIDs are assigned densely in read order starting
/// at 0, matching the ingestion façade's ordering requirement.
pub struct DocumentReader<R: BufRead, T: Tokenizer> {
    lines: std::io::Lines<R>,
    tokenizer: T,
    line_no: u64,
}

impl<R: BufRead, T: Tokenizer> DocumentReader<R, T> {
    pub fn new(reader: R, tokenizer: T) -> Self {
        Self {
            lines: reader.lines(),
            tokenizer,
            line_no: 0,
        }
    }

    /// Read and tokenize the next document, or `None` at end of input.
    /// Blank lines are skipped without consuming a docID.
    pub fn next_document(&mut self) -> Result<Option<ReadDocument>> {
        loop {
            let Some(line) = self.lines.next() else {
                return Ok(None);
            };
            self.line_no += 1;
            let line = line.map_err(|e| IndexError::io("<document stream>", e))?;
            if line.trim().is_empty() {
                continue;
            }

            let raw: RawDocument = serde_json::from_str(&line).map_err(|e| {
                IndexError::format("<document stream>", self.line_no, e.to_string())
            })?;

            let fields = DocumentFields {
                title: self.tokenizer.tokenize(&raw.title),
                infobox: self.tokenizer.tokenize(&raw.infobox),
                body: self.tokenizer.tokenize(&raw.body),
                category: self.tokenizer.tokenize(&raw.category),
                link: self.tokenizer.tokenize(&raw.link),
                reference: self.tokenizer.tokenize(&raw.reference),
            };

            return Ok(Some(ReadDocument {
                fields,
                title: raw.title,
            }));
        }
    }
}
