//! Core data model: fields, postings, and the in-memory per-term record.
//!
//! Grounded on the field/posting shape of `index/text_types.rs` and
//! `index/text_fts.rs` (term/doc ids, per-field counts), generalized to six
//! fixed Wikipedia-like fields, each given a distinct serialization code.
//! Earlier prior art emitted `t` for every field, which loses the field
//! distinction entirely; that is treated as a defect here, not preserved.

use std::fmt;

/// Document identifier. Assigned densely and monotonically by the
/// ingestion façade starting at 0.
pub type DocId = u64;

/// The fixed, ordered set of fields a document can contribute tokens from.
/// Order here is the order postings are serialized in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Title,
    Infobox,
    Body,
    Category,
    Link,
    Reference,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Title,
        Field::Infobox,
        Field::Body,
        Field::Category,
        Field::Link,
        Field::Reference,
    ];

    /// Single-character serialization code. Codes are pairwise distinct.
    pub fn code(self) -> char {
        match self {
            Field::Title => 't',
            Field::Infobox => 'i',
            Field::Body => 'b',
            Field::Category => 'c',
            Field::Link => 'l',
            Field::Reference => 'r',
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Per-field occurrence counts for one (token, document) pair. A field
/// absent from the document simply never sets its entry; zero counts are
/// never serialized (see `PostingEntry::format`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldCounts {
    counts: [u32; 6],
}

impl FieldCounts {
    pub fn new() -> Self {
        Self::default()
    }

    fn index(field: Field) -> usize {
        match field {
            Field::Title => 0,
            Field::Infobox => 1,
            Field::Body => 2,
            Field::Category => 3,
            Field::Link => 4,
            Field::Reference => 5,
        }
    }

    pub fn add(&mut self, field: Field, count: u32) {
        self.counts[Self::index(field)] += count;
    }

    pub fn get(&self, field: Field) -> u32 {
        self.counts[Self::index(field)]
    }

    /// Sum across all six fields: this token's total occurrence count in
    /// the document.
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }
}

/// One document's contribution to a token's posting list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingEntry {
    pub doc_id: DocId,
    pub counts: FieldCounts,
}

impl PostingEntry {
    pub fn new(doc_id: DocId, counts: FieldCounts) -> Self {
        Self { doc_id, counts }
    }

    /// `"<docID> <tag1><count1><tag2><count2>…"`, tags in fixed field
    /// order, zero counts elided.
    pub fn format(&self) -> String {
        let mut s = format!("{} ", self.doc_id);
        for field in Field::ALL {
            let c = self.counts.get(field);
            if c > 0 {
                s.push(field.code());
                s.push_str(&c.to_string());
            }
        }
        s
    }

    /// Parse one `"<docID> <tag><count>…"` posting string, as it appears
    /// inside a RunLine/FinalLine posting list. `file`/`line` are carried
    /// only to produce a precise `FormatError`.
    pub fn parse(s: &str, file: &std::path::Path, line: u64) -> crate::error::Result<Self> {
        use crate::error::IndexError;

        let (doc_str, tag_run) = s.split_once(' ').ok_or_else(|| {
            IndexError::format(file, line, format!("posting entry missing space: {s:?}"))
        })?;
        let doc_id: DocId = doc_str.parse().map_err(|_| {
            IndexError::format(file, line, format!("invalid docID in posting: {doc_str:?}"))
        })?;

        let mut counts = FieldCounts::new();
        let mut chars = tag_run.chars().peekable();
        while let Some(code) = chars.next() {
            let field = Field::ALL.into_iter().find(|f| f.code() == code).ok_or_else(|| {
                IndexError::format(file, line, format!("unknown field code {code:?} in {s:?}"))
            })?;
            let mut digits = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_digit() {
                    digits.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            if digits.is_empty() {
                return Err(IndexError::format(
                    file,
                    line,
                    format!("field code {code:?} missing count in {s:?}"),
                ));
            }
            let count: u32 = digits.parse().map_err(|_| {
                IndexError::format(file, line, format!("invalid count {digits:?} in {s:?}"))
            })?;
            counts.add(field, count);
        }

        Ok(PostingEntry { doc_id, counts })
    }
}

/// Validate a token against the configured maximum length. Enforced at
/// ingestion (see `ingest::Ingestor`), not deferred to the tokenizer: an
/// over-long token is a `FormatError`, fatal to the build. `FormatError`'s
/// `file`/`line` fields are repurposed here to identify the offending
/// document rather than an on-disk file, since the violation happens
/// in-memory, before any run file exists.
pub fn check_token_len(token: &str, max_word_cap: usize, doc_id: DocId) -> crate::error::Result<()> {
    if token.chars().count() > max_word_cap {
        return Err(crate::error::IndexError::format(
            "<ingestion>",
            doc_id,
            format!("document {doc_id}: token {token:?} exceeds max_word_cap={max_word_cap}"),
        ));
    }
    Ok(())
}
