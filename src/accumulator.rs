//! Posting accumulator.
//!
//! In-memory map token → TermBlock for documents seen since the last flush,
//! plus a running byte counter used as the flush trigger. Modeled the way
//! `storage/lsm/memtable.rs`'s `MemTable` tracks a `size: AtomicUsize`
//! alongside its sorted map and exposes `should_flush`/`size`/`iter`; here it
//! is single-threaded, so a plain counter replaces the atomic, and `BTreeMap`
//! gives the sorted drain for free instead of requiring a separate sort.

use std::collections::BTreeMap;

use crate::model::{DocId, Field, FieldCounts, PostingEntry};

/// Per-token aggregate since the last flush. A concrete record, not a
/// dynamic map-of-maps: earlier prior art kept this as a heterogeneous
/// dict (`{"doc_count": ..., "total_count": ..., "posting_list": [...]}`).
#[derive(Debug, Clone, Default)]
pub struct TermBlock {
    pub doc_count: u64,
    pub total_count: u64,
    pub posting_list: Vec<PostingEntry>,
}

impl TermBlock {
    /// Serialize as a RunLine body (everything after the leading token):
    /// `"<doc_count>=<total_count>=<p1>|<p2>|…"`.
    pub fn format_tail(&self) -> String {
        let postings = self
            .posting_list
            .iter()
            .map(PostingEntry::format)
            .collect::<Vec<_>>()
            .join("|");
        format!("{}={}={}", self.doc_count, self.total_count, postings)
    }
}

/// The six-field payload the ingestion façade hands to the accumulator for
/// one document.
#[derive(Debug, Clone, Default)]
pub struct DocumentFields {
    pub title: Vec<String>,
    pub infobox: Vec<String>,
    pub body: Vec<String>,
    pub category: Vec<String>,
    pub link: Vec<String>,
    pub reference: Vec<String>,
}

impl DocumentFields {
    fn streams(&self) -> [(Field, &[String]); 6] {
        [
            (Field::Title, &self.title),
            (Field::Infobox, &self.infobox),
            (Field::Body, &self.body),
            (Field::Category, &self.category),
            (Field::Link, &self.link),
            (Field::Reference, &self.reference),
        ]
    }
}

/// The accumulator: token → TermBlock, plus the cumulative posting byte
/// count added since the last drain.
#[derive(Debug, Default)]
pub struct Accumulator {
    terms: BTreeMap<String, TermBlock>,
    byte_count: u64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate one document's contribution. Builds a per-field
    /// token→count map for each of the six streams, unions them into a
    /// combined per-token count, then upserts every touched token's
    /// `TermBlock`. Documents must be presented in increasing docID order
    /// by the caller (the ingestion façade enforces this), which is what
    /// keeps each `TermBlock.posting_list` sorted by construction.
    pub fn add(&mut self, doc_id: DocId, fields: &DocumentFields) {
        let mut combined: std::collections::BTreeMap<&str, FieldCounts> = Default::default();

        for (field, tokens) in fields.streams() {
            for token in tokens {
                combined
                    .entry(token.as_str())
                    .or_insert_with(FieldCounts::new)
                    .add(field, 1);
            }
        }

        for (token, counts) in combined {
            let entry = PostingEntry::new(doc_id, counts);
            let formatted_len = entry.format().len() as u64;

            let block = self.terms.entry(token.to_string()).or_default();
            block.doc_count += 1;
            block.total_count += entry.counts.total() as u64;
            block.posting_list.push(entry);

            self.byte_count += formatted_len;
        }
    }

    /// Current cumulative posting bytes added since the last drain. This
    /// is an upper bound on in-RAM posting-list bytes, not on total
    /// resident memory (TermBlock headers and token strings add more), and
    /// the flush threshold is a soft budget, not a hard memory ceiling.
    pub fn size_bytes(&self) -> u64 {
        self.byte_count
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Drain all accumulated terms in ascending token order, emptying the
    /// accumulator. `BTreeMap::into_iter` already yields keys sorted, so
    /// no separate sort step is needed: this is the out-of-core analogue
    /// of `MemTable::iter()` feeding an SSTable flush.
    pub fn drain_sorted(&mut self) -> impl Iterator<Item = (String, TermBlock)> {
        self.byte_count = 0;
        std::mem::take(&mut self.terms).into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_document_single_token() {
        let mut acc = Accumulator::new();
        let fields = DocumentFields {
            body: toks(&["alpha"]),
            ..Default::default()
        };
        acc.add(0, &fields);
        let drained: Vec<_> = acc.drain_sorted().collect();
        assert_eq!(drained.len(), 1);
        let (token, block) = &drained[0];
        assert_eq!(token, "alpha");
        assert_eq!(block.doc_count, 1);
        assert_eq!(block.total_count, 1);
        assert_eq!(block.posting_list[0].format(), "0 b1");
    }

    #[test]
    fn multi_field_token_sums_counts() {
        let mut acc = Accumulator::new();
        let fields = DocumentFields {
            title: toks(&["x"]),
            body: toks(&["x", "x"]),
            category: toks(&["x"]),
            ..Default::default()
        };
        acc.add(0, &fields);
        let drained: Vec<_> = acc.drain_sorted().collect();
        let (_, block) = &drained[0];
        assert_eq!(block.total_count, 4);
        assert_eq!(block.posting_list[0].format(), "0 t1b2c1");
    }

    #[test]
    fn drain_empties_and_resets_byte_count() {
        let mut acc = Accumulator::new();
        acc.add(
            0,
            &DocumentFields {
                body: toks(&["a"]),
                ..Default::default()
            },
        );
        assert!(acc.size_bytes() > 0);
        let _: Vec<_> = acc.drain_sorted().collect();
        assert_eq!(acc.size_bytes(), 0);
        assert!(acc.is_empty());
    }

    #[test]
    fn ordering_preserved_within_term_block() {
        let mut acc = Accumulator::new();
        acc.add(
            0,
            &DocumentFields {
                body: toks(&["a"]),
                ..Default::default()
            },
        );
        acc.add(
            1,
            &DocumentFields {
                body: toks(&["a"]),
                ..Default::default()
            },
        );
        let drained: Vec<_> = acc.drain_sorted().collect();
        let (_, block) = &drained[0];
        let ids: Vec<DocId> = block.posting_list.iter().map(|p| p.doc_id).collect();
        assert_eq!(ids, vec![0, 1]);
    }
}
