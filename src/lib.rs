//! wikidex: an offline, disk-resident inverted-index builder.
//!
//! Builds an out-of-core sort-merge inverted index over a corpus of
//! documents with a bounded working set: postings accumulate in memory
//! (see [`accumulator`]) until a byte threshold is crossed, at which point
//! they flush to a sorted on-disk run (see [`run`]); once ingestion (see
//! [`ingest`]) is complete, all runs are merged with a k-way heap merge
//! (see [`merge`]) into a final partitioned primary index with IDF
//! weights attached, and a sparse secondary index (see [`secondary`]) is
//! built over the partition heads.
//!
//! The XML parsing and real tokenization this system runs against
//! production Wikipedia-like dumps are treated as external collaborators;
//! this crate ships a minimal reference tokenizer and document reader
//! (see [`tokenizer`], [`document`]) so the pipeline can be driven end to
//! end, wired together by [`build::run_build`] / [`build::run_build_from_reader`].

pub mod accumulator;
pub mod build;
pub mod checksum;
pub mod config;
pub mod document;
pub mod error;
pub mod ingest;
pub mod merge;
pub mod model;
pub mod run;
pub mod secondary;
pub mod stats;
pub mod title;
pub mod tokenizer;

pub use build::{run_build, run_build_from_reader, InputDocument};
pub use config::BuildConfig;
pub use error::{IndexError, Result};
pub use stats::Statistics;
