//! Build orchestrator.
//!
//! Owns the output directory for one build: purges stale files, drives
//! ingestion to completion, runs the k-way merge, builds the secondary
//! index, and assembles the final `Statistics` record. Grounded on the
//! open/prepare/run shape of `database/core.rs`'s top-level `MoteDB`
//! entry points, stripped of everything but the text-index pipeline this
//! crate implements.

use std::io::BufRead;
use std::time::Instant;

use tracing::{info, info_span};

use crate::accumulator::DocumentFields;
use crate::checksum;
use crate::config::BuildConfig;
use crate::document::DocumentReader;
use crate::error::Result;
use crate::ingest::Ingestor;
use crate::merge::merge_runs;
use crate::model::DocId;
use crate::secondary::build_secondary_index;
use crate::stats::{purge_stale_outputs, Statistics};
use crate::title::TitleWriter;
use crate::tokenizer::Tokenizer;

/// One document as the orchestrator's caller supplies it directly (the
/// non-CLI entry point; see `run_build_from_reader` for the CLI path that
/// goes through the reference tokenizer and document reader instead).
pub struct InputDocument {
    pub doc_id: DocId,
    pub title: String,
    pub fields: DocumentFields,
}

/// Run a full build over `documents`, in docID order, writing all outputs
/// under `config.index_folder_path` and the statistics report to
/// `report_path`. This is the library entry point for callers who already
/// have tokenized documents (e.g. from their own XML parser) and don't
/// need the reference tokenizer/document reader.
pub fn run_build<I>(config: &BuildConfig, documents: I, report_path: &std::path::Path) -> Result<Statistics>
where
    I: IntoIterator<Item = InputDocument>,
{
    purge_stale_outputs(&config.index_folder_path, report_path)?;

    let mut stats = Statistics::default();
    let mut tokens_encountered: u64 = 0;

    let ingest_span = info_span!("ingest");
    let ingest_start = Instant::now();
    let (run_paths, ingest_stats) = {
        let _guard = ingest_span.enter();
        let mut ingestor = Ingestor::new(config);
        let mut title_writer = TitleWriter::new(&config.index_folder_path, config.title_file_cap);

        for doc in documents {
            tokens_encountered += count_tokens(&doc.fields);
            title_writer.add(doc.doc_id, &doc.title)?;
            ingestor.add_document(doc.doc_id, doc.fields)?;
        }

        let title_paths = title_writer.finish()?;
        stats.title_file_count = title_paths.len() as u64;
        ingestor.finish()?
    };
    stats.set_ingest_elapsed(ingest_start.elapsed());
    stats.total_docs = ingest_stats.total_docs;
    stats.total_tokens_encountered = tokens_encountered;
    info!(run_count = ingest_stats.run_count, "ingestion phase done");

    let merge_span = info_span!("merge");
    let merge_start = Instant::now();
    let (partitions, merge_stats) = {
        let _guard = merge_span.enter();
        merge_runs(&run_paths, ingest_stats.total_docs, config)?
    };
    stats.set_merge_elapsed(merge_start.elapsed());
    stats.unique_tokens = merge_stats.unique_tokens;
    stats.total_tokens_indexed = merge_stats.total_tokens_indexed;
    stats.primary_partition_count = merge_stats.partition_count;

    // The merger never deletes runs; that is the façade's responsibility
    // once the merge has completed successfully. Each run's CRC32 sidecar
    // (written alongside it by `run::write_run`) is cleaned up here too, or
    // it would be left behind as litter even though its run is gone.
    for run_path in &run_paths {
        let _ = std::fs::remove_file(run_path);
        let _ = std::fs::remove_file(checksum::sidecar_path(run_path));
    }

    let secondary_span = info_span!("secondary_index");
    let secondary_start = Instant::now();
    let (secondary_paths, _entries) = {
        let _guard = secondary_span.enter();
        build_secondary_index(&partitions, &config.index_folder_path, config.final_index_file_cap)?
    };
    stats.set_secondary_index_elapsed(secondary_start.elapsed());
    stats.secondary_partition_count = secondary_paths.len() as u64;

    stats.measure_index_size(&config.index_folder_path, report_path)?;
    stats.write_report(report_path)?;

    info!(
        total_docs = stats.total_docs,
        unique_tokens = stats.unique_tokens,
        primary_partitions = stats.primary_partition_count,
        secondary_partitions = stats.secondary_partition_count,
        "build complete"
    );

    Ok(stats)
}

fn count_tokens(fields: &DocumentFields) -> u64 {
    (fields.title.len()
        + fields.infobox.len()
        + fields.body.len()
        + fields.category.len()
        + fields.link.len()
        + fields.reference.len()) as u64
}

/// Convenience entry point for the CLI: reads documents from `reader`
/// through the reference tokenizer, assigning docIDs densely in read
/// order, then runs the same build as `run_build`.
pub fn run_build_from_reader<R: BufRead, T: Tokenizer>(
    config: &BuildConfig,
    reader: R,
    tokenizer: T,
    report_path: &std::path::Path,
) -> Result<Statistics> {
    let mut doc_reader = DocumentReader::new(reader, tokenizer);
    let mut next_id: DocId = 0;
    let documents = std::iter::from_fn(move || {
        doc_reader
            .next_document()
            .transpose()
            .map(|result| {
                result.map(|doc| {
                    let input = InputDocument {
                        doc_id: next_id,
                        title: doc.title,
                        fields: doc.fields,
                    };
                    next_id += 1;
                    input
                })
            })
    });

    // Collect eagerly rather than threading the `Result` through
    // `IntoIterator`: `run_build` takes a plain iterator of
    // `InputDocument`, and a read/parse failure here should surface before
    // any ingestion work starts. Errors always surface to the caller;
    // nothing here is retried.
    let mut collected = Vec::new();
    for doc in documents {
        collected.push(doc?);
    }

    run_build(config, collected, report_path)
}
