//! CLI entry point.
//!
//! Wires configuration, directory preparation, ingestion, merge,
//! secondary-index build, and statistics reporting into one invocation.
//! Argument handling follows `bin/motedb-cli.rs`'s shape, ported to `clap`'s
//! derive API; see DESIGN.md for why `clap` moved from a dev-only
//! dependency to a real one here.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wikidex::config::BuildConfig;
use wikidex::tokenizer::WhitespaceTokenizer;
use wikidex::{run_build_from_reader, IndexError};

/// Build an offline, disk-resident inverted index over a document corpus.
#[derive(Parser, Debug)]
#[command(name = "wikidex-build", version, about)]
struct Cli {
    /// Path to the input document stream (one JSON object per line: title,
    /// infobox, body, category, link, reference).
    input: PathBuf,

    /// Directory to write the index into. Created if missing; existing
    /// files matching this build's output prefixes are purged first.
    /// Defaults to `index`, or to whatever `--config` sets if given.
    #[arg(long)]
    index_folder: Option<PathBuf>,

    /// Path to write the human-readable statistics report to.
    #[arg(long, default_value = "fileStat.txt")]
    stat_file: PathBuf,

    /// Path to a TOML config file to load `BuildConfig` from. Per-flag caps
    /// below, if given, override whatever this file sets.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Byte threshold at which the posting accumulator flushes a run.
    #[arg(long)]
    temp_file_cap: Option<u64>,

    /// Byte cap per primary partition (also the secondary index's cap).
    #[arg(long)]
    final_index_cap: Option<u64>,

    /// Maximum accepted token length.
    #[arg(long)]
    max_word_cap: Option<usize>,

    /// Entry cap per title-table file.
    #[arg(long)]
    title_file_cap: Option<usize>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Single exit path on fatal error, naming the file and offset
            // where applicable.
            eprintln!("wikidex-build: fatal: {err}");
            if let IndexError::Format { file, line, .. } = &err {
                eprintln!("  at {}:{}", file.display(), line);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> wikidex::Result<()> {
    let mut config = match &cli.config {
        Some(path) => BuildConfig::load(path)?,
        None => BuildConfig::default(),
    };
    if let Some(index_folder) = &cli.index_folder {
        config.index_folder_path = index_folder.clone();
    }
    if let Some(cap) = cli.temp_file_cap {
        config = config.with_temp_file_cap(cap);
    }
    if let Some(cap) = cli.final_index_cap {
        config = config.with_final_index_file_cap(cap);
    }
    if let Some(cap) = cli.max_word_cap {
        config = config.with_max_word_cap(cap);
    }
    if let Some(cap) = cli.title_file_cap {
        config = config.with_title_file_cap(cap);
    }

    let input_file = File::open(&cli.input).map_err(|e| IndexError::io(&cli.input, e))?;
    let reader = BufReader::new(input_file);

    // The reference tokenizer's max token length must agree with the
    // configured `max_word_cap`, or a token it happily emits can still be
    // rejected as a fatal FormatError at ingestion.
    let tokenizer = WhitespaceTokenizer::with_max_word_cap(config.max_word_cap);
    let stats = run_build_from_reader(&config, reader, tokenizer, &cli.stat_file)?;

    println!(
        "indexed {} documents, {} unique tokens, {} primary partitions",
        stats.total_docs, stats.unique_tokens, stats.primary_partition_count
    );
    Ok(())
}
