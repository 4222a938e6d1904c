use crate::aggregate::{ProfileAggregator, SequenceProfile, TrackWriters};
use crate::annot::{load_cluster_table, load_read_clusters, CategorySet, ReadCategories};
use crate::error::ProfileError;
use crate::gff::{extract_intervals, masked_regions, GffWriter};
use crate::profile::build_window_profile;
use crate::reconcile::{reconcile, ReconciledProfile};
use crate::search::{AlignmentSearch, BlastnSearch};
use crate::windows::windows;
use crate::ProfileConfig;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use needletail::parse_fastx_file;
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Characters a sequence identifier may not contain: ids become parts of
/// track file names and GFF columns.
const FORBIDDEN_ID_CHARS: &[char] = &['/', '\\', '|'];

/// Windowing and normalisation settings for one profiling run.
#[derive(Debug, Clone)]
pub struct ProfileOptions {
    /// Window size in bp.
    pub window: usize,
    /// Overlap between neighbouring windows in bp.
    pub overlap: usize,
    /// Maximum number of window results held in memory at once.
    pub max_in_flight: usize,
    /// Optional coverage divisor converting hit counts to copy numbers.
    pub coverage: Option<f64>,
}

/// Outcome of one sequence within a run.
#[derive(Debug, Serialize, Deserialize)]
pub struct SequenceSummary {
    pub id: String,
    pub length: usize,
    pub windows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// JSON run summary.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub version: String,
    pub query: String,
    pub window: usize,
    pub overlap: usize,
    pub threads: usize,
    pub coverage: Option<f64>,
    pub sequences: Vec<SequenceSummary>,
    pub total_bp: u64,
    pub failed_sequences: u64,
    pub time: f64,
    pub bp_per_second: u64,
}

/// Build the complete repeat profile of one sequence.
///
/// The sequence's windows are dispatched to the rayon pool in batches of at
/// most `max_in_flight`; within a batch the search/build/reconcile chain of
/// each window runs independently, while `collect` hands results back in
/// window order so the merge sees global positions strictly left to right.
/// The first failing window aborts the whole sequence.
pub fn profile_sequence<S: AlignmentSearch + ?Sized>(
    seq_id: &str,
    sequence: &[u8],
    search: &S,
    categories: &CategorySet,
    reads: &ReadCategories,
    options: &ProfileOptions,
    progress: Option<&Arc<Mutex<ProgressBar>>>,
) -> Result<SequenceProfile, ProfileError> {
    check_coverage(options.coverage)?;
    let wins = windows(sequence.len(), options.window, options.overlap)?;
    let total = wins.len();

    let mut aggregator =
        ProfileAggregator::new(seq_id, sequence.len(), categories, options.coverage);
    let mut done = 0usize;
    for batch in wins.chunks(options.max_in_flight.max(1)) {
        let reconciled: Result<Vec<ReconciledProfile>, ProfileError> = batch
            .par_iter()
            .map(|win| {
                let subseq = &sequence[win.offset..win.offset + win.size];
                let hits = search.search(subseq)?;
                let profile = build_window_profile(*win, &hits, categories, reads)?;
                Ok(reconcile(profile, options.overlap, sequence.len()))
            })
            .collect();
        for profile in reconciled? {
            aggregator.merge(&profile);
        }
        done += batch.len();
        if let Some(spinner) = progress {
            spinner
                .lock()
                .set_message(format!("Profiling {}: {}/{} windows", seq_id, done, total));
        }
    }
    Ok(aggregator.finish())
}

/// A coverage divisor of zero or below would turn every stored count into
/// nonsense; reject it before any window is dispatched.
fn check_coverage(coverage: Option<f64>) -> Result<(), ProfileError> {
    match coverage {
        Some(cv) if cv <= 0.0 => Err(ProfileError::config(format!(
            "coverage divisor must be positive, got {}",
            cv
        ))),
        _ => Ok(()),
    }
}

/// Derive the coverage divisor from the genome size and the read database:
/// number of reads times read length over the genome size, with the read
/// length taken from the first database record.
pub fn coverage_from_genome_size(database: &Path, genome_size_mbp: f64) -> Result<f64> {
    if genome_size_mbp <= 0.0 {
        return Err(ProfileError::config(format!(
            "genome size must be positive, got {}",
            genome_size_mbp
        ))
        .into());
    }
    let mut reader = parse_fastx_file(database)
        .with_context(|| format!("Failed to open read database: {}", database.display()))?;
    let mut num_reads = 0u64;
    let mut read_length = 0usize;
    while let Some(record) = reader.next() {
        let record = record.context("Failed to parse read database record")?;
        if num_reads == 0 {
            read_length = record.seq().len();
        }
        num_reads += 1;
    }
    if num_reads == 0 {
        return Err(ProfileError::config(format!(
            "read database contains no sequences: {}",
            database.display()
        ))
        .into());
    }
    Ok(num_reads as f64 * read_length as f64 / (genome_size_mbp * 1e6))
}

/// Scan the query once up front and reject ids that would corrupt file
/// names or GFF columns.
fn check_sequence_ids(query: &str) -> Result<()> {
    let mut reader = parse_fastx_file(query)
        .with_context(|| format!("Failed to open query file: {}", query))?;
    let mut forbidden = Vec::new();
    while let Some(record) = reader.next() {
        let record = record.context("Failed to parse query record")?;
        let id = record_id(record.id());
        if id.contains(FORBIDDEN_ID_CHARS) {
            forbidden.push(id);
        }
    }
    if forbidden.is_empty() {
        Ok(())
    } else {
        Err(ProfileError::config(format!(
            "sequence ids contain forbidden characters (/ \\ |): {}",
            forbidden.join(", ")
        ))
        .into())
    }
}

/// First whitespace-delimited token of a FASTA header.
fn record_id(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .split_whitespace()
        .next()
        .unwrap_or("unknown")
        .to_string()
}

fn make_spinner(quiet: bool) -> Option<Arc<Mutex<ProgressBar>>> {
    if quiet {
        return None;
    }
    let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    Some(Arc::new(Mutex::new(pb)))
}

/// Run the full profiling pipeline with the blastn adapter.
pub fn run_profile(config: &ProfileConfig) -> Result<RunSummary> {
    let (categories, clusters) = load_cluster_table(&config.annotation_path)?;
    let reads = load_read_clusters(&config.cls_path, &clusters)?;
    let search = BlastnSearch::new(config.database_path.clone(), config.search.clone());
    run_with_search(config, &search, &categories, &reads)
}

/// Run the full profiling pipeline against any alignment search
/// implementation. Sequences are processed one after another; a failing
/// sequence is reported and skipped without touching the others.
pub fn run_with_search<S: AlignmentSearch + ?Sized>(
    config: &ProfileConfig,
    search: &S,
    categories: &CategorySet,
    reads: &ReadCategories,
) -> Result<RunSummary> {
    let start_time = Instant::now();
    let version = env!("CARGO_PKG_VERSION").to_string();

    if config.options.window <= config.options.overlap {
        return Err(ProfileError::config(format!(
            "window ({}) must be greater than overlap ({})",
            config.options.window, config.options.overlap
        ))
        .into());
    }

    let mut options = config.options.clone();
    if options.coverage.is_none() {
        if let Some(genome_size) = config.genome_size {
            options.coverage =
                Some(coverage_from_genome_size(&config.database_path, genome_size)?);
        }
    }
    check_coverage(options.coverage)?;

    let pool = match config.threads {
        0 => None,
        threads => Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .context("Failed to initialize thread pool")?,
        ),
    };

    if !config.quiet {
        eprintln!(
            "repcov v{}; window={}, overlap={}, threads={}, categories={}",
            version,
            options.window,
            options.overlap,
            config.threads,
            categories.len()
        );
    }

    check_sequence_ids(&config.query_path)?;

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            config.output_dir.display()
        )
    })?;
    let mut repeat_gff = GffWriter::create(&config.output_dir.join(&config.gff_name))?;
    let mut masked_gff = GffWriter::create(&config.output_dir.join(&config.masked_gff_name))?;
    let mut tracks = TrackWriters::new(&config.output_dir);

    let spinner = make_spinner(config.quiet);
    let mut summaries = Vec::new();
    let mut total_bp = 0u64;

    let mut reader = parse_fastx_file(&config.query_path)
        .with_context(|| format!("Failed to open query file: {}", config.query_path))?;
    while let Some(record) = reader.next() {
        let record = record.context("Failed to parse query record")?;
        let seq_id = record_id(record.id());
        let sequence = record.seq().into_owned();
        total_bp += sequence.len() as u64;

        for region in masked_regions(&seq_id, &sequence, config.masked_min_segment) {
            masked_gff.write_masked(&region)?;
        }

        let window_count = windows(sequence.len(), options.window, options.overlap)
            .map(|w| w.len())
            .unwrap_or(0);
        let profiled = || {
            profile_sequence(
                &seq_id,
                &sequence,
                search,
                categories,
                reads,
                &options,
                spinner.as_ref(),
            )
        };
        let result = match &pool {
            Some(pool) => pool.install(profiled),
            None => profiled(),
        };
        match result {
            Ok(profile) => {
                tracks.append(categories, &profile)?;
                for interval in
                    extract_intervals(&profile, categories, config.threshold, config.min_segment)?
                {
                    repeat_gff.write_repeat(&interval)?;
                }
                summaries.push(SequenceSummary {
                    id: seq_id,
                    length: sequence.len(),
                    windows: window_count,
                    error: None,
                });
            }
            Err(e) => {
                eprintln!("Sequence {} failed: {}", seq_id, e);
                summaries.push(SequenceSummary {
                    id: seq_id,
                    length: sequence.len(),
                    windows: window_count,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    repeat_gff.finish()?;
    masked_gff.finish()?;
    tracks.finish()?;
    if let Some(pb) = &spinner {
        pb.lock().finish_and_clear();
    }

    let time = start_time.elapsed().as_secs_f64();
    let failed_sequences = summaries.iter().filter(|s| s.error.is_some()).count() as u64;
    let summary = RunSummary {
        version,
        query: config.query_path.clone(),
        window: options.window,
        overlap: options.overlap,
        threads: config.threads,
        coverage: options.coverage,
        total_bp,
        failed_sequences,
        sequences: summaries,
        time,
        bp_per_second: (total_bp as f64 / time) as u64,
    };

    if let Some(path) = &config.summary_path {
        let file = File::create(path)
            .with_context(|| format!("Failed to create summary file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &summary)?;
        writeln!(writer)?;
    }

    if !config.quiet {
        eprintln!(
            "Profiled {} sequence(s), {} bp in {:.1}s ({} failed)",
            summary.sequences.len(),
            summary.total_bp,
            summary.time,
            summary.failed_sequences
        );
    }

    Ok(summary)
}
