//! # repcov
//!
//! Windowed repeat coverage profiling of genomic sequences.
//!
//! Long sequences are searched against a read database in overlapping
//! windows processed in parallel; the per-window results are trimmed and
//! stitched into one gap-free, non-duplicated profile per sequence and
//! repeat category, then written as wiggle tracks and GFF3 repeat
//! annotations.
//!
#![doc = include_str!("../README.md")]

pub mod aggregate;
pub mod annot;
pub mod error;
pub mod filter;
pub mod gff;
pub mod profile;
pub mod reconcile;
pub mod run;
pub mod search;
pub mod sparse;
pub mod windows;

pub use aggregate::{ProfileAggregator, SequenceProfile, TrackWriters};
pub use annot::{CategorySet, ReadCategories, ALL_LABEL};
pub use error::ProfileError;
pub use filter::{filter_gff, FilterStats, FilterThresholds};
pub use gff::{extract_intervals, masked_regions, Interval};
pub use run::{
    coverage_from_genome_size, profile_sequence, run_with_search, ProfileOptions, RunSummary,
};
pub use search::{AlignmentSearch, BlastnSearch, RawHit, SearchParams};
pub use sparse::retained_indices;
pub use windows::{windows, Window, WindowRole};

use anyhow::Result;
use std::path::{Path, PathBuf};

pub const DEFAULT_WINDOW: usize = 5000;
pub const DEFAULT_OVERLAP: usize = 150;
pub const DEFAULT_THRESHOLD: u64 = 5;
pub const DEFAULT_MIN_SEGMENT: usize = 80;
pub const DEFAULT_MASKED_MIN_SEGMENT: usize = 50;
pub const DEFAULT_MAX_IN_FLIGHT: usize = 1000;

/// Configuration for one profiling run.
pub struct ProfileConfig {
    /// Path to the query FASTA file.
    pub query_path: String,

    /// Path to the read database searched by the alignment engine.
    pub database_path: PathBuf,

    /// Path to the cluster annotation table (`<cluster> <category>` lines).
    pub annotation_path: PathBuf,

    /// Path to the cluster listing assigning reads to clusters.
    pub cls_path: PathBuf,

    /// Windowing and normalisation settings.
    pub options: run::ProfileOptions,

    /// Genome size in Mbp; when set and no explicit coverage divisor is
    /// given, the divisor is derived from it and the read database.
    pub genome_size: Option<f64>,

    /// Similarity-search settings and hit acceptance thresholds.
    pub search: search::SearchParams,

    /// Minimum per-position count (exclusive) for a repeat interval.
    pub threshold: u64,

    /// Minimum repeat interval length (exclusive) in bp.
    pub min_segment: usize,

    /// Minimum masked (N) region length (exclusive) in bp.
    pub masked_min_segment: usize,

    /// Directory receiving GFF files and wiggle tracks.
    pub output_dir: PathBuf,

    /// Repeat annotation file name within the output directory.
    pub gff_name: String,

    /// Masked-region annotation file name within the output directory.
    pub masked_gff_name: String,

    /// Optional path to a JSON run summary.
    pub summary_path: Option<PathBuf>,

    /// Number of execution threads (0 = auto).
    pub threads: usize,

    /// Suppress progress reporting.
    pub quiet: bool,
}

impl ProfileConfig {
    /// Create a configuration with default windowing and output names.
    pub fn new<P: AsRef<Path>>(query_path: &str, database_path: P) -> Self {
        Self {
            query_path: query_path.to_string(),
            database_path: database_path.as_ref().to_path_buf(),
            annotation_path: PathBuf::new(),
            cls_path: PathBuf::new(),
            options: run::ProfileOptions {
                window: DEFAULT_WINDOW,
                overlap: DEFAULT_OVERLAP,
                max_in_flight: DEFAULT_MAX_IN_FLIGHT,
                coverage: None,
            },
            genome_size: None,
            search: search::SearchParams::default(),
            threshold: DEFAULT_THRESHOLD,
            min_segment: DEFAULT_MIN_SEGMENT,
            masked_min_segment: DEFAULT_MASKED_MIN_SEGMENT,
            output_dir: PathBuf::from("."),
            gff_name: "repeats.gff3".to_string(),
            masked_gff_name: "n_regions.gff3".to_string(),
            summary_path: None,
            threads: 0,
            quiet: false,
        }
    }

    /// Set the annotation table path
    pub fn with_annotation<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.annotation_path = path.as_ref().to_path_buf();
        self
    }

    /// Set the cluster listing path
    pub fn with_cls<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cls_path = path.as_ref().to_path_buf();
        self
    }

    /// Set window size and overlap
    pub fn with_windowing(mut self, window: usize, overlap: usize) -> Self {
        self.options.window = window;
        self.options.overlap = overlap;
        self
    }

    /// Set the coverage divisor for copy-number output
    pub fn with_coverage(mut self, coverage: f64) -> Self {
        self.options.coverage = Some(coverage);
        self
    }

    /// Set the genome size (Mbp) for deriving the coverage divisor
    pub fn with_genome_size(mut self, genome_size: f64) -> Self {
        self.genome_size = Some(genome_size);
        self
    }

    /// Set the output directory
    pub fn with_output_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the interval reporting thresholds
    pub fn with_thresholds(mut self, threshold: u64, min_segment: usize) -> Self {
        self.threshold = threshold;
        self.min_segment = min_segment;
        self
    }

    /// Set the summary path
    pub fn with_summary<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.summary_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the num threads
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Execute the profiling run with the blastn search adapter.
    pub fn execute(&self) -> Result<run::RunSummary> {
        run::run_profile(self)
    }
}

/// Configuration for annotation-record quality filtering.
pub struct GffFilterConfig {
    /// Path to the input GFF file.
    pub input_path: PathBuf,

    /// Path to the filtered output GFF file.
    pub output_path: PathBuf,

    /// Quality thresholds and classification selector.
    pub thresholds: filter::FilterThresholds,
}

impl GffFilterConfig {
    pub fn new<P: AsRef<Path>>(input_path: P, output_path: P) -> Self {
        Self {
            input_path: input_path.as_ref().to_path_buf(),
            output_path: output_path.as_ref().to_path_buf(),
            thresholds: filter::FilterThresholds::default(),
        }
    }

    /// Execute the filtering pass with this configuration.
    pub fn execute(&self) -> Result<filter::FilterStats> {
        filter::filter_gff(&self.input_path, &self.output_path, &self.thresholds)
    }
}
