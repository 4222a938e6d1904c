use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Windowed repeat coverage profiling with GFF3 and wiggle output", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build repeat coverage profiles, wiggle tracks and GFF3 annotations
    Profile {
        /// Path to query FASTA file
        query: PathBuf,

        /// Path to the read database (blastn database of all reads)
        #[arg(short = 'd', long = "database")]
        database: PathBuf,

        /// Path to cluster annotation table
        #[arg(short = 'a', long = "annotation-tbl")]
        annotation_tbl: PathBuf,

        /// Path to cluster listing assigning reads to clusters
        #[arg(short = 'c', long = "cls")]
        cls: PathBuf,

        /// Window size for parallel processing
        #[arg(short = 'w', long = "window", default_value_t = repcov::DEFAULT_WINDOW)]
        window: usize,

        /// Overlap of neighbouring windows; set greater than read length
        #[arg(short = 'o', long = "overlap", default_value_t = repcov::DEFAULT_OVERLAP)]
        overlap: usize,

        /// Minimum hit identity in percent
        #[arg(short = 'i', long = "identity", default_value_t = 95.0)]
        identity: f64,

        /// Minimum hit alignment length in bp
        #[arg(short = 'l', long = "align-length", default_value_t = 40)]
        align_length: usize,

        /// Search e-value
        #[arg(short = 'e', long = "e-value", default_value = "1e-15")]
        e_value: String,

        /// Initial word size for the alignment search
        #[arg(long = "word-size", default_value_t = 11)]
        word_size: usize,

        /// blast task to run
        #[arg(long = "task", default_value = "blastn")]
        task: String,

        /// Maximum number of alignments reported per window
        #[arg(short = 'm', long = "max-alignments", default_value_t = 10_000_000)]
        max_alignments: usize,

        /// dust low-complexity filter setting
        #[arg(long = "dust", default_value = "20 64 1")]
        dust: String,

        /// Number of hits (exclusive) above which a position is repetitive
        #[arg(long = "threshold", default_value_t = repcov::DEFAULT_THRESHOLD)]
        threshold: u64,

        /// Minimum length (exclusive) of a reported repeat segment in bp
        #[arg(long = "threshold-segment", default_value_t = repcov::DEFAULT_MIN_SEGMENT)]
        threshold_segment: usize,

        /// Minimum length (exclusive) of a reported masked (N) region in bp
        #[arg(long = "masked-segment", default_value_t = repcov::DEFAULT_MASKED_MIN_SEGMENT)]
        masked_segment: usize,

        /// Coverage divisor converting hit counts to copy numbers
        #[arg(long = "coverage")]
        coverage: Option<f64>,

        /// Genome size in Mbp; derives the coverage divisor from the read
        /// database when no explicit --coverage is given
        #[arg(long = "genome-size")]
        genome_size: Option<f64>,

        /// Maximum number of in-flight window results
        #[arg(long = "batch-size", default_value_t = repcov::DEFAULT_MAX_IN_FLIGHT)]
        batch_size: usize,

        /// Output directory for GFF files and wiggle tracks
        #[arg(long = "output-dir", default_value = "repcov_output")]
        output_dir: PathBuf,

        /// Repeat GFF file name within the output directory
        #[arg(long = "output-gff", default_value = "repeats.gff3")]
        output_gff: String,

        /// Masked-region GFF file name within the output directory
        #[arg(long = "n-gff", default_value = "n_regions.gff3")]
        n_gff: String,

        /// Path to JSON summary file
        #[arg(long = "summary")]
        summary: Option<PathBuf>,

        /// Number of execution threads (0 = auto)
        #[arg(short = 't', long = "threads", default_value_t = 0)]
        threads: usize,

        /// Suppress progress reporting
        #[arg(short = 'q', long = "quiet", default_value_t = false)]
        quiet: bool,
    },

    /// Filter annotation records by alignment quality thresholds
    Filter {
        /// Path to input GFF file
        input: PathBuf,

        /// Path to filtered output GFF file
        #[arg(short = 'o', long = "output")]
        output: PathBuf,

        /// Minimum alignment identity
        #[arg(long = "th-identity", default_value_t = 0.35)]
        th_identity: f64,

        /// Minimum alignment similarity
        #[arg(long = "th-similarity", default_value_t = 0.45)]
        th_similarity: f64,

        /// Minimum relative alignment length
        #[arg(long = "th-length", default_value_t = 0.8)]
        th_length: f64,

        /// Maximum interruptions (frameshifts/stops) per 100 bp
        #[arg(long = "interruptions", default_value_t = 3.0)]
        interruptions: f64,

        /// Keep only records whose classification contains this string
        #[arg(long = "classification", default_value = "All")]
        classification: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Profile {
            query,
            database,
            annotation_tbl,
            cls,
            window,
            overlap,
            identity,
            align_length,
            e_value,
            word_size,
            task,
            max_alignments,
            dust,
            threshold,
            threshold_segment,
            masked_segment,
            coverage,
            genome_size,
            batch_size,
            output_dir,
            output_gff,
            n_gff,
            summary,
            threads,
            quiet,
        } => {
            let config = repcov::ProfileConfig {
                query_path: query.to_string_lossy().to_string(),
                database_path: database,
                annotation_path: annotation_tbl,
                cls_path: cls,
                options: repcov::ProfileOptions {
                    window,
                    overlap,
                    max_in_flight: batch_size,
                    coverage,
                },
                genome_size,
                search: repcov::SearchParams {
                    e_value,
                    word_size,
                    task,
                    max_alignments,
                    dust,
                    min_identity: identity,
                    min_align_length: align_length,
                },
                threshold,
                min_segment: threshold_segment,
                masked_min_segment: masked_segment,
                output_dir,
                gff_name: output_gff,
                masked_gff_name: n_gff,
                summary_path: summary,
                threads,
                quiet,
            };

            config.execute().context("Failed to run profiling")?;
        }
        Commands::Filter {
            input,
            output,
            th_identity,
            th_similarity,
            th_length,
            interruptions,
            classification,
        } => {
            let config = repcov::GffFilterConfig {
                input_path: input,
                output_path: output,
                thresholds: repcov::FilterThresholds {
                    min_identity: th_identity,
                    min_similarity: th_similarity,
                    min_length: th_length,
                    max_interruptions: interruptions,
                    classification,
                },
            };

            let stats = config.execute().context("Failed to filter GFF")?;
            eprintln!(
                "Kept {} of {} records",
                stats.records_out, stats.records_in
            );
        }
    }

    Ok(())
}
