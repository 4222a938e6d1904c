use crate::annot::CategorySet;
use crate::reconcile::ReconciledProfile;
use crate::sparse::retained_indices;
use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Sparse per-category repeat profile of one whole sequence: ascending
/// `(global 1-based position, count)` pairs per category. Grows only while
/// reconciled windows are merged in order; immutable afterwards.
#[derive(Debug)]
pub struct SequenceProfile {
    pub seq_id: String,
    pub length: usize,
    /// `pairs[category]`, category indices per `CategorySet`.
    pub pairs: Vec<Vec<(usize, u64)>>,
}

impl SequenceProfile {
    /// Reconstruct the dense count array of one category, unset positions
    /// being zero.
    pub fn dense(&self, category: usize) -> Vec<u64> {
        let mut counts = vec![0u64; self.length];
        for &(pos, count) in &self.pairs[category] {
            counts[pos - 1] = count;
        }
        counts
    }
}

/// Merges trimmed window profiles into one `SequenceProfile`. Sole owner and
/// mutator of the accumulating state; only ever driven from the merging
/// thread.
pub struct ProfileAggregator<'a> {
    categories: &'a CategorySet,
    /// Optional coverage divisor: stored counts become `⌊count / coverage⌋`.
    coverage: Option<f64>,
    profile: SequenceProfile,
}

impl<'a> ProfileAggregator<'a> {
    pub fn new(
        seq_id: &str,
        length: usize,
        categories: &'a CategorySet,
        coverage: Option<f64>,
    ) -> Self {
        ProfileAggregator {
            categories,
            coverage,
            profile: SequenceProfile {
                seq_id: seq_id.to_string(),
                length,
                pairs: vec![Vec::new(); categories.len()],
            },
        }
    }

    fn scale(&self, count: u64) -> u64 {
        match self.coverage {
            Some(cv) => (count as f64 / cv) as u64,
            None => count,
        }
    }

    /// Append one reconciled window. Per category, only the indices the
    /// sparse encoder retains are stored: all non-zero positions plus the
    /// boundary positions of zero runs, nothing for all-zero windows.
    pub fn merge(&mut self, reconciled: &ReconciledProfile) {
        for (category, counts) in reconciled.counts.iter().enumerate() {
            for i in retained_indices(counts) {
                let scaled = self.scale(counts[i]);
                self.profile.pairs[category].push((reconciled.global_start + i, scaled));
            }
        }
    }

    pub fn finish(self) -> SequenceProfile {
        self.profile
    }

    pub fn categories(&self) -> &CategorySet {
        self.categories
    }
}

/// Lazily created per-category wiggle track files, reused across the
/// sequences of a run. Each track is `variableStep` data: one declaration
/// line per sequence followed by `position<TAB>count` lines.
pub struct TrackWriters {
    directory: PathBuf,
    writers: FxHashMap<usize, TrackWriter>,
}

struct TrackWriter {
    writer: BufWriter<File>,
    declared: Vec<String>,
}

impl TrackWriters {
    pub fn new(directory: &Path) -> Self {
        TrackWriters {
            directory: directory.to_path_buf(),
            writers: FxHashMap::default(),
        }
    }

    /// Append one sequence's sparse values to the tracks of every category
    /// that has any. A category's file is created on its first non-empty
    /// profile.
    pub fn append(&mut self, categories: &CategorySet, profile: &SequenceProfile) -> Result<()> {
        for (category, pairs) in profile.pairs.iter().enumerate() {
            if pairs.is_empty() {
                continue;
            }
            let track = match self.writers.entry(category) {
                std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
                std::collections::hash_map::Entry::Vacant(e) => {
                    let path = self
                        .directory
                        .join(format!("{}.wig", categories.file_stem(category)));
                    let file = OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(&path)
                        .with_context(|| {
                            format!("Failed to create track file: {}", path.display())
                        })?;
                    e.insert(TrackWriter {
                        writer: BufWriter::new(file),
                        declared: Vec::new(),
                    })
                }
            };
            if !track.declared.contains(&profile.seq_id) {
                writeln!(track.writer, "variableStep chrom={}", profile.seq_id)?;
                track.declared.push(profile.seq_id.clone());
            }
            for &(pos, count) in pairs {
                writeln!(track.writer, "{}\t{}", pos, count)?;
            }
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        for track in self.writers.values_mut() {
            track.writer.flush().context("Failed to flush track file")?;
        }
        Ok(())
    }
}
