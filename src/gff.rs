use crate::aggregate::SequenceProfile;
use crate::annot::CategorySet;
use crate::error::ProfileError;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const GFF_HEADER: &str = "##gff-version 3";
const SOURCE: &str = "repcov";
const REPEAT_FEATURE: &str = "Repeat";
const MASKED_FEATURE: &str = "N_region";
const MASKED_NAME: &str = "N";

/// One annotated genomic interval, 1-based inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub seq_id: String,
    pub start: usize,
    pub end: usize,
    pub name: String,
}

/// Group ascending positions into maximal runs of consecutive values and
/// keep the runs strictly longer than `min_segment` positions.
pub fn group_runs(positions: impl IntoIterator<Item = usize>, min_segment: usize) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut current: Option<(usize, usize)> = None;

    for pos in positions {
        current = match current {
            Some((start, end)) if pos == end + 1 => Some((start, pos)),
            Some((start, end)) => {
                if end - start + 1 > min_segment {
                    runs.push((start, end));
                }
                Some((pos, pos))
            }
            None => Some((pos, pos)),
        };
    }
    if let Some((start, end)) = current {
        if end - start + 1 > min_segment {
            runs.push((start, end));
        }
    }
    runs
}

/// Extract reportable repeat intervals from a sequence profile: per named
/// category, maximal runs of consecutive positions whose count is strictly
/// above `threshold`, kept when strictly longer than `min_segment`. The ALL
/// bucket is a rendering aid, not an annotation, and is skipped. Positions
/// out of the declared sequence range indicate a corrupted profile.
pub fn extract_intervals(
    profile: &SequenceProfile,
    categories: &CategorySet,
    threshold: u64,
    min_segment: usize,
) -> Result<Vec<Interval>, ProfileError> {
    let mut intervals = Vec::new();
    for (category, pairs) in profile.pairs.iter().enumerate() {
        let mut previous = 0usize;
        for &(pos, _) in pairs {
            if pos <= previous || pos > profile.length {
                return Err(ProfileError::Encoding {
                    expected: profile.length,
                    actual: pos,
                });
            }
            previous = pos;
        }
        if category == CategorySet::ALL {
            continue;
        }
        let active = pairs
            .iter()
            .filter(|&&(_, count)| count > threshold)
            .map(|&(pos, _)| pos);
        for (start, end) in group_runs(active, min_segment) {
            intervals.push(Interval {
                seq_id: profile.seq_id.clone(),
                start,
                end,
                name: categories.label(category).to_string(),
            });
        }
    }
    Ok(intervals)
}

/// Masked-region variant of the same grouping: runs of unknown (`N`/`n`)
/// bases longer than `min_segment`, independent of any count array.
pub fn masked_regions(seq_id: &str, sequence: &[u8], min_segment: usize) -> Vec<Interval> {
    let positions = sequence
        .iter()
        .enumerate()
        .filter(|&(_, &base)| base == b'N' || base == b'n')
        .map(|(i, _)| i + 1);
    group_runs(positions, min_segment)
        .into_iter()
        .map(|(start, end)| Interval {
            seq_id: seq_id.to_string(),
            start,
            end,
            name: MASKED_NAME.to_string(),
        })
        .collect()
}

/// GFF3 annotation writer. Score, strand and frame are placeholders; the
/// category/track label travels in the `Name` attribute.
pub struct GffWriter {
    writer: BufWriter<File>,
}

impl GffWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create GFF file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", GFF_HEADER)?;
        Ok(GffWriter { writer })
    }

    fn write_record(&mut self, interval: &Interval, feature: &str) -> Result<()> {
        writeln!(
            self.writer,
            "{}\t{}\t{}\t{}\t{}\t.\t.\t.\tName={}",
            interval.seq_id, SOURCE, feature, interval.start, interval.end, interval.name
        )?;
        Ok(())
    }

    pub fn write_repeat(&mut self, interval: &Interval) -> Result<()> {
        self.write_record(interval, REPEAT_FEATURE)
    }

    pub fn write_masked(&mut self, interval: &Interval) -> Result<()> {
        self.write_record(interval, MASKED_FEATURE)
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush GFF file")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ltr_profile(pairs: Vec<(usize, u64)>, length: usize) -> (SequenceProfile, CategorySet) {
        let categories = CategorySet::new(vec!["LTR".to_string()]);
        let profile = SequenceProfile {
            seq_id: "seq1".to_string(),
            length,
            pairs: vec![pairs.clone(), pairs],
        };
        (profile, categories)
    }

    #[test]
    fn test_group_runs_min_segment_strict() {
        // run of exactly min_segment positions is dropped
        assert!(group_runs(1..=5, 5).is_empty());
        assert_eq!(group_runs(1..=6, 5), vec![(1, 6)]);
        assert_eq!(group_runs(vec![1, 2, 3, 7, 8, 9, 10], 3), vec![(7, 10)]);
    }

    #[test]
    fn test_ltr_scenario() {
        // Hits at positions 10..=30, weight 1, T=0, S=5: one interval.
        let pairs: Vec<(usize, u64)> = (10..=30).map(|p| (p, 1)).collect();
        let (profile, categories) = ltr_profile(pairs, 100);
        let intervals = extract_intervals(&profile, &categories, 0, 5).unwrap();
        assert_eq!(
            intervals,
            vec![Interval {
                seq_id: "seq1".to_string(),
                start: 10,
                end: 30,
                name: "LTR".to_string(),
            }]
        );
    }

    #[test]
    fn test_threshold_exclusive() {
        let pairs: Vec<(usize, u64)> = (1..=10).map(|p| (p, 5)).collect();
        let (profile, categories) = ltr_profile(pairs, 10);
        assert!(extract_intervals(&profile, &categories, 5, 2)
            .unwrap()
            .is_empty());
        assert_eq!(extract_intervals(&profile, &categories, 4, 2).unwrap().len(), 1);
    }

    #[test]
    fn test_zero_boundary_pairs_not_active() {
        // Sparse boundary zeros sit inside the pair list but must not join runs.
        let pairs = vec![(1, 0), (2, 3), (3, 3), (4, 3), (5, 0), (9, 0), (10, 4)];
        let (profile, categories) = ltr_profile(pairs, 12);
        let intervals = extract_intervals(&profile, &categories, 0, 2).unwrap();
        assert_eq!(intervals.len(), 1);
        assert_eq!((intervals[0].start, intervals[0].end), (2, 4));
    }

    #[test]
    fn test_extraction_idempotent() {
        let pairs = vec![(3, 2), (4, 2), (5, 2), (6, 2), (10, 7), (11, 7), (12, 7), (13, 7), (14, 7)];
        let (profile, categories) = ltr_profile(pairs, 20);
        let intervals = extract_intervals(&profile, &categories, 0, 3).unwrap();

        // Rebuild a mask profile from the reported intervals and re-extract.
        let mask: Vec<(usize, u64)> = intervals
            .iter()
            .flat_map(|iv| (iv.start..=iv.end).map(|p| (p, 1)))
            .collect();
        let (mask_profile, _) = ltr_profile(mask, 20);
        let again = extract_intervals(&mask_profile, &categories, 0, 3).unwrap();
        assert_eq!(again, intervals);
    }

    #[test]
    fn test_corrupt_profile_rejected() {
        let (profile, categories) = ltr_profile(vec![(5, 1), (4, 1)], 10);
        assert!(matches!(
            extract_intervals(&profile, &categories, 0, 0),
            Err(ProfileError::Encoding { .. })
        ));

        let (profile, categories) = ltr_profile(vec![(11, 1)], 10);
        assert!(matches!(
            extract_intervals(&profile, &categories, 0, 0),
            Err(ProfileError::Encoding { expected: 10, actual: 11 })
        ));
    }

    #[test]
    fn test_masked_regions() {
        let seq = b"ACGTNNNNNNNNACGTnnnNACGT";
        let regions = masked_regions("chr1", seq, 3);
        assert_eq!(regions.len(), 2);
        assert_eq!((regions[0].start, regions[0].end), (5, 12));
        assert_eq!((regions[1].start, regions[1].end), (17, 20));
        assert_eq!(regions[0].name, "N");

        // min segment is strict: a 4-base run needs min_segment < 4
        assert_eq!(masked_regions("chr1", seq, 4).len(), 1);
    }
}
