use crate::profile::WindowProfile;
use crate::windows::{Window, WindowRole};

/// A window's counts after overlap trimming, re-indexed so that index 0 of
/// every array corresponds to `global_start` (1-based). Concatenating the
/// reconciled profiles of one sequence in window order yields exactly one
/// value per position, no gaps and no duplicates.
#[derive(Debug)]
pub struct ReconciledProfile {
    pub global_start: usize,
    pub counts: Vec<Vec<u64>>,
}

impl ReconciledProfile {
    pub fn len(&self) -> usize {
        self.counts.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn global_end(&self) -> usize {
        self.global_start + self.len().saturating_sub(1)
    }
}

/// Global 1-based inclusive range `[start, end]` a window keeps after its
/// share of each overlap is assigned.
///
/// With `half = ⌊overlap/2⌋`, the left window of a shared overlap keeps the
/// first `half` overlapping positions and the right window the remaining
/// `overlap − half`, so the two trims always sum to the overlap, for even
/// and odd overlaps alike. First/Single windows start at the sequence
/// start; Last/Single windows run to the sequence end.
pub fn kept_range(window: &Window, overlap: usize, seq_length: usize) -> (usize, usize) {
    let half = overlap / 2;
    let start = match window.role {
        WindowRole::Single | WindowRole::First => window.offset + 1,
        WindowRole::Middle | WindowRole::Last => window.offset + half + 1,
    };
    let end = match window.role {
        WindowRole::Single | WindowRole::Last => seq_length,
        WindowRole::First | WindowRole::Middle => {
            window.offset + window.size - (overlap - half)
        }
    };
    (start, end)
}

/// Trim one window's profile to the range it owns and attach the global
/// coordinate of its first kept position.
pub fn reconcile(
    profile: WindowProfile,
    overlap: usize,
    seq_length: usize,
) -> ReconciledProfile {
    let (start, end) = kept_range(&profile.window, overlap, seq_length);
    let lo = start - profile.window.offset - 1;
    let hi = end - profile.window.offset; // exclusive local bound

    let counts = profile
        .counts
        .into_iter()
        .map(|mut arr| {
            arr.truncate(hi);
            arr.drain(..lo);
            arr
        })
        .collect();

    ReconciledProfile {
        global_start: start,
        counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::windows::windows;

    fn reconciled_ranges(seq_length: usize, window: usize, overlap: usize) -> Vec<(usize, usize)> {
        windows(seq_length, window, overlap)
            .unwrap()
            .iter()
            .map(|w| kept_range(w, overlap, seq_length))
            .collect()
    }

    #[test]
    fn test_single_window_untrimmed() {
        let ranges = reconciled_ranges(50, 60, 20);
        assert_eq!(ranges, vec![(1, 50)]);
    }

    #[test]
    fn test_boundary_scenario() {
        // L=100 W=60 O=20: windows at 0 and 40, handover at 50/51.
        let ranges = reconciled_ranges(100, 60, 20);
        assert_eq!(ranges, vec![(1, 50), (51, 100)]);
    }

    #[test]
    fn test_no_gap_no_overlap_exhaustive() {
        for seq_length in 1..=120 {
            for window in 2..=40 {
                for overlap in 0..window {
                    if window > seq_length {
                        continue;
                    }
                    let ranges = reconciled_ranges(seq_length, window, overlap);
                    let mut expected_start = 1;
                    for &(start, end) in &ranges {
                        assert_eq!(
                            start, expected_start,
                            "L={} W={} O={}",
                            seq_length, window, overlap
                        );
                        assert!(end >= start);
                        expected_start = end + 1;
                    }
                    assert_eq!(
                        expected_start,
                        seq_length + 1,
                        "L={} W={} O={}",
                        seq_length, window, overlap
                    );
                }
            }
        }
    }

    #[test]
    fn test_trim_reindexes_counts() {
        use crate::annot::{CategorySet, ReadCategories};
        use crate::profile::build_window_profile;
        use crate::search::RawHit;

        let wins = windows(100, 60, 20).unwrap();
        let categories = CategorySet::new(vec![]);
        let reads = ReadCategories::default();

        // Second window (offset 40), hit covering local 1..=60 = global 41..=100.
        let hits = vec![RawHit {
            read_id: "r".to_string(),
            identity: 99.0,
            align_length: 60,
            query_start: 1,
            query_end: 60,
        }];
        let profile = build_window_profile(wins[1], &hits, &categories, &reads).unwrap();
        let rec = reconcile(profile, 20, 100);

        assert_eq!(rec.global_start, 51);
        assert_eq!(rec.len(), 50);
        assert_eq!(rec.global_end(), 100);
        assert!(rec.counts[0].iter().all(|&c| c == 1));
    }
}
