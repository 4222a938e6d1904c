use crate::annot::{CategorySet, ReadCategories};
use crate::error::ProfileError;
use crate::search::RawHit;
use crate::windows::Window;

/// Per-category hit counts for one window, indexed by window-local position.
/// Transient: built by a worker, consumed by reconciliation.
#[derive(Debug)]
pub struct WindowProfile {
    pub window: Window,
    /// `counts[category][local_position]`, category indices per `CategorySet`.
    pub counts: Vec<Vec<u64>>,
}

/// Multiplicity a read identifier stands for. De-duplicated databases encode
/// how many original reads a representative replaces as an integer suffix
/// after a `reduce` marker; everything else weighs 1.
pub fn read_weight(read_id: &str) -> u64 {
    match read_id.rsplit_once("reduce") {
        Some((_, suffix)) => suffix.parse().unwrap_or(1),
        None => 1,
    }
}

/// Accumulate the raw hits of one window into per-category count arrays.
///
/// Each hit adds its read weight across the inclusive local span
/// `[query_start, query_end]` of its resolved category. Afterwards the ALL
/// array is the position-wise sum of every named category plus the hits that
/// resolved to ALL directly. Hits with coordinates outside the window are
/// malformed adapter output.
pub fn build_window_profile(
    window: Window,
    hits: &[RawHit],
    categories: &CategorySet,
    reads: &ReadCategories,
) -> Result<WindowProfile, ProfileError> {
    let mut counts = vec![vec![0u64; window.size]; categories.len()];

    for hit in hits {
        if hit.query_start == 0 || hit.query_end < hit.query_start || hit.query_end > window.size {
            return Err(ProfileError::adapter(format!(
                "hit span {}-{} outside window of size {} (read {})",
                hit.query_start, hit.query_end, window.size, hit.read_id
            )));
        }
        let category = reads.resolve(&hit.read_id);
        let weight = read_weight(&hit.read_id);
        for value in &mut counts[category][hit.query_start - 1..hit.query_end] {
            *value += weight;
        }
    }

    // Fold the named categories into ALL on top of the directly accumulated
    // unclassified hits.
    let (all, named) = counts.split_at_mut(1);
    for category in named.iter() {
        for (total, value) in all[0].iter_mut().zip(category) {
            *total += value;
        }
    }

    Ok(WindowProfile { window, counts })
}
