/// Select the indices of a count array that must be kept for a step/line
/// rendering of the profile to be reproduced without loss of shape.
///
/// Every non-zero index is kept. For each maximal run of consecutive zeros
/// the first and last index of the run are also kept, so a drop to the
/// baseline is still drawn with just two points instead of every in-between
/// zero. An all-zero array keeps nothing.
pub fn retained_indices(counts: &[u64]) -> Vec<usize> {
    if counts.iter().all(|&c| c == 0) {
        return Vec::new();
    }

    let mut indices = Vec::new();
    let mut zero_run_start: Option<usize> = None;

    for (i, &count) in counts.iter().enumerate() {
        if count == 0 {
            if zero_run_start.is_none() {
                zero_run_start = Some(i);
            }
        } else {
            if let Some(start) = zero_run_start.take() {
                indices.push(start);
                if i - 1 > start {
                    indices.push(i - 1);
                }
            }
            indices.push(i);
        }
    }
    if let Some(start) = zero_run_start {
        indices.push(start);
        let last = counts.len() - 1;
        if last > start {
            indices.push(last);
        }
    }

    indices
}
