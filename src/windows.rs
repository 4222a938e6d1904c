use crate::error::ProfileError;

/// Position of a window within the ordered window sequence.
///
/// The role decides how much of the window's overlap with its neighbours is
/// trimmed away during reconciliation, so it is fixed at construction time
/// rather than re-derived from index comparisons downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRole {
    Single,
    First,
    Middle,
    Last,
}

/// One query window over a sequence. `offset` is 0-based; the window covers
/// global 1-based positions `offset+1 ..= offset+size`.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    pub offset: usize,
    pub size: usize,
    pub role: WindowRole,
}

impl Window {
    /// Global 1-based position of the first covered base.
    pub fn global_start(&self) -> usize {
        self.offset + 1
    }

    /// Global 1-based position of the last covered base.
    pub fn global_end(&self) -> usize {
        self.offset + self.size
    }
}

/// Split a sequence of length `seq_length` into overlapping windows of
/// nominal size `window` with `overlap` shared positions between neighbours.
///
/// Offsets advance by `window - overlap`. Trailing offsets are dropped while
/// the preceding window already reaches the end of the sequence, so the last
/// window is never redundant and a sequence no longer than one window always
/// yields exactly one `Single` window.
pub fn windows(seq_length: usize, window: usize, overlap: usize) -> Result<Vec<Window>, ProfileError> {
    if seq_length == 0 {
        return Err(ProfileError::config("sequence length must be positive"));
    }
    if window <= overlap {
        return Err(ProfileError::config(format!(
            "window ({}) must be greater than overlap ({})",
            window, overlap
        )));
    }

    let step = window - overlap;
    let mut offsets: Vec<usize> = (0..seq_length).step_by(step).collect();
    while offsets.len() > 1 && offsets[offsets.len() - 2] + window >= seq_length {
        offsets.pop();
    }

    let count = offsets.len();
    let windows = offsets
        .into_iter()
        .enumerate()
        .map(|(i, offset)| {
            let role = if count == 1 {
                WindowRole::Single
            } else if i == 0 {
                WindowRole::First
            } else if i == count - 1 {
                WindowRole::Last
            } else {
                WindowRole::Middle
            };
            Window {
                offset,
                size: window.min(seq_length - offset),
                role,
            }
        })
        .collect();

    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_sequence_single_window() {
        for (len, w, o) in [(1, 10, 0), (10, 10, 5), (100, 100, 99), (50, 60, 20)] {
            let wins = windows(len, w, o).unwrap();
            assert_eq!(wins.len(), 1, "L={} W={} O={}", len, w, o);
            assert_eq!(wins[0].role, WindowRole::Single);
            assert_eq!(wins[0].offset, 0);
            assert_eq!(wins[0].size, len.min(w));
        }
    }

    #[test]
    fn test_roles_ordered() {
        let wins = windows(200, 60, 20).unwrap();
        assert_eq!(wins[0].role, WindowRole::First);
        assert_eq!(wins.last().unwrap().role, WindowRole::Last);
        for win in &wins[1..wins.len() - 1] {
            assert_eq!(win.role, WindowRole::Middle);
        }
    }

    #[test]
    fn test_redundant_tail_dropped() {
        // Offsets 0, 40, 80; the window at 40 already reaches position 100,
        // so 80 is dropped.
        let wins = windows(100, 60, 20).unwrap();
        let offsets: Vec<usize> = wins.iter().map(|w| w.offset).collect();
        assert_eq!(offsets, vec![0, 40]);
    }

    #[test]
    fn test_tail_drop_iterates() {
        // step=2 produces offsets 0,2,4,6,8; windows at 4, 6 and 8 are all
        // covered by their predecessors and must all be removed.
        let wins = windows(10, 8, 6).unwrap();
        let offsets: Vec<usize> = wins.iter().map(|w| w.offset).collect();
        assert_eq!(offsets, vec![0, 2]);
    }

    #[test]
    fn test_last_window_truncated() {
        let wins = windows(130, 60, 20).unwrap();
        let last = wins.last().unwrap();
        assert_eq!(last.global_end(), 130);
        assert!(last.size <= 60);
    }

    #[test]
    fn test_every_window_ends_within_sequence() {
        for len in [1usize, 7, 99, 100, 101, 250] {
            for w in [5usize, 8, 60] {
                for o in 0..w.min(len) {
                    let wins = windows(len, w, o).unwrap();
                    assert_eq!(wins.last().unwrap().global_end(), len);
                    for win in &wins {
                        assert!(win.global_end() <= len);
                        assert!(win.size > 0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_zero_length_rejected() {
        assert!(windows(0, 10, 2).is_err());
    }

    #[test]
    fn test_window_not_greater_than_overlap_rejected() {
        assert!(windows(100, 10, 10).is_err());
        assert!(windows(100, 10, 15).is_err());
    }
}
