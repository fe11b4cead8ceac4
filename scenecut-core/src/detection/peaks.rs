//! Local-maximum extraction shared by the threshold selector, the segmenter,
//! the boundary refiner and the consensus pass.

/// Returns the interior indices of `scores` that qualify as cut peaks.
///
/// Index `i` (with `1 <= i <= n - 2`) is a local maximum when
/// `scores[i] > scores[i - 1]` and `scores[i] >= scores[i + 1]`. Maxima are
/// accepted greedily from left to right; one closer than `min_separation`
/// frames to the last accepted maximum is suppressed. Only then are maxima
/// below `threshold` dropped, so a weak maximum still claims its separation
/// window.
///
/// Pass `f64::NEG_INFINITY` as `threshold` to keep every local maximum.
///
/// # Examples
///
/// ```rust
/// use scenecut_core::detection::find_peaks;
///
/// let scores = [0.0, 5.0, 1.0, 6.0, 1.0, 0.0, 9.0, 0.0];
/// assert_eq!(find_peaks(&scores, 2.0, 1), vec![1, 3, 6]);
/// assert_eq!(find_peaks(&scores, 2.0, 3), vec![1, 6]);
/// assert_eq!(find_peaks(&scores, 8.0, 1), vec![6]);
/// // The maximum at 1 is too weak but still suppresses the one at 3.
/// assert_eq!(find_peaks(&scores, 5.5, 3), vec![6]);
/// ```
pub fn find_peaks(scores: &[f64], threshold: f64, min_separation: usize) -> Vec<usize> {
    let maxima = local_maxima(scores, min_separation);
    filter_peaks(scores, &maxima, threshold)
}

/// Separated local maxima of `scores`, with no threshold applied.
pub fn local_maxima(scores: &[f64], min_separation: usize) -> Vec<usize> {
    let mut peaks = Vec::new();
    if scores.len() < 3 {
        return peaks;
    }

    let mut last_accepted: Option<usize> = None;
    for i in 1..scores.len() - 1 {
        if let Some(last) = last_accepted {
            if i - last < min_separation {
                continue;
            }
        }
        let value = scores[i];
        if value > scores[i - 1] && value >= scores[i + 1] {
            peaks.push(i);
            last_accepted = Some(i);
        }
    }
    peaks
}

/// The entries of `maxima` whose score is at least `threshold`.
pub fn filter_peaks(scores: &[f64], maxima: &[usize], threshold: f64) -> Vec<usize> {
    maxima
        .iter()
        .copied()
        .filter(|&i| scores[i] >= threshold)
        .collect()
}

/// Boundary indices for a series of `len` points: `0`, every peak, then `len - 1`.
pub(crate) fn cut_indices_with_bounds(peaks: &[usize], len: usize) -> Vec<usize> {
    let mut cuts = Vec::with_capacity(peaks.len() + 2);
    cuts.push(0);
    cuts.extend_from_slice(peaks);
    if len > 0 {
        cuts.push(len - 1);
    }
    cuts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_series_has_no_peaks() {
        assert!(find_peaks(&[], 0.0, 1).is_empty());
        assert!(find_peaks(&[3.0], 0.0, 1).is_empty());
        assert!(find_peaks(&[1.0, 9.0], 0.0, 1).is_empty());
    }

    #[test]
    fn test_endpoints_are_never_peaks() {
        let scores = [9.0, 1.0, 1.0, 9.0];
        assert!(find_peaks(&scores, 0.0, 1).is_empty());
    }

    #[test]
    fn test_plateau_takes_leading_edge() {
        // Rising edge qualifies through `>=` on the right neighbour; the
        // second plateau sample fails `>` on the left.
        let scores = [0.0, 4.0, 4.0, 0.0];
        assert_eq!(find_peaks(&scores, 0.0, 1), vec![1]);
    }

    #[test]
    fn test_flat_series_has_no_peaks() {
        assert!(find_peaks(&[5.0; 12], f64::NEG_INFINITY, 1).is_empty());
    }

    #[test]
    fn test_threshold_filters_weak_maxima() {
        let scores = [0.0, 3.0, 0.0, 10.0, 0.0];
        assert_eq!(find_peaks(&scores, 5.0, 1), vec![3]);
    }

    #[test]
    fn test_greedy_suppression_keeps_first() {
        // The stronger maximum at 3 sits inside the suppression zone of 1.
        let scores = [0.0, 5.0, 0.0, 50.0, 0.0, 0.0, 6.0, 0.0];
        assert_eq!(find_peaks(&scores, 0.0, 3), vec![1, 6]);
    }

    #[test]
    fn test_weak_maximum_still_claims_its_window() {
        // 3 is a maximum below the threshold; it blocks 50 at index 5.
        let scores = [0.0, 3.0, 0.0, 0.0, 0.0, 50.0, 0.0, 0.0, 0.0, 40.0, 0.0];
        assert_eq!(local_maxima(&scores, 5), vec![1, 9]);
        assert_eq!(find_peaks(&scores, 10.0, 5), vec![9]);
        assert_eq!(find_peaks(&scores, 10.0, 1), vec![5, 9]);
    }

    #[test]
    fn test_cut_indices_include_series_bounds() {
        assert_eq!(cut_indices_with_bounds(&[4, 9], 15), vec![0, 4, 9, 14]);
        assert_eq!(cut_indices_with_bounds(&[], 5), vec![0, 4]);
    }
}
