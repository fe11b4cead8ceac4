// ============================================================================
// scenecut-core/src/detection/threshold.rs
// ============================================================================
//
// THRESHOLD SELECTION: Automatic cut threshold from a change-score series
//
// Candidate thresholds are taken from fixed upper percentiles of the score
// distribution. Separated local maxima are extracted once; each candidate
// keeps the maxima scoring at least its value, and survives only if every
// resulting scene is at least `min_separation_frames` long. The survivor producing the most scenes wins,
// with ties going to the smallest threshold.
//
// The selection is a pure function of (series, min_scene_seconds,
// percentiles). It never draws random numbers and evaluates candidates in a
// fixed order, so repeated calls return bit-identical results.

use log::{debug, info, warn};
use serde::Serialize;

use super::peaks::{cut_indices_with_bounds, filter_peaks, local_maxima};
use crate::config::DEFAULT_PERCENTILE_CANDIDATES;
use crate::error::{CoreResult, invalid};
use crate::series::ContentChangeSeries;

/// Threshold returned for an empty series: a moderate cut level on a 0-100 change scale.
pub const DEFAULT_FALLBACK_THRESHOLD: f64 = 27.0;

/// Percentile used when no candidate survives the minimum-length filter.
pub const FALLBACK_PERCENTILE: f64 = 98.0;

/// Outcome of trialling one threshold value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdCandidate {
    pub value: f64,
    pub scene_count: usize,
    pub valid: bool,
}

/// Picks the threshold that yields the most valid scenes.
#[derive(Debug, Clone)]
pub struct ThresholdSelector {
    percentiles: Vec<f64>,
}

impl Default for ThresholdSelector {
    fn default() -> Self {
        Self {
            percentiles: DEFAULT_PERCENTILE_CANDIDATES.to_vec(),
        }
    }
}

impl ThresholdSelector {
    /// Creates a selector over custom percentiles (each in `[0, 100]`).
    pub fn with_percentiles(percentiles: Vec<f64>) -> CoreResult<Self> {
        if percentiles.is_empty() {
            return Err(invalid("at least one percentile candidate is required"));
        }
        if let Some(p) = percentiles
            .iter()
            .find(|p| !(p.is_finite() && (0.0..=100.0).contains(*p)))
        {
            return Err(invalid(format!("percentile must lie in [0, 100], got {p}")));
        }
        Ok(Self { percentiles })
    }

    /// Distinct candidate threshold values for `scores`, ascending.
    pub fn candidate_values(&self, scores: &[f64]) -> Vec<f64> {
        let mut sorted = scores.to_vec();
        sorted.sort_by(f64::total_cmp);

        let mut values: Vec<f64> = self
            .percentiles
            .iter()
            .map(|&p| percentile_of_sorted(&sorted, p))
            .collect();
        values.sort_by(f64::total_cmp);
        values.dedup();
        values
    }

    /// Trials every candidate threshold over `series`.
    ///
    /// Candidates that produce no peaks at all are left out; they cannot
    /// split the series and say nothing about scene lengths.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<ThresholdCandidate>)` - One entry per distinct candidate that produced peaks
    /// * `Err(CoreError::InvalidParameter)` - `min_scene_seconds` is negative or not finite
    pub fn evaluate_candidates(
        &self,
        series: &ContentChangeSeries,
        min_scene_seconds: f64,
    ) -> CoreResult<Vec<ThresholdCandidate>> {
        let min_sep = min_separation_frames(min_scene_seconds, series.frame_rate())?;
        let scores = series.scores();
        let maxima = local_maxima(&scores, min_sep);

        let mut results = Vec::new();
        for value in self.candidate_values(&scores) {
            let peaks = filter_peaks(&scores, &maxima, value);
            if peaks.is_empty() {
                debug!("Threshold candidate {value:.4}: no peaks, skipped");
                continue;
            }

            let cuts = cut_indices_with_bounds(&peaks, scores.len());
            let valid = cuts.windows(2).all(|pair| pair[1] - pair[0] >= min_sep);
            let scene_count = cuts.len() - 1;
            debug!(
                "Threshold candidate {value:.4}: {} peaks, {scene_count} scenes, valid={valid}",
                peaks.len()
            );
            results.push(ThresholdCandidate {
                value,
                scene_count,
                valid,
            });
        }
        Ok(results)
    }

    /// Chooses the cut threshold for `series`.
    ///
    /// # Arguments
    ///
    /// * `series` - Per-frame change scores
    /// * `min_scene_seconds` - Minimum scene length, converted to frames at the series' rate
    ///
    /// # Returns
    ///
    /// * `Ok(f64)` - The best surviving candidate, the 98th percentile when none survives,
    ///   or `DEFAULT_FALLBACK_THRESHOLD` for an empty series
    /// * `Err(CoreError::InvalidParameter)` - `min_scene_seconds` is negative or not finite
    pub fn select_threshold(
        &self,
        series: &ContentChangeSeries,
        min_scene_seconds: f64,
    ) -> CoreResult<f64> {
        if series.is_empty() {
            // Validate the parameter even though the fallback ignores it.
            min_separation_frames(min_scene_seconds, series.frame_rate())?;
            warn!(
                "Empty change series, using default threshold {DEFAULT_FALLBACK_THRESHOLD}"
            );
            return Ok(DEFAULT_FALLBACK_THRESHOLD);
        }

        let candidates = self.evaluate_candidates(series, min_scene_seconds)?;

        let mut best: Option<ThresholdCandidate> = None;
        for candidate in candidates.into_iter().filter(|c| c.valid) {
            // Ascending order means the first candidate reaching a count is the smallest.
            let better = match best {
                None => true,
                Some(current) => candidate.scene_count > current.scene_count,
            };
            if better {
                best = Some(candidate);
            }
        }

        match best {
            Some(chosen) => {
                info!(
                    "Selected threshold {:.4} ({} scenes)",
                    chosen.value, chosen.scene_count
                );
                Ok(chosen.value)
            }
            None => {
                let mut sorted = series.scores();
                sorted.sort_by(f64::total_cmp);
                let fallback = percentile_of_sorted(&sorted, FALLBACK_PERCENTILE);
                warn!(
                    "No threshold candidate met the minimum scene length, falling back to p{FALLBACK_PERCENTILE} = {fallback:.4}"
                );
                Ok(fallback)
            }
        }
    }
}

/// Convenience wrapper over the default percentile set.
pub fn select_threshold(series: &ContentChangeSeries, min_scene_seconds: f64) -> CoreResult<f64> {
    ThresholdSelector::default().select_threshold(series, min_scene_seconds)
}

/// `max(1, floor(min_scene_seconds * frame_rate))`.
pub fn min_separation_frames(min_scene_seconds: f64, frame_rate: f64) -> CoreResult<usize> {
    if !(min_scene_seconds.is_finite() && min_scene_seconds >= 0.0) {
        return Err(invalid(format!(
            "minimum scene length must be non-negative, got {min_scene_seconds}"
        )));
    }
    if !(frame_rate.is_finite() && frame_rate > 0.0) {
        return Err(invalid(format!(
            "frame rate must be positive, got {frame_rate}"
        )));
    }
    Ok(((min_scene_seconds * frame_rate).floor() as usize).max(1))
}

/// Percentile `p` of an ascending slice with linear interpolation between ranks.
///
/// Rank is `p / 100 * (n - 1)`. Returns `0.0` for an empty slice.
///
/// # Examples
///
/// ```rust
/// use scenecut_core::detection::percentile_of_sorted;
///
/// let values = [10.0, 20.0, 30.0, 40.0];
/// assert_eq!(percentile_of_sorted(&values, 50.0), 25.0);
/// assert_eq!(percentile_of_sorted(&values, 100.0), 40.0);
/// ```
pub fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => return 0.0,
        1 => return sorted[0],
        _ => {}
    }
    if p <= 0.0 {
        return sorted[0];
    }
    let last = sorted.len() - 1;
    if p >= 100.0 {
        return sorted[last];
    }

    let rank = p / 100.0 * last as f64;
    let low = rank.floor() as usize;
    let high = (low + 1).min(last);
    let frac = rank - low as f64;
    sorted[low] * (1.0 - frac) + sorted[high] * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::peaks::find_peaks;
    use crate::error::CoreError;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn spike_series() -> ContentChangeSeries {
        let mut scores = vec![5.0; 100];
        scores[50] = 90.0;
        ContentChangeSeries::from_scores(&scores, 10.0).unwrap()
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [0.0, 10.0];
        assert_eq!(percentile_of_sorted(&values, 25.0), 2.5);
        assert_eq!(percentile_of_sorted(&values, 0.0), 0.0);
        assert_eq!(percentile_of_sorted(&[7.0], 99.9), 7.0);
        assert_eq!(percentile_of_sorted(&[], 50.0), 0.0);
    }

    #[test]
    fn test_min_separation_frames() {
        assert_eq!(min_separation_frames(3.0, 29.97).unwrap(), 89);
        assert_eq!(min_separation_frames(0.0, 25.0).unwrap(), 1);
        assert!(matches!(
            min_separation_frames(-1.0, 25.0),
            Err(CoreError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_empty_series_uses_default() {
        let series = ContentChangeSeries::new(Vec::new(), 24.0).unwrap();
        assert_eq!(select_threshold(&series, 1.0).unwrap(), DEFAULT_FALLBACK_THRESHOLD);
    }

    #[test]
    fn test_negative_min_scene_is_rejected() {
        assert!(select_threshold(&spike_series(), -0.5).is_err());
    }

    #[test]
    fn test_single_spike_selects_smallest_equivalent_threshold() {
        let series = spike_series();
        let threshold = select_threshold(&series, 0.5).unwrap();
        assert_eq!(threshold, 5.0);
        assert!(threshold <= 90.0);

        let peaks = find_peaks(&series.scores(), threshold, 5);
        assert_eq!(peaks, vec![50]);
        assert_eq!(cut_indices_with_bounds(&peaks, series.len()).len() - 1, 2);
    }

    #[test]
    fn test_candidate_values_are_sorted_and_distinct() {
        let series = spike_series();
        let values = ThresholdSelector::default().candidate_values(&series.scores());
        assert!(values.windows(2).all(|w| w[0] < w[1]));
        // p80..p98.5 all land on the baseline.
        assert_eq!(values[0], 5.0);
    }

    #[test]
    fn test_falls_back_to_98th_percentile_when_nothing_fits() {
        // Peaks every 4 frames, but scenes must be 10 frames long.
        let scores: Vec<f64> = (0..40)
            .map(|i| if i % 4 == 2 { 50.0 } else { 1.0 })
            .collect();
        let series = ContentChangeSeries::from_scores(&scores, 10.0).unwrap();
        let threshold = select_threshold(&series, 1.0).unwrap();

        let mut sorted = scores.clone();
        sorted.sort_by(f64::total_cmp);
        assert_eq!(threshold, percentile_of_sorted(&sorted, FALLBACK_PERCENTILE));
    }

    #[test]
    fn test_more_scenes_beat_lower_threshold() {
        // Two strong cuts and one weak one; all three fit the minimum length.
        let mut scores = vec![1.0; 60];
        scores[15] = 40.0;
        scores[30] = 80.0;
        scores[45] = 90.0;
        let series = ContentChangeSeries::from_scores(&scores, 10.0).unwrap();
        let selector = ThresholdSelector::default();
        let threshold = selector.select_threshold(&series, 1.0).unwrap();

        let best = selector
            .evaluate_candidates(&series, 1.0)
            .unwrap()
            .into_iter()
            .filter(|c| c.valid)
            .map(|c| c.scene_count)
            .max()
            .unwrap();
        assert_eq!(best, 4);
        assert_eq!(find_peaks(&scores, threshold, 10), vec![15, 30, 45]);
    }

    #[test]
    fn test_selection_is_deterministic_and_trials_respect_min_length() {
        let mut rng = StdRng::seed_from_u64(0x5CE7E);
        for _ in 0..50 {
            let len = rng.gen_range(3..400);
            let scores: Vec<f64> = (0..len).map(|_| rng.gen_range(0.0..100.0)).collect();
            let fps = rng.gen_range(5.0..60.0);
            let min_scene = rng.gen_range(0.0..3.0);
            let series = ContentChangeSeries::from_scores(&scores, fps).unwrap();

            let first = select_threshold(&series, min_scene).unwrap();
            let second = select_threshold(&series, min_scene).unwrap();
            assert_eq!(first.to_bits(), second.to_bits());

            let min_sep = min_separation_frames(min_scene, fps).unwrap();
            let selector = ThresholdSelector::default();
            let candidates = selector.evaluate_candidates(&series, min_scene).unwrap();
            for candidate in candidates.iter().filter(|c| c.valid) {
                let peaks = find_peaks(&scores, candidate.value, min_sep);
                let cuts = cut_indices_with_bounds(&peaks, scores.len());
                assert!(cuts.windows(2).all(|w| w[1] - w[0] >= min_sep));
            }

            if candidates.iter().any(|c| c.valid) {
                let peaks = find_peaks(&scores, first, min_sep);
                let cuts = cut_indices_with_bounds(&peaks, scores.len());
                assert!(cuts.windows(2).all(|w| w[1] - w[0] >= min_sep));
            }
        }
    }

    /// Straightforward selection: for each candidate, scan the maxima again,
    /// filter, measure scene lengths, keep the best `(scenes, -threshold)`.
    fn naive_select(scores: &[f64], fps: f64, min_scene_seconds: f64) -> f64 {
        if scores.is_empty() {
            return 27.0;
        }
        let min_sep = ((min_scene_seconds * fps) as usize).max(1);
        let mut sorted = scores.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let percentile = |p: f64| {
            let n = sorted.len();
            if n == 1 || p <= 0.0 {
                return sorted[0];
            }
            if p >= 100.0 {
                return sorted[n - 1];
            }
            let rank = p / 100.0 * (n - 1) as f64;
            let low = rank as usize;
            let high = (low + 1).min(n - 1);
            let fraction = rank - low as f64;
            sorted[low] * (1.0 - fraction) + sorted[high] * fraction
        };
        let mut candidates: Vec<f64> = DEFAULT_PERCENTILE_CANDIDATES
            .iter()
            .map(|&p| percentile(p))
            .collect();
        candidates.sort_by(|a, b| a.partial_cmp(b).unwrap());
        candidates.dedup();

        let mut best: Option<(usize, f64)> = None;
        for t in candidates {
            let mut maxima = Vec::new();
            let mut last: isize = -(min_sep as isize);
            for i in 1..scores.len().saturating_sub(1) {
                if (i as isize) - last < min_sep as isize {
                    continue;
                }
                if scores[i] > scores[i - 1] && scores[i] >= scores[i + 1] {
                    maxima.push(i);
                    last = i as isize;
                }
            }
            let peaks: Vec<usize> = maxima.into_iter().filter(|&i| scores[i] >= t).collect();
            if peaks.is_empty() {
                continue;
            }
            let mut cuts = vec![0];
            cuts.extend(&peaks);
            cuts.push(scores.len() - 1);
            if cuts.windows(2).any(|w| w[1] - w[0] < min_sep) {
                continue;
            }
            let scenes = cuts.len() - 1;
            let better = match best {
                None => true,
                Some((best_scenes, best_t)) => scenes > best_scenes || (scenes == best_scenes && t < best_t),
            };
            if better {
                best = Some((scenes, t));
            }
        }
        best.map(|(_, t)| t).unwrap_or_else(|| percentile(98.0))
    }

    #[test]
    fn test_selection_matches_naive_rescan() {
        let mut rng = StdRng::seed_from_u64(0x7E57);
        for trial in 0..500 {
            let len = rng.gen_range(20..400);
            let scores: Vec<f64> = (0..len).map(|_| rng.gen_range(0.0..100.0)).collect();
            let min_scene = rng.gen_range(0.2..2.0);
            let series = ContentChangeSeries::from_scores(&scores, 10.0).unwrap();

            let selected = select_threshold(&series, min_scene).unwrap();
            let expected = naive_select(&scores, 10.0, min_scene);
            assert_eq!(
                selected.to_bits(),
                expected.to_bits(),
                "trial {trial}: len {len}, min_scene {min_scene}: {selected} != {expected}"
            );
        }
    }

    #[test]
    fn test_weak_maximum_suppresses_strong_neighbour_in_trials() {
        // With min_sep 5 the weak maximum at 10 hides the strong one at 12,
        // so frame 12 never becomes a cut.
        let mut scores = vec![0.0; 50];
        scores[10] = 1.0;
        scores[12] = 90.0;
        scores[30] = 80.0;
        let series = ContentChangeSeries::from_scores(&scores, 10.0).unwrap();
        let threshold = select_threshold(&series, 0.5).unwrap();
        let ranges = crate::detection::segment(&series, threshold, 5, 5.0).unwrap();
        let starts: Vec<f64> = ranges.iter().map(|r| r.start_seconds()).collect();
        assert!(!starts.contains(&1.2));
        assert!(starts.contains(&3.0));
    }

    #[test]
    fn test_custom_percentiles_are_validated() {
        assert!(ThresholdSelector::with_percentiles(vec![]).is_err());
        assert!(ThresholdSelector::with_percentiles(vec![50.0, 120.0]).is_err());
        assert!(ThresholdSelector::with_percentiles(vec![90.0]).is_ok());
    }
}
