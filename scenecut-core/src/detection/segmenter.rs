//! Turns peaks in a change series into ordered scene ranges.

use log::{debug, warn};

use super::peaks::{cut_indices_with_bounds, find_peaks};
use super::types::SceneRange;
use crate::error::{CoreResult, invalid};
use crate::series::ContentChangeSeries;

/// Cuts a series at its peaks above a fixed threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakSegmenter {
    threshold: f64,
    min_separation_frames: usize,
}

impl PeakSegmenter {
    pub fn new(threshold: f64, min_separation_frames: usize) -> CoreResult<Self> {
        if threshold.is_nan() {
            return Err(invalid("segmentation threshold must be a number"));
        }
        Ok(Self {
            threshold,
            min_separation_frames: min_separation_frames.max(1),
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn min_separation_frames(&self) -> usize {
        self.min_separation_frames
    }

    /// Series positions used as cuts: `0`, every accepted peak, and the last index.
    pub fn cut_indices(&self, series: &ContentChangeSeries) -> Vec<usize> {
        let scores = series.scores();
        let peaks = find_peaks(&scores, self.threshold, self.min_separation_frames);
        cut_indices_with_bounds(&peaks, scores.len())
    }

    /// Splits `series` into consecutive scene ranges.
    ///
    /// Ranges run between the timestamps of consecutive cut positions, so
    /// together they cover `[first timestamp, last timestamp]` without gaps.
    /// A series with fewer than two points cannot be cut and yields the
    /// single range `(0, total_duration)`, with `total_duration` supplied by
    /// the media prober.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<SceneRange>)` - Ranges in ascending time order
    /// * `Err(CoreError::InvalidParameter)` - `total_duration` is needed but not positive
    pub fn segment(
        &self,
        series: &ContentChangeSeries,
        total_duration: f64,
    ) -> CoreResult<Vec<SceneRange>> {
        if series.len() < 2 {
            warn!(
                "Series has {} point(s), returning the whole video as one scene",
                series.len()
            );
            return Ok(vec![SceneRange::new(0.0, total_duration)?]);
        }

        let points = series.points();
        let cuts = self.cut_indices(series);
        let mut ranges = Vec::with_capacity(cuts.len() - 1);
        for pair in cuts.windows(2) {
            let start = points[pair[0]].timestamp_seconds;
            let end = points[pair[1]].timestamp_seconds;
            ranges.push(SceneRange::new(start, end)?);
        }
        debug!(
            "Segmented {} points at threshold {:.4} into {} ranges",
            series.len(),
            self.threshold,
            ranges.len()
        );
        Ok(ranges)
    }
}

/// Convenience wrapper: `PeakSegmenter::new(threshold, sep)?.segment(series, total_duration)`.
pub fn segment(
    series: &ContentChangeSeries,
    threshold: f64,
    min_separation_frames: usize,
    total_duration: f64,
) -> CoreResult<Vec<SceneRange>> {
    PeakSegmenter::new(threshold, min_separation_frames)?.segment(series, total_duration)
}

/// Drops ranges shorter than `min_scene_seconds`.
///
/// If nothing survives, the whole video `(0, total_duration)` is returned
/// so callers always receive at least one usable range.
pub fn enforce_min_duration(
    ranges: Vec<SceneRange>,
    min_scene_seconds: f64,
    total_duration: f64,
) -> CoreResult<Vec<SceneRange>> {
    if !(min_scene_seconds.is_finite() && min_scene_seconds >= 0.0) {
        return Err(invalid(format!(
            "minimum scene length must be non-negative, got {min_scene_seconds}"
        )));
    }

    let before = ranges.len();
    let kept: Vec<SceneRange> = ranges
        .into_iter()
        .filter(|r| r.duration() >= min_scene_seconds)
        .collect();
    if kept.len() < before {
        debug!(
            "Dropped {} range(s) shorter than {min_scene_seconds:.3}s",
            before - kept.len()
        );
    }

    if kept.is_empty() {
        warn!("No range meets the minimum scene length, using the whole video");
        return Ok(vec![SceneRange::new(0.0, total_duration)?]);
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_flat_series_is_one_range() {
        let series = ContentChangeSeries::from_scores(&[2.0; 10], 10.0).unwrap();
        let ranges = segment(&series, 27.0, 1, 1.0).unwrap();
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].start_seconds(), 0.0);
        assert!((ranges[0].end_seconds() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_empty_series_spans_probed_duration() {
        let series = ContentChangeSeries::new(Vec::new(), 25.0).unwrap();
        let ranges = segment(&series, 10.0, 1, 42.0).unwrap();
        assert_eq!(ranges, vec![SceneRange::new(0.0, 42.0).unwrap()]);
        assert!(segment(&series, 10.0, 1, 0.0).is_err());
    }

    #[test]
    fn test_cuts_at_peaks() {
        let mut scores = vec![1.0; 30];
        scores[10] = 50.0;
        scores[20] = 60.0;
        let series = ContentChangeSeries::from_scores(&scores, 10.0).unwrap();
        let segmenter = PeakSegmenter::new(30.0, 5).unwrap();
        assert_eq!(segmenter.cut_indices(&series), vec![0, 10, 20, 29]);

        let ranges = segmenter.segment(&series, 3.0).unwrap();
        let bounds: Vec<(f64, f64)> = ranges
            .iter()
            .map(|r| (r.start_seconds(), r.end_seconds()))
            .collect();
        assert_eq!(bounds.len(), 3);
        assert!((bounds[0].1 - 1.0).abs() < 1e-12);
        assert!((bounds[1].1 - 2.0).abs() < 1e-12);
        assert!((bounds[2].1 - 2.9).abs() < 1e-12);
    }

    #[test]
    fn test_ranges_tile_the_series() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let len = rng.gen_range(2..300);
            let scores: Vec<f64> = (0..len).map(|_| rng.gen_range(0.0..60.0)).collect();
            let series = ContentChangeSeries::from_scores(&scores, 24.0).unwrap();
            let threshold = rng.gen_range(0.0..60.0);
            let sep = rng.gen_range(1..20);
            let ranges = segment(&series, threshold, sep, 100.0).unwrap();

            assert_eq!(ranges[0].start_seconds(), 0.0);
            assert_eq!(
                ranges.last().unwrap().end_seconds(),
                series.last_timestamp()
            );
            for pair in ranges.windows(2) {
                assert_eq!(pair[0].end_seconds(), pair[1].start_seconds());
            }
        }
    }

    #[test]
    fn test_selected_threshold_never_yields_short_scenes() {
        let mut rng = StdRng::seed_from_u64(0x5E6);
        for _ in 0..100 {
            let len = rng.gen_range(20..300);
            let scores: Vec<f64> = (0..len).map(|_| rng.gen_range(0.0..100.0)).collect();
            let series = ContentChangeSeries::from_scores(&scores, 10.0).unwrap();
            let min_scene = rng.gen_range(0.2..2.0);
            let sep = crate::detection::min_separation_frames(min_scene, 10.0).unwrap();

            let selector = crate::detection::ThresholdSelector::default();
            if !selector
                .evaluate_candidates(&series, min_scene)
                .unwrap()
                .iter()
                .any(|c| c.valid)
            {
                continue;
            }
            let threshold = selector.select_threshold(&series, min_scene).unwrap();
            let cuts = PeakSegmenter::new(threshold, sep).unwrap().cut_indices(&series);
            assert!(cuts.windows(2).all(|w| w[1] - w[0] >= sep));
        }
    }

    #[test]
    fn test_enforce_min_duration_drops_short_ranges() {
        let ranges = vec![
            SceneRange::new(0.0, 4.0).unwrap(),
            SceneRange::new(4.0, 5.0).unwrap(),
            SceneRange::new(5.0, 9.0).unwrap(),
        ];
        let kept = enforce_min_duration(ranges, 3.0, 9.0).unwrap();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].start_seconds(), 5.0);
    }

    #[test]
    fn test_enforce_min_duration_falls_back_to_whole_video() {
        let ranges = vec![SceneRange::new(0.0, 1.0).unwrap()];
        let kept = enforce_min_duration(ranges, 3.0, 12.0).unwrap();
        assert_eq!(kept, vec![SceneRange::new(0.0, 12.0).unwrap()]);
    }
}
