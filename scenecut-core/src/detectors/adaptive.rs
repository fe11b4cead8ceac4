//! Adaptive-ratio detector.
//!
//! Camera motion raises the content score of whole stretches of frames. The
//! adaptive ratio divides each frame's content value by the mean of its
//! neighbours, so only values that stand out locally score high.

use std::path::Path;
use std::sync::Arc;

use log::debug;

use super::ContentChangeDetector;
use crate::error::CoreResult;
use crate::series::ContentChangeSeries;

/// Neighbouring frames averaged on each side.
pub const DEFAULT_WINDOW_WIDTH: usize = 2;

/// Content values below this never register as a cut.
pub const DEFAULT_MIN_CONTENT_VALUE: f64 = 15.0;

/// Upper bound of the ratio, also used when the neighbourhood is static.
const MAX_RATIO: f64 = 255.0;

/// Ratio of each content value to the mean of up to `window_width`
/// neighbours on each side.
///
/// Frames near the series edges average over the neighbours they have.
/// A value below `min_content_value` scores 0. A value at or above it with
/// an all-zero neighbourhood scores the cap.
///
/// # Examples
///
/// ```rust
/// use scenecut_core::detectors::adaptive_ratios;
///
/// let ratios = adaptive_ratios(&[2.0, 2.0, 40.0, 2.0, 2.0], 2, 15.0);
/// assert_eq!(ratios[2], 20.0);
/// assert_eq!(ratios[0], 0.0);
/// ```
pub fn adaptive_ratios(content: &[f64], window_width: usize, min_content_value: f64) -> Vec<f64> {
    let n = content.len();
    (0..n)
        .map(|i| {
            let value = content[i];
            if value < min_content_value {
                return 0.0;
            }
            let lo = i.saturating_sub(window_width);
            let hi = (i + window_width).min(n.saturating_sub(1));
            let neighbours: Vec<f64> = (lo..=hi).filter(|&j| j != i).map(|j| content[j]).collect();
            if neighbours.is_empty() {
                return 0.0;
            }
            let mean = neighbours.iter().sum::<f64>() / neighbours.len() as f64;
            if mean.abs() < 1e-5 {
                MAX_RATIO
            } else {
                (value / mean).min(MAX_RATIO)
            }
        })
        .collect()
}

/// Reports adaptive ratios over the series of another content detector.
#[derive(Clone)]
pub struct AdaptiveRatioDetector {
    content: Arc<dyn ContentChangeDetector>,
}

impl AdaptiveRatioDetector {
    /// `content` is usually a [`ContentDistanceDetector`](super::ContentDistanceDetector)
    /// or a [`StatsCsvDetector`](super::StatsCsvDetector).
    pub fn new(content: Arc<dyn ContentChangeDetector>) -> Self {
        Self { content }
    }
}

impl ContentChangeDetector for AdaptiveRatioDetector {
    fn name(&self) -> &'static str {
        "adaptive"
    }

    fn produce(&self, video: &Path) -> CoreResult<ContentChangeSeries> {
        let content = self.content.produce(video)?;
        let ratios = adaptive_ratios(
            &content.scores(),
            DEFAULT_WINDOW_WIDTH,
            DEFAULT_MIN_CONTENT_VALUE,
        );
        debug!(
            "adaptive: {} frames over '{}' from {}",
            ratios.len(),
            self.content.name(),
            video.display()
        );
        ContentChangeSeries::from_scores(&ratios, content.frame_rate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::{ContentDistanceDetector, StatsCsvDetector};
    use crate::external::mocks::MockFrameSource;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_static_neighbourhood_caps_ratio() {
        let ratios = adaptive_ratios(&[0.0, 0.0, 30.0, 0.0, 0.0], 2, 15.0);
        assert_eq!(ratios, vec![0.0, 0.0, 255.0, 0.0, 0.0]);
    }

    #[test]
    fn test_motion_is_damped() {
        // Steady high content everywhere: no frame stands out.
        let ratios = adaptive_ratios(&[40.0; 7], 2, 15.0);
        assert!(ratios.iter().all(|&r| (r - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_edges_use_available_neighbours() {
        let ratios = adaptive_ratios(&[20.0, 10.0, 10.0], 2, 15.0);
        assert_eq!(ratios[0], 2.0);
    }

    #[test]
    fn test_single_value_scores_zero() {
        assert_eq!(adaptive_ratios(&[100.0], 2, 15.0), vec![0.0]);
        assert!(adaptive_ratios(&[], 2, 15.0).is_empty());
    }

    #[test]
    fn test_detector_wraps_content() {
        let source = MockFrameSource::solid(
            &[[0, 0, 0], [0, 0, 0], [0, 0, 0], [255, 0, 0], [255, 0, 0], [255, 0, 0]],
            4,
            4,
            25.0,
        );
        let content = ContentDistanceDetector::new(Arc::new(source), 25.0).unwrap();
        let series = AdaptiveRatioDetector::new(Arc::new(content))
            .produce(Path::new("mock.mp4"))
            .unwrap();
        let scores = series.scores();
        assert_eq!(scores[3], 255.0);
        assert_eq!(scores[2], 0.0);
        assert_eq!(series.frame_rate(), 25.0);
    }

    #[test]
    fn test_detector_wraps_stats_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Frame Number,content_val").unwrap();
        for (i, value) in [2.0, 2.0, 40.0, 2.0, 2.0].iter().enumerate() {
            writeln!(file, "{},{}", i + 1, value).unwrap();
        }
        file.flush().unwrap();

        let stats = StatsCsvDetector::new(file.path(), 10.0).unwrap();
        let series = AdaptiveRatioDetector::new(Arc::new(stats))
            .produce(Path::new("unused.mp4"))
            .unwrap();
        assert_eq!(series.scores(), vec![0.0, 0.0, 20.0, 0.0, 0.0]);
        assert_eq!(series.frame_rate(), 10.0);
    }
}
