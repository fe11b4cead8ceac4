// ============================================================================
// scenecut-core/src/detectors/mod.rs
// ============================================================================
//
// CONTENT-CHANGE DETECTORS: Producers of per-frame change scores
//
// Every detection component reads a ContentChangeSeries and nothing else.
// This module defines the one capability that produces such a series from a
// video, plus the built-in implementations:
//
// - ContentDistanceDetector: mean HSV channel delta between consecutive frames
// - AdaptiveRatioDetector: content delta relative to its neighbourhood
// - PerceptualHashDetector: normalized Hamming distance of DCT hashes
// - StatsCsvDetector: scores precomputed by an external shot-boundary tool
//
// Frame-based detectors decode through a shared FrameSource, so tests can
// substitute in-memory frames for ffmpeg.

use crate::error::CoreResult;
use crate::external::FrameSource;
use crate::series::ContentChangeSeries;
use image::RgbImage;
use std::path::Path;

// ============================================================================
// SUBMODULES
// ============================================================================

pub mod adaptive;
pub mod content;
pub mod hash;
pub mod stats_csv;

pub use adaptive::{
    AdaptiveRatioDetector, DEFAULT_MIN_CONTENT_VALUE, DEFAULT_WINDOW_WIDTH, adaptive_ratios,
};
pub use content::{ContentDistanceDetector, content_distance, rgb_to_hsv};
pub use hash::{PerceptualHashDetector, normalized_hash_distance};
pub use stats_csv::{StatsCsvDetector, parse_stats_csv};

// ============================================================================
// DETECTOR CAPABILITY
// ============================================================================

/// Anything that turns a video into a frame-indexed change-score series.
pub trait ContentChangeDetector: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Computes the change series for `video`.
    fn produce(&self, video: &Path) -> CoreResult<ContentChangeSeries>;
}

/// Streams every frame of `video` through `score`, which sees the previous
/// frame (if any) and the current one.
pub(crate) fn score_consecutive_frames<F>(
    source: &dyn FrameSource,
    video: &Path,
    mut score: F,
) -> CoreResult<Vec<f64>>
where
    F: FnMut(Option<&RgbImage>, &RgbImage) -> f64,
{
    let mut scores = Vec::new();
    let mut previous: Option<RgbImage> = None;
    source.stream_frames(video, &mut |frame| {
        scores.push(score(previous.as_ref(), &frame.image));
        previous = Some(frame.image);
        Ok(())
    })?;
    Ok(scores)
}
