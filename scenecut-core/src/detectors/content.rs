//! Content-distance detector.
//!
//! Each frame is converted to HSV on the 8-bit scale (hue 0-179, saturation
//! and value 0-255). A frame's score is the mean of the three per-channel
//! mean absolute differences from the previous frame. The first frame
//! scores 0. This is the metric the 27.0 fallback threshold is calibrated
//! against.

use std::path::Path;
use std::sync::Arc;

use image::RgbImage;
use log::debug;

use super::{ContentChangeDetector, score_consecutive_frames};
use crate::error::{CoreResult, invalid};
use crate::external::FrameSource;
use crate::series::ContentChangeSeries;

/// Converts one 8-bit RGB pixel to `[h, s, v]` with hue halved into 0-179.
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [f64; 3] {
    let r = f64::from(rgb[0]);
    let g = f64::from(rgb[1]);
    let b = f64::from(rgb[2]);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max > 0.0 { delta / max * 255.0 } else { 0.0 };
    let h_degrees = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        60.0 * (b - r) / delta + 120.0
    } else {
        60.0 * (r - g) / delta + 240.0
    };
    let h_degrees = if h_degrees < 0.0 { h_degrees + 360.0 } else { h_degrees };

    [h_degrees / 2.0, s, max]
}

/// Mean HSV delta between two frames of the same size.
///
/// Frames of different sizes score 0, which never produces a cut.
pub fn content_distance(previous: &RgbImage, current: &RgbImage) -> f64 {
    if previous.dimensions() != current.dimensions() {
        return 0.0;
    }
    let pixel_count = previous.pixels().len();
    if pixel_count == 0 {
        return 0.0;
    }

    let mut sums = [0.0_f64; 3];
    for (a, b) in previous.pixels().zip(current.pixels()) {
        let ha = rgb_to_hsv(a.0);
        let hb = rgb_to_hsv(b.0);
        for (sum, (x, y)) in sums.iter_mut().zip(ha.iter().zip(hb.iter())) {
            *sum += (x - y).abs();
        }
    }

    let n = pixel_count as f64;
    sums.iter().map(|s| s / n).sum::<f64>() / 3.0
}

/// Scores consecutive decoded frames by [`content_distance`].
#[derive(Clone)]
pub struct ContentDistanceDetector {
    source: Arc<dyn FrameSource>,
    frame_rate: f64,
}

impl ContentDistanceDetector {
    pub fn new(source: Arc<dyn FrameSource>, frame_rate: f64) -> CoreResult<Self> {
        if !(frame_rate.is_finite() && frame_rate > 0.0) {
            return Err(invalid(format!("frame rate must be positive, got {frame_rate}")));
        }
        Ok(Self { source, frame_rate })
    }

    /// Raw per-frame content values, first frame 0.
    pub fn content_values(&self, video: &Path) -> CoreResult<Vec<f64>> {
        score_consecutive_frames(self.source.as_ref(), video, |prev, cur| {
            prev.map_or(0.0, |p| content_distance(p, cur))
        })
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }
}

impl ContentChangeDetector for ContentDistanceDetector {
    fn name(&self) -> &'static str {
        "content"
    }

    fn produce(&self, video: &Path) -> CoreResult<ContentChangeSeries> {
        let values = self.content_values(video)?;
        debug!("content: {} frames from {}", values.len(), video.display());
        ContentChangeSeries::from_scores(&values, self.frame_rate)
    }
}
