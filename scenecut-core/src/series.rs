//! Frame-indexed content-change series.
//!
//! A [`ContentChangeSeries`] is the substrate every detection component
//! reads: one [`ContentChangePoint`] per analysed frame, ordered by frame
//! index and timestamp, plus the frame rate the indices were taken at.
//! Series are validated on construction and never mutated afterwards.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{CoreResult, invalid};

/// Change score of one frame relative to the frame before it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentChangePoint {
    pub frame_index: u64,
    pub timestamp_seconds: f64,
    pub change_score: f64,
}

impl ContentChangePoint {
    pub fn new(frame_index: u64, timestamp_seconds: f64, change_score: f64) -> Self {
        Self {
            frame_index,
            timestamp_seconds,
            change_score,
        }
    }
}

/// Ordered sequence of change points plus the frame rate they were sampled at.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentChangeSeries {
    points: Vec<ContentChangePoint>,
    frame_rate: f64,
}

impl ContentChangeSeries {
    /// Creates a series after checking its invariants.
    ///
    /// # Arguments
    ///
    /// * `points` - Change points in ascending frame order
    /// * `frame_rate` - Frames per second, strictly positive
    ///
    /// # Returns
    ///
    /// * `Ok(ContentChangeSeries)` - The validated series (may be empty)
    /// * `Err(CoreError::InvalidParameter)` - Non-positive frame rate, negative or
    ///   non-finite values, or indices/timestamps that do not strictly increase
    pub fn new(points: Vec<ContentChangePoint>, frame_rate: f64) -> CoreResult<Self> {
        if !(frame_rate.is_finite() && frame_rate > 0.0) {
            return Err(invalid(format!(
                "frame rate must be positive, got {frame_rate}"
            )));
        }

        for (i, point) in points.iter().enumerate() {
            if !(point.timestamp_seconds.is_finite() && point.timestamp_seconds >= 0.0) {
                return Err(invalid(format!(
                    "timestamp at position {i} must be non-negative, got {}",
                    point.timestamp_seconds
                )));
            }
            if !(point.change_score.is_finite() && point.change_score >= 0.0) {
                return Err(invalid(format!(
                    "change score at frame {} must be non-negative, got {}",
                    point.frame_index, point.change_score
                )));
            }
            if i > 0 {
                let prev = &points[i - 1];
                if point.frame_index <= prev.frame_index
                    || point.timestamp_seconds <= prev.timestamp_seconds
                {
                    return Err(invalid(format!(
                        "series must be strictly increasing, frame {} follows frame {}",
                        point.frame_index, prev.frame_index
                    )));
                }
            }
        }

        Ok(Self { points, frame_rate })
    }

    /// Builds a series from raw per-frame scores, frame `i` at `i / frame_rate` seconds.
    pub fn from_scores(scores: &[f64], frame_rate: f64) -> CoreResult<Self> {
        let points = scores
            .iter()
            .enumerate()
            .map(|(i, &score)| ContentChangePoint::new(i as u64, i as f64 / frame_rate, score))
            .collect();
        Self::new(points, frame_rate)
    }

    pub fn points(&self) -> &[ContentChangePoint] {
        &self.points
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Change scores in series order.
    pub fn scores(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.change_score).collect()
    }

    /// Timestamp of the final point, `0.0` for an empty series.
    pub fn last_timestamp(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.timestamp_seconds)
    }

    /// Sub-series of the points whose timestamps fall in `[start, end]`.
    pub fn window(&self, start_seconds: f64, end_seconds: f64) -> ContentChangeSeries {
        let lo = self
            .points
            .partition_point(|p| p.timestamp_seconds < start_seconds);
        let hi = self
            .points
            .partition_point(|p| p.timestamp_seconds <= end_seconds);
        let points = if lo < hi {
            self.points[lo..hi].to_vec()
        } else {
            Vec::new()
        };
        ContentChangeSeries {
            points,
            frame_rate: self.frame_rate,
        }
    }

    /// Score recorded for `frame_index`, if that frame is in the series.
    pub fn score_at_frame(&self, frame_index: u64) -> Option<f64> {
        self.points
            .binary_search_by_key(&frame_index, |p| p.frame_index)
            .ok()
            .map(|i| self.points[i].change_score)
    }

    /// Point recorded for `frame_index`, if present.
    pub fn point_at_frame(&self, frame_index: u64) -> Option<&ContentChangePoint> {
        self.points
            .binary_search_by_key(&frame_index, |p| p.frame_index)
            .ok()
            .map(|i| &self.points[i])
    }

    /// Frame index nearest to `seconds` at this series' frame rate.
    pub fn frame_for_time(&self, seconds: f64) -> u64 {
        (seconds * self.frame_rate).round().max(0.0) as u64
    }

    /// Hex SHA-256 over the frame rate and every point's bit pattern.
    ///
    /// Identical series always hash identically, so results can be cached
    /// by `(fingerprint, parameters)`.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.frame_rate.to_bits().to_le_bytes());
        hasher.update((self.points.len() as u64).to_le_bytes());
        for point in &self.points {
            hasher.update(point.frame_index.to_le_bytes());
            hasher.update(point.timestamp_seconds.to_bits().to_le_bytes());
            hasher.update(point.change_score.to_bits().to_le_bytes());
        }
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}
