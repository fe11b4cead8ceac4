// ============================================================================
// scenecut-core/src/detection/consensus.rs
// ============================================================================
//
// CONSENSUS SUB-SEGMENTATION: Find cuts missed inside a coarse scene
//
// Two independently computed signals are consulted over the same range: an
// adaptive content-change ratio (primary) and a perceptual-hash distance
// (secondary). Each proposes raw candidate cuts on its own; a candidate is
// accepted only when
//
//     adaptive >= adaptive_threshold AND hash >= hash_threshold   (consensus)
//     OR adaptive >= screamer_threshold                          (screamer)
//
// An empty result means "no sub-scenes", not failure.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use super::peaks::find_peaks;
use super::types::SceneRange;
use crate::error::{CoreResult, invalid};
use crate::series::ContentChangeSeries;

/// Default adaptive ratio required for a consensus cut.
pub const DEFAULT_ADAPTIVE_THRESHOLD: f64 = 7.0;

/// Default adaptive ratio that is accepted without hash agreement.
pub const DEFAULT_SCREAMER_THRESHOLD: f64 = 13.0;

/// Default normalized hash distance required for a consensus cut.
pub const DEFAULT_HASH_THRESHOLD: f64 = 0.4;

/// Default adaptive ratio a peak needs to be proposed as a candidate at all.
pub const DEFAULT_ADAPTIVE_CANDIDATE_FLOOR: f64 = 3.0;

/// Acceptance thresholds for the consensus pass.
///
/// These values are empirical defaults and worth tuning against labelled
/// footage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusThresholds {
    pub adaptive: f64,
    pub screamer: f64,
    pub hash: f64,
    pub candidate_floor: f64,
}

impl Default for ConsensusThresholds {
    fn default() -> Self {
        Self {
            adaptive: DEFAULT_ADAPTIVE_THRESHOLD,
            screamer: DEFAULT_SCREAMER_THRESHOLD,
            hash: DEFAULT_HASH_THRESHOLD,
            candidate_floor: DEFAULT_ADAPTIVE_CANDIDATE_FLOOR,
        }
    }
}

impl ConsensusThresholds {
    pub fn validate(&self) -> CoreResult<()> {
        for (name, value) in [
            ("adaptive threshold", self.adaptive),
            ("screamer threshold", self.screamer),
            ("hash threshold", self.hash),
            ("candidate floor", self.candidate_floor),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(format!("{name} must be non-negative, got {value}")));
            }
        }
        Ok(())
    }

    /// Decides one candidate cut from its two signal values.
    ///
    /// A missing value fails every test that needs it.
    pub fn judge(&self, adaptive: Option<f64>, hash: Option<f64>) -> CutVerdict {
        let Some(adaptive) = adaptive else {
            return CutVerdict::Rejected;
        };
        if adaptive >= self.screamer {
            return CutVerdict::Screamer;
        }
        match hash {
            Some(hash) if adaptive >= self.adaptive && hash >= self.hash => CutVerdict::Consensus,
            _ => CutVerdict::Rejected,
        }
    }
}

/// Why a candidate cut was or was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CutVerdict {
    Consensus,
    Screamer,
    Rejected,
}

impl CutVerdict {
    pub fn is_accepted(self) -> bool {
        !matches!(self, CutVerdict::Rejected)
    }
}

/// Raw cut proposed by one of the two detectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawCandidate {
    pub frame_index: u64,
    pub timestamp_seconds: f64,
}

/// Re-detects finer cuts inside a coarse range using two signals.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConsensusSubSegmenter {
    thresholds: ConsensusThresholds,
}

impl ConsensusSubSegmenter {
    pub fn new(thresholds: ConsensusThresholds) -> CoreResult<Self> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &ConsensusThresholds {
        &self.thresholds
    }

    /// Union of both detectors' peaks strictly inside `(range_start, range_end)`, by frame.
    ///
    /// Primary peaks must reach the candidate floor; secondary peaks must
    /// reach the hash threshold.
    pub fn raw_candidates(
        &self,
        range_start: f64,
        range_end: f64,
        primary: &ContentChangeSeries,
        secondary: &ContentChangeSeries,
    ) -> Vec<RawCandidate> {
        let mut by_frame: BTreeMap<u64, f64> = BTreeMap::new();
        for (series, floor) in [
            (primary, self.thresholds.candidate_floor),
            (secondary, self.thresholds.hash),
        ] {
            let points = series.points();
            for i in find_peaks(&series.scores(), floor, 1) {
                let point = &points[i];
                if point.timestamp_seconds > range_start && point.timestamp_seconds < range_end {
                    by_frame
                        .entry(point.frame_index)
                        .or_insert(point.timestamp_seconds);
                }
            }
        }
        by_frame
            .into_iter()
            .map(|(frame_index, timestamp_seconds)| RawCandidate {
                frame_index,
                timestamp_seconds,
            })
            .collect()
    }

    /// Splits `[range_start, range_end]` at the cuts both signals agree on.
    ///
    /// # Arguments
    ///
    /// * `range_start`, `range_end` - The coarse scene, in seconds
    /// * `primary` - Adaptive content-change ratios, indexed by frame
    /// * `secondary` - Perceptual-hash distances, indexed by frame
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<SceneRange>)` - Sub-scenes covering the whole range, or empty when
    ///   no candidate was accepted
    /// * `Err(CoreError::InvalidParameter)` - The range is negative or inverted
    pub fn find_sub_scenes(
        &self,
        range_start: f64,
        range_end: f64,
        primary: &ContentChangeSeries,
        secondary: &ContentChangeSeries,
    ) -> CoreResult<Vec<SceneRange>> {
        // Validates the bounds before any scanning.
        SceneRange::new(range_start, range_end)?;

        let candidates = self.raw_candidates(range_start, range_end, primary, secondary);
        // The range start is an implicit boundary; one more is needed to split anything.
        if candidates.is_empty() {
            debug!("No raw cuts in [{range_start:.3}, {range_end:.3}], nothing to split");
            return Ok(Vec::new());
        }

        let mut ranges = Vec::new();
        let mut current_start = range_start;
        for candidate in candidates {
            let adaptive = primary.score_at_frame(candidate.frame_index);
            let hash = secondary.score_at_frame(candidate.frame_index);
            let verdict = self.thresholds.judge(adaptive, hash);
            debug!(
                "Candidate frame {} at {:.3}s: adaptive={adaptive:?} hash={hash:?} -> {verdict:?}",
                candidate.frame_index, candidate.timestamp_seconds
            );
            if verdict.is_accepted() {
                ranges.push(SceneRange::new(current_start, candidate.timestamp_seconds)?);
                current_start = candidate.timestamp_seconds;
            }
        }

        if ranges.is_empty() {
            return Ok(ranges);
        }
        ranges.push(SceneRange::new(current_start, range_end)?);
        Ok(ranges)
    }
}

/// Runs the consensus pass with explicit thresholds.
pub fn find_sub_scenes(
    range_start: f64,
    range_end: f64,
    primary: &ContentChangeSeries,
    secondary: &ContentChangeSeries,
    thresholds: ConsensusThresholds,
) -> CoreResult<Vec<SceneRange>> {
    ConsensusSubSegmenter::new(thresholds)?.find_sub_scenes(range_start, range_end, primary, secondary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    /// 100 frames at 10 fps, zero except the given frames.
    fn signal(spikes: &[(usize, f64)]) -> ContentChangeSeries {
        let mut scores = vec![0.0; 100];
        for &(frame, value) in spikes {
            scores[frame] = value;
        }
        ContentChangeSeries::from_scores(&scores, 10.0).unwrap()
    }

    fn bounds(ranges: &[SceneRange]) -> Vec<(f64, f64)> {
        ranges
            .iter()
            .map(|r| (r.start_seconds(), r.end_seconds()))
            .collect()
    }

    #[test]
    fn test_hash_alone_is_not_enough() {
        let primary = signal(&[(50, 6.0)]);
        let secondary = signal(&[(50, 0.9)]);
        let ranges = ConsensusSubSegmenter::default()
            .find_sub_scenes(0.0, 10.0, &primary, &secondary)
            .unwrap();
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_screamer_overrides_missing_agreement() {
        let primary = signal(&[(50, 14.0)]);
        let secondary = signal(&[(50, 0.1)]);
        let ranges = ConsensusSubSegmenter::default()
            .find_sub_scenes(0.0, 10.0, &primary, &secondary)
            .unwrap();
        assert_eq!(bounds(&ranges), vec![(0.0, 5.0), (5.0, 10.0)]);
    }

    #[test]
    fn test_consensus_splits_on_agreement() {
        let primary = signal(&[(20, 8.0), (60, 9.0), (80, 4.0)]);
        let secondary = signal(&[(20, 0.5), (60, 0.45), (80, 0.9)]);
        let ranges = ConsensusSubSegmenter::default()
            .find_sub_scenes(0.0, 9.9, &primary, &secondary)
            .unwrap();
        assert_eq!(bounds(&ranges), vec![(0.0, 2.0), (2.0, 6.0), (6.0, 9.9)]);
    }

    #[test]
    fn test_candidates_outside_range_are_ignored() {
        let primary = signal(&[(10, 20.0), (90, 20.0)]);
        let secondary = signal(&[]);
        let ranges = ConsensusSubSegmenter::default()
            .find_sub_scenes(2.0, 8.0, &primary, &secondary)
            .unwrap();
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_missing_metric_rejects_consensus() {
        // Secondary only covers the first half of the range.
        let primary = signal(&[(70, 9.0)]);
        let secondary = ContentChangeSeries::from_scores(&[0.0; 50], 10.0).unwrap();
        let ranges = ConsensusSubSegmenter::default()
            .find_sub_scenes(0.0, 10.0, &primary, &secondary)
            .unwrap();
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_raw_candidates_merge_by_frame() {
        let primary = signal(&[(30, 5.0), (40, 2.0)]);
        let secondary = signal(&[(30, 0.6), (55, 0.7)]);
        let frames: Vec<u64> = ConsensusSubSegmenter::default()
            .raw_candidates(0.0, 10.0, &primary, &secondary)
            .iter()
            .map(|c| c.frame_index)
            .collect();
        // Frame 40 is below the candidate floor.
        assert_eq!(frames, vec![30, 55]);
    }

    #[test]
    fn test_invalid_range_fails_fast() {
        let primary = signal(&[]);
        let secondary = signal(&[]);
        let segmenter = ConsensusSubSegmenter::default();
        assert!(matches!(
            segmenter.find_sub_scenes(5.0, 5.0, &primary, &secondary),
            Err(CoreError::InvalidParameter(_))
        ));
        assert!(segmenter.find_sub_scenes(-1.0, 5.0, &primary, &secondary).is_err());
    }

    #[test]
    fn test_judge() {
        let t = ConsensusThresholds::default();
        assert_eq!(t.judge(Some(7.0), Some(0.4)), CutVerdict::Consensus);
        assert_eq!(t.judge(Some(13.0), None), CutVerdict::Screamer);
        assert_eq!(t.judge(Some(12.9), Some(0.39)), CutVerdict::Rejected);
        assert_eq!(t.judge(None, Some(1.0)), CutVerdict::Rejected);
    }
}
