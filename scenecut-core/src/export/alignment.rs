// ============================================================================
// scenecut-core/src/export/alignment.rs
// ============================================================================
//
// EXPORT ALIGNMENT: Keyframe snapping for stream-copy export
//
// Fast export copies the bitstream without re-encoding, so a clip can only
// start on a keyframe. The start moves forward to the first keyframe at or
// after it and the end moves back to the last keyframe at or before it.
// Sparse keyframes can collapse a range into a sliver; such results are
// reported as `Alignment::Unusable` so the caller skips that one clip and
// carries on. Precise export re-encodes and keeps the range as is.

use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MIN_EXPORT_SECONDS;
use crate::detection::SceneRange;
use crate::error::{CoreError, CoreResult, invalid};

/// How clips will be cut by the downstream transcoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// Stream copy; boundaries must land on keyframes.
    #[default]
    Fast,
    /// Re-encode; any boundary is allowed.
    Precise,
}

impl FromStr for ExportMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(ExportMode::Fast),
            "precise" | "precision" => Ok(ExportMode::Precise),
            other => Err(invalid(format!(
                "export mode must be 'fast' or 'precise', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportMode::Fast => write!(f, "fast"),
            ExportMode::Precise => write!(f, "precise"),
        }
    }
}

/// Result of aligning one range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum Alignment {
    Usable(SceneRange),
    /// Alignment collapsed the range; skip this clip.
    Unusable { start_seconds: f64, end_seconds: f64 },
}

impl Alignment {
    pub fn usable(self) -> Option<SceneRange> {
        match self {
            Alignment::Usable(range) => Some(range),
            Alignment::Unusable { .. } => None,
        }
    }
}

/// Single-boundary keyframe lookups, used when no full keyframe list is available.
pub trait KeyframeProber {
    /// Smallest keyframe time `>= seconds`.
    fn next_keyframe(&self, seconds: f64) -> Option<f64>;

    /// Largest keyframe time `<= seconds`.
    fn previous_keyframe(&self, seconds: f64) -> Option<f64>;
}

/// Sorted keyframe timestamps answering [`KeyframeProber`] queries in memory.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyframeIndex {
    times: Vec<f64>,
}

impl KeyframeIndex {
    /// Builds an index, sorting and dropping non-finite entries.
    pub fn new(mut times: Vec<f64>) -> Self {
        times.retain(|t| t.is_finite());
        times.sort_by(f64::total_cmp);
        times.dedup();
        Self { times }
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

impl KeyframeProber for KeyframeIndex {
    fn next_keyframe(&self, seconds: f64) -> Option<f64> {
        let i = self.times.partition_point(|&t| t < seconds);
        self.times.get(i).copied()
    }

    fn previous_keyframe(&self, seconds: f64) -> Option<f64> {
        let i = self.times.partition_point(|&t| t <= seconds);
        i.checked_sub(1).map(|i| self.times[i])
    }
}

/// Maps scene ranges onto exportable clip boundaries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportAligner {
    mode: ExportMode,
    min_duration_seconds: f64,
}

impl ExportAligner {
    pub fn new(mode: ExportMode) -> Self {
        Self {
            mode,
            min_duration_seconds: DEFAULT_MIN_EXPORT_SECONDS,
        }
    }

    /// Overrides the shortest clip accepted after alignment.
    pub fn with_min_duration(mode: ExportMode, min_duration_seconds: f64) -> CoreResult<Self> {
        if !(min_duration_seconds.is_finite() && min_duration_seconds >= 0.0) {
            return Err(invalid(format!(
                "minimum export duration must be non-negative, got {min_duration_seconds}"
            )));
        }
        Ok(Self {
            mode,
            min_duration_seconds,
        })
    }

    pub fn mode(&self) -> ExportMode {
        self.mode
    }

    /// Aligns `range` against a pre-probed, ascending keyframe list.
    ///
    /// With no list (or an empty one) fast mode leaves the boundaries where
    /// they are; use [`ExportAligner::align_with_prober`] to probe per
    /// boundary instead.
    pub fn align(&self, range: &SceneRange, keyframe_times: Option<&[f64]>) -> Alignment {
        if self.mode == ExportMode::Precise {
            return Alignment::Usable(*range);
        }
        match keyframe_times {
            Some(times) if !times.is_empty() => {
                let start = range.start_seconds();
                let end = range.end_seconds();
                let si = times.partition_point(|&t| t < start);
                let aligned_start = times.get(si).copied().unwrap_or(start);
                let ei = times.partition_point(|&t| t <= end);
                let aligned_end = ei.checked_sub(1).map_or(end, |i| times[i]);
                self.check(range, aligned_start, aligned_end)
            }
            _ => self.check(range, range.start_seconds(), range.end_seconds()),
        }
    }

    /// Aligns `range` by asking `prober` for the keyframes around each boundary.
    pub fn align_with_prober(&self, range: &SceneRange, prober: &dyn KeyframeProber) -> Alignment {
        if self.mode == ExportMode::Precise {
            return Alignment::Usable(*range);
        }
        let aligned_start = prober
            .next_keyframe(range.start_seconds())
            .unwrap_or(range.start_seconds());
        let aligned_end = prober
            .previous_keyframe(range.end_seconds())
            .unwrap_or(range.end_seconds());
        self.check(range, aligned_start, aligned_end)
    }

    fn check(&self, original: &SceneRange, start: f64, end: f64) -> Alignment {
        if end <= start || end - start < self.min_duration_seconds {
            debug!(
                "Skipping unusable aligned range [{start:.3}, {end:.3}] from [{:.3}, {:.3}]",
                original.start_seconds(),
                original.end_seconds()
            );
            return Alignment::Unusable {
                start_seconds: start,
                end_seconds: end,
            };
        }
        match SceneRange::new(start, end) {
            Ok(aligned) => Alignment::Usable(aligned),
            Err(_) => Alignment::Unusable {
                start_seconds: start,
                end_seconds: end,
            },
        }
    }
}

/// Aligns one range with the default sliver limit.
pub fn align(range: &SceneRange, mode: ExportMode, keyframe_times: Option<&[f64]>) -> Alignment {
    ExportAligner::new(mode).align(range, keyframe_times)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn range(start: f64, end: f64) -> SceneRange {
        SceneRange::new(start, end).unwrap()
    }

    #[test]
    fn test_precise_mode_is_identity() {
        let r = range(1.23, 4.56);
        let once = align(&r, ExportMode::Precise, Some(&[0.0, 2.0, 4.0]));
        assert_eq!(once, Alignment::Usable(r));
        let twice = align(&once.usable().unwrap(), ExportMode::Precise, None);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_fast_mode_snaps_inward() {
        let keyframes = [0.0, 2.0, 4.0, 6.0, 8.0];
        let aligned = align(&range(1.5, 7.9), ExportMode::Fast, Some(&keyframes));
        assert_eq!(aligned, Alignment::Usable(range(2.0, 6.0)));
    }

    #[test]
    fn test_exact_keyframe_boundaries_are_kept() {
        let keyframes = [0.0, 2.0, 4.0];
        let aligned = align(&range(2.0, 4.0), ExportMode::Fast, Some(&keyframes));
        assert_eq!(aligned, Alignment::Usable(range(2.0, 4.0)));
    }

    #[test]
    fn test_missing_keyframes_fall_back_to_original_bounds() {
        // The only keyframe lies past the end: start jumps to it, end stays.
        let late = [10.0];
        let aligned = align(&range(1.0, 3.0), ExportMode::Fast, Some(&late));
        assert!(matches!(aligned, Alignment::Unusable { .. }));

        let early = [0.5];
        let aligned = align(&range(1.0, 3.0), ExportMode::Fast, Some(&early));
        // Start keeps 1.0 (no keyframe >= 1.0), end snaps back to 0.5.
        assert_eq!(
            aligned,
            Alignment::Unusable {
                start_seconds: 1.0,
                end_seconds: 0.5
            }
        );

        let aligned = align(&range(1.0, 3.0), ExportMode::Fast, Some(&[]));
        assert_eq!(aligned, Alignment::Usable(range(1.0, 3.0)));
        let aligned = align(&range(1.0, 3.0), ExportMode::Fast, None);
        assert_eq!(aligned, Alignment::Usable(range(1.0, 3.0)));
    }

    #[test]
    fn test_sliver_is_unusable() {
        let keyframes = [0.0, 5.0, 5.04, 10.0];
        let aligned = align(&range(4.9, 5.045), ExportMode::Fast, Some(&keyframes));
        assert_eq!(
            aligned,
            Alignment::Unusable {
                start_seconds: 5.0,
                end_seconds: 5.04
            }
        );
    }

    struct CountingProber {
        index: KeyframeIndex,
        calls: Cell<usize>,
    }

    impl KeyframeProber for CountingProber {
        fn next_keyframe(&self, seconds: f64) -> Option<f64> {
            self.calls.set(self.calls.get() + 1);
            self.index.next_keyframe(seconds)
        }

        fn previous_keyframe(&self, seconds: f64) -> Option<f64> {
            self.calls.set(self.calls.get() + 1);
            self.index.previous_keyframe(seconds)
        }
    }

    #[test]
    fn test_prober_path_matches_list_path() {
        let prober = CountingProber {
            index: KeyframeIndex::new(vec![8.0, 0.0, 4.0, 2.0, 6.0]),
            calls: Cell::new(0),
        };
        let aligner = ExportAligner::new(ExportMode::Fast);
        let r = range(3.1, 7.2);
        let probed = aligner.align_with_prober(&r, &prober);
        let listed = aligner.align(&r, Some(prober.index.times()));
        assert_eq!(probed, listed);
        assert_eq!(probed, Alignment::Usable(range(4.0, 6.0)));
        assert_eq!(prober.calls.get(), 2);

        let precise = ExportAligner::new(ExportMode::Precise).align_with_prober(&r, &prober);
        assert_eq!(precise, Alignment::Usable(r));
        assert_eq!(prober.calls.get(), 2);
    }

    #[test]
    fn test_export_mode_parsing() {
        assert_eq!("fast".parse::<ExportMode>().unwrap(), ExportMode::Fast);
        assert_eq!("Precision".parse::<ExportMode>().unwrap(), ExportMode::Precise);
        assert_eq!("precise".parse::<ExportMode>().unwrap(), ExportMode::Precise);
        assert!("copy".parse::<ExportMode>().is_err());
    }

    #[test]
    fn test_custom_min_duration() {
        let aligner = ExportAligner::with_min_duration(ExportMode::Fast, 1.0).unwrap();
        let aligned = aligner.align(&range(0.0, 0.8), None);
        assert!(matches!(aligned, Alignment::Unusable { .. }));
        assert!(ExportAligner::with_min_duration(ExportMode::Fast, -0.1).is_err());
    }
}
