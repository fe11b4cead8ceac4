//! Scene-cut detection and refinement over a change series.
//!
//! The components here are pure and synchronous: they read an already
//! materialised [`ContentChangeSeries`](crate::series::ContentChangeSeries)
//! and perform no I/O, so they can be invoked concurrently on disjoint inputs.

pub mod consensus;
pub mod peaks;
pub mod refinement;
pub mod segmenter;
pub mod threshold;
pub mod types;

pub use consensus::{ConsensusSubSegmenter, ConsensusThresholds, CutVerdict, find_sub_scenes};
pub use peaks::{filter_peaks, find_peaks, local_maxima};
pub use refinement::{BoundaryRefiner, fitness, proximity_factor, refine};
pub use segmenter::{PeakSegmenter, enforce_min_duration, segment};
pub use threshold::{
    DEFAULT_FALLBACK_THRESHOLD, ThresholdCandidate, ThresholdSelector, min_separation_frames,
    percentile_of_sorted, select_threshold,
};
pub use types::{FuzzyBoundary, RefinedBoundary, SceneRange};
