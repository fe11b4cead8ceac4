//! Clip planning: aligned, named, millisecond-rounded export instructions.
//!
//! The core never invokes a transcoder. It hands back a list of
//! [`ClipPlan`] entries an external exporter can execute one by one.

use log::{debug, info};
use serde::Serialize;

use super::alignment::{Alignment, ExportAligner, KeyframeProber};
use crate::detection::SceneRange;
use crate::utils::seconds_to_millis;

/// Where a planned segment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SegmentSource {
    /// Whole-video automatic detection.
    Detected,
    /// Span between two refined boundaries, kept whole.
    Refined,
    /// Piece of a refined span split by the consensus pass.
    SubScene,
}

/// A scene range plus its provenance, ready for export planning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedSegment {
    pub range: SceneRange,
    /// Fitness of the refined boundary that opened this segment, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fitness_score: Option<f64>,
    pub source: SegmentSource,
}

impl PlannedSegment {
    pub fn detected(range: SceneRange) -> Self {
        Self {
            range,
            fitness_score: None,
            source: SegmentSource::Detected,
        }
    }
}

/// One clip the external exporter should produce.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipPlan {
    pub index: usize,
    pub file_name: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub duration_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fitness_score: Option<f64>,
    pub source: SegmentSource,
}

/// A segment dropped because alignment left nothing usable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedClip {
    pub index: usize,
    pub start_seconds: f64,
    pub end_seconds: f64,
}

/// Keyframe information available to the planner.
#[derive(Clone, Copy)]
pub enum KeyframeSource<'a> {
    /// Nothing known; fast mode keeps the original boundaries.
    Unavailable,
    /// Full ascending keyframe list from one probe.
    List(&'a [f64]),
    /// Per-boundary lookups.
    Prober(&'a dyn KeyframeProber),
}

/// Clips plus the segments that were skipped.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipPlanSet {
    pub clips: Vec<ClipPlan>,
    pub skipped: Vec<SkippedClip>,
}

/// Replaces every run of characters outside `[A-Za-z0-9._-]` with `_`.
///
/// An empty result becomes `"file"`.
///
/// # Examples
///
/// ```rust
/// use scenecut_core::export::sanitize_filename;
///
/// assert_eq!(sanitize_filename("my clip (final)!.mp4"), "my_clip_final_.mp4");
/// assert_eq!(sanitize_filename(""), "file");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    if out.is_empty() {
        "file".to_string()
    } else {
        out
    }
}

/// `<base>-<label>-<index:03>.mp4`, sanitized.
pub fn clip_file_name(base: &str, label: &str, index: usize) -> String {
    sanitize_filename(&format!("{base}-{label}-{index:03}.mp4"))
}

/// Aligns and names every segment.
///
/// Indices count every input segment, so a skipped segment leaves a gap
/// in the numbering rather than shifting later file names.
pub fn plan_clips(
    segments: &[PlannedSegment],
    aligner: &ExportAligner,
    keyframes: KeyframeSource<'_>,
    base_name: &str,
    label: &str,
    min_duration_seconds: f64,
) -> ClipPlanSet {
    let mut plan = ClipPlanSet::default();

    for (index, segment) in segments.iter().enumerate() {
        let alignment = match keyframes {
            KeyframeSource::Unavailable => aligner.align(&segment.range, None),
            KeyframeSource::List(times) => aligner.align(&segment.range, Some(times)),
            KeyframeSource::Prober(prober) => aligner.align_with_prober(&segment.range, prober),
        };

        let usable = match alignment {
            Alignment::Usable(range) if range.duration() >= min_duration_seconds => range,
            Alignment::Usable(range) => {
                plan.skipped.push(SkippedClip {
                    index,
                    start_seconds: range.start_seconds(),
                    end_seconds: range.end_seconds(),
                });
                continue;
            }
            Alignment::Unusable {
                start_seconds,
                end_seconds,
            } => {
                plan.skipped.push(SkippedClip {
                    index,
                    start_seconds,
                    end_seconds,
                });
                continue;
            }
        };

        let start_ms = seconds_to_millis(usable.start_seconds());
        let end_ms = seconds_to_millis(usable.end_seconds());
        let clip = ClipPlan {
            index,
            file_name: clip_file_name(base_name, label, index),
            start_ms,
            end_ms,
            duration_ms: seconds_to_millis(usable.duration()),
            fitness_score: segment.fitness_score,
            source: segment.source,
        };
        debug!(
            "Planned clip {} [{start_ms}ms, {end_ms}ms] -> {}",
            index, clip.file_name
        );
        plan.clips.push(clip);
    }

    info!(
        "Planned {} clip(s), skipped {}",
        plan.clips.len(),
        plan.skipped.len()
    );
    plan
}
