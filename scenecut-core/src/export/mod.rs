//! Export planning: keyframe alignment and clip naming.

pub mod alignment;
pub mod clip;

pub use alignment::{Alignment, ExportAligner, ExportMode, KeyframeIndex, KeyframeProber, align};
pub use clip::{
    ClipPlan, ClipPlanSet, KeyframeSource, PlannedSegment, SegmentSource, SkippedClip,
    clip_file_name, plan_clips, sanitize_filename,
};
