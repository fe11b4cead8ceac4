// ============================================================================
// scenecut-core/src/pipeline.rs
// ============================================================================
//
// SCENE PIPELINE: Orchestration of detection, refinement and export planning
//
// This module is the single place where the detection components are wired
// together. It owns no global state: configuration is handed in once, media
// facts (duration, keyframes) are passed per call, and progress leaves
// through an injected callback.
//
// KEY COMPONENTS:
// - ScenePipeline: Holds the configuration and the progress callback
// - SceneSignals: The change series a refinement run works from
// - ScenePlan: Serializable result of a full run
//
// WORKFLOW:
// 1. Automatic detection:
//    a. Choose a threshold (auto-selected or fixed)
//    b. Segment the series at its peaks
//    c. Drop ranges below the minimum scene length
// 2. Hint refinement:
//    a. Clamp and refine every approximate boundary (in parallel)
//    b. Build coarse ranges between the refined boundaries
//    c. Split each coarse range by dual-signal consensus (in parallel)
//    d. Drop ranges below the minimum scene length
// 3. Both flows end by aligning and naming clips for export.

// ---- Internal crate imports ----
use crate::config::{CoreConfig, ThresholdMode};
use crate::detection::{
    BoundaryRefiner, ConsensusSubSegmenter, FuzzyBoundary, PeakSegmenter, RefinedBoundary,
    SceneRange, ThresholdSelector, enforce_min_duration, min_separation_frames,
};
use crate::detectors::ContentChangeDetector;
use crate::error::{CoreResult, invalid};
use crate::export::{
    ClipPlan, ClipPlanSet, ExportAligner, ExportMode, KeyframeSource, PlannedSegment,
    SegmentSource, SkippedClip, plan_clips,
};
use crate::external::MediaProber;
use crate::series::ContentChangeSeries;
use crate::utils::clip_base_name;

// ---- External crate imports ----
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;

// ---- Standard library imports ----
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Receives overall progress as a fraction in `[0, 1]`.
pub type ProgressCallback = Box<dyn Fn(f64) + Send + Sync>;

/// Clip label used for automatically detected scenes.
pub const DETECTED_LABEL: &str = "scene";

/// Clip label used for refined and sub-split scenes.
pub const REFINED_LABEL: &str = "refined";

// ============================================================================
// RESULT TYPES
// ============================================================================

/// Output of automatic detection before export planning.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedScenes {
    pub threshold: f64,
    pub min_separation_frames: usize,
    pub ranges: Vec<SceneRange>,
}

/// Output of hint refinement before export planning.
#[derive(Debug, Clone, PartialEq)]
pub struct HintedSegments {
    /// One entry per input hint, in input order
    pub refined: Vec<RefinedBoundary>,
    pub segments: Vec<PlannedSegment>,
}

/// Change series used by the refinement flow.
///
/// `content` drives boundary refinement. The consensus pass runs only when
/// both `adaptive` and `hash` are present.
#[derive(Debug, Clone)]
pub struct SceneSignals {
    pub content: ContentChangeSeries,
    pub adaptive: Option<ContentChangeSeries>,
    pub hash: Option<ContentChangeSeries>,
}

/// Detectors for a refinement run, produced into [`SceneSignals`].
pub struct RefinementDetectors<'a> {
    pub content: &'a dyn ContentChangeDetector,
    pub adaptive: Option<&'a dyn ContentChangeDetector>,
    pub hash: Option<&'a dyn ContentChangeDetector>,
}

/// Everything an external exporter needs, plus the inputs that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenePlan {
    pub source_name: String,
    pub total_duration_seconds: f64,
    /// Threshold used by automatic detection; absent for refinement runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// SHA-256 of the content series, for memoizing by input
    pub series_fingerprint: String,
    pub export_mode: ExportMode,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub refined_boundaries: Vec<RefinedBoundary>,
    pub clips: Vec<ClipPlan>,
    pub skipped: Vec<SkippedClip>,
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Runs the scene detection flows with one explicit configuration.
pub struct ScenePipeline {
    config: CoreConfig,
    on_progress: Option<ProgressCallback>,
}

impl ScenePipeline {
    /// Creates a pipeline, validating `config` first.
    pub fn new(config: CoreConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            on_progress: None,
        })
    }

    /// Installs a progress callback.
    pub fn with_progress<F>(mut self, on_progress: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.on_progress = Some(Box::new(on_progress));
        self
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    fn report(&self, fraction: f64) {
        if let Some(callback) = &self.on_progress {
            callback(fraction.clamp(0.0, 1.0));
        }
    }

    fn aligner(&self) -> CoreResult<ExportAligner> {
        ExportAligner::with_min_duration(self.config.export_mode, self.config.min_export_seconds)
    }

    /// Threshold for `series`: the fixed value, or the auto-selected one.
    pub fn choose_threshold(&self, series: &ContentChangeSeries) -> CoreResult<f64> {
        match self.config.threshold {
            ThresholdMode::Fixed(value) => {
                debug!("Using fixed threshold {value}");
                Ok(value)
            }
            ThresholdMode::Auto => ThresholdSelector::with_percentiles(
                self.config.percentile_candidates.clone(),
            )?
            .select_threshold(series, self.config.min_scene_seconds),
        }
    }

    // ========================================================================
    // AUTOMATIC DETECTION
    // ========================================================================

    /// Whole-video scene ranges from `series`.
    ///
    /// The last range is stretched to `total_duration` when the series ends
    /// before the video does, so trailing frames are not lost.
    pub fn detect_scenes(
        &self,
        series: &ContentChangeSeries,
        total_duration: f64,
    ) -> CoreResult<DetectedScenes> {
        check_total_duration(total_duration)?;

        let threshold = self.choose_threshold(series)?;
        let min_sep = min_separation_frames(self.config.min_scene_seconds, series.frame_rate())?;
        let mut ranges = PeakSegmenter::new(threshold, min_sep)?.segment(series, total_duration)?;

        if let Some(last) = ranges.last_mut() {
            if last.end_seconds() < total_duration {
                *last = SceneRange::new(last.start_seconds(), total_duration)?;
            }
        }

        let ranges = enforce_min_duration(ranges, self.config.min_scene_seconds, total_duration)?;
        info!(
            "Detected {} scene(s) at threshold {threshold:.4}",
            ranges.len()
        );
        Ok(DetectedScenes {
            threshold,
            min_separation_frames: min_sep,
            ranges,
        })
    }

    // ========================================================================
    // HINT REFINEMENT
    // ========================================================================

    fn refine_one(
        &self,
        refiner: &BoundaryRefiner,
        hint: &FuzzyBoundary,
        series: &ContentChangeSeries,
        total_duration: f64,
    ) -> CoreResult<RefinedBoundary> {
        let clamped = hint.clamped(total_duration);
        if clamped.approximate_seconds != hint.approximate_seconds {
            debug!(
                "Clamped hint {:.3}s to {:.3}s",
                hint.approximate_seconds, clamped.approximate_seconds
            );
        }
        // One extra frame each side lets window-edge points qualify as maxima.
        let pad = 1.0 / series.frame_rate();
        let (lo, hi) = refiner.search_window(clamped.approximate_seconds);
        let local = series.window(lo - pad, hi + pad);
        refiner.refine(&clamped, &local)
    }

    /// Refines every hint against `series`, preserving input order.
    pub fn refine_hints(
        &self,
        hints: &[FuzzyBoundary],
        series: &ContentChangeSeries,
        total_duration: f64,
    ) -> CoreResult<Vec<RefinedBoundary>> {
        self.refine_hints_with_progress(hints, series, total_duration, 0.0, 1.0)
    }

    fn refine_hints_with_progress(
        &self,
        hints: &[FuzzyBoundary],
        series: &ContentChangeSeries,
        total_duration: f64,
        progress_start: f64,
        progress_span: f64,
    ) -> CoreResult<Vec<RefinedBoundary>> {
        check_total_duration(total_duration)?;
        let refiner = BoundaryRefiner::new(self.config.radius_seconds)?;
        let done = AtomicUsize::new(0);
        let total = hints.len().max(1) as f64;

        let refined = hints
            .par_iter()
            .map(|hint| {
                let result = self.refine_one(&refiner, hint, series, total_duration);
                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                self.report(progress_start + progress_span * finished as f64 / total);
                result
            })
            .collect::<CoreResult<Vec<_>>>()?;

        let moved = refined.iter().filter(|b| !b.is_passthrough()).count();
        info!(
            "Refined {} hint(s), {moved} snapped to a detected cut",
            refined.len()
        );
        Ok(refined)
    }

    /// Refines `hints`, splits the spans between them by consensus and
    /// enforces the minimum scene length.
    pub fn hinted_segments(
        &self,
        hints: &[FuzzyBoundary],
        signals: &SceneSignals,
        total_duration: f64,
    ) -> CoreResult<HintedSegments> {
        check_total_duration(total_duration)?;

        // ====================================================================
        // STEP 1: REFINE HINTS
        // ====================================================================

        let refined =
            self.refine_hints_with_progress(hints, &signals.content, total_duration, 0.0, 0.5)?;

        // ====================================================================
        // STEP 2: COARSE RANGES BETWEEN REFINED BOUNDARIES
        // ====================================================================

        let coarse = coarse_ranges(&refined, total_duration)?;
        debug!("{} coarse range(s) from {} boundaries", coarse.len(), refined.len());

        // ====================================================================
        // STEP 3: CONSENSUS SUB-SPLIT
        // ====================================================================

        let segmenter = ConsensusSubSegmenter::new(self.config.consensus)?;
        let consensus_inputs = match (&signals.adaptive, &signals.hash) {
            (Some(adaptive), Some(hash)) => Some((adaptive, hash)),
            _ => {
                debug!("Consensus pass skipped: adaptive or hash signal missing");
                None
            }
        };

        let done = AtomicUsize::new(0);
        let coarse_total = coarse.len().max(1) as f64;
        let nested = coarse
            .par_iter()
            .map(|(range, fitness)| {
                let pieces = match consensus_inputs {
                    Some((adaptive, hash)) => split_by_consensus(&segmenter, range, *fitness, adaptive, hash)?,
                    None => Vec::new(),
                };
                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                self.report(0.5 + 0.5 * finished as f64 / coarse_total);
                if pieces.is_empty() {
                    Ok(vec![PlannedSegment {
                        range: *range,
                        fitness_score: *fitness,
                        source: SegmentSource::Refined,
                    }])
                } else {
                    Ok(pieces)
                }
            })
            .collect::<CoreResult<Vec<Vec<PlannedSegment>>>>()?;
        let segments: Vec<PlannedSegment> = nested.into_iter().flatten().collect();

        // ====================================================================
        // STEP 4: MINIMUM SCENE LENGTH
        // ====================================================================

        let segments = self.enforce_min_segment_duration(segments, total_duration)?;
        info!("Refinement produced {} segment(s)", segments.len());
        Ok(HintedSegments { refined, segments })
    }

    fn enforce_min_segment_duration(
        &self,
        segments: Vec<PlannedSegment>,
        total_duration: f64,
    ) -> CoreResult<Vec<PlannedSegment>> {
        let min = self.config.min_scene_seconds;
        let before = segments.len();
        let kept: Vec<PlannedSegment> = segments
            .into_iter()
            .filter(|s| s.range.duration() >= min)
            .collect();
        if kept.len() < before {
            debug!("Dropped {} segment(s) shorter than {min:.3}s", before - kept.len());
        }
        if kept.is_empty() {
            warn!("No segment meets the minimum scene length, using the whole video");
            return Ok(vec![PlannedSegment {
                range: SceneRange::new(0.0, total_duration)?,
                fitness_score: None,
                source: SegmentSource::Refined,
            }]);
        }
        Ok(kept)
    }

    // ========================================================================
    // EXPORT PLANNING
    // ========================================================================

    /// Aligns and names `segments` with this pipeline's export settings.
    pub fn plan(
        &self,
        segments: &[PlannedSegment],
        keyframes: KeyframeSource<'_>,
        base_name: &str,
        label: &str,
    ) -> CoreResult<ClipPlanSet> {
        Ok(plan_clips(
            segments,
            &self.aligner()?,
            keyframes,
            base_name,
            label,
            self.config.min_export_seconds,
        ))
    }

    // ========================================================================
    // FULL RUNS
    // ========================================================================

    /// Detection from a video: produce the series, detect scenes, plan clips.
    ///
    /// Without a probed `total_duration` the video is taken to end with the
    /// last frame of the series.
    pub fn run_detection(
        &self,
        video: &Path,
        detector: &dyn ContentChangeDetector,
        total_duration: Option<f64>,
        keyframes: KeyframeSource<'_>,
    ) -> CoreResult<ScenePlan> {
        self.report(0.0);
        info!("Producing '{}' series for {}", detector.name(), video.display());
        let series = detector.produce(video)?;
        self.report(0.6);
        let total = total_duration.unwrap_or_else(|| series_end(&series));
        self.detect_and_plan(&clip_base_name(video), &series, total, keyframes)
    }

    /// Detection over an already produced series; `source_name` names the clips.
    pub fn detect_and_plan(
        &self,
        source_name: &str,
        series: &ContentChangeSeries,
        total_duration: f64,
        keyframes: KeyframeSource<'_>,
    ) -> CoreResult<ScenePlan> {
        let detected = self.detect_scenes(series, total_duration)?;
        self.report(0.8);

        let segments: Vec<PlannedSegment> = detected
            .ranges
            .iter()
            .copied()
            .map(PlannedSegment::detected)
            .collect();
        let plan = self.plan(&segments, keyframes, source_name, DETECTED_LABEL)?;
        self.report(1.0);

        Ok(ScenePlan {
            source_name: source_name.to_string(),
            total_duration_seconds: total_duration,
            threshold: Some(detected.threshold),
            series_fingerprint: series.fingerprint(),
            export_mode: self.config.export_mode,
            refined_boundaries: Vec::new(),
            clips: plan.clips,
            skipped: plan.skipped,
        })
    }

    /// Produces every signal for a refinement run, detectors in parallel.
    pub fn produce_signals(
        &self,
        video: &Path,
        detectors: &RefinementDetectors<'_>,
    ) -> CoreResult<SceneSignals> {
        let produce_optional = |detector: Option<&dyn ContentChangeDetector>| {
            detector.map(|d| d.produce(video)).transpose()
        };
        let (content, (adaptive, hash)) = rayon::join(
            || detectors.content.produce(video),
            || {
                rayon::join(
                    || produce_optional(detectors.adaptive),
                    || produce_optional(detectors.hash),
                )
            },
        );
        Ok(SceneSignals {
            content: content?,
            adaptive: adaptive?,
            hash: hash?,
        })
    }

    /// Refinement from a video and approximate boundaries, then clip planning.
    ///
    /// `total_duration` falls back to the end of the content series, as in
    /// [`ScenePipeline::run_detection`].
    pub fn run_refinement(
        &self,
        video: &Path,
        hints: &[FuzzyBoundary],
        detectors: &RefinementDetectors<'_>,
        total_duration: Option<f64>,
        keyframes: KeyframeSource<'_>,
    ) -> CoreResult<ScenePlan> {
        self.report(0.0);
        let signals = self.produce_signals(video, detectors)?;
        let total = total_duration.unwrap_or_else(|| series_end(&signals.content));
        self.refine_and_plan(&clip_base_name(video), hints, &signals, total, keyframes)
    }

    /// Refinement over already produced signals; `source_name` names the clips.
    pub fn refine_and_plan(
        &self,
        source_name: &str,
        hints: &[FuzzyBoundary],
        signals: &SceneSignals,
        total_duration: f64,
        keyframes: KeyframeSource<'_>,
    ) -> CoreResult<ScenePlan> {
        let hinted = self.hinted_segments(hints, signals, total_duration)?;
        let plan = self.plan(&hinted.segments, keyframes, source_name, REFINED_LABEL)?;
        self.report(1.0);

        Ok(ScenePlan {
            source_name: source_name.to_string(),
            total_duration_seconds: total_duration,
            threshold: None,
            series_fingerprint: signals.content.fingerprint(),
            export_mode: self.config.export_mode,
            refined_boundaries: hinted.refined,
            clips: plan.clips,
            skipped: plan.skipped,
        })
    }
}

/// End of the last frame of `series`; `0.0` for an empty series.
pub fn series_end(series: &ContentChangeSeries) -> f64 {
    if series.is_empty() {
        0.0
    } else {
        series.last_timestamp() + 1.0 / series.frame_rate()
    }
}

/// Keyframe list from `prober`, or `None` (with a warning) when probing fails.
pub fn resolve_keyframes(prober: &dyn MediaProber, video: &Path) -> Option<Vec<f64>> {
    match prober.keyframe_times(video) {
        Ok(times) if !times.is_empty() => Some(times),
        Ok(_) => {
            warn!("No keyframes reported for {}", video.display());
            None
        }
        Err(e) => {
            warn!("Keyframe listing failed for {}: {}", video.display(), e);
            None
        }
    }
}

fn check_total_duration(total_duration: f64) -> CoreResult<()> {
    if total_duration.is_finite() && total_duration > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!(
            "total duration must be positive, got {total_duration}"
        )))
    }
}

/// Ranges between consecutive refined boundaries, covering `[0, total_duration]`.
///
/// Each range carries the fitness of the boundary that opens it. Boundaries
/// at either end of the video or repeated at the same time are collapsed.
fn coarse_ranges(
    refined: &[RefinedBoundary],
    total_duration: f64,
) -> CoreResult<Vec<(SceneRange, Option<f64>)>> {
    let mut cuts: Vec<(f64, f64)> = refined
        .iter()
        .filter(|b| b.actual_seconds > 0.0 && b.actual_seconds < total_duration)
        .map(|b| (b.actual_seconds, b.fitness_score))
        .collect();
    // Fittest first among equal times, so dedup keeps it.
    cuts.sort_by(|a, b| a.0.total_cmp(&b.0).then(b.1.total_cmp(&a.1)));
    cuts.dedup_by(|later, earlier| later.0 == earlier.0);

    let mut ranges = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0.0;
    let mut opening_fitness = None;
    for (time, fitness) in cuts {
        ranges.push((SceneRange::new(start, time)?, opening_fitness));
        start = time;
        opening_fitness = Some(fitness);
    }
    ranges.push((SceneRange::new(start, total_duration)?, opening_fitness));
    Ok(ranges)
}

fn split_by_consensus(
    segmenter: &ConsensusSubSegmenter,
    range: &SceneRange,
    fitness: Option<f64>,
    adaptive: &ContentChangeSeries,
    hash: &ContentChangeSeries,
) -> CoreResult<Vec<PlannedSegment>> {
    let (start, end) = (range.start_seconds(), range.end_seconds());
    let pieces = segmenter.find_sub_scenes(
        start,
        end,
        &adaptive.window(start, end),
        &hash.window(start, end),
    )?;
    if !pieces.is_empty() {
        debug!("Split [{start:.3}, {end:.3}] into {} sub-scene(s)", pieces.len());
    }
    Ok(pieces
        .into_iter()
        .enumerate()
        .map(|(i, piece)| PlannedSegment {
            range: piece,
            fitness_score: if i == 0 { fitness } else { None },
            source: SegmentSource::SubScene,
        })
        .collect())
}
