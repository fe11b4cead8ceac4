//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command. The
//! helpers here resolve what every command needs first: an explicit
//! configuration, the media facts and the content-change series.

/// Automatic detection of scene cuts (`split`).
pub mod split;

/// Refinement of approximate cut times (`refine`).
pub mod refine;

/// Threshold inspection (`threshold`).
pub mod threshold;

pub use refine::run_refine;
pub use split::run_split;
pub use threshold::run_threshold;

use crate::cli::SourceArgs;
use crate::logging::generate_job_id;
use crate::output::{PlanDocument, print_summary, write_plan};

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use scenecut_core::config::{CoreConfig, CoreConfigBuilder};
use scenecut_core::detectors::{ContentDistanceDetector, PerceptualHashDetector, StatsCsvDetector};
use scenecut_core::export::KeyframeSource;
use scenecut_core::external::{CrateFfprobeExecutor, FfprobeKeyframeProber, SidecarFrameSource};
use scenecut_core::pipeline::resolve_keyframes;
use scenecut_core::utils::clip_base_name;
use scenecut_core::{
    ContentChangeDetector, ContentChangeSeries, ExportMode, MediaProber, ScenePlan,
    check_dependency,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Reads `SCENECUT_*` overrides, then applies the command-line ones.
pub(crate) fn build_config<F>(apply: F) -> Result<CoreConfig>
where
    F: FnOnce(CoreConfigBuilder) -> CoreConfigBuilder,
{
    let base = CoreConfig::from_env().context("Invalid SCENECUT_* environment setting")?;
    let config = apply(CoreConfigBuilder::from_config(base))
        .build()
        .context("Invalid configuration")?;
    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// The inputs of one command after probing.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedSource {
    pub video: Option<PathBuf>,
    pub stats: Option<PathBuf>,
    pub frame_rate: f64,
    pub probed_duration: Option<f64>,
    pub duration_override: Option<f64>,
}

impl ResolvedSource {
    /// Checks the paths and probes the video, if there is one.
    pub fn resolve(args: &SourceArgs, config: &CoreConfig) -> Result<Self> {
        if args.input.is_none() && args.stats.is_none() {
            bail!("Either --input or --stats is required");
        }
        for path in args.input.iter().chain(args.stats.iter()) {
            if !path.is_file() {
                bail!("Input file not found: {}", path.display());
            }
        }

        let mut probed_frame_rate = None;
        let mut probed_duration = None;
        if let Some(video) = &args.input {
            check_dependency("ffprobe")?;
            let info = CrateFfprobeExecutor::new()
                .probe(video)
                .with_context(|| format!("Failed to probe {}", video.display()))?;
            info!(
                "Probed {}: {:.3}s at {:?} fps",
                video.display(),
                info.duration_seconds,
                info.frame_rate
            );
            probed_frame_rate = info.frame_rate;
            probed_duration = Some(info.duration_seconds);
        }

        let frame_rate = args
            .frame_rate
            .or(probed_frame_rate)
            .unwrap_or(config.fallback_frame_rate);
        if !frame_rate.is_finite() || frame_rate <= 0.0 {
            bail!("Frame rate must be positive, got {frame_rate}");
        }

        Ok(Self {
            video: args.input.clone(),
            stats: args.stats.clone(),
            frame_rate,
            probed_duration,
            duration_override: args.duration,
        })
    }

    /// Path whose stem names the clips: the video, else the stats file.
    pub fn name_path(&self) -> &Path {
        self.video
            .as_deref()
            .or(self.stats.as_deref())
            .unwrap_or_else(|| Path::new("source"))
    }

    pub fn source_name(&self) -> String {
        clip_base_name(self.name_path())
    }

    /// Content detector over the stats file, or decoding the video.
    pub fn content_detector(&self, config: &CoreConfig) -> Result<Arc<dyn ContentChangeDetector>> {
        Ok(match &self.stats {
            Some(stats) => Arc::new(StatsCsvDetector::new(stats, self.frame_rate)?),
            None => {
                check_dependency("ffmpeg")?;
                let frames = Arc::new(SidecarFrameSource::new(config.analysis_width));
                Arc::new(ContentDistanceDetector::new(frames, self.frame_rate)?)
            }
        })
    }

    /// Hash detector over the decoded video; `None` with only a stats file.
    pub fn hash_detector(&self, config: &CoreConfig) -> Result<Option<PerceptualHashDetector>> {
        if self.video.is_none() {
            warn!("No --input video to hash; skipping the consensus pass");
            return Ok(None);
        }
        check_dependency("ffmpeg")?;
        let frames = Arc::new(SidecarFrameSource::new(config.analysis_width));
        Ok(Some(PerceptualHashDetector::new(frames, self.frame_rate)?))
    }

    /// Content-change series, for commands that stop before the pipeline.
    pub fn content_series(&self, config: &CoreConfig) -> Result<ContentChangeSeries> {
        let detector = self.content_detector(config)?;
        let path = self.name_path();
        info!("Producing '{}' series from {}", detector.name(), path.display());
        detector
            .produce(path)
            .with_context(|| format!("Failed to read content changes from {}", path.display()))
    }

    /// `--duration`, then the probed duration. `None` lets the pipeline use
    /// the end of the last frame.
    pub fn total_duration(&self) -> Option<f64> {
        self.duration_override.or(self.probed_duration)
    }

    /// Keyframes for fast export; nothing is probed for precise export.
    pub fn keyframes(&self, mode: ExportMode) -> Keyframes {
        let Some(video) = &self.video else {
            return Keyframes::Unavailable;
        };
        if mode == ExportMode::Precise {
            return Keyframes::Unavailable;
        }
        match resolve_keyframes(&CrateFfprobeExecutor::new(), video) {
            Some(times) => Keyframes::List(times),
            None => Keyframes::Prober(FfprobeKeyframeProber::new(video)),
        }
    }
}

/// Owned keyframe information, borrowed as a [`KeyframeSource`].
pub(crate) enum Keyframes {
    Unavailable,
    List(Vec<f64>),
    Prober(FfprobeKeyframeProber),
}

impl Keyframes {
    pub fn source(&self) -> KeyframeSource<'_> {
        match self {
            Keyframes::Unavailable => KeyframeSource::Unavailable,
            Keyframes::List(times) => KeyframeSource::List(times),
            Keyframes::Prober(prober) => KeyframeSource::Prober(prober),
        }
    }
}

/// Prints the summary and writes the plan under a fresh job id.
pub(crate) fn emit_plan(plan: &ScenePlan, output: Option<&Path>) -> Result<()> {
    let job_id = generate_job_id();
    print_summary(&job_id, plan);
    write_plan(&PlanDocument { job_id, plan }, output)
}
