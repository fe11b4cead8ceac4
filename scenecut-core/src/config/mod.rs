//! Configuration structures and constants for the scenecut-core library.
//!
//! Every tunable the detection and refinement components read is carried in
//! [`CoreConfig`] and handed to them explicitly. Environment overrides are
//! applied once, when the configuration is constructed.

mod builder;
mod utils;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::detection::consensus::ConsensusThresholds;
use crate::error::{CoreResult, invalid};
use crate::export::ExportMode;

pub use builder::CoreConfigBuilder;
use utils::{get_env_f64, get_env_parsed, get_env_u32};

// Default constants

/// Default minimum scene duration in seconds (3000 ms).
pub const DEFAULT_MIN_SCENE_SECONDS: f64 = 3.0;

/// Default half-width of the refinement search window in seconds.
pub const DEFAULT_RADIUS_SECONDS: f64 = 1.5;

/// Upper percentiles of the score distribution tried as cut thresholds.
pub const DEFAULT_PERCENTILE_CANDIDATES: [f64; 14] = [
    80.0, 85.0, 90.0, 92.5, 95.0, 97.0, 98.0, 98.5, 99.0, 99.2, 99.4, 99.6, 99.8, 99.9,
];

/// Aligned clips shorter than this are skipped as unusable slivers.
pub const DEFAULT_MIN_EXPORT_SECONDS: f64 = 0.05;

/// Frame rate assumed when the prober cannot report one.
pub const DEFAULT_FALLBACK_FRAME_RATE: f64 = 30.0;

/// Width in pixels frames are scaled to before the built-in detectors score them.
pub const DEFAULT_ANALYSIS_WIDTH: u32 = 320;

/// Prefix shared by every environment override key.
pub const ENV_PREFIX: &str = "SCENECUT_";

/// How the cut threshold for automatic detection is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode", content = "value")]
pub enum ThresholdMode {
    /// Pick the threshold from the score distribution.
    #[default]
    Auto,
    /// Use this exact threshold.
    Fixed(f64),
}

impl FromStr for ThresholdMode {
    type Err = crate::error::CoreError;

    /// Parses `"auto"` (or an empty string) as automatic and any finite
    /// number as a fixed threshold.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
            return Ok(ThresholdMode::Auto);
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(ThresholdMode::Fixed(value)),
            _ => Err(invalid(format!(
                "threshold must be 'auto' or a number, got '{s}'"
            ))),
        }
    }
}

impl fmt::Display for ThresholdMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdMode::Auto => write!(f, "auto"),
            ThresholdMode::Fixed(value) => write!(f, "{value}"),
        }
    }
}

/// Main configuration structure for the scenecut-core library.
///
/// Created by the consumer of the library (e.g. scenecut-cli) and passed to
/// the [`ScenePipeline`](crate::pipeline::ScenePipeline). All fields have
/// defaults; the builder provides a fluent way to override them.
///
/// # Examples
///
/// ```rust
/// use scenecut_core::config::{CoreConfigBuilder, ThresholdMode};
/// use scenecut_core::export::ExportMode;
///
/// let config = CoreConfigBuilder::new()
///     .min_scene_seconds(2.0)
///     .threshold(ThresholdMode::Fixed(30.0))
///     .radius_seconds(1.0)
///     .export_mode(ExportMode::Precise)
///     .build()
///     .unwrap();
/// assert_eq!(config.radius_seconds, 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreConfig {
    /// Scenes shorter than this are never surfaced
    pub min_scene_seconds: f64,

    /// Automatic or fixed cut threshold
    pub threshold: ThresholdMode,

    /// Percentiles tried by the threshold selector
    pub percentile_candidates: Vec<f64>,

    /// Half-width of the window searched around each approximate boundary
    pub radius_seconds: f64,

    /// Thresholds for the dual-signal sub-scene pass
    pub consensus: ConsensusThresholds,

    /// Keyframe-aligned (fast) or exact (precise) export
    pub export_mode: ExportMode,

    /// Minimum usable clip length after alignment
    pub min_export_seconds: f64,

    /// Frame rate used when the media prober reports none
    pub fallback_frame_rate: f64,

    /// Analysis frame width for the built-in detectors
    pub analysis_width: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            min_scene_seconds: DEFAULT_MIN_SCENE_SECONDS,
            threshold: ThresholdMode::Auto,
            percentile_candidates: DEFAULT_PERCENTILE_CANDIDATES.to_vec(),
            radius_seconds: DEFAULT_RADIUS_SECONDS,
            consensus: ConsensusThresholds::default(),
            export_mode: ExportMode::Fast,
            min_export_seconds: DEFAULT_MIN_EXPORT_SECONDS,
            fallback_frame_rate: DEFAULT_FALLBACK_FRAME_RATE,
            analysis_width: DEFAULT_ANALYSIS_WIDTH,
        }
    }
}

impl CoreConfig {
    /// Builds a configuration from defaults overlaid with `SCENECUT_*`
    /// environment variables.
    ///
    /// Recognised keys: `SCENECUT_MIN_SCENE_MS`, `SCENECUT_THRESHOLD`,
    /// `SCENECUT_RADIUS_SECONDS`, `SCENECUT_ADAPTIVE_THRESHOLD`,
    /// `SCENECUT_SCREAMER_THRESHOLD`, `SCENECUT_HASH_THRESHOLD`,
    /// `SCENECUT_EXPORT_MODE`, `SCENECUT_FALLBACK_FPS` and
    /// `SCENECUT_ANALYSIS_WIDTH`. Unparseable numeric values keep their
    /// defaults; an unparseable threshold or export mode is an error.
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`CoreConfig::from_env`], reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> CoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let key = |name: &str| format!("{ENV_PREFIX}{name}");

        let min_scene_ms = get_env_f64(
            &lookup,
            &key("MIN_SCENE_MS"),
            defaults.min_scene_seconds * 1000.0,
        );
        let threshold = get_env_parsed(&lookup, &key("THRESHOLD"), defaults.threshold)?;
        let export_mode = get_env_parsed(&lookup, &key("EXPORT_MODE"), defaults.export_mode)?;

        let consensus = ConsensusThresholds {
            adaptive: get_env_f64(&lookup, &key("ADAPTIVE_THRESHOLD"), defaults.consensus.adaptive),
            screamer: get_env_f64(&lookup, &key("SCREAMER_THRESHOLD"), defaults.consensus.screamer),
            hash: get_env_f64(&lookup, &key("HASH_THRESHOLD"), defaults.consensus.hash),
            ..defaults.consensus
        };

        let config = Self {
            min_scene_seconds: min_scene_ms / 1000.0,
            threshold,
            radius_seconds: get_env_f64(&lookup, &key("RADIUS_SECONDS"), defaults.radius_seconds),
            consensus,
            export_mode,
            fallback_frame_rate: get_env_f64(
                &lookup,
                &key("FALLBACK_FPS"),
                defaults.fallback_frame_rate,
            ),
            analysis_width: get_env_u32(&lookup, &key("ANALYSIS_WIDTH"), defaults.analysis_width),
            ..defaults
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks every field against its contract.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The configuration is usable
    /// * `Err(CoreError::InvalidParameter)` - A field is out of range
    pub fn validate(&self) -> CoreResult<()> {
        non_negative("min_scene_seconds", self.min_scene_seconds)?;
        non_negative("radius_seconds", self.radius_seconds)?;
        non_negative("min_export_seconds", self.min_export_seconds)?;

        if !(self.fallback_frame_rate.is_finite() && self.fallback_frame_rate > 0.0) {
            return Err(invalid(format!(
                "fallback_frame_rate must be positive, got {}",
                self.fallback_frame_rate
            )));
        }
        if self.analysis_width == 0 {
            return Err(invalid("analysis_width must be at least 1 pixel"));
        }
        if let ThresholdMode::Fixed(value) = self.threshold {
            non_negative("threshold", value)?;
        }
        if self.percentile_candidates.is_empty() {
            return Err(invalid("percentile_candidates must not be empty"));
        }
        if let Some(p) = self
            .percentile_candidates
            .iter()
            .find(|p| !(p.is_finite() && (0.0..=100.0).contains(*p)))
        {
            return Err(invalid(format!(
                "percentile candidates must lie in [0, 100], got {p}"
            )));
        }
        self.consensus.validate()
    }
}

fn non_negative(name: &str, value: f64) -> CoreResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be non-negative, got {value}")))
    }
}
