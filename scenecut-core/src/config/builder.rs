// ============================================================================
// scenecut-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// Fluent API for assembling a CoreConfig. Every setter returns Self; `build`
// runs the same validation as `CoreConfig::validate` so a builder can never
// hand out a configuration the components would reject.

// ---- Internal crate imports ----
use super::{CoreConfig, ThresholdMode};
use crate::detection::consensus::ConsensusThresholds;
use crate::error::CoreResult;
use crate::export::ExportMode;

/// Builder for creating CoreConfig instances.
///
/// # Examples
///
/// ```rust
/// use scenecut_core::config::CoreConfigBuilder;
///
/// let config = CoreConfigBuilder::new()
///     .min_scene_ms(1500)
///     .adaptive_threshold(6.5)
///     .hash_threshold(0.35)
///     .build()
///     .unwrap();
/// assert_eq!(config.min_scene_seconds, 1.5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    /// Creates a new CoreConfigBuilder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration, e.g. one read from the environment.
    pub fn from_config(config: CoreConfig) -> Self {
        Self { config }
    }

    /// Sets the minimum scene duration in seconds.
    ///
    /// # Arguments
    ///
    /// * `seconds` - Scenes shorter than this are dropped
    ///
    /// # Returns
    ///
    /// * Self for method chaining
    pub fn min_scene_seconds(mut self, seconds: f64) -> Self {
        self.config.min_scene_seconds = seconds;
        self
    }

    /// Sets the minimum scene duration in milliseconds.
    pub fn min_scene_ms(mut self, millis: u64) -> Self {
        self.config.min_scene_seconds = millis as f64 / 1000.0;
        self
    }

    /// Sets the cut threshold mode.
    ///
    /// # Arguments
    ///
    /// * `threshold` - `ThresholdMode::Auto` or a fixed value
    ///
    /// # Returns
    ///
    /// * Self for method chaining
    pub fn threshold(mut self, threshold: ThresholdMode) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Replaces the percentile candidates tried by the threshold selector.
    pub fn percentile_candidates(mut self, percentiles: Vec<f64>) -> Self {
        self.config.percentile_candidates = percentiles;
        self
    }

    /// Sets the refinement search radius in seconds.
    ///
    /// # Arguments
    ///
    /// * `radius` - Half-width of the window around each approximate boundary
    ///
    /// # Returns
    ///
    /// * Self for method chaining
    pub fn radius_seconds(mut self, radius: f64) -> Self {
        self.config.radius_seconds = radius;
        self
    }

    /// Sets the adaptive-ratio threshold required for a consensus cut.
    pub fn adaptive_threshold(mut self, value: f64) -> Self {
        self.config.consensus.adaptive = value;
        self
    }

    /// Sets the adaptive-ratio level that accepts a cut on its own.
    pub fn screamer_threshold(mut self, value: f64) -> Self {
        self.config.consensus.screamer = value;
        self
    }

    /// Sets the hash-distance threshold required for a consensus cut.
    pub fn hash_threshold(mut self, value: f64) -> Self {
        self.config.consensus.hash = value;
        self
    }

    /// Replaces all consensus thresholds at once.
    pub fn consensus(mut self, thresholds: ConsensusThresholds) -> Self {
        self.config.consensus = thresholds;
        self
    }

    /// Sets the export mode.
    ///
    /// # Arguments
    ///
    /// * `mode` - `ExportMode::Fast` snaps to keyframes, `ExportMode::Precise` does not
    ///
    /// # Returns
    ///
    /// * Self for method chaining
    pub fn export_mode(mut self, mode: ExportMode) -> Self {
        self.config.export_mode = mode;
        self
    }

    pub fn min_export_seconds(mut self, seconds: f64) -> Self {
        self.config.min_export_seconds = seconds;
        self
    }

    pub fn fallback_frame_rate(mut self, fps: f64) -> Self {
        self.config.fallback_frame_rate = fps;
        self
    }

    pub fn analysis_width(mut self, width: u32) -> Self {
        self.config.analysis_width = width;
        self
    }

    /// Validates and returns the configuration.
    ///
    /// # Returns
    ///
    /// * `Ok(CoreConfig)` - The assembled configuration
    /// * `Err(CoreError::InvalidParameter)` - A value is out of range
    pub fn build(self) -> CoreResult<CoreConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
