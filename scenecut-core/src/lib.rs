//! Core library for locating scene cuts in a video's content-change signal.
//!
//! This crate selects a cut threshold automatically, segments a change
//! series at its peaks, refines approximate cut times against local
//! evidence, splits coarse scenes where two independent signals agree and
//! aligns the results to keyframes for export.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use scenecut_core::{CoreConfig, ScenePipeline};
//! use scenecut_core::detectors::StatsCsvDetector;
//! use scenecut_core::export::KeyframeSource;
//! use std::path::Path;
//!
//! let config = CoreConfig::from_env().unwrap();
//! let pipeline = ScenePipeline::new(config)
//!     .unwrap()
//!     .with_progress(|fraction| println!("{:.0}%", fraction * 100.0));
//!
//! let detector = StatsCsvDetector::new("/path/to/stats.csv", 29.97).unwrap();
//! let plan = pipeline
//!     .run_detection(
//!         Path::new("/path/to/video.mp4"),
//!         &detector,
//!         Some(120.0),
//!         KeyframeSource::Unavailable,
//!     )
//!     .unwrap();
//! println!("{}", serde_json::to_string_pretty(&plan).unwrap());
//! ```

pub mod config;
pub mod detection;
pub mod detectors;
pub mod error;
pub mod export;
pub mod external;
pub mod pipeline;
pub mod series;
pub mod utils;

// Re-exports for public API
pub use config::{CoreConfig, CoreConfigBuilder, ThresholdMode};
pub use detection::{
    ConsensusThresholds, FuzzyBoundary, RefinedBoundary, SceneRange, find_sub_scenes, refine,
    segment, select_threshold,
};
pub use detectors::ContentChangeDetector;
pub use error::{CoreError, CoreResult};
pub use export::{Alignment, ClipPlan, ExportMode, align};
pub use external::{MediaInfo, MediaProber, check_dependency};
pub use pipeline::{ProgressCallback, ScenePipeline, ScenePlan};
pub use series::{ContentChangePoint, ContentChangeSeries};
pub use utils::format_duration;
