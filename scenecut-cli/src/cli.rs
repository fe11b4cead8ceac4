// scenecut-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use scenecut_core::{ExportMode, ThresholdMode};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Scenecut: Scene boundary detection and refinement",
    long_about = "Finds scene cuts in a video (or a per-frame stats file), refines approximate \
                  cut times and writes a clip plan as JSON for an external exporter."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detects scenes automatically and plans one clip per scene
    Split(SplitArgs),
    /// Snaps approximate cut times to real cuts and splits long scenes
    Refine(RefineArgs),
    /// Prints the cut threshold automatic detection would use
    Threshold(ThresholdArgs),
}

/// Where the content-change series comes from.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Video file to analyse
    #[arg(short = 'i', long = "input", value_name = "VIDEO")]
    pub input: Option<PathBuf>,

    /// Per-frame stats CSV with a content_val column, used instead of decoding
    #[arg(long, value_name = "CSV")]
    pub stats: Option<PathBuf>,

    /// Frame rate of the stats file (defaults to the probed or fallback rate)
    #[arg(long, value_name = "FPS")]
    pub frame_rate: Option<f64>,

    /// Total duration in seconds (defaults to the probed duration)
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<f64>,
}

/// Options shared by the commands that produce a clip plan.
#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// Scenes shorter than this are dropped
    #[arg(long, value_name = "MS")]
    pub min_scene_ms: Option<u64>,

    /// Export alignment: fast (keyframes) or precise (exact times)
    #[arg(long, value_name = "MODE")]
    pub mode: Option<ExportMode>,

    /// Write the clip plan here instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct SplitArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Cut threshold: "auto" or a number
    #[arg(long, value_name = "THRESHOLD")]
    pub threshold: Option<ThresholdMode>,

    #[command(flatten)]
    pub plan: PlanArgs,
}

#[derive(Parser, Debug)]
pub struct RefineArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// JSON file of approximate cut times: numbers or {"approximateSeconds": ..} objects
    #[arg(long, value_name = "JSON", required = true)]
    pub hints: PathBuf,

    /// Half-width in seconds of the window searched around each hint
    #[arg(long, value_name = "SECONDS")]
    pub radius: Option<f64>,

    /// Minimum adaptive ratio for a consensus cut
    #[arg(long, value_name = "RATIO")]
    pub adaptive_threshold: Option<f64>,

    /// Adaptive ratio that cuts without hash agreement
    #[arg(long, value_name = "RATIO")]
    pub screamer_threshold: Option<f64>,

    /// Minimum normalized hash distance for a consensus cut
    #[arg(long, value_name = "DISTANCE")]
    pub hash_threshold: Option<f64>,

    /// Skip the dual-signal sub-scene pass
    #[arg(long, default_value_t = false)]
    pub no_consensus: bool,

    #[command(flatten)]
    pub plan: PlanArgs,
}

#[derive(Parser, Debug)]
pub struct ThresholdArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Minimum scene length used to space candidate peaks
    #[arg(long, value_name = "MS")]
    pub min_scene_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_flags_parse() {
        let cli = Cli::try_parse_from([
            "scenecut",
            "split",
            "--stats",
            "stats.csv",
            "--frame-rate",
            "25",
            "--threshold",
            "30",
            "--mode",
            "precise",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Split(args) => {
                assert_eq!(args.source.frame_rate, Some(25.0));
                assert_eq!(args.threshold, Some(ThresholdMode::Fixed(30.0)));
                assert_eq!(args.plan.mode, Some(ExportMode::Precise));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_refine_requires_hints() {
        assert!(Cli::try_parse_from(["scenecut", "refine", "-i", "a.mp4"]).is_err());
    }

    #[test]
    fn test_bad_mode_is_rejected() {
        let result = Cli::try_parse_from(["scenecut", "split", "-i", "a.mp4", "--mode", "lossless"]);
        assert!(result.is_err());
    }
}
