// scenecut-cli/src/commands/threshold.rs
//
// Prints the threshold automatic detection would pick for a series.

use super::{ResolvedSource, build_config};
use crate::cli::ThresholdArgs;

use anyhow::Result;
use log::info;
use scenecut_core::detection::min_separation_frames;
use scenecut_core::{ScenePipeline, ThresholdMode};

pub fn run_threshold(args: ThresholdArgs) -> Result<()> {
    let config = build_config(|builder| {
        let builder = builder.threshold(ThresholdMode::Auto);
        match args.min_scene_ms {
            Some(ms) => builder.min_scene_ms(ms),
            None => builder,
        }
    })?;

    let source = ResolvedSource::resolve(&args.source, &config)?;
    let series = source.content_series(&config)?;
    let min_separation = min_separation_frames(config.min_scene_seconds, series.frame_rate())?;

    let pipeline = ScenePipeline::new(config)?;
    let threshold = pipeline.choose_threshold(&series)?;
    info!(
        "Selected threshold {:.3} over {} frames (peaks at least {} frames apart)",
        threshold,
        series.len(),
        min_separation
    );

    println!("{threshold:.3}");
    Ok(())
}
