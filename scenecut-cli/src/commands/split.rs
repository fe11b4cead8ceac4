// scenecut-cli/src/commands/split.rs
//
// Automatic scene detection: threshold, segmentation, minimum-length filter
// and export alignment, ending in a JSON clip plan.

use super::{ResolvedSource, build_config, emit_plan};
use crate::cli::SplitArgs;
use crate::progress::CliProgress;

use anyhow::Result;
use log::info;
use scenecut_core::ScenePipeline;

pub fn run_split(args: SplitArgs) -> Result<()> {
    let config = build_config(|mut builder| {
        if let Some(ms) = args.plan.min_scene_ms {
            builder = builder.min_scene_ms(ms);
        }
        if let Some(threshold) = args.threshold {
            builder = builder.threshold(threshold);
        }
        if let Some(mode) = args.plan.mode {
            builder = builder.export_mode(mode);
        }
        builder
    })?;

    let source = ResolvedSource::resolve(&args.source, &config)?;
    let content = source.content_detector(&config)?;
    let keyframes = source.keyframes(config.export_mode);

    info!(
        "Detecting scenes in {} (threshold {})",
        source.source_name(),
        config.threshold
    );

    let progress = CliProgress::new("Detecting");
    let pipeline = ScenePipeline::new(config)?.with_progress(progress.callback());
    let result = pipeline.run_detection(
        source.name_path(),
        content.as_ref(),
        source.total_duration(),
        keyframes.source(),
    );
    progress.finish();

    emit_plan(&result?, args.plan.output.as_deref())
}
