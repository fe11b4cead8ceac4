// scenecut-cli/src/commands/refine.rs
//
// Hint refinement: snap approximate cut times to real cuts, split coarse
// scenes where the adaptive and hash signals agree, then plan clips.

use super::{ResolvedSource, build_config, emit_plan};
use crate::cli::RefineArgs;
use crate::progress::CliProgress;

use anyhow::{Context, Result};
use log::info;
use scenecut_core::detectors::AdaptiveRatioDetector;
use scenecut_core::pipeline::RefinementDetectors;
use scenecut_core::{ContentChangeDetector, FuzzyBoundary, ScenePipeline};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// One entry of a hints file: a bare time or a full boundary object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HintEntry {
    Seconds(f64),
    Boundary(FuzzyBoundary),
}

/// Parses a hints document: a JSON array of numbers and/or
/// `{"approximateSeconds": .., "rationale": ..}` objects.
pub fn parse_hints(text: &str) -> Result<Vec<FuzzyBoundary>> {
    let entries: Vec<HintEntry> =
        serde_json::from_str(text).context("Hints must be a JSON array of times or boundaries")?;
    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            HintEntry::Seconds(seconds) => FuzzyBoundary::new(seconds),
            HintEntry::Boundary(boundary) => boundary,
        })
        .collect())
}

fn load_hints(path: &Path) -> Result<Vec<FuzzyBoundary>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read hints from {}", path.display()))?;
    let hints = parse_hints(&text).with_context(|| format!("Invalid hints file {}", path.display()))?;
    for hint in &hints {
        if let Some(rationale) = &hint.rationale {
            log::debug!("Hint {:.3}s: {}", hint.approximate_seconds, rationale);
        }
    }
    Ok(hints)
}

pub fn run_refine(args: RefineArgs) -> Result<()> {
    let config = build_config(|mut builder| {
        if let Some(ms) = args.plan.min_scene_ms {
            builder = builder.min_scene_ms(ms);
        }
        if let Some(mode) = args.plan.mode {
            builder = builder.export_mode(mode);
        }
        if let Some(radius) = args.radius {
            builder = builder.radius_seconds(radius);
        }
        if let Some(value) = args.adaptive_threshold {
            builder = builder.adaptive_threshold(value);
        }
        if let Some(value) = args.screamer_threshold {
            builder = builder.screamer_threshold(value);
        }
        if let Some(value) = args.hash_threshold {
            builder = builder.hash_threshold(value);
        }
        builder
    })?;

    let hints = load_hints(&args.hints)?;
    let source = ResolvedSource::resolve(&args.source, &config)?;
    let content = source.content_detector(&config)?;
    let (adaptive, hash) = if args.no_consensus {
        (None, None)
    } else {
        (
            Some(AdaptiveRatioDetector::new(Arc::clone(&content))),
            source.hash_detector(&config)?,
        )
    };
    let detectors = RefinementDetectors {
        content: content.as_ref(),
        adaptive: adaptive.as_ref().map(|d| d as &dyn ContentChangeDetector),
        hash: hash.as_ref().map(|d| d as &dyn ContentChangeDetector),
    };
    let keyframes = source.keyframes(config.export_mode);

    info!(
        "Refining {} hints for {} (radius {:.2}s)",
        hints.len(),
        source.source_name(),
        config.radius_seconds
    );

    let progress = CliProgress::new("Refining");
    let pipeline = ScenePipeline::new(config)?.with_progress(progress.callback());
    let result = pipeline.run_refinement(
        source.name_path(),
        &hints,
        &detectors,
        source.total_duration(),
        keyframes.source(),
    );
    progress.finish();

    emit_plan(&result?, args.plan.output.as_deref())
}
