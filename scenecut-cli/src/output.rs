// scenecut-cli/src/output.rs
//
// Writing clip plans and printing human-readable summaries.
//
// The plan itself is JSON on stdout (or in the --output file) so it can be
// piped into an exporter. Summaries go to stderr.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use scenecut_core::{ScenePlan, format_duration};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// A clip plan tagged with the run that produced it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDocument<'a> {
    pub job_id: String,
    #[serde(flatten)]
    pub plan: &'a ScenePlan,
}

/// Serializes `document` to `output`, or to stdout when `output` is `None`.
pub fn write_plan(document: &PlanDocument<'_>, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(document).context("Failed to serialize clip plan")?;
    match output {
        Some(path) => {
            fs::write(path, format!("{json}\n"))
                .with_context(|| format!("Failed to write clip plan to {}", path.display()))?;
            log::info!("Clip plan written to {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}").context("Failed to write clip plan to stdout")?;
        }
    }
    Ok(())
}

/// Print a heading with colored styling
pub fn print_heading(text: &str) {
    eprintln!("\n{}", format!(" {text} ").bold().bright_white());
    eprintln!("{}", "=".repeat(50).bright_blue());
}

/// Print an info line with label and value, with the label colored
pub fn print_info<T: std::fmt::Display>(label: &str, value: T) {
    eprintln!("{:>12}: {}", label.bright_cyan(), value);
}

/// Prints a short summary of `plan` to stderr.
pub fn print_summary(job_id: &str, plan: &ScenePlan) {
    print_heading(&format!("Scene plan for {}", plan.source_name));
    print_info("Job", job_id);
    print_info("Duration", format_duration(plan.total_duration_seconds));
    if let Some(threshold) = plan.threshold {
        print_info("Threshold", format!("{threshold:.2}"));
    }
    if !plan.refined_boundaries.is_empty() {
        print_info("Refined", plan.refined_boundaries.len());
    }
    print_info("Export", plan.export_mode);
    print_info("Clips", plan.clips.len().green());
    if !plan.skipped.is_empty() {
        print_info("Skipped", plan.skipped.len().yellow());
    }
}
