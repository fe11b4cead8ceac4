//! Reads per-frame content values from a shot-boundary statistics CSV.
//!
//! The expected layout is a header row followed by one row per frame, e.g.
//! `Frame Number,Timecode,content_val,delta_hue,delta_sat,delta_lum`.
//!
//! Fields may be double-quoted, with `""` standing for a literal quote, so a
//! comma inside quotes does not split the field. Quoted fields spanning
//! several lines are not supported.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use super::ContentChangeDetector;
use crate::error::{CoreError, CoreResult, invalid};
use crate::series::ContentChangeSeries;

const CONTENT_COLUMN: &str = "content_val";

/// Picks `content_val`, or the first header containing both `content` and `val`.
fn content_column(headers: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| *h == CONTENT_COLUMN)
        .or_else(|| {
            headers
                .iter()
                .position(|h| h.contains("content") && h.contains("val"))
        })
}

/// Splits one CSV record into trimmed fields, honouring double quotes.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut field).trim().to_string()),
            _ => field.push(c),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

/// Extracts the content values of a statistics CSV.
///
/// Rows whose content cell is empty or not a finite number are skipped.
///
/// # Errors
///
/// * `CoreError::StatsParse` - No header, no content column, or no values
pub fn parse_stats_csv(text: &str) -> CoreResult<Vec<f64>> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| CoreError::StatsParse("stats CSV is empty".to_string()))?;
    let fields = split_fields(header);
    let headers: Vec<&str> = fields.iter().map(String::as_str).collect();
    let column = content_column(&headers).ok_or_else(|| {
        CoreError::StatsParse(format!("stats CSV missing '{CONTENT_COLUMN}' column"))
    })?;

    let mut skipped = 0usize;
    let values: Vec<f64> = lines
        .filter_map(|line| {
            let parsed = split_fields(line)
                .into_iter()
                .nth(column)
                .filter(|cell| !cell.is_empty())
                .and_then(|cell| cell.parse::<f64>().ok())
                .filter(|v| v.is_finite());
            if parsed.is_none() {
                skipped += 1;
            }
            parsed
        })
        .collect();

    if skipped > 0 {
        debug!("Skipped {} stats rows without a usable content value", skipped);
    }
    if values.is_empty() {
        return Err(CoreError::StatsParse(
            "no content values found in stats CSV".to_string(),
        ));
    }
    Ok(values)
}

/// Detector that replays values from a statistics CSV instead of decoding.
///
/// The video argument of [`ContentChangeDetector::produce`] is ignored.
#[derive(Debug, Clone)]
pub struct StatsCsvDetector {
    path: PathBuf,
    frame_rate: f64,
}

impl StatsCsvDetector {
    pub fn new(path: impl Into<PathBuf>, frame_rate: f64) -> CoreResult<Self> {
        if !(frame_rate.is_finite() && frame_rate > 0.0) {
            return Err(invalid(format!("frame rate must be positive, got {frame_rate}")));
        }
        Ok(Self {
            path: path.into(),
            frame_rate,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ContentChangeDetector for StatsCsvDetector {
    fn name(&self) -> &'static str {
        "stats-csv"
    }

    fn produce(&self, _video: &Path) -> CoreResult<ContentChangeSeries> {
        let text = fs::read_to_string(&self.path)?;
        let values = parse_stats_csv(&text).inspect_err(|e| {
            warn!("Unusable stats file {}: {}", self.path.display(), e);
        })?;
        debug!(
            "stats-csv: {} values from {}",
            values.len(),
            self.path.display()
        );
        ContentChangeSeries::from_scores(&values, self.frame_rate)
    }
}
