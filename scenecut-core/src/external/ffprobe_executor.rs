//! FFprobe integration for duration, frame rate and keyframe timestamps
//!
//! Duration and frame rate come from the `ffprobe` crate. Keyframe lists are
//! read by running the ffprobe binary with `-skip_frame nokey`, which only
//! decodes keyframes and prints one timestamp per line.

use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error};
use crate::export::KeyframeProber;
use crate::utils::parse_frame_rate;
use ffprobe::{FfProbeError, ffprobe};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Frame entry printed for every keyframe.
const KEYFRAME_TIME_ENTRY: &str = "frame=best_effort_timestamp_time";

/// Seconds scanned past a boundary when looking for the next keyframe.
const KEYFRAME_LOOKAHEAD_SECONDS: f64 = 30.0;

/// Seconds scanned before a boundary when looking for the previous keyframe.
const KEYFRAME_LOOKBACK_SECONDS: f64 = 30.0;

/// Media properties the pipeline needs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MediaInfo {
    /// Duration of the media in seconds
    pub duration_seconds: f64,
    /// Average frame rate of the first video stream, when reported
    pub frame_rate: Option<f64>,
    /// Total number of frames in the video, when reported
    pub total_frames: Option<u64>,
}

impl MediaInfo {
    /// Frame rate, or `fallback` when the prober reported none.
    pub fn frame_rate_or(&self, fallback: f64) -> f64 {
        self.frame_rate.unwrap_or(fallback)
    }
}

/// Source of media properties and keyframe timestamps.
pub trait MediaProber: Send + Sync {
    /// Duration and frame rate of `path`.
    fn probe(&self, path: &Path) -> CoreResult<MediaInfo>;

    /// Ascending keyframe timestamps of the first video stream.
    fn keyframe_times(&self, path: &Path) -> CoreResult<Vec<f64>>;
}

/// `MediaProber` backed by the ffprobe crate and binary.
#[derive(Debug, Clone)]
pub struct CrateFfprobeExecutor {
    ffprobe_bin: PathBuf,
}

impl Default for CrateFfprobeExecutor {
    fn default() -> Self {
        Self {
            ffprobe_bin: PathBuf::from("ffprobe"),
        }
    }
}

impl CrateFfprobeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs keyframe listing with optional extra arguments (e.g. `-read_intervals`).
    fn list_keyframes(&self, path: &Path, extra_args: &[String]) -> CoreResult<Vec<f64>> {
        let mut cmd = Command::new(&self.ffprobe_bin);
        cmd.args(["-loglevel", "error", "-skip_frame", "nokey", "-select_streams", "v:0"]);
        cmd.args(extra_args);
        cmd.args(["-show_frames", "-show_entries", KEYFRAME_TIME_ENTRY, "-of", "csv=p=0"]);
        cmd.arg(path);

        log::debug!("Running keyframe probe: {:?}", cmd);
        let output = cmd
            .output()
            .map_err(|e| command_start_error("ffprobe (keyframes)", e))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return Err(command_failed_error("ffprobe (keyframes)", output.status, stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_keyframe_lines(&stdout))
    }
}

impl MediaProber for CrateFfprobeExecutor {
    fn probe(&self, input_path: &Path) -> CoreResult<MediaInfo> {
        log::debug!(
            "Running ffprobe (via crate) for media info on: {}",
            input_path.display()
        );
        let metadata = ffprobe(input_path).map_err(|err| {
            log::error!("ffprobe failed for media info on {}: {:?}", input_path.display(), err);
            map_ffprobe_error(err, "media info")
        })?;

        let video_stream = metadata
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| {
                CoreError::VideoInfoError(format!(
                    "No video stream found in {}",
                    input_path.display()
                ))
            })?;

        let duration_seconds = metadata
            .format
            .duration
            .as_deref()
            .or(video_stream.duration.as_deref())
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0)
            .ok_or_else(|| {
                CoreError::FfprobeParse(format!(
                    "Failed to parse duration for {}",
                    input_path.display()
                ))
            })?;

        let frame_rate = parse_frame_rate(&video_stream.avg_frame_rate)
            .or_else(|| parse_frame_rate(&video_stream.r_frame_rate));
        if frame_rate.is_none() {
            log::warn!(
                "No usable frame rate reported for {}",
                input_path.display()
            );
        }

        Ok(MediaInfo {
            duration_seconds,
            frame_rate,
            total_frames: video_stream
                .nb_frames
                .as_deref()
                .and_then(|f| f.parse::<u64>().ok()),
        })
    }

    fn keyframe_times(&self, path: &Path) -> CoreResult<Vec<f64>> {
        let times = self.list_keyframes(path, &[])?;
        log::debug!("Found {} keyframes in {}", times.len(), path.display());
        Ok(times)
    }
}

/// Parses `csv=p=0` keyframe output into sorted, de-duplicated timestamps.
///
/// Blank, `N/A` and otherwise unparseable lines are skipped.
pub fn parse_keyframe_lines(text: &str) -> Vec<f64> {
    let mut times: Vec<f64> = text
        .lines()
        .filter_map(|line| {
            let field = line.trim().split(',').next()?.trim();
            field.parse::<f64>().ok().filter(|t| t.is_finite())
        })
        .collect();
    times.sort_by(f64::total_cmp);
    times.dedup();
    times
}

/// Per-boundary keyframe lookups, each reading only a window of the file.
///
/// Failures degrade to `None`, which leaves the boundary unaligned.
#[derive(Debug, Clone)]
pub struct FfprobeKeyframeProber {
    executor: CrateFfprobeExecutor,
    path: PathBuf,
}

impl FfprobeKeyframeProber {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            executor: CrateFfprobeExecutor::new(),
            path: path.into(),
        }
    }

    fn probe_interval(&self, interval: String) -> Option<Vec<f64>> {
        match self
            .executor
            .list_keyframes(&self.path, &["-read_intervals".to_string(), interval])
        {
            Ok(times) => Some(times),
            Err(e) => {
                log::warn!("Keyframe probe failed for {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

impl KeyframeProber for FfprobeKeyframeProber {
    fn next_keyframe(&self, seconds: f64) -> Option<f64> {
        let interval = format!("{:.6}%+{:.6}", seconds.max(0.0), KEYFRAME_LOOKAHEAD_SECONDS);
        self.probe_interval(interval)?
            .into_iter()
            .find(|&t| t >= seconds)
    }

    fn previous_keyframe(&self, seconds: f64) -> Option<f64> {
        let from = (seconds - KEYFRAME_LOOKBACK_SECONDS).max(0.0);
        let interval = format!("{from:.6}%{seconds:.6}");
        self.probe_interval(interval)?
            .into_iter()
            .filter(|&t| t <= seconds)
            .last()
    }
}

fn map_ffprobe_error(err: FfProbeError, context: &str) -> CoreError {
    match err {
        FfProbeError::Io(io_err) => command_start_error(format!("ffprobe ({context})"), io_err),
        FfProbeError::Status(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            command_failed_error(format!("ffprobe ({context})"), output.status, stderr)
        }
        FfProbeError::Deserialize(err) => CoreError::JsonParseError(format!(
            "ffprobe {context} output deserialization: {err}"
        )),
        _ => CoreError::FfprobeParse(format!(
            "Unknown ffprobe error during {context}: {err:?}"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keyframe_lines() {
        let output = "0.000000\n2.002000\nN/A\n\n4.004000,\n2.002000\n";
        assert_eq!(parse_keyframe_lines(output), vec![0.0, 2.002, 4.004]);
    }

    #[test]
    fn test_parse_keyframe_lines_empty() {
        assert!(parse_keyframe_lines("").is_empty());
        assert!(parse_keyframe_lines("N/A\nN/A\n").is_empty());
    }

    #[test]
    fn test_frame_rate_fallback() {
        let info = MediaInfo {
            duration_seconds: 12.0,
            frame_rate: None,
            total_frames: None,
        };
        assert_eq!(info.frame_rate_or(30.0), 30.0);
    }
}
