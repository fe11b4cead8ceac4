//! Utility functions for formatting and time conversion.
//!
//! General-purpose helpers used throughout the scenecut-core library.

use std::path::Path;

/// Formats seconds as HH:MM:SS.mmm (e.g., 3725.5 -> "01:02:05.500"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_millis = seconds_to_millis(seconds);
    let millis = total_millis % 1000;
    let total_seconds = total_millis / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}.{millis:03}")
}

/// Rounds seconds to the nearest whole millisecond.
#[must_use]
pub fn seconds_to_millis(seconds: f64) -> i64 {
    (seconds * 1000.0).round() as i64
}

/// Parses an ffprobe rational frame rate such as "30000/1001" or "25".
///
/// Returns None for "0/0", zero, negative or malformed values.
#[must_use]
pub fn parse_frame_rate(text: &str) -> Option<f64> {
    let text = text.trim();
    let rate = match text.split_once('/') {
        Some((num, den)) => {
            let num = num.trim().parse::<f64>().ok()?;
            let den = den.trim().parse::<f64>().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => text.parse::<f64>().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

/// File stem used as the base of clip names, "video" when the path has none.
#[must_use]
pub fn clip_base_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "video".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "00:00:00.000");
        assert_eq!(format_duration(3725.5), "01:02:05.500");
        assert_eq!(format_duration(59.9996), "00:01:00.000");
        assert_eq!(format_duration(-1.0), "??:??:??");
        assert_eq!(format_duration(f64::NAN), "??:??:??");
    }

    #[test]
    fn test_seconds_to_millis_rounds() {
        assert_eq!(seconds_to_millis(1.2344), 1234);
        assert_eq!(seconds_to_millis(1.2346), 1235);
        assert_eq!(seconds_to_millis(0.0), 0);
    }

    #[test]
    fn test_parse_frame_rate() {
        let ntsc = parse_frame_rate("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.001);
        assert_eq!(parse_frame_rate("25/1"), Some(25.0));
        assert_eq!(parse_frame_rate("24"), Some(24.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("0"), None);
        assert_eq!(parse_frame_rate("abc"), None);
    }

    #[test]
    fn test_clip_base_name() {
        assert_eq!(clip_base_name(Path::new("/media/My Trip.mov")), "My Trip");
        assert_eq!(clip_base_name(Path::new("clip.tar.mp4")), "clip.tar");
        assert_eq!(clip_base_name(Path::new("/")), "video");
    }
}
