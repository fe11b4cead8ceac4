// scenecut-core/src/external/mocks.rs
//
// In-memory stand-ins for the ffprobe and ffmpeg integrations, so pipelines
// can be exercised without media files or binaries.

use super::{DecodedFrame, FrameSource, MediaInfo, MediaProber};
use crate::error::{CoreError, CoreResult};
use image::{Rgb, RgbImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// `MediaProber` answering from per-path expectations.
#[derive(Debug, Default)]
pub struct MockMediaProber {
    infos: Mutex<HashMap<PathBuf, MediaInfo>>,
    keyframes: Mutex<HashMap<PathBuf, Vec<f64>>>,
    probe_calls: Mutex<Vec<PathBuf>>,
}

impl MockMediaProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_media_info(&self, path: &Path, info: MediaInfo) {
        if let Ok(mut infos) = self.infos.lock() {
            infos.insert(path.to_path_buf(), info);
        }
    }

    pub fn expect_keyframes(&self, path: &Path, times: Vec<f64>) {
        if let Ok(mut keyframes) = self.keyframes.lock() {
            keyframes.insert(path.to_path_buf(), times);
        }
    }

    /// Paths passed to `probe`, in call order.
    pub fn probe_calls(&self) -> Vec<PathBuf> {
        self.probe_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl MediaProber for MockMediaProber {
    fn probe(&self, path: &Path) -> CoreResult<MediaInfo> {
        if let Ok(mut calls) = self.probe_calls.lock() {
            calls.push(path.to_path_buf());
        }
        log::debug!("MockMediaProber: probe {}", path.display());
        self.infos
            .lock()
            .ok()
            .and_then(|infos| infos.get(path).copied())
            .ok_or_else(|| {
                CoreError::VideoInfoError(format!(
                    "MockMediaProber: no media info expected for {}",
                    path.display()
                ))
            })
    }

    fn keyframe_times(&self, path: &Path) -> CoreResult<Vec<f64>> {
        self.keyframes
            .lock()
            .ok()
            .and_then(|keyframes| keyframes.get(path).cloned())
            .ok_or_else(|| {
                CoreError::OperationFailed(format!(
                    "MockMediaProber: no keyframes expected for {}",
                    path.display()
                ))
            })
    }
}

/// `FrameSource` replaying a fixed list of solid-colour frames.
#[derive(Debug, Clone)]
pub struct MockFrameSource {
    frames: Vec<RgbImage>,
    frame_rate: f64,
}

impl MockFrameSource {
    pub fn new(frames: Vec<RgbImage>, frame_rate: f64) -> Self {
        Self { frames, frame_rate }
    }

    /// One `width` x `height` frame per colour.
    pub fn solid(colours: &[[u8; 3]], width: u32, height: u32, frame_rate: f64) -> Self {
        let frames = colours
            .iter()
            .map(|&c| RgbImage::from_pixel(width, height, Rgb(c)))
            .collect();
        Self::new(frames, frame_rate)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for MockFrameSource {
    fn stream_frames(
        &self,
        _video: &Path,
        on_frame: &mut dyn FnMut(DecodedFrame) -> CoreResult<()>,
    ) -> CoreResult<()> {
        for (i, image) in self.frames.iter().enumerate() {
            on_frame(DecodedFrame {
                frame_index: i as u64,
                timestamp_seconds: i as f64 / self.frame_rate,
                image: image.clone(),
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_prober_returns_expectations() {
        let prober = MockMediaProber::new();
        let path = Path::new("/videos/a.mp4");
        prober.expect_media_info(
            path,
            MediaInfo {
                duration_seconds: 10.0,
                frame_rate: Some(25.0),
                total_frames: Some(250),
            },
        );
        prober.expect_keyframes(path, vec![0.0, 5.0]);

        assert_eq!(prober.probe(path).unwrap().duration_seconds, 10.0);
        assert_eq!(prober.keyframe_times(path).unwrap(), vec![0.0, 5.0]);
        assert_eq!(prober.probe_calls(), vec![path.to_path_buf()]);
        assert!(prober.probe(Path::new("other.mp4")).is_err());
    }

    #[test]
    fn test_mock_frame_source_stops_on_callback_error() {
        let source = MockFrameSource::solid(&[[0, 0, 0], [255, 0, 0], [0, 255, 0]], 4, 4, 10.0);
        let mut seen = Vec::new();
        let result = source.stream_frames(Path::new("x"), &mut |frame| {
            seen.push(frame.timestamp_seconds);
            if frame.frame_index == 1 {
                return Err(CoreError::OperationFailed("stop".into()));
            }
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(seen, vec![0.0, 0.1]);
    }
}
