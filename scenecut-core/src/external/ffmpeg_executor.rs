// ============================================================================
// scenecut-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: Decoded frame streaming
//
// Detectors that measure content change need pixels. This module decodes the
// first video stream through ffmpeg-sidecar, scales it down to an analysis
// width and hands each frame to a callback as an RGB image.
//
// KEY COMPONENTS:
// - DecodedFrame: One RGB frame with its index and presentation time
// - FrameSource: Trait for anything that can stream frames of a video
// - SidecarFrameSource: Concrete implementation using ffmpeg-sidecar

use crate::config::DEFAULT_ANALYSIS_WIDTH;
use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error, command_wait_error};
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use image::RgbImage;
use std::path::Path;

/// One decoded frame.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// Zero-based position in decode order
    pub frame_index: u64,
    /// Presentation time in seconds
    pub timestamp_seconds: f64,
    pub image: RgbImage,
}

/// Something that can decode a video into a sequence of frames.
pub trait FrameSource: Send + Sync {
    /// Calls `on_frame` for every frame in order. An error from the callback
    /// stops decoding and is returned unchanged.
    fn stream_frames(
        &self,
        video: &Path,
        on_frame: &mut dyn FnMut(DecodedFrame) -> CoreResult<()>,
    ) -> CoreResult<()>;
}

/// `FrameSource` that decodes through an ffmpeg child process.
#[derive(Debug, Clone, Copy)]
pub struct SidecarFrameSource {
    analysis_width: u32,
}

impl Default for SidecarFrameSource {
    fn default() -> Self {
        Self {
            analysis_width: DEFAULT_ANALYSIS_WIDTH,
        }
    }
}

impl SidecarFrameSource {
    pub fn new(analysis_width: u32) -> Self {
        Self {
            analysis_width: analysis_width.max(1),
        }
    }

    pub fn analysis_width(&self) -> u32 {
        self.analysis_width
    }

    /// Output-side arguments placed between the input and the rawvideo sink.
    fn decode_args(&self) -> Vec<String> {
        vec![
            "-an".to_string(),
            "-sn".to_string(),
            "-dn".to_string(),
            "-vf".to_string(),
            format!("scale={}:-2", self.analysis_width),
        ]
    }
}

impl FrameSource for SidecarFrameSource {
    fn stream_frames(
        &self,
        video: &Path,
        on_frame: &mut dyn FnMut(DecodedFrame) -> CoreResult<()>,
    ) -> CoreResult<()> {
        let args = self.decode_args();
        log::debug!("Decoding frames of {} with {}", video.display(), args.join(" "));

        let mut child = FfmpegCommand::new()
            .hide_banner()
            .input(&*video.to_string_lossy())
            .args(&args)
            .rawvideo()
            .spawn()
            .map_err(|e| command_start_error("ffmpeg (frame decode)", e))?;

        let iterator = child.iter().map_err(|e| {
            log::error!("Failed to get ffmpeg event iterator: {}", e);
            CoreError::OperationFailed(format!("ffmpeg (frame decode): {e}"))
        })?;

        let mut stderr_lines: Vec<String> = Vec::new();
        let mut decoded: u64 = 0;
        let mut callback_error: Option<CoreError> = None;

        for event in iterator {
            match event {
                FfmpegEvent::OutputFrame(frame) => {
                    let Some(image) = RgbImage::from_raw(frame.width, frame.height, frame.data)
                    else {
                        callback_error = Some(CoreError::OperationFailed(format!(
                            "ffmpeg produced a truncated {}x{} frame at index {}",
                            frame.width, frame.height, frame.frame_num
                        )));
                        break;
                    };
                    let decoded_frame = DecodedFrame {
                        frame_index: u64::from(frame.frame_num),
                        timestamp_seconds: f64::from(frame.timestamp),
                        image,
                    };
                    decoded += 1;
                    if let Err(e) = on_frame(decoded_frame) {
                        callback_error = Some(e);
                        break;
                    }
                }
                FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, line) => {
                    log::debug!("ffmpeg: {}", line);
                    stderr_lines.push(line);
                }
                FfmpegEvent::Error(line) => {
                    log::debug!("ffmpeg error: {}", line);
                    stderr_lines.push(line);
                }
                _ => {}
            }
        }

        if let Some(err) = callback_error {
            if let Err(kill_err) = child.kill() {
                log::warn!("Failed to stop ffmpeg after an aborted decode: {}", kill_err);
            }
            // Reap the child; its exit status is irrelevant at this point.
            let _ = child.wait();
            return Err(err);
        }

        let status = child
            .wait()
            .map_err(|e| command_wait_error("ffmpeg (frame decode)", e))?;
        if !status.success() {
            return Err(command_failed_error(
                "ffmpeg (frame decode)",
                status,
                stderr_lines.join("\n"),
            ));
        }

        log::debug!("Decoded {} frames from {}", decoded, video.display());
        Ok(())
    }
}
