// ============================================================================
// scenecut-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with ffmpeg and ffprobe
//
// The detection components never touch a media file. Everything that needs
// one goes through the traits defined here:
//
// - MediaProber: duration, frame rate and keyframe timestamps (ffprobe)
// - FrameSource: decoded, downscaled RGB frames (ffmpeg via ffmpeg-sidecar)
//
// Concrete implementations shell out to the real tools; the mocks module
// provides in-memory stand-ins so the pipeline can be tested without them.

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::io;
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Frame decoding through ffmpeg-sidecar
pub mod ffmpeg_executor;

/// Media probing through the ffprobe crate and the ffprobe binary
pub mod ffprobe_executor;

/// In-memory probers and frame sources for tests
pub mod mocks;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffmpeg_executor::{DecodedFrame, FrameSource, SidecarFrameSource};
pub use ffprobe_executor::{
    CrateFfprobeExecutor, FfprobeKeyframeProber, MediaInfo, MediaProber, parse_keyframe_lines,
};

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks if a required external command is available and executable.
///
/// Runs `cmd_name -version` and discards its output.
///
/// # Returns
///
/// * `Ok(())` - The command ran
/// * `Err(CoreError::DependencyNotFound)` - The command is not on the PATH
/// * `Err(CoreError::CommandStart)` - The command exists but failed to start
pub fn check_dependency(cmd_name: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", cmd_name);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", cmd_name);
            Err(CoreError::DependencyNotFound(cmd_name.to_string()))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{}': {}", cmd_name, e);
            Err(CoreError::CommandStart(cmd_name.to_string(), e))
        }
    }
}
