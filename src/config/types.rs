//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Capture engine settings.
///
/// The rolling-capture frame rate is intentionally *not* configurable: it is
/// fixed at [`crate::capture::CAPTURE_FPS`] so that background capture cost
/// stays predictable. These settings size the buffers and the on-demand
/// active recording mode.
#[derive(Debug, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// How many seconds of screen history the rolling buffer retains
    /// (valid range: 10 - 60)
    #[serde(default = "default_buffer_seconds")]
    pub buffer_seconds: u32,

    /// Frame rate used while an active recording session runs
    /// (valid range: 5 - 30)
    #[serde(default = "default_recording_fps")]
    pub recording_fps: u32,

    /// Absolute ceiling on active recording length in minutes; the session
    /// auto-stops when reached (valid range: 1 - 15)
    #[serde(default = "default_max_recording_minutes")]
    pub max_recording_minutes: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            buffer_seconds: default_buffer_seconds(),
            recording_fps: default_recording_fps(),
            max_recording_minutes: default_max_recording_minutes(),
        }
    }
}

/// Output settings for exported artifacts.
#[derive(Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory exported GIFs / sequences are written to.
    /// Supports a leading `~` for the home directory.
    #[serde(default = "default_output_folder")]
    pub folder: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            folder: default_output_folder(),
        }
    }
}

fn default_buffer_seconds() -> u32 {
    30
}

fn default_recording_fps() -> u32 {
    10
}

fn default_max_recording_minutes() -> u32 {
    3
}

fn default_output_folder() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("QuickRewind")
}
