//! Data types for the screen capture engine.

use thiserror::Error;

/// A single captured frame: an owned truecolor raster without alpha.
///
/// Frames are immutable once captured and ordered implicitly by insertion
/// into their owning buffer.
pub type Frame = image::RgbImage;

/// Which store an export was taken from; determines the `<mode>` component
/// of the artifact filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// Snapshot of the rolling buffer ("the last N seconds").
    Buffer,
    /// Frames accumulated by an active recording session.
    Recording,
}

impl ExportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buffer => "buffer",
            Self::Recording => "recording",
        }
    }
}

/// Errors that can occur while capturing the screen.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Failed to enumerate monitors: {0}")]
    MonitorEnumeration(String),

    #[error("No primary monitor found")]
    NoPrimaryMonitor,

    #[error("Screen capture failed: {0}")]
    CaptureFailed(String),

    #[error("Active recording is already in progress")]
    AlreadyRecording,

    #[error("No active recording in progress")]
    NotRecording,

    #[error("Rolling capture is not running")]
    NotCapturing,

    #[error("Failed to spawn capture thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),
}
