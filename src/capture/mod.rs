//! Screen capture engine for quickrewind.
//!
//! This module provides the always-on capture machinery:
//! - Frame grabbing with mode-appropriate downsampling
//! - The bounded rolling buffer of recent frames
//! - On-demand active recording sessions
//! - The scheduler owning both capture loops
//!
//! Encoding captured frames into artifacts lives in [`crate::encode`].

pub mod buffer;
pub mod grabber;
pub mod scheduler;
pub mod session;
pub mod types;

#[cfg(test)]
mod tests;

pub use buffer::RollingBuffer;
pub use grabber::{FrameGrabber, FrameSource, RECORDING_SCALE, ROLLING_SCALE};
pub use scheduler::{CAPTURE_FPS, CancelToken, CaptureScheduler};
pub use session::ActiveRecordingSession;
pub use types::{CaptureError, ExportMode, Frame};
