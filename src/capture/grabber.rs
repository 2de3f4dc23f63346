//! Full-screen frame grabbing via the `xcap` crate.
//!
//! This is the layer that talks to the OS. Everything above it consumes the
//! [`FrameSource`] trait, so the scheduler can be driven by a synthetic
//! source in tests.

use image::imageops::{self, FilterType};
use xcap::Monitor;

use crate::capture::types::{CaptureError, Frame};

/// Downsample factor for the always-on rolling capture path. Kept small
/// because this path runs continuously.
pub const ROLLING_SCALE: f32 = 0.5;

/// Downsample factor for active recording. Larger than the rolling scale
/// since recordings are short, user-initiated bursts.
pub const RECORDING_SCALE: f32 = 0.75;

/// Abstraction over how raw frames are produced.
pub trait FrameSource: Send + Sync {
    /// Grab one frame of the primary display, downsampled by `scale`.
    fn grab(&self, scale: f32) -> Result<Frame, CaptureError>;
}

/// Captures the primary display through `xcap`.
pub struct FrameGrabber;

impl FrameGrabber {
    /// Create a grabber, verifying that a capturable display exists.
    ///
    /// # Errors
    /// Returns an error if no monitor can be resolved; this is treated as
    /// fatal at startup since nothing else can work without a display.
    pub fn new() -> Result<Self, CaptureError> {
        primary_monitor()?;
        Ok(Self)
    }

    /// Grab the entire primary display region at full resolution.
    pub fn capture_full(&self) -> Result<Frame, CaptureError> {
        let monitor = primary_monitor()?;
        let rgba = monitor
            .capture_image()
            .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;

        // Drop the alpha channel; buffers hold fixed-depth truecolor frames
        // to keep memory per frame predictable.
        Ok(image::DynamicImage::ImageRgba8(rgba).to_rgb8())
    }

    /// Grab the primary display and downsample it by `scale` using a
    /// smoothing (bilinear) filter.
    pub fn capture_downscaled(&self, scale: f32) -> Result<Frame, CaptureError> {
        let full = self.capture_full()?;
        Ok(downscale(&full, scale))
    }
}

impl FrameSource for FrameGrabber {
    fn grab(&self, scale: f32) -> Result<Frame, CaptureError> {
        self.capture_downscaled(scale)
    }
}

/// Resolve the primary monitor, falling back to the first one if no monitor
/// reports itself as primary.
fn primary_monitor() -> Result<Monitor, CaptureError> {
    let monitors =
        Monitor::all().map_err(|e| CaptureError::MonitorEnumeration(e.to_string()))?;

    monitors
        .into_iter()
        .reduce(|primary, candidate| {
            if candidate.is_primary().unwrap_or(false) {
                candidate
            } else {
                primary
            }
        })
        .ok_or(CaptureError::NoPrimaryMonitor)
}

/// Resample a frame to `scale` of its original size with bilinear filtering.
pub fn downscale(frame: &Frame, scale: f32) -> Frame {
    let scale = scale.clamp(0.1, 1.0);
    let width = ((frame.width() as f32 * scale) as u32).max(1);
    let height = ((frame.height() as f32 * scale) as u32).max(1);

    if width == frame.width() && height == frame.height() {
        return frame.clone();
    }

    imageops::resize(frame, width, height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn downscale_halves_dimensions() {
        let frame = Frame::from_pixel(100, 80, Rgb([10, 20, 30]));
        let scaled = downscale(&frame, 0.5);
        assert_eq!(scaled.dimensions(), (50, 40));
    }

    #[test]
    fn downscale_clamps_pathological_scales() {
        let frame = Frame::from_pixel(10, 10, Rgb([0, 0, 0]));
        assert_eq!(downscale(&frame, 5.0).dimensions(), (10, 10));
        assert_eq!(downscale(&frame, 0.0).dimensions(), (1, 1));
    }

    #[test]
    fn downscale_at_unity_is_identity() {
        let frame = Frame::from_pixel(7, 3, Rgb([1, 2, 3]));
        let scaled = downscale(&frame, 1.0);
        assert_eq!(scaled.as_raw(), frame.as_raw());
    }
}
