//! Single-still encoding, the last-resort fallback stage.

use std::fs;
use std::path::PathBuf;

use image::ImageFormat;

use super::{EncodeError, EncodeRequest, EncodeStage, FrameEncoder};

pub struct StillEncoder;

impl FrameEncoder for StillEncoder {
    fn stage(&self) -> EncodeStage {
        EncodeStage::SingleStill
    }

    /// Write only the most recent frame, retargeting the extension to
    /// `.png`.
    fn encode(&self, request: &EncodeRequest) -> Result<PathBuf, EncodeError> {
        let last = request.frames.last().ok_or(EncodeError::NoFrames)?;
        let path = request.target.with_extension("png");

        last.save_with_format(&path, ImageFormat::Png)
            .inspect_err(|_| {
                let _ = fs::remove_file(&path);
            })?;
        Ok(path)
    }
}
