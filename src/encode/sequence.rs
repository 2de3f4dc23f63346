//! PNG frame-sequence encoding, the second fallback stage.

use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;

use super::{EncodeError, EncodeRequest, EncodeStage, FrameEncoder, file};

pub struct SequenceEncoder;

impl FrameEncoder for SequenceEncoder {
    fn stage(&self) -> EncodeStage {
        EncodeStage::FrameSequence
    }

    fn encode(&self, request: &EncodeRequest) -> Result<PathBuf, EncodeError> {
        let dir = file::sequence_dir(&request.target);
        write_sequence(request, &dir).inspect_err(|_| {
            // A half-written sequence directory is worse than none.
            let _ = fs::remove_dir_all(&dir);
        })?;
        Ok(dir)
    }
}

fn write_sequence(request: &EncodeRequest, dir: &Path) -> Result<(), EncodeError> {
    fs::create_dir_all(dir)?;

    log::debug!(
        "Writing PNG sequence: {} frames into {}",
        request.frames.len(),
        dir.display()
    );

    for (index, frame) in request.frames.iter().enumerate() {
        let frame_path = dir.join(format!("frame_{index:03}.png"));
        frame.save_with_format(&frame_path, ImageFormat::Png)?;
    }

    fs::write(dir.join("README.txt"), manifest(request))?;
    Ok(())
}

/// Small human-readable summary dropped next to the frames.
fn manifest(request: &EncodeRequest) -> String {
    let estimated_seconds =
        (request.frames.len() as u64 * u64::from(request.delay_ms)) as f64 / 1000.0;
    format!(
        "QuickRewind capture sequence\n\
         ============================\n\
         Frames: {}\n\
         Estimated duration: {:.1} seconds\n\
         \n\
         Open the frames in any image viewer, or import them into a video\n\
         editor to reassemble the animation.\n",
        request.frames.len(),
        estimated_seconds
    )
}
