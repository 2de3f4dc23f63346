//! Animated GIF encoding, the first (preferred) fallback stage.

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use color_quant::NeuQuant;
use gif::{DisposalMethod, Encoder, Repeat};
use image::RgbaImage;

use super::{EncodeError, EncodeRequest, EncodeStage, FrameEncoder};
use crate::capture::types::Frame;

/// NeuQuant sample spacing: 1 trains on every pixel, 10 on every tenth.
/// Screen content tolerates the coarser sampling well.
const QUANT_SAMPLE_FACTOR: i32 = 10;

const PALETTE_SIZE: usize = 256;

pub struct AnimationEncoder;

impl FrameEncoder for AnimationEncoder {
    fn stage(&self) -> EncodeStage {
        EncodeStage::Animation
    }

    fn encode(&self, request: &EncodeRequest) -> Result<PathBuf, EncodeError> {
        let path = request.target.clone();
        write_animation(request, &path).inspect_err(|_| {
            // Never leave a truncated GIF behind for a later stage to race.
            if path.is_file() {
                let _ = fs::remove_file(&path);
            }
        })?;
        Ok(path)
    }
}

fn write_animation(request: &EncodeRequest, path: &Path) -> Result<(), EncodeError> {
    let first = request.frames.first().ok_or(EncodeError::NoFrames)?;
    let (width, height) = first.dimensions();

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let mut encoder = Encoder::new(&mut writer, width as u16, height as u16, &[])?;
    // Play once. The netscape application extension carrying the repeat
    // count is emitted ahead of the first frame only.
    encoder.set_repeat(Repeat::Finite(1))?;

    let delay = delay_centiseconds(request.delay_ms);
    log::debug!(
        "Encoding GIF: {} frames, {}x{}, {} cs/frame",
        request.frames.len(),
        width,
        height,
        delay
    );

    for frame in &request.frames {
        encoder.write_frame(&quantize_frame(frame, delay))?;
    }

    // Finalize explicitly: the GIF trailer and the buffered flush would
    // otherwise happen inside implicit drops, which cannot report write
    // failures.
    encoder.into_inner()?;
    writer.flush()?;

    Ok(())
}

/// Quantize one truecolor frame down to an indexed 256-color palette with
/// dithering, ready to be written as a GIF frame.
fn quantize_frame(frame: &Frame, delay: u16) -> gif::Frame<'static> {
    let mut rgba: RgbaImage = image::DynamicImage::ImageRgb8(frame.clone()).to_rgba8();
    let quantizer = NeuQuant::new(QUANT_SAMPLE_FACTOR, PALETTE_SIZE, rgba.as_raw());

    // Dither against the trained palette to reduce banding on gradients.
    image::imageops::dither(&mut rgba, &quantizer);

    let indices: Vec<u8> = rgba
        .pixels()
        .map(|px| quantizer.index_of(&px.0) as u8)
        .collect();

    gif::Frame {
        width: frame.width() as u16,
        height: frame.height() as u16,
        delay,
        // Frames accumulate visually; fine for screen content and cheaper
        // than restoring the background between frames.
        dispose: DisposalMethod::Keep,
        palette: Some(quantizer.color_map_rgb()),
        buffer: Cow::Owned(indices),
        ..gif::Frame::default()
    }
}

/// GIF stores per-frame delays in centiseconds; milliseconds truncate.
pub(crate) fn delay_centiseconds(delay_ms: u32) -> u16 {
    (delay_ms / 10).min(u32::from(u16::MAX)) as u16
}
