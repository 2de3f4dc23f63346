//! Frame-sequence encoding with cascading fallback.
//!
//! Exports run an ordered chain of encoder strategies: animated GIF first,
//! then a numbered PNG sequence, then a single PNG still of the last frame.
//! Each stage's failure is caught and the chain advances; the stage that
//! succeeded is part of the result so callers can tell the user what was
//! actually written.

pub mod animation;
pub mod file;
pub mod sequence;
pub mod still;


use std::path::PathBuf;

use thiserror::Error;

use crate::capture::types::Frame;

/// Which fallback stage produced an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeStage {
    /// Multi-frame animated GIF (the intended outcome).
    Animation,
    /// Numbered PNG stills in a `_sequence` directory (degraded).
    FrameSequence,
    /// Single PNG of the most recent frame (last resort).
    SingleStill,
}

impl EncodeStage {
    pub fn describe(self) -> &'static str {
        match self {
            Self::Animation => "animated GIF",
            Self::FrameSequence => "PNG frame sequence",
            Self::SingleStill => "single PNG still",
        }
    }
}

/// One export's worth of input: an ordered frame sequence, the intended
/// artifact path, and the per-frame display delay.
#[derive(Debug, Clone)]
pub struct EncodeRequest {
    pub frames: Vec<Frame>,
    pub target: PathBuf,
    pub delay_ms: u32,
}

/// Result of a successful export: where the artifact landed and which
/// stage wrote it.
#[derive(Debug, Clone)]
pub struct EncodedArtifact {
    pub path: PathBuf,
    pub stage: EncodeStage,
}

/// Errors raised by the encoding pipeline.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("No frames to encode")]
    NoFrames,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GIF encoding failed: {0}")]
    Gif(#[from] gif::EncodingError),

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("All encoding stages failed")]
    AllStagesFailed,
}

/// One strategy in the fallback chain.
pub trait FrameEncoder: Send + Sync {
    fn stage(&self) -> EncodeStage;

    /// Encode the request, returning the path actually written. A failing
    /// stage must clean up any partial output before returning.
    fn encode(&self, request: &EncodeRequest) -> Result<PathBuf, EncodeError>;
}

/// The production chain, in fallback order.
pub fn default_chain() -> Vec<Box<dyn FrameEncoder>> {
    vec![
        Box::new(animation::AnimationEncoder),
        Box::new(sequence::SequenceEncoder),
        Box::new(still::StillEncoder),
    ]
}

/// Run the chain until one stage succeeds.
///
/// An empty frame sequence is rejected up front without touching the file
/// system. If every stage fails, `AllStagesFailed` is returned and no
/// partial artifact is left behind (each stage removes its own debris).
pub fn encode_with_fallback(
    request: &EncodeRequest,
    chain: &[Box<dyn FrameEncoder>],
) -> Result<EncodedArtifact, EncodeError> {
    if request.frames.is_empty() {
        return Err(EncodeError::NoFrames);
    }

    for encoder in chain {
        match encoder.encode(request) {
            Ok(path) => {
                log::info!(
                    "Export succeeded as {} at {}",
                    encoder.stage().describe(),
                    path.display()
                );
                return Ok(EncodedArtifact {
                    path,
                    stage: encoder.stage(),
                });
            }
            Err(e) => {
                log::warn!(
                    "{} stage failed: {}. Trying next fallback.",
                    encoder.stage().describe(),
                    e
                );
            }
        }
    }

    Err(EncodeError::AllStagesFailed)
}
