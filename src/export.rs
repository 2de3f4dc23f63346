//! Async export manager.
//!
//! Bridges the capture threads and the blocking encoding pipeline: export
//! requests carry a frame snapshot through an unbounded channel to a
//! background task, which runs the fallback chain on a blocking worker so
//! capture pacing is never disturbed by an export.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task;

use crate::capture::session::ActiveRecordingSession;
use crate::capture::types::{ExportMode, Frame};
use crate::encode::{
    self, EncodeError, EncodeRequest, EncodeStage, EncodedArtifact, FrameEncoder,
};
use crate::notification::{Notifier, Severity};

/// One export request: a point-in-time frame snapshot plus presentation
/// parameters.
pub struct ExportRequest {
    pub frames: Vec<Frame>,
    pub mode: ExportMode,
    pub delay_ms: u32,
    /// Session generation the frames were snapshotted from. A recording
    /// export only clears the session if this still matches once the
    /// encode finishes; unused for buffer exports.
    pub session_generation: u64,
}

/// Status of the most recent export operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    Idle,
    InProgress,
    Success,
    Failed(String),
}

/// Outcome of a finished export.
#[derive(Debug, Clone)]
pub enum ExportOutcome {
    Saved(EncodedArtifact),
    Failed(String),
}

#[derive(Debug, Error)]
#[error("Export worker is not running")]
pub struct ExportWorkerStopped;

/// Shared handle for dispatching exports and observing their progress.
#[derive(Clone)]
pub struct ExportManager {
    request_tx: mpsc::UnboundedSender<ExportRequest>,
    status: Arc<Mutex<ExportStatus>>,
    last_result: Arc<Mutex<Option<ExportOutcome>>>,
}

impl ExportManager {
    /// Create a manager with the production encoder chain.
    ///
    /// Spawns the background task that services export requests.
    pub fn new(
        runtime_handle: &tokio::runtime::Handle,
        output_dir: PathBuf,
        notifier: Arc<dyn Notifier>,
        session: Arc<ActiveRecordingSession>,
    ) -> Self {
        Self::with_chain(
            runtime_handle,
            output_dir,
            notifier,
            session,
            encode::default_chain(),
        )
    }

    /// Create a manager with a custom encoder chain (useful for testing).
    pub fn with_chain(
        runtime_handle: &tokio::runtime::Handle,
        output_dir: PathBuf,
        notifier: Arc<dyn Notifier>,
        session: Arc<ActiveRecordingSession>,
        chain: Vec<Box<dyn FrameEncoder>>,
    ) -> Self {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<ExportRequest>();
        let status = Arc::new(Mutex::new(ExportStatus::Idle));
        let last_result = Arc::new(Mutex::new(None));
        let chain = Arc::new(chain);

        let status_clone = status.clone();
        let result_clone = last_result.clone();

        runtime_handle.spawn(async move {
            while let Some(request) = request_rx.recv().await {
                log::debug!(
                    "Processing export request: {:?}, {} frames",
                    request.mode,
                    request.frames.len()
                );
                *status_clone.lock().await = ExportStatus::InProgress;

                let outcome = run_export(
                    request,
                    &output_dir,
                    chain.clone(),
                    notifier.as_ref(),
                    &session,
                )
                .await;

                match outcome {
                    Ok(artifact) => {
                        *status_clone.lock().await = ExportStatus::Success;
                        *result_clone.lock().await = Some(ExportOutcome::Saved(artifact));
                    }
                    Err(message) => {
                        *status_clone.lock().await = ExportStatus::Failed(message.clone());
                        *result_clone.lock().await = Some(ExportOutcome::Failed(message));
                    }
                }
            }
        });

        Self {
            request_tx,
            status,
            last_result,
        }
    }

    /// Queue an export of the given frame snapshot.
    ///
    /// Non-blocking; the encode happens in the background.
    pub fn request_export(
        &self,
        frames: Vec<Frame>,
        mode: ExportMode,
        delay_ms: u32,
        session_generation: u64,
    ) -> Result<(), ExportWorkerStopped> {
        self.request_tx
            .send(ExportRequest {
                frames,
                mode,
                delay_ms,
                session_generation,
            })
            .map_err(|_| ExportWorkerStopped)
    }

    pub async fn get_status(&self) -> ExportStatus {
        self.status.lock().await.clone()
    }

    /// Get the result of the last export and clear it.
    pub async fn take_result(&self) -> Option<ExportOutcome> {
        self.last_result.lock().await.take()
    }

    /// Try to get the result without waiting (non-blocking).
    pub fn try_take_result(&self) -> Option<ExportOutcome> {
        self.last_result.try_lock().ok().and_then(|mut r| r.take())
    }
}

async fn run_export(
    request: ExportRequest,
    output_dir: &std::path::Path,
    chain: Arc<Vec<Box<dyn FrameEncoder>>>,
    notifier: &dyn Notifier,
    session: &Arc<ActiveRecordingSession>,
) -> Result<EncodedArtifact, String> {
    let mode = request.mode;
    let session_generation = request.session_generation;

    if request.frames.is_empty() {
        notifier.notify(
            Severity::Warning,
            "Nothing to export",
            "No frames available",
        );
        return Err(EncodeError::NoFrames.to_string());
    }

    notifier.notify(
        Severity::Info,
        "Processing export",
        &format!("Encoding {} frames", request.frames.len()),
    );

    let target = encode::file::artifact_path(output_dir, mode);
    let dir = output_dir.to_path_buf();

    let encoded = task::spawn_blocking(move || {
        encode::file::ensure_directory_exists(&dir)?;
        let encode_request = EncodeRequest {
            frames: request.frames,
            target,
            delay_ms: request.delay_ms,
        };
        encode::encode_with_fallback(&encode_request, &chain)
    })
    .await;

    match encoded {
        Ok(Ok(artifact)) => {
            announce(notifier, &artifact);
            if mode == ExportMode::Recording {
                // Frames were only kept around so a failed export could be
                // retried; the export succeeded, release the memory. If a
                // new session started while the encode ran, its frames
                // must stay.
                if !session.clear_if(session_generation) {
                    log::debug!("Recording restarted during export, leaving its frames alone");
                }
            }
            Ok(artifact)
        }
        Ok(Err(e)) => {
            let message = e.to_string();
            log::error!("Export failed: {}", message);
            notifier.notify(Severity::Error, "Export failed", &message);
            Err(message)
        }
        Err(e) => {
            let message = format!("Export task failed: {}", e);
            log::error!("{}", message);
            notifier.notify(Severity::Error, "Export failed", &message);
            Err(message)
        }
    }
}

/// Tell the user what was actually written. The fallback stages are
/// degraded outcomes and are reported as warnings, not successes.
fn announce(notifier: &dyn Notifier, artifact: &EncodedArtifact) {
    let location = artifact.path.display().to_string();
    match artifact.stage {
        EncodeStage::Animation => {
            notifier.notify(Severity::Info, "Animation saved", &location);
        }
        EncodeStage::FrameSequence => {
            notifier.notify(
                Severity::Warning,
                "Saved frame sequence",
                &format!("GIF encoding failed; wrote numbered stills to {location}"),
            );
        }
        EncodeStage::SingleStill => {
            notifier.notify(
                Severity::Warning,
                "Saved screenshot",
                &format!("Animation failed; wrote the last frame to {location}"),
            );
        }
    }
}
