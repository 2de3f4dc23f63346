/// Daemon mode implementation: background capture service driven by signals.
use anyhow::{Context, Result};
use log::{info, warn};
use signal_hook::consts::signal::{SIGINT, SIGTERM, SIGUSR1, SIGUSR2};
use signal_hook::iterator::Signals;
use std::sync::Arc;
use std::time::Duration;

use crate::capture::{CAPTURE_FPS, CaptureScheduler, ExportMode, FrameGrabber};
use crate::config::Config;
use crate::export::{ExportManager, ExportOutcome};
use crate::notification::{LogNotifier, Notifier, Severity};

/// Per-frame playback delay for buffer exports: mirrors the fixed rolling
/// capture rate, so the replay runs at roughly real time.
const BUFFER_DELAY_MS: u32 = 1000 / CAPTURE_FPS;

/// Per-frame playback delay for recording exports, derived from the actual
/// session duration and clamped to a sensible playback range.
fn recording_delay_ms(duration_ms: u64, frame_count: usize) -> u32 {
    if frame_count == 0 {
        return 100;
    }
    (duration_ms / frame_count as u64).clamp(100, 1000) as u32
}

/// Wires the grabber, scheduler, and export manager together.
struct Service {
    scheduler: Arc<CaptureScheduler>,
    exporter: ExportManager,
    notifier: Arc<dyn Notifier>,
}

impl Service {
    fn new(
        config: &Config,
        runtime_handle: &tokio::runtime::Handle,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        // The only fatal failure in the whole engine: no display, no tool.
        let grabber = FrameGrabber::new().context("Failed to initialize screen capture")?;
        let scheduler = Arc::new(CaptureScheduler::new(&config.capture, Arc::new(grabber)));
        let exporter = ExportManager::new(
            runtime_handle,
            config.output.folder.clone(),
            notifier.clone(),
            scheduler.session(),
        );
        Ok(Self {
            scheduler,
            exporter,
            notifier,
        })
    }

    fn start(&self) -> Result<()> {
        self.scheduler.start()?;
        Ok(())
    }

    fn export_buffer(&self) {
        let frames = self.scheduler.buffer_snapshot();
        if let Err(e) = self
            .exporter
            .request_export(frames, ExportMode::Buffer, BUFFER_DELAY_MS, 0)
        {
            warn!("Could not queue buffer export: {}", e);
        }
    }

    fn toggle_recording(&self) {
        match self.scheduler.stop_active_recording() {
            Ok(()) => {
                let session = self.scheduler.session();
                let frames = session.snapshot();
                let generation = session.generation();
                let delay = recording_delay_ms(session.duration_millis(), frames.len());
                if let Err(e) =
                    self.exporter
                        .request_export(frames, ExportMode::Recording, delay, generation)
                {
                    warn!("Could not queue recording export: {}", e);
                }
            }
            Err(_) => match self.scheduler.start_active_recording() {
                Ok(()) => self.notifier.notify(
                    Severity::Info,
                    "Recording started",
                    "Send SIGUSR2 again to stop and save",
                ),
                Err(e) => self.notifier.notify(
                    Severity::Warning,
                    "Could not start recording",
                    &e.to_string(),
                ),
            },
        }
    }

    fn shutdown(&self) {
        self.scheduler.stop();
    }
}

/// Background capture service.
pub struct Daemon {
    config: Config,
    notifier: Arc<dyn Notifier>,
}

impl Daemon {
    pub fn new(config: Config) -> Self {
        Self::with_notifier(config, Arc::new(LogNotifier))
    }

    pub fn with_notifier(config: Config, notifier: Arc<dyn Notifier>) -> Self {
        Self { config, notifier }
    }

    /// Run until SIGINT/SIGTERM. SIGUSR1 exports the rolling buffer;
    /// SIGUSR2 toggles active recording (the stop edge exports it).
    pub fn run(&self) -> Result<()> {
        let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
        let service = Service::new(&self.config, runtime.handle(), self.notifier.clone())?;
        service.start()?;

        self.notifier.notify(
            Severity::Info,
            "QuickRewind started",
            &format!(
                "Buffering the last {} seconds of screen activity",
                self.config.capture.buffer_seconds
            ),
        );
        info!("Output folder: {}", self.config.output.folder.display());
        info!("SIGUSR1 exports the buffer, SIGUSR2 toggles recording");

        let mut signals = Signals::new([SIGINT, SIGTERM, SIGUSR1, SIGUSR2])
            .context("Failed to install signal handlers")?;
        for signal in signals.forever() {
            match signal {
                SIGUSR1 => service.export_buffer(),
                SIGUSR2 => service.toggle_recording(),
                SIGINT | SIGTERM => {
                    info!("Received shutdown signal");
                    break;
                }
                _ => {}
            }
        }

        service.shutdown();
        Ok(())
    }

    /// One-shot mode: fill the buffer for `seconds`, export it, exit.
    pub fn run_once(&self, seconds: u64) -> Result<()> {
        let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
        let service = Service::new(&self.config, runtime.handle(), self.notifier.clone())?;
        service.start()?;

        info!("Capturing for {} seconds before export", seconds);
        std::thread::sleep(Duration::from_secs(seconds));
        service.export_buffer();

        let outcome = runtime.block_on(async {
            // Encoding large buffers takes a while; poll generously.
            for _ in 0..600 {
                if let Some(outcome) = service.exporter.take_result().await {
                    return Some(outcome);
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            None
        });

        service.shutdown();

        match outcome {
            Some(ExportOutcome::Saved(artifact)) => {
                info!("Export written to {}", artifact.path.display());
                Ok(())
            }
            Some(ExportOutcome::Failed(message)) => Err(anyhow::anyhow!(message)),
            None => Err(anyhow::anyhow!("Export did not finish in time")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_delay_matches_capture_rate() {
        assert_eq!(BUFFER_DELAY_MS, 500);
    }

    #[test]
    fn recording_delay_tracks_real_duration() {
        // 10 seconds, 50 frames -> 200 ms per frame.
        assert_eq!(recording_delay_ms(10_000, 50), 200);
    }

    #[test]
    fn recording_delay_is_clamped() {
        assert_eq!(recording_delay_ms(100, 50), 100);
        assert_eq!(recording_delay_ms(600_000, 10), 1000);
        assert_eq!(recording_delay_ms(5_000, 0), 100);
    }
}
