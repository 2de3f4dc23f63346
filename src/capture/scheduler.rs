//! Capture loop ownership and lifecycle.
//!
//! The scheduler owns two independent loops running on dedicated OS
//! threads: the always-on rolling capture (background priority) and the
//! on-demand active recording (normal priority). Both pace themselves with
//! interruptible sleeps through a [`CancelToken`], so shutdown never waits
//! out a full frame interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::capture::buffer::RollingBuffer;
use crate::capture::grabber::{FrameSource, RECORDING_SCALE, ROLLING_SCALE};
use crate::capture::session::ActiveRecordingSession;
use crate::capture::types::CaptureError;
use crate::config::CaptureConfig;

/// Fixed frame rate of the rolling capture loop. Deliberately low and
/// independent of the configured recording FPS: this loop never stops, so
/// its cost has to stay negligible.
pub const CAPTURE_FPS: u32 = 2;

/// Settle delay between grabbing a frame and inserting it into the buffer,
/// smoothing the load spike of a grab.
const GRAB_SETTLE: Duration = Duration::from_millis(50);

/// Cancellation token shared between the scheduler and a capture loop.
///
/// `sleep` doubles as the loop's pacing primitive: it waits on a condvar
/// with a deadline, so a `cancel` from another thread wakes the sleeper
/// immediately instead of interrupting the thread.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    pub fn cancel(&self) {
        let (flag, condvar) = &*self.inner;
        *flag.lock().unwrap() = true;
        condvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap()
    }

    /// Sleep for `duration` unless cancelled first. Returns `false` if the
    /// token was cancelled before or during the sleep.
    pub fn sleep(&self, duration: Duration) -> bool {
        let (flag, condvar) = &*self.inner;
        let deadline = Instant::now() + duration;
        let mut cancelled = flag.lock().unwrap();
        while !*cancelled {
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            let (guard, _timeout) = condvar.wait_timeout(cancelled, deadline - now).unwrap();
            cancelled = guard;
        }
        false
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Derived timing parameters for both capture loops.
///
/// Built from [`CaptureConfig`] at scheduler construction; the config stays
/// the single source of truth, and picking up changed settings means
/// rebuilding the scheduler.
#[derive(Debug, Clone)]
pub(crate) struct SchedulerTiming {
    pub capture_fps: u32,
    pub recording_fps: u32,
    pub rolling_capacity: usize,
    pub max_recording: Duration,
    pub max_recording_frames: usize,
    pub grab_settle: Duration,
}

impl SchedulerTiming {
    fn from_config(config: &CaptureConfig) -> Self {
        let max_seconds = u64::from(config.max_recording_minutes) * 60;
        Self {
            capture_fps: CAPTURE_FPS,
            recording_fps: config.recording_fps,
            rolling_capacity: (config.buffer_seconds * CAPTURE_FPS) as usize,
            max_recording: Duration::from_secs(max_seconds),
            max_recording_frames: max_seconds as usize * config.recording_fps as usize,
            grab_settle: GRAB_SETTLE,
        }
    }
}

struct LoopHandle {
    token: CancelToken,
    thread: JoinHandle<()>,
}

impl LoopHandle {
    fn shutdown(self) {
        self.token.cancel();
        if self.thread.join().is_err() {
            log::error!("Capture loop thread panicked");
        }
    }
}

/// Owns the rolling-capture and active-recording loops and their shared
/// frame stores.
pub struct CaptureScheduler {
    source: Arc<dyn FrameSource>,
    rolling: Arc<RollingBuffer>,
    session: Arc<ActiveRecordingSession>,
    timing: SchedulerTiming,
    capturing: AtomicBool,
    rolling_loop: Mutex<Option<LoopHandle>>,
    recording_loop: Mutex<Option<LoopHandle>>,
}

impl CaptureScheduler {
    pub fn new(config: &CaptureConfig, source: Arc<dyn FrameSource>) -> Self {
        Self::with_timing(source, SchedulerTiming::from_config(config))
    }

    pub(crate) fn with_timing(source: Arc<dyn FrameSource>, timing: SchedulerTiming) -> Self {
        let session = ActiveRecordingSession::new(
            timing.max_recording_frames,
            timing.recording_fps as usize,
        );
        Self {
            source,
            rolling: Arc::new(RollingBuffer::new(timing.rolling_capacity)),
            session: Arc::new(session),
            timing,
            capturing: AtomicBool::new(false),
            rolling_loop: Mutex::new(None),
            recording_loop: Mutex::new(None),
        }
    }

    /// Start the rolling capture loop. Idempotent: a no-op if already
    /// capturing.
    pub fn start(&self) -> Result<(), CaptureError> {
        if self.capturing.swap(true, Ordering::SeqCst) {
            log::debug!("Rolling capture already running");
            return Ok(());
        }

        let token = CancelToken::new();
        let source = Arc::clone(&self.source);
        let buffer = Arc::clone(&self.rolling);
        let loop_token = token.clone();
        let timing = self.timing.clone();

        let spawned = thread::Builder::new()
            .name("rolling-capture".into())
            .spawn(move || {
                lower_thread_priority();
                rolling_loop(&*source, &buffer, &loop_token, &timing);
            });

        match spawned {
            Ok(handle) => {
                *self.rolling_loop.lock().unwrap() = Some(LoopHandle {
                    token,
                    thread: handle,
                });
                log::info!(
                    "Rolling capture started ({} FPS, {} frame buffer)",
                    self.timing.capture_fps,
                    self.rolling.capacity()
                );
                Ok(())
            }
            Err(e) => {
                self.capturing.store(false, Ordering::SeqCst);
                Err(e.into())
            }
        }
    }

    /// Stop the rolling capture loop. Idempotent. Also tears down any
    /// in-progress active recording: a recording session never outlives its
    /// parent rolling capture.
    pub fn stop(&self) {
        if self.stop_active_recording().is_ok() {
            log::info!("Stopped active recording during rolling capture shutdown");
        }

        if !self.capturing.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.rolling_loop.lock().unwrap().take() {
            handle.shutdown();
        }
        log::info!("Rolling capture stopped");
    }

    /// Begin an active recording session on its own loop.
    ///
    /// # Errors
    /// - [`CaptureError::NotCapturing`] if rolling capture is not running
    ///   (recording is an overlay on rolling capture, not a replacement).
    /// - [`CaptureError::AlreadyRecording`] if a session is in progress.
    pub fn start_active_recording(&self) -> Result<(), CaptureError> {
        if !self.is_capturing() {
            return Err(CaptureError::NotCapturing);
        }

        let mut guard = self.recording_loop.lock().unwrap();
        if self.session.is_recording() {
            return Err(CaptureError::AlreadyRecording);
        }
        // Collect a loop that auto-stopped but was never explicitly stopped;
        // its unexported frames are discarded by the reset below.
        if let Some(stale) = guard.take() {
            stale.shutdown();
        }

        self.session.begin();

        let token = CancelToken::new();
        let source = Arc::clone(&self.source);
        let session = Arc::clone(&self.session);
        let loop_token = token.clone();
        let timing = self.timing.clone();

        let handle = thread::Builder::new()
            .name("active-recording".into())
            .spawn(move || {
                recording_loop(&*source, &session, &loop_token, &timing);
            })
            .inspect_err(|_| self.session.finish())?;

        *guard = Some(LoopHandle {
            token,
            thread: handle,
        });
        log::info!(
            "Active recording started ({} FPS, {:?} ceiling)",
            self.timing.recording_fps,
            self.timing.max_recording
        );
        Ok(())
    }

    /// Stop the active recording loop. Frames remain available for export
    /// until [`ActiveRecordingSession::clear`] is called.
    ///
    /// Succeeds after an auto-stop too (the finished loop is collected);
    /// fails with [`CaptureError::NotRecording`] only when no session was
    /// ever started or it has already been stopped.
    pub fn stop_active_recording(&self) -> Result<(), CaptureError> {
        let handle = self.recording_loop.lock().unwrap().take();
        match handle {
            Some(handle) => {
                handle.shutdown();
                self.session.finish();
                log::info!(
                    "Active recording stopped ({} frames, {} ms)",
                    self.session.frame_count(),
                    self.session.duration_millis()
                );
                Ok(())
            }
            None => Err(CaptureError::NotRecording),
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    pub fn is_active_recording(&self) -> bool {
        self.session.is_recording()
    }

    pub fn active_recording_duration(&self) -> Duration {
        Duration::from_millis(self.session.duration_millis())
    }

    /// Point-in-time copy of the rolling buffer for export.
    pub fn buffer_snapshot(&self) -> Vec<crate::capture::types::Frame> {
        self.rolling.snapshot()
    }

    pub fn session(&self) -> Arc<ActiveRecordingSession> {
        Arc::clone(&self.session)
    }
}

impl Drop for CaptureScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn frame_interval(fps: u32) -> Duration {
    Duration::from_millis(1000 / u64::from(fps.max(1)))
}

fn rolling_loop(
    source: &dyn FrameSource,
    buffer: &RollingBuffer,
    token: &CancelToken,
    timing: &SchedulerTiming,
) {
    let interval = frame_interval(timing.capture_fps);

    while !token.is_cancelled() {
        let start = Instant::now();

        match source.grab(ROLLING_SCALE) {
            Ok(frame) => {
                if !token.sleep(timing.grab_settle) {
                    break;
                }
                buffer.push(frame);
            }
            // Transient grab failures must not kill the loop.
            Err(e) => log::warn!("Rolling capture iteration failed: {}", e),
        }

        if !token.sleep(interval.saturating_sub(start.elapsed())) {
            break;
        }
    }
    log::debug!("Rolling capture loop exited");
}

fn recording_loop(
    source: &dyn FrameSource,
    session: &ActiveRecordingSession,
    token: &CancelToken,
    timing: &SchedulerTiming,
) {
    let interval = frame_interval(timing.recording_fps);
    let max_millis = timing.max_recording.as_millis() as u64;

    while !token.is_cancelled() {
        // Absolute time ceiling, independent of user action. Count trimming
        // inside `session.push` is the finer-grained valve.
        if session.duration_millis() >= max_millis {
            log::info!("Active recording reached its duration ceiling, auto-stopping");
            break;
        }

        let start = Instant::now();
        match source.grab(RECORDING_SCALE) {
            Ok(frame) => session.push(frame),
            Err(e) => log::warn!("Active recording iteration failed: {}", e),
        }

        if !token.sleep(interval.saturating_sub(start.elapsed())) {
            break;
        }
    }

    session.finish();
    log::debug!("Active recording loop exited");
}

#[cfg(unix)]
fn lower_thread_priority() {
    // Background capture must not compete with foreground work.
    let rc = unsafe { libc::nice(10) };
    if rc == -1 {
        log::debug!("Could not lower rolling capture thread priority");
    }
}

#[cfg(not(unix))]
fn lower_thread_priority() {}
