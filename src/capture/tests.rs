use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use image::Rgb;

use super::grabber::FrameSource;
use super::scheduler::{CaptureScheduler, SchedulerTiming};
use super::types::{CaptureError, Frame};

/// Synthetic frame source: returns a solid-color frame and counts grabs.
struct MockSource {
    grabs: AtomicUsize,
    fail: bool,
}

impl MockSource {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            grabs: AtomicUsize::new(0),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            grabs: AtomicUsize::new(0),
            fail: true,
        })
    }

    fn grab_count(&self) -> usize {
        self.grabs.load(Ordering::SeqCst)
    }
}

impl FrameSource for MockSource {
    fn grab(&self, _scale: f32) -> Result<Frame, CaptureError> {
        let n = self.grabs.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CaptureError::CaptureFailed("mock failure".into()));
        }
        Ok(Frame::from_pixel(4, 4, Rgb([(n % 250) as u8, 0, 0])))
    }
}

/// Timing tuned for tests: millisecond-scale intervals and ceilings.
fn fast_timing() -> SchedulerTiming {
    SchedulerTiming {
        capture_fps: 100,
        recording_fps: 100,
        rolling_capacity: 20,
        max_recording: Duration::from_secs(60),
        max_recording_frames: 1000,
        grab_settle: Duration::from_millis(0),
    }
}

fn scheduler_with(source: Arc<MockSource>, timing: SchedulerTiming) -> CaptureScheduler {
    CaptureScheduler::with_timing(source, timing)
}

#[test]
fn start_is_idempotent() {
    let source = MockSource::new();
    let scheduler = scheduler_with(source.clone(), fast_timing());

    scheduler.start().unwrap();
    scheduler.start().unwrap();
    assert!(scheduler.is_capturing());

    std::thread::sleep(Duration::from_millis(80));
    scheduler.stop();

    // One loop at ~100 FPS for ~80ms cannot have grabbed a doubled frame
    // count; a second live loop would roughly double it.
    let grabs = source.grab_count();
    assert!(grabs >= 2, "expected some grabs, got {grabs}");
    assert!(grabs <= 20, "suspiciously many grabs ({grabs}), duplicate loop?");
}

#[test]
fn stop_is_idempotent_and_returns_to_idle() {
    let scheduler = scheduler_with(MockSource::new(), fast_timing());

    scheduler.start().unwrap();
    scheduler.stop();
    scheduler.stop();
    assert!(!scheduler.is_capturing());
    assert!(!scheduler.is_active_recording());
}

#[test]
fn rolling_loop_fills_the_buffer() {
    let source = MockSource::new();
    let scheduler = scheduler_with(source, fast_timing());

    scheduler.start().unwrap();
    std::thread::sleep(Duration::from_millis(100));
    scheduler.stop();

    let snapshot = scheduler.buffer_snapshot();
    assert!(!snapshot.is_empty());
    assert!(snapshot.len() <= 20);
}

#[test]
fn rolling_loop_survives_grab_failures() {
    let source = MockSource::failing();
    let scheduler = scheduler_with(source.clone(), fast_timing());

    scheduler.start().unwrap();
    std::thread::sleep(Duration::from_millis(80));

    // Still capturing, still iterating, despite every grab failing.
    assert!(scheduler.is_capturing());
    assert!(source.grab_count() >= 2);
    scheduler.stop();
    assert!(scheduler.buffer_snapshot().is_empty());
}

#[test]
fn recording_requires_rolling_capture() {
    let scheduler = scheduler_with(MockSource::new(), fast_timing());
    assert!(matches!(
        scheduler.start_active_recording(),
        Err(CaptureError::NotCapturing)
    ));
}

#[test]
fn double_start_recording_is_reported() {
    let scheduler = scheduler_with(MockSource::new(), fast_timing());
    scheduler.start().unwrap();
    scheduler.start_active_recording().unwrap();

    assert!(matches!(
        scheduler.start_active_recording(),
        Err(CaptureError::AlreadyRecording)
    ));

    scheduler.stop();
}

#[test]
fn stop_recording_without_session_is_reported() {
    let scheduler = scheduler_with(MockSource::new(), fast_timing());
    scheduler.start().unwrap();
    assert!(matches!(
        scheduler.stop_active_recording(),
        Err(CaptureError::NotRecording)
    ));
    scheduler.stop();
}

#[test]
fn stopping_rolling_capture_cascades_into_recording() {
    let scheduler = scheduler_with(MockSource::new(), fast_timing());
    scheduler.start().unwrap();
    scheduler.start_active_recording().unwrap();
    assert!(scheduler.is_active_recording());

    scheduler.stop();
    assert!(!scheduler.is_capturing());
    assert!(!scheduler.is_active_recording());
}

#[test]
fn recording_auto_stops_at_duration_ceiling() {
    let timing = SchedulerTiming {
        max_recording: Duration::from_millis(60),
        ..fast_timing()
    };
    let scheduler = scheduler_with(MockSource::new(), timing);
    scheduler.start().unwrap();
    scheduler.start_active_recording().unwrap();

    std::thread::sleep(Duration::from_millis(200));

    // The loop self-terminated without stop_active_recording being called.
    assert!(!scheduler.is_active_recording());
    let session = scheduler.session();
    assert!(session.frame_count() > 0);
    assert!(session.duration_millis() >= 60);

    // Explicit stop still succeeds afterwards: it collects the finished
    // loop and leaves the frames available for export.
    scheduler.stop_active_recording().unwrap();
    assert!(session.frame_count() > 0);

    scheduler.stop();
}

#[test]
fn recording_frames_survive_stop_until_cleared() {
    let scheduler = scheduler_with(MockSource::new(), fast_timing());
    scheduler.start().unwrap();
    scheduler.start_active_recording().unwrap();
    std::thread::sleep(Duration::from_millis(80));
    scheduler.stop_active_recording().unwrap();

    let session = scheduler.session();
    let exported = session.snapshot();
    assert!(!exported.is_empty());
    assert_eq!(session.frame_count(), exported.len());

    session.clear();
    assert_eq!(session.frame_count(), 0);

    scheduler.stop();
}

#[test]
fn restarting_a_recording_resets_the_session() {
    let scheduler = scheduler_with(MockSource::new(), fast_timing());
    scheduler.start().unwrap();

    scheduler.start_active_recording().unwrap();
    std::thread::sleep(Duration::from_millis(60));
    scheduler.stop_active_recording().unwrap();
    let first = scheduler.session().snapshot();
    assert!(!first.is_empty());
    let last_tag_of_first = first.last().unwrap().get_pixel(0, 0).0[0];

    scheduler.start_active_recording().unwrap();
    std::thread::sleep(Duration::from_millis(30));
    scheduler.stop_active_recording().unwrap();

    // Second session started from an empty store, not the leftovers: its
    // oldest frame was grabbed after everything in the first session.
    let second = scheduler.session().snapshot();
    assert!(!second.is_empty());
    assert!(second[0].get_pixel(0, 0).0[0] > last_tag_of_first);

    scheduler.stop();
}
