//! Frame store for on-demand active recording sessions.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::capture::types::Frame;

#[derive(Default)]
struct SessionInner {
    frames: Vec<Frame>,
    started_at: Option<Instant>,
    ended_at: Option<Instant>,
    generation: u64,
}

/// Time-and-count-bounded accumulating frame store for active recording.
///
/// The frame count is capped at `max_frames`; when a push exceeds the cap,
/// a full second's worth of oldest frames (`trim_chunk`) is dropped in one
/// batch. The session never clears itself after an export: a failed export
/// can be retried against the same frames, and the caller invokes
/// [`clear`](Self::clear) once the export succeeded.
pub struct ActiveRecordingSession {
    max_frames: usize,
    trim_chunk: usize,
    recording: AtomicBool,
    inner: Mutex<SessionInner>,
}

impl ActiveRecordingSession {
    /// `max_frames` = max minutes × 60 × fps; `trim_chunk` = fps.
    pub fn new(max_frames: usize, trim_chunk: usize) -> Self {
        Self {
            max_frames: max_frames.max(1),
            trim_chunk: trim_chunk.max(1),
            recording: AtomicBool::new(false),
            inner: Mutex::new(SessionInner::default()),
        }
    }

    /// Reset the frame store and mark the session running. Any frames left
    /// over from a previous session are discarded.
    pub fn begin(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.frames.clear();
        inner.started_at = Some(Instant::now());
        inner.ended_at = None;
        inner.generation += 1;
        self.recording.store(true, Ordering::SeqCst);
    }

    /// Mark the session stopped. Frames stay available for export.
    pub fn finish(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.ended_at.is_none() {
            inner.ended_at = Some(Instant::now());
        }
        self.recording.store(false, Ordering::SeqCst);
    }

    /// Append a frame, batch-trimming the oldest frames if the count cap is
    /// exceeded.
    pub fn push(&self, frame: Frame) {
        let mut inner = self.inner.lock().unwrap();
        inner.frames.push(frame);
        if inner.frames.len() > self.max_frames {
            let excess = self.trim_chunk.min(inner.frames.len());
            inner.frames.drain(0..excess);
            log::warn!(
                "Recording frame cap reached, dropped {} oldest frames",
                excess
            );
        }
    }

    /// Point-in-time ordered copy of the recorded frames, oldest first.
    pub fn snapshot(&self) -> Vec<Frame> {
        self.inner.lock().unwrap().frames.clone()
    }

    /// Release frame memory. Called after a successful export.
    pub fn clear(&self) {
        self.inner.lock().unwrap().frames.clear();
    }

    /// Identifier of the current session; bumped by every
    /// [`begin`](Self::begin).
    pub fn generation(&self) -> u64 {
        self.inner.lock().unwrap().generation
    }

    /// Release frame memory only if `generation` still identifies the
    /// current session. A slow export must not clear frames recorded by a
    /// session that started after its snapshot was taken. Returns whether
    /// the frames were cleared.
    pub fn clear_if(&self, generation: u64) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.generation == generation {
            inner.frames.clear();
            true
        } else {
            false
        }
    }

    pub fn frame_count(&self) -> usize {
        self.inner.lock().unwrap().frames.len()
    }

    /// Elapsed recording time in milliseconds: now − start while running,
    /// frozen once the session finishes. Zero if never started.
    pub fn duration_millis(&self) -> u64 {
        let inner = self.inner.lock().unwrap();
        match inner.started_at {
            Some(start) => {
                let end = inner.ended_at.unwrap_or_else(Instant::now);
                end.duration_since(start).as_millis() as u64
            }
            None => 0,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::time::Duration;

    fn frame_with_tag(tag: u8) -> Frame {
        Frame::from_pixel(2, 2, Rgb([tag, 0, 0]))
    }

    #[test]
    fn push_trims_a_full_second_of_oldest_frames() {
        // 1 minute at 10 FPS.
        let session = ActiveRecordingSession::new(600, 10);
        session.begin();
        for i in 0..=600 {
            session.push(frame_with_tag((i % 250) as u8));
        }

        // The 601st push trips the cap and drops one chunk of 10.
        assert_eq!(session.frame_count(), 591);
        assert!(session.frame_count() <= 600);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.first().map(|f| f.get_pixel(0, 0).0[0]), Some(10));
    }

    #[test]
    fn begin_resets_previous_frames() {
        let session = ActiveRecordingSession::new(100, 5);
        session.begin();
        session.push(frame_with_tag(1));
        session.finish();

        session.begin();
        assert_eq!(session.frame_count(), 0);
        assert!(session.is_recording());
    }

    #[test]
    fn finish_keeps_frames_until_cleared() {
        let session = ActiveRecordingSession::new(100, 5);
        session.begin();
        session.push(frame_with_tag(7));
        session.finish();

        assert!(!session.is_recording());
        assert_eq!(session.frame_count(), 1);

        session.clear();
        assert_eq!(session.frame_count(), 0);
    }

    #[test]
    fn stale_generation_cannot_clear_a_newer_session() {
        let session = ActiveRecordingSession::new(100, 5);
        session.begin();
        session.push(frame_with_tag(1));
        session.finish();
        let old = session.generation();

        session.begin();
        session.push(frame_with_tag(2));

        assert!(!session.clear_if(old));
        assert_eq!(session.frame_count(), 1);

        assert!(session.clear_if(session.generation()));
        assert_eq!(session.frame_count(), 0);
    }

    #[test]
    fn duration_freezes_at_finish() {
        let session = ActiveRecordingSession::new(100, 5);
        assert_eq!(session.duration_millis(), 0);

        session.begin();
        std::thread::sleep(Duration::from_millis(30));
        session.finish();

        let frozen = session.duration_millis();
        assert!(frozen >= 30);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(session.duration_millis(), frozen);
    }
}
