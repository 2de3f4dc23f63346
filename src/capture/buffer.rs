//! Bounded FIFO frame storage for the rolling capture loop.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::capture::types::Frame;

/// Fixed-capacity circular buffer of the most recent frames.
///
/// Shared between one producer (the rolling-capture loop) and one consumer
/// (export snapshots); all mutation goes through the internal lock, so no
/// caller can touch the contents directly.
pub struct RollingBuffer {
    capacity: usize,
    frames: Mutex<VecDeque<Frame>>,
}

impl RollingBuffer {
    /// Create a buffer retaining at most `capacity` frames.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            frames: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Insert a frame, evicting exactly one oldest frame if at capacity.
    pub fn push(&self, frame: Frame) {
        let mut frames = self.frames.lock().unwrap();
        if frames.len() == self.capacity {
            frames.pop_front();
        }
        frames.push_back(frame);
    }

    /// Point-in-time ordered copy of the buffer contents, oldest first.
    ///
    /// An empty result is a valid outcome (nothing captured yet); callers
    /// must handle it. The copy decouples encoding from concurrent pushes.
    pub fn snapshot(&self) -> Vec<Frame> {
        let frames = self.frames.lock().unwrap();
        frames.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn frame_with_tag(tag: u8) -> Frame {
        Frame::from_pixel(2, 2, Rgb([tag, 0, 0]))
    }

    fn tag_of(frame: &Frame) -> u8 {
        frame.get_pixel(0, 0).0[0]
    }

    #[test]
    fn size_never_exceeds_capacity() {
        let buffer = RollingBuffer::new(4);
        for i in 0..50 {
            buffer.push(frame_with_tag(i));
            assert!(buffer.len() <= 4);
        }
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn overflow_retains_most_recent_frames_in_order() {
        // Buffer sized for 10 seconds at 2 FPS.
        let buffer = RollingBuffer::new(20);
        for i in 0..25 {
            buffer.push(frame_with_tag(i));
        }

        let snapshot = buffer.snapshot();
        assert_eq!(snapshot.len(), 20);
        let tags: Vec<u8> = snapshot.iter().map(tag_of).collect();
        let expected: Vec<u8> = (5..25).collect();
        assert_eq!(tags, expected);
    }

    #[test]
    fn snapshot_does_not_mutate_the_buffer() {
        let buffer = RollingBuffer::new(8);
        for i in 0..3 {
            buffer.push(frame_with_tag(i));
        }

        let first = buffer.snapshot();
        let second = buffer.snapshot();
        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 3);
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn snapshot_of_empty_buffer_is_empty() {
        let buffer = RollingBuffer::new(5);
        assert!(buffer.snapshot().is_empty());
        assert!(buffer.is_empty());
    }
}
