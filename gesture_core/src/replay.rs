//! Scripted landmark source.
//!
//! Plays back a fixed list of frames, one per upstream frame stamp.  Used
//! for headless runs and the pipeline tests; it can also pretend to fail
//! initialization a few times, or be denied the camera.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::SourceError;
use crate::landmark::HandFrame;
use crate::source::{FrameStamp, LandmarkSource};

pub struct ReplaySource {
    frames:        Vec<Option<HandFrame>>,
    cursor:        usize,
    /// Frames handed out so far; doubles as the monotonic frame stamp.
    served:        u64,
    /// Step to the next frame after every `detect` (default) instead of
    /// holding still until [`advance`](Self::advance) is called.
    auto_advance:  bool,
    loop_frames:   bool,
    failures_left: u32,
    camera_denied: bool,
    init_delay:    Duration,
    init_calls:    Arc<AtomicUsize>,
    releases:      Arc<AtomicUsize>,
}

impl ReplaySource {
    pub fn new(frames: Vec<Option<HandFrame>>) -> Self {
        ReplaySource {
            frames,
            cursor:        0,
            served:        0,
            auto_advance:  true,
            loop_frames:   false,
            failures_left: 0,
            camera_denied: false,
            init_delay:    Duration::ZERO,
            init_calls:    Arc::new(AtomicUsize::new(0)),
            releases:      Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail `n` initialization attempts with a retryable model-load error.
    pub fn with_failures(mut self, n: u32) -> Self {
        self.failures_left = n;
        self
    }

    pub fn with_camera_denied(mut self) -> Self {
        self.camera_denied = true;
        self
    }

    /// Make every initialization attempt take `ms` milliseconds, like a
    /// model download.
    pub fn with_init_delay(mut self, ms: u64) -> Self {
        self.init_delay = Duration::from_millis(ms);
        self
    }

    /// Start over from the first frame after the last one.
    pub fn looping(mut self) -> Self {
        self.loop_frames = true;
        self
    }

    /// Only move to the next frame when [`advance`](Self::advance) is called;
    /// in between every tick sees the same stamp.
    pub fn manual(mut self) -> Self {
        self.auto_advance = false;
        self
    }

    /// Move a manual replay on to its next frame.
    pub fn advance(&mut self) {
        self.step();
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn init_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.init_calls)
    }

    pub fn release_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.releases)
    }

    /// Index of the frame the next `detect` returns.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// True once a non-looping replay has played every frame.
    pub fn finished(&self) -> bool {
        self.cursor >= self.frames.len()
    }

    fn step(&mut self) {
        self.served += 1;
        self.cursor += 1;
        if self.loop_frames && self.cursor >= self.frames.len() {
            self.cursor = 0;
        }
    }
}

impl LandmarkSource for ReplaySource {
    fn initialize(&mut self) -> Result<(), SourceError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if !self.init_delay.is_zero() {
            thread::sleep(self.init_delay);
        }
        if self.camera_denied {
            return Err(SourceError::CameraUnavailable("permission denied".into()));
        }
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(SourceError::ModelLoad("replay: simulated load failure".into()));
        }
        Ok(())
    }

    fn current_frame(&mut self, _now_ms: u64) -> Option<FrameStamp> {
        if self.cursor >= self.frames.len() {
            return None;
        }
        Some(FrameStamp(self.served))
    }

    fn detect(&mut self, _now_ms: u64) -> Option<HandFrame> {
        let frame = self.frames.get(self.cursor).cloned().flatten();
        if self.auto_advance {
            self.step();
        }
        frame
    }

    fn release(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{self, Pose};

    fn fist() -> Option<HandFrame> {
        Some(pose::frame(Pose::ClosedFist, 0.5, 0.6, 0.1))
    }

    #[test]
    fn auto_replay_stamps_increase() {
        let mut r = ReplaySource::new(vec![fist(), None]);
        assert_eq!(r.current_frame(0), Some(FrameStamp(0)));
        assert!(r.detect(0).is_some());
        assert_eq!(r.current_frame(0), Some(FrameStamp(1)));
        assert!(r.detect(0).is_none());
        assert_eq!(r.current_frame(0), None);
        assert!(r.finished());
    }

    #[test]
    fn manual_replay_holds_stamp() {
        let mut r = ReplaySource::new(vec![fist(), fist()]).manual();
        assert_eq!(r.current_frame(0), Some(FrameStamp(0)));
        r.detect(0);
        assert_eq!(r.current_frame(16), Some(FrameStamp(0)));
        r.advance();
        assert_eq!(r.current_frame(33), Some(FrameStamp(1)));
    }

    #[test]
    fn looping_replay_keeps_stamps_monotonic() {
        let mut r = ReplaySource::new(vec![fist()]).looping();
        let mut last = None;
        for _ in 0..5 {
            let stamp = r.current_frame(0);
            assert!(stamp > last);
            last = stamp;
            r.detect(0);
        }
    }
}
