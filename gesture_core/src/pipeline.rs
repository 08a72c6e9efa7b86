//! Per-frame pipeline driver.
//!
//! One [`PipelineDriver::tick`] per display refresh:
//!
//! 1. ask the source for its current frame stamp; skip if it has not moved;
//! 2. classify the landmarks;
//! 3. push the raw gesture through the stabilizer;
//! 4. update the cursor from the wrist (hand present) or hold it and report
//!    `None` (hand absent, presence beats history);
//! 5. let the mode controller decide on a transition;
//! 6. publish a [`HandState`].
//!
//! The driver holds no reference to application state.  The caller passes in
//! the current [`AppMode`] and gets the new one back in the [`Tick`].
//!
//! [`Pipeline`] wraps the driver with the source lifecycle and a
//! [`StopHandle`], which is what an application loop actually polls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::classifier::{classify, Gesture};
use crate::config::PipelineConfig;
use crate::cursor::{Cursor, CursorSmoother};
use crate::error::SourceError;
use crate::mode::{AppMode, ModeController, ModeTransition};
use crate::source::{FrameStamp, LandmarkSource, SourceLifecycle, SourceStatus};
use crate::stabilizer::TemporalStabilizer;

// ════════════════════════════════════════════════════════════════════════════
// Published output
// ════════════════════════════════════════════════════════════════════════════

/// Latest snapshot for the renderer and UI.  Overwritten every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandState {
    pub gesture:      Gesture,
    pub cursor:       Cursor,
    pub timestamp_ms: u64,
}

impl Default for HandState {
    fn default() -> Self {
        HandState { gesture: Gesture::None, cursor: Cursor::CENTRE, timestamp_ms: 0 }
    }
}

/// Everything one processed frame produced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    pub hand:       HandState,
    /// Mode after this tick.
    pub mode:       AppMode,
    /// Unstabilized classifier output for this frame.
    pub raw:        Gesture,
    pub hand_seen:  bool,
    pub transition: Option<ModeTransition>,
    pub frame:      FrameStamp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The source has no frame yet.
    NoFrame,
    /// Same upstream frame as the previous tick.
    Duplicate,
    /// Stop was requested while detection ran; its result was dropped.
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickOutcome {
    /// Source not ready, failed, or pipeline stopped.  Nothing ran.
    Idle,
    Skipped(SkipReason),
    Published(Tick),
}

impl TickOutcome {
    pub fn tick(&self) -> Option<&Tick> {
        match self {
            TickOutcome::Published(t) => Some(t),
            _ => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// StopHandle
// ════════════════════════════════════════════════════════════════════════════

/// Cloneable stop request, settable from any thread.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PipelineDriver
// ════════════════════════════════════════════════════════════════════════════

pub struct PipelineDriver {
    stabilizer: TemporalStabilizer,
    cursor:     CursorSmoother,
    modes:      ModeController,
    last_frame: Option<FrameStamp>,
    published:  HandState,
}

impl PipelineDriver {
    pub fn new(config: &PipelineConfig) -> Self {
        PipelineDriver {
            stabilizer: TemporalStabilizer::new(config.history_capacity),
            cursor:     CursorSmoother::new(config.cursor),
            modes:      ModeController::new(config.cooldown_ms),
            last_frame: None,
            published:  HandState::default(),
        }
    }

    /// Run one frame against `source`, starting from `mode`.
    pub fn tick<S: LandmarkSource + ?Sized>(&mut self, source: &mut S, mode: AppMode, now_ms: u64) -> TickOutcome {
        self.tick_until(source, mode, now_ms, || false)
    }

    /// As [`tick`](Self::tick), dropping the result if `stopped()` turns true
    /// while the source is detecting.
    pub fn tick_until<S: LandmarkSource + ?Sized>(
        &mut self,
        source:  &mut S,
        mode:    AppMode,
        now_ms:  u64,
        stopped: impl Fn() -> bool,
    ) -> TickOutcome {
        let frame = match source.current_frame(now_ms) {
            Some(f) => f,
            None    => return TickOutcome::Skipped(SkipReason::NoFrame),
        };
        if self.last_frame.map_or(false, |last| frame <= last) {
            log::trace!("frame {:?} already processed", frame);
            return TickOutcome::Skipped(SkipReason::Duplicate);
        }

        let landmarks = source.detect(now_ms);
        if stopped() {
            return TickOutcome::Skipped(SkipReason::Stopped);
        }
        self.last_frame = Some(frame);

        let raw = classify(landmarks.as_ref());
        let voted = self.stabilizer.push(raw);

        let (gesture, cursor) = match &landmarks {
            Some(hand) => (voted, self.cursor.update(hand.wrist())),
            None       => (Gesture::None, self.cursor.position()),
        };

        let transition = self.modes.evaluate(mode, gesture, now_ms);
        let mode = transition.map_or(mode, |t| t.to);

        self.published = HandState { gesture, cursor, timestamp_ms: now_ms };
        TickOutcome::Published(Tick {
            hand: self.published,
            mode,
            raw,
            hand_seen: landmarks.is_some(),
            transition,
            frame,
        })
    }

    /// Last published snapshot.
    pub fn hand_state(&self) -> HandState { self.published }

    pub fn stabilizer(&self) -> &TemporalStabilizer { &self.stabilizer }

    pub fn modes(&self) -> &ModeController { &self.modes }
}

// ════════════════════════════════════════════════════════════════════════════
// Pipeline: lifecycle + driver + stop
// ════════════════════════════════════════════════════════════════════════════

/// What the UI should say about hand tracking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PipelineStatus {
    Starting { attempt: u32 },
    Running,
    /// Persistent: retries are exhausted or the camera was refused.
    Unavailable(SourceError),
    Stopped,
}

pub struct Pipeline<S: LandmarkSource> {
    lifecycle: SourceLifecycle<S>,
    driver:    PipelineDriver,
    stop:      StopHandle,
    stopped:   bool,
}

impl<S: LandmarkSource> Pipeline<S> {
    pub fn new(source: S, config: &PipelineConfig) -> Self {
        Pipeline {
            lifecycle: SourceLifecycle::new(source, config.retry),
            driver:    PipelineDriver::new(config),
            stop:      StopHandle::default(),
            stopped:   false,
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn status(&self) -> PipelineStatus {
        if self.stopped {
            return PipelineStatus::Stopped;
        }
        match self.lifecycle.status() {
            SourceStatus::Uninitialized           => PipelineStatus::Starting { attempt: 0 },
            SourceStatus::Initializing { attempt } => PipelineStatus::Starting { attempt },
            SourceStatus::Ready                   => PipelineStatus::Running,
            SourceStatus::Failed(e)               => PipelineStatus::Unavailable(e),
            SourceStatus::Released                => PipelineStatus::Stopped,
        }
    }

    /// One render-loop step: make progress on start-up, then tick if ready.
    pub fn poll(&mut self, mode: AppMode, now_ms: u64) -> TickOutcome {
        if self.stop.is_stopped() {
            self.stop();
        }
        if self.stopped {
            return TickOutcome::Idle;
        }
        if self.lifecycle.ensure_ready() != SourceStatus::Ready {
            return TickOutcome::Idle;
        }
        let stop = self.stop.clone();
        let outcome = match self.lifecycle.source_mut() {
            Some(source) => self.driver.tick_until(source, mode, now_ms, || stop.is_stopped()),
            None         => TickOutcome::Idle,
        };
        if self.stop.is_stopped() {
            self.stop();
        }
        outcome
    }

    /// Block until the source has finished starting.  Headless use only.
    pub fn wait_ready(&mut self) -> PipelineStatus {
        if !self.stopped {
            self.lifecycle.wait_ready();
        }
        self.status()
    }

    /// Stop ticking and release the source.  Idempotent.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.stop.stop();
        self.lifecycle.release();
        log::info!("hand pipeline stopped");
    }

    pub fn driver(&self) -> &PipelineDriver { &self.driver }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
