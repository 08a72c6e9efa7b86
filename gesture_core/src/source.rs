//! Landmark sources and their start-up lifecycle.
//!
//! A [`LandmarkSource`] wraps whatever produces hand landmarks: a camera plus
//! inference model, a detector subprocess, LeapMotion hardware, a keyboard
//! simulator or a scripted replay.  The pipeline never needs to know which.
//!
//! Loading a model can take seconds, so [`SourceLifecycle`] runs
//! `initialize()` on its own thread with linear-backoff retries while the
//! render loop keeps polling [`SourceLifecycle::ensure_ready`].

use std::sync::mpsc::{self, Receiver, SendError, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::RetryPolicy;
use crate::error::SourceError;
use crate::landmark::HandFrame;

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Identity of one upstream video frame (a counter or a capture timestamp).
/// Only ordering matters: a tick runs when the stamp has moved on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameStamp(pub u64);

/// Anything that can deliver per-frame hand landmarks.
///
/// Calls are never concurrent: the lifecycle owns the source on its init
/// thread, then hands it to the driver, which calls one method at a time.
pub trait LandmarkSource: Send + 'static {
    /// Acquire the camera and load the model.  Called again on retryable
    /// failures, so it must be safe to repeat.
    fn initialize(&mut self) -> Result<(), SourceError>;

    /// The frame currently available upstream, or `None` while the video has
    /// no frame yet (zero dimensions, stream not started).
    fn current_frame(&mut self, now_ms: u64) -> Option<FrameStamp>;

    /// Landmarks for the current frame, `None` if no hand is in view.
    fn detect(&mut self, now_ms: u64) -> Option<HandFrame>;

    /// Give back the camera / child process.  Default: nothing to release.
    fn release(&mut self) {}
}

impl<S: LandmarkSource + ?Sized> LandmarkSource for Box<S> {
    fn initialize(&mut self) -> Result<(), SourceError> { (**self).initialize() }
    fn current_frame(&mut self, now_ms: u64) -> Option<FrameStamp> { (**self).current_frame(now_ms) }
    fn detect(&mut self, now_ms: u64) -> Option<HandFrame> { (**self).detect(now_ms) }
    fn release(&mut self) { (**self).release() }
}

// ════════════════════════════════════════════════════════════════════════════
// initialize_with_retry
// ════════════════════════════════════════════════════════════════════════════

/// Progress messages from the init thread.
enum InitReport<S> {
    Attempt(u32),
    Ready(S),
    Failed(SourceError),
}

/// Longest single sleep while backing off, so a cancel is noticed promptly.
const BACKOFF_SLICE: Duration = Duration::from_millis(25);

/// Run `initialize()` until it succeeds, fails for good, runs out of
/// retries, or `cancelled()` turns true.  `on_attempt` sees the 1-based
/// attempt number before each try.  Cancellation is checked before every
/// attempt and throughout the backoff, and reports [`SourceError::Abandoned`].
pub fn initialize_with_retry<S: LandmarkSource>(
    source: &mut S,
    policy: RetryPolicy,
    cancelled: impl Fn() -> bool,
    mut on_attempt: impl FnMut(u32),
) -> Result<(), SourceError> {
    let mut attempt = 1;
    loop {
        if cancelled() {
            log::debug!("landmark source start-up cancelled before attempt {}", attempt);
            return Err(SourceError::Abandoned);
        }
        on_attempt(attempt);
        let err = match source.initialize() {
            Ok(())   => return Ok(()),
            Err(e)   => e,
        };
        if !err.is_retryable() {
            log::error!("landmark source failed: {}", err);
            return Err(err);
        }
        if attempt >= policy.total_attempts() {
            log::error!("landmark source failed {} times, giving up: {}", attempt, err);
            return Err(SourceError::Exhausted { attempts: attempt, last: Box::new(err) });
        }
        let delay = policy.delay_before(attempt);
        log::warn!("landmark source attempt {} failed: {}; retrying in {:?}", attempt, err, delay);
        let deadline = Instant::now() + delay;
        while !cancelled() {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() { break; }
            thread::sleep(left.min(BACKOFF_SLICE));
        }
        attempt += 1;
    }
}

/// Set once the lifecycle is released.  The init thread holds the lock
/// while it hands the source over, so a release either finds the source in
/// the channel or the thread sees the flag and releases it itself.
#[derive(Clone, Default)]
struct Closed(Arc<Mutex<bool>>);

impl Closed {
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_set(&self) -> bool {
        *self.lock()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SourceLifecycle
// ════════════════════════════════════════════════════════════════════════════

/// Externally visible lifecycle state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceStatus {
    Uninitialized,
    Initializing { attempt: u32 },
    Ready,
    Failed(SourceError),
    Released,
}

enum Stage<S> {
    Uninitialized(S),
    Initializing { rx: Receiver<InitReport<S>>, attempt: u32 },
    Ready(S),
    Failed(SourceError),
    Released,
}

/// Owns a source from construction to release.
///
/// [`ensure_ready`](Self::ensure_ready) is idempotent: the first call starts
/// one background initialization, later calls only collect its progress, so
/// every caller observes the same outcome.
pub struct SourceLifecycle<S: LandmarkSource> {
    stage:  Stage<S>,
    policy: RetryPolicy,
    closed: Closed,
}

impl<S: LandmarkSource> SourceLifecycle<S> {
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        SourceLifecycle { stage: Stage::Uninitialized(source), policy, closed: Closed::default() }
    }

    pub fn status(&self) -> SourceStatus {
        match &self.stage {
            Stage::Uninitialized(_)            => SourceStatus::Uninitialized,
            Stage::Initializing { attempt, .. } => SourceStatus::Initializing { attempt: *attempt },
            Stage::Ready(_)                    => SourceStatus::Ready,
            Stage::Failed(e)                   => SourceStatus::Failed(e.clone()),
            Stage::Released                    => SourceStatus::Released,
        }
    }

    /// Start initialization if needed and collect any finished result.
    /// Never blocks.
    pub fn ensure_ready(&mut self) -> SourceStatus {
        self.advance(|rx| match rx.try_recv() {
            Ok(r)                           => Some(r),
            Err(TryRecvError::Empty)        => None,
            Err(TryRecvError::Disconnected) => Some(InitReport::Failed(SourceError::Abandoned)),
        });
        self.status()
    }

    /// Like [`ensure_ready`](Self::ensure_ready) but waits for the outcome.
    /// For headless runs and tests.
    pub fn wait_ready(&mut self) -> SourceStatus {
        loop {
            self.advance(|rx| Some(rx.recv().unwrap_or(InitReport::Failed(SourceError::Abandoned))));
            match self.stage {
                Stage::Initializing { .. } => continue,
                _ => return self.status(),
            }
        }
    }

    fn advance(&mut self, mut next: impl FnMut(&Receiver<InitReport<S>>) -> Option<InitReport<S>>) {
        if let Stage::Uninitialized(_) = self.stage {
            if let Stage::Uninitialized(source) = std::mem::replace(&mut self.stage, Stage::Released) {
                self.stage = self.spawn(source);
            }
        }

        while let Stage::Initializing { rx, attempt } = &mut self.stage {
            match next(rx) {
                None                          => return,
                Some(InitReport::Attempt(n))  => *attempt = n,
                Some(InitReport::Ready(s))    => {
                    log::info!("landmark source ready");
                    self.stage = Stage::Ready(s);
                }
                Some(InitReport::Failed(e))   => self.stage = Stage::Failed(e),
            }
        }
    }

    fn spawn(&self, mut source: S) -> Stage<S> {
        let (tx, rx) = mpsc::channel();
        let policy = self.policy;
        let closed = self.closed.clone();
        thread::spawn(move || {
            let progress = tx.clone();
            let result = initialize_with_retry(
                &mut source,
                policy,
                || closed.is_set(),
                |n| { let _ = progress.send(InitReport::Attempt(n)); },
            );

            let released = closed.lock();
            if *released {
                log::debug!("landmark source start-up finished after release");
                source.release();
                return;
            }
            let report = match result {
                Ok(())  => InitReport::Ready(source),
                Err(e)  => {
                    source.release();
                    InitReport::Failed(e)
                }
            };
            if let Err(SendError(InitReport::Ready(mut orphan))) = tx.send(report) {
                orphan.release();
            }
            drop(released);
        });
        Stage::Initializing { rx, attempt: 0 }
    }

    /// The ready source, if initialization has finished successfully.
    pub fn source_mut(&mut self) -> Option<&mut S> {
        match &mut self.stage {
            Stage::Ready(s) => Some(s),
            _ => None,
        }
    }

    /// Release the source.  An initialization still in flight stops
    /// retrying, and whatever it produces is released on its thread.
    pub fn release(&mut self) {
        let mut closed = self.closed.lock();
        *closed = true;
        match std::mem::replace(&mut self.stage, Stage::Released) {
            Stage::Ready(mut s) | Stage::Uninitialized(mut s) => s.release(),
            Stage::Initializing { rx, .. } => {
                while let Ok(report) = rx.try_recv() {
                    if let InitReport::Ready(mut s) = report {
                        s.release();
                    }
                }
            }
            _ => {}
        }
        drop(closed);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
