//! Landmark sources for the installation: keyboard/mouse simulation and
//! LeapMotion hardware.  The detector-subprocess source lives in
//! [`crate::detector`].
//!
//! The pipeline sees them all through [`LandmarkSource`]; it does not know
//! whether a frame came from a camera, the Leap or the simulator.

use std::sync::mpsc::Receiver;

use gesture_core::pose::{self, Pose};
use gesture_core::{FrameStamp, HandFrame, LandmarkSource, SourceError};

// ════════════════════════════════════════════════════════════════════════════
// SimInput: raw events from the preview window
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the simulation window.
#[derive(Clone, Debug, PartialEq)]
pub enum SimInput {
    KeyDown(SimKey),
    /// Mouse position in window-normalised coordinates (`[0, 1]²`).
    Pointer { x: f32, y: f32 },
}

/// Simulated key codes (mapped from minifb Key).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimKey {
    Pose(Pose),     // 1–6
    HideHand,       // 0
    ToggleNoise,    // J
}

// ════════════════════════════════════════════════════════════════════════════
// SimLandmarkSource: keyboard/mouse stand-in for a camera
// ════════════════════════════════════════════════════════════════════════════

/// Holds up a synthetic hand: the number keys pick the pose, the mouse moves
/// the wrist.
///
/// A virtual camera produces one frame every `frame_interval_ms`, so a
/// render loop running faster than that sees duplicate frames, the same as
/// with a real 30 fps webcam.
pub struct SimLandmarkSource {
    rx:                Receiver<SimInput>,
    pose:              Option<Pose>,
    wrist:             (f32, f32),
    scale:             f32,
    frame_interval_ms: u64,
    /// Every fifth frame shows a relaxed hand instead of the held pose.
    noise:             bool,
    flaky_starts:      u32,
    stamp:             u64,
}

impl SimLandmarkSource {
    pub fn new(rx: Receiver<SimInput>, frame_interval_ms: u64) -> Self {
        SimLandmarkSource {
            rx,
            pose:              None,
            wrist:             (0.5, 0.75),
            scale:             0.09,
            frame_interval_ms: frame_interval_ms.max(1),
            noise:             false,
            flaky_starts:      0,
            stamp:             0,
        }
    }

    /// Fail the first `n` initialization attempts, to watch the retry path.
    pub fn with_flaky_start(mut self, n: u32) -> Self {
        self.flaky_starts = n;
        self
    }

    fn apply(&mut self, input: SimInput) {
        match input {
            SimInput::KeyDown(SimKey::Pose(p))     => self.pose = Some(p),
            SimInput::KeyDown(SimKey::HideHand)    => self.pose = None,
            SimInput::KeyDown(SimKey::ToggleNoise) => self.noise = !self.noise,
            // The camera is mirrored: the model reports x flipped, and the
            // cursor smoother flips it back.
            SimInput::Pointer { x, y } => {
                self.wrist = (1.0 - x.clamp(0.0, 1.0), y.clamp(0.0, 1.0));
            }
        }
    }
}

impl LandmarkSource for SimLandmarkSource {
    fn initialize(&mut self) -> Result<(), SourceError> {
        if self.flaky_starts > 0 {
            self.flaky_starts -= 1;
            return Err(SourceError::ModelLoad("simulated model download stalled".into()));
        }
        Ok(())
    }

    fn current_frame(&mut self, now_ms: u64) -> Option<FrameStamp> {
        while let Ok(input) = self.rx.try_recv() {
            self.apply(input);
        }
        self.stamp = now_ms / self.frame_interval_ms;
        Some(FrameStamp(self.stamp))
    }

    fn detect(&mut self, _now_ms: u64) -> Option<HandFrame> {
        let held = self.pose?;
        let shown = if self.noise && self.stamp % 5 == 4 { Pose::Relaxed } else { held };
        Some(pose::frame(shown, self.wrist.0, self.wrist.1, self.scale))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapLandmarkSource: real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Landmarks from a LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
/// LeapC is polled on its own thread; each tracking event becomes one frame.
///
/// Leap digits map onto the 21-point layout as
/// `[proximal.prev, intermediate.prev, distal.prev, distal.next]` per finger,
/// with the wrist taken from the middle metacarpal's base.  Millimetres are
/// normalised over a 400 mm box centred above the device.
#[cfg(feature = "leap")]
pub struct LeapLandmarkSource {
    rx:     Option<Receiver<Option<HandFrame>>>,
    stop:   std::sync::Arc<std::sync::atomic::AtomicBool>,
    latest: Option<HandFrame>,
    frames: u64,
}

#[cfg(feature = "leap")]
impl LeapLandmarkSource {
    pub fn new() -> Self {
        LeapLandmarkSource {
            rx:     None,
            stop:   Default::default(),
            latest: None,
            frames: 0,
        }
    }
}

#[cfg(feature = "leap")]
impl LandmarkSource for LeapLandmarkSource {
    fn initialize(&mut self) -> Result<(), SourceError> {
        use std::sync::atomic::Ordering;
        use std::sync::mpsc;

        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), SourceError>>();
        let (frame_tx, frame_rx) = mpsc::channel();
        let stop = std::sync::Arc::clone(&self.stop);

        std::thread::spawn(move || {
            use leaprs::*;

            let mut connection = match Connection::create(ConnectionConfig::default()) {
                Ok(c)  => c,
                Err(e) => {
                    let _ = ready_tx.send(Err(SourceError::ModelLoad(format!("LeapC: {:?}", e))));
                    return;
                }
            };
            if let Err(e) = connection.open() {
                let _ = ready_tx.send(Err(SourceError::CameraUnavailable(format!("Leap device: {:?}", e))));
                return;
            }
            let _ = ready_tx.send(Ok(()));

            while !stop.load(Ordering::SeqCst) {
                let msg = match connection.poll(100) {
                    Ok(m)  => m,
                    Err(_) => continue,
                };
                if let Event::Tracking(frame) = msg.event() {
                    let hand = frame.hands().next().and_then(|h| leap_hand_frame(&h));
                    if frame_tx.send(hand).is_err() { return; }
                }
            }
        });

        ready_rx
            .recv()
            .unwrap_or_else(|_| Err(SourceError::ModelLoad("LeapC thread exited".into())))?;
        self.rx = Some(frame_rx);
        Ok(())
    }

    fn current_frame(&mut self, _now_ms: u64) -> Option<FrameStamp> {
        if let Some(rx) = &self.rx {
            while let Ok(hand) = rx.try_recv() {
                self.latest = hand;
                self.frames += 1;
            }
        }
        (self.frames > 0).then(|| FrameStamp(self.frames))
    }

    fn detect(&mut self, _now_ms: u64) -> Option<HandFrame> {
        self.latest.clone()
    }

    fn release(&mut self) {
        self.stop.store(true, std::sync::atomic::Ordering::SeqCst);
        self.rx = None;
    }
}

#[cfg(feature = "leap")]
impl Drop for LeapLandmarkSource {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(feature = "leap")]
fn leap_hand_frame(hand: &leaprs::Hand) -> Option<HandFrame> {
    use gesture_core::Landmark;

    const BOX_MM: f32 = 400.0;
    const FLOOR_MM: f32 = 100.0;

    let norm = |x: f32, y: f32, z: f32| {
        let nx = (x + BOX_MM / 2.0) / BOX_MM;
        let ny = 1.0 - (y - FLOOR_MM) / BOX_MM;
        // front-camera convention: report x mirrored
        Landmark::new(1.0 - nx, ny, z / BOX_MM)
    };
    macro_rules! joint {
        ($v:expr) => {{ let v = $v; norm(v.x, v.y, v.z) }};
    }

    let digits: Vec<_> = hand.digits().collect();
    if digits.len() < 5 { return None; }

    let mut pts = Vec::with_capacity(21);
    pts.push(joint!(digits[2].metacarpal().prev_joint()));
    for d in &digits {
        pts.push(joint!(d.proximal().prev_joint()));
        pts.push(joint!(d.intermediate().prev_joint()));
        pts.push(joint!(d.distal().prev_joint()));
        pts.push(joint!(d.distal().next_joint()));
    }
    HandFrame::from_slice(&pts)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use gesture_core::{classify, Gesture};
    use std::sync::mpsc;

    #[test]
    fn no_hand_until_a_pose_key() {
        let (_tx, rx) = mpsc::channel();
        let mut s = SimLandmarkSource::new(rx, 33);
        s.current_frame(0);
        assert!(s.detect(0).is_none());
    }

    #[test]
    fn pose_key_shows_that_gesture() {
        let (tx, rx) = mpsc::channel();
        let mut s = SimLandmarkSource::new(rx, 33);
        tx.send(SimInput::KeyDown(SimKey::Pose(Pose::Victory))).unwrap();
        s.current_frame(0);
        assert_eq!(classify(s.detect(0).as_ref()), Gesture::Victory);

        tx.send(SimInput::KeyDown(SimKey::HideHand)).unwrap();
        s.current_frame(40);
        assert!(s.detect(40).is_none());
    }

    #[test]
    fn virtual_camera_repeats_frames_between_intervals() {
        let (_tx, rx) = mpsc::channel();
        let mut s = SimLandmarkSource::new(rx, 33);
        assert_eq!(s.current_frame(0),  Some(FrameStamp(0)));
        assert_eq!(s.current_frame(16), Some(FrameStamp(0)));
        assert_eq!(s.current_frame(33), Some(FrameStamp(1)));
    }

    #[test]
    fn pointer_moves_mirrored_wrist() {
        let (tx, rx) = mpsc::channel();
        let mut s = SimLandmarkSource::new(rx, 33);
        tx.send(SimInput::KeyDown(SimKey::Pose(Pose::OpenHand))).unwrap();
        tx.send(SimInput::Pointer { x: 0.2, y: 0.4 }).unwrap();
        s.current_frame(0);
        let wrist = s.detect(0).map(|f| f.wrist());
        let wrist = wrist.expect("hand shown");
        assert!((wrist.x - 0.8).abs() < 1e-6);
        assert!((wrist.y - 0.4).abs() < 1e-6);
    }

    #[test]
    fn noise_swaps_every_fifth_frame() {
        let (tx, rx) = mpsc::channel();
        let mut s = SimLandmarkSource::new(rx, 10);
        tx.send(SimInput::KeyDown(SimKey::Pose(Pose::Heart))).unwrap();
        tx.send(SimInput::KeyDown(SimKey::ToggleNoise)).unwrap();
        let seen: Vec<_> = (0..10u64)
            .map(|i| {
                s.current_frame(i * 10);
                classify(s.detect(i * 10).as_ref())
            })
            .collect();
        assert_eq!(seen.iter().filter(|&&g| g == Gesture::None).count(), 2);
        assert_eq!(seen[4], Gesture::None);
    }

    #[test]
    fn flaky_start_fails_then_recovers() {
        let (_tx, rx) = mpsc::channel();
        let mut s = SimLandmarkSource::new(rx, 33).with_flaky_start(1);
        assert!(matches!(s.initialize(), Err(SourceError::ModelLoad(_))));
        assert_eq!(s.initialize(), Ok(()));
    }
}
