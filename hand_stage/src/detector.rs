//! Landmark source backed by an external detector process.
//!
//! The detector owns the camera and the hand model (typically a small
//! MediaPipe script).  It talks JSON lines on stdout:
//!
//! ```text
//! READY                                   ← model loaded, camera open
//! ERROR camera: permission denied         ← or: ERROR model: <reason>
//! {"frame": 41, "hands": [{"score": 0.93, "landmarks": [{"x":..,"y":..,"z":..}, ×21]}]}
//! {"frame": 42, "hands": []}
//! ```
//!
//! A reader thread parses lines as they arrive and forwards them over a
//! channel; the render loop drains the channel and keeps the newest frame.

use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use serde::{Deserialize, Serialize};

use gesture_core::{FrameStamp, HandFrame, Landmark, LandmarkSource, SourceError};

/// How to launch the detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub command:   String,
    #[serde(default)]
    pub args:      Vec<String>,
    /// Hands scored below this are ignored.
    #[serde(default = "default_min_score")]
    pub min_score: f32,
}

fn default_min_score() -> f32 { 0.5 }

// ════════════════════════════════════════════════════════════════════════════
// Wire format
// ════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize, Debug)]
struct DetectionLine {
    frame: u64,
    #[serde(default)]
    hands: Vec<HandLine>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize, Debug)]
struct HandLine {
    #[serde(default = "full_score")]
    score:     f32,
    landmarks: Vec<Landmark>,
}

fn full_score() -> f32 { 1.0 }

/// One parsed detector line.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub frame: FrameStamp,
    pub hand:  Option<HandFrame>,
}

/// Parse one JSON line.  The first hand at or above `min_score` with a full
/// set of 21 landmarks wins; anything else counts as "no hand".
pub fn parse_detection(line: &str, min_score: f32) -> Result<Detection, SourceError> {
    let parsed: DetectionLine = serde_json::from_str(line)
        .map_err(|e| SourceError::Protocol(format!("bad detector line: {}", e)))?;

    if let Some(err) = &parsed.error {
        log::warn!("detector reported: {}", err);
    }

    let hand = parsed.hands.iter()
        .filter(|h| h.score >= min_score)
        .find_map(|h| {
            let frame = HandFrame::from_slice(&h.landmarks);
            if frame.is_none() {
                log::warn!("expected 21 landmarks, got {}", h.landmarks.len());
            }
            frame
        });

    Ok(Detection { frame: FrameStamp(parsed.frame), hand })
}

/// Interpret the detector's first line.
fn parse_handshake(line: &str) -> Result<(), SourceError> {
    let line = line.trim();
    if line == "READY" {
        return Ok(());
    }
    match line.strip_prefix("ERROR ") {
        Some(rest) => match rest.strip_prefix("camera:") {
            Some(why) => Err(SourceError::CameraUnavailable(why.trim().to_string())),
            None      => Err(SourceError::ModelLoad(rest.trim_start_matches("model:").trim().to_string())),
        },
        None if line.is_empty() => Err(SourceError::ModelLoad("detector exited before READY".into())),
        None => Err(SourceError::Protocol(format!("expected READY, got {:?}", line))),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SubprocessSource
// ════════════════════════════════════════════════════════════════════════════

pub struct SubprocessSource {
    config: DetectorConfig,
    child:  Option<Child>,
    rx:     Option<Receiver<Detection>>,
    latest: Option<Detection>,
}

impl SubprocessSource {
    pub fn new(config: DetectorConfig) -> Self {
        SubprocessSource { config, child: None, rx: None, latest: None }
    }

    fn kill(&mut self) {
        self.rx = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl LandmarkSource for SubprocessSource {
    fn initialize(&mut self) -> Result<(), SourceError> {
        self.kill();
        log::info!("starting hand detector: {} {}", self.config.command, self.config.args.join(" "));

        let mut child = Command::new(&self.config.command)
            .args(&self.config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| SourceError::ModelLoad(format!("cannot start {}: {}", self.config.command, e)))?;

        let stdout = match child.stdout.take() {
            Some(s) => s,
            None    => {
                let _ = child.kill();
                return Err(SourceError::ModelLoad("detector stdout unavailable".into()));
            }
        };
        let mut reader = BufReader::new(stdout);

        let mut first = String::new();
        let handshake = reader.read_line(&mut first)
            .map_err(|e| SourceError::ModelLoad(format!("reading detector: {}", e)))
            .and_then(|_| parse_handshake(&first));
        if let Err(e) = handshake {
            let _ = child.kill();
            let _ = child.wait();
            return Err(e);
        }

        let (tx, rx) = mpsc::channel();
        let min_score = self.config.min_score;
        thread::spawn(move || {
            for line in reader.lines() {
                let line = match line {
                    Ok(l)  => l,
                    Err(_) => break,
                };
                if line.trim().is_empty() { continue; }
                match parse_detection(&line, min_score) {
                    Ok(d)  => if tx.send(d).is_err() { break; },
                    Err(e) => log::warn!("{}", e),
                }
            }
            log::debug!("detector output closed");
        });

        self.child = Some(child);
        self.rx = Some(rx);
        Ok(())
    }

    fn current_frame(&mut self, _now_ms: u64) -> Option<FrameStamp> {
        let mut exited = false;
        if let Some(rx) = &self.rx {
            loop {
                match rx.try_recv() {
                    Ok(d)                          => self.latest = Some(d),
                    Err(TryRecvError::Empty)       => break,
                    Err(TryRecvError::Disconnected) => { exited = true; break; }
                }
            }
        }
        if exited {
            log::warn!("hand detector stopped sending frames; no hand until restart");
            self.rx = None;
            self.latest = None;
        }
        self.latest.as_ref().map(|d| d.frame)
    }

    fn detect(&mut self, _now_ms: u64) -> Option<HandFrame> {
        self.latest.as_ref().and_then(|d| d.hand.clone())
    }

    fn release(&mut self) {
        self.kill();
    }
}

impl Drop for SubprocessSource {
    fn drop(&mut self) {
        self.kill();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use gesture_core::pose::{self, Pose};
    use gesture_core::{classify, Gesture};

    fn line_for(frame: u64, score: f32, hand: &HandFrame) -> String {
        let pts = serde_json::to_string(&hand.points().to_vec()).unwrap();
        format!(r#"{{"frame": {}, "hands": [{{"score": {}, "landmarks": {}}}]}}"#, frame, score, pts)
    }

    #[test]
    fn parses_a_hand() {
        let hand = pose::frame(Pose::Pinch, 0.5, 0.6, 0.1);
        let d = parse_detection(&line_for(7, 0.9, &hand), 0.5).unwrap();
        assert_eq!(d.frame, FrameStamp(7));
        assert_eq!(classify(d.hand.as_ref()), Gesture::Pinch);
    }

    #[test]
    fn low_score_is_no_hand() {
        let hand = pose::frame(Pose::Pinch, 0.5, 0.6, 0.1);
        let d = parse_detection(&line_for(8, 0.2, &hand), 0.5).unwrap();
        assert!(d.hand.is_none());
    }

    #[test]
    fn short_landmark_list_is_no_hand() {
        let d = parse_detection(r#"{"frame": 3, "hands": [{"landmarks": [{"x": 0.1, "y": 0.2}]}]}"#, 0.5).unwrap();
        assert!(d.hand.is_none());
    }

    #[test]
    fn empty_hands_and_error_field() {
        let d = parse_detection(r#"{"frame": 9, "hands": [], "error": "blurry"}"#, 0.5).unwrap();
        assert_eq!(d, Detection { frame: FrameStamp(9), hand: None });
    }

    #[test]
    fn garbage_is_protocol_error() {
        assert!(matches!(parse_detection("not json", 0.5), Err(SourceError::Protocol(_))));
    }

    #[test]
    fn handshake_variants() {
        assert_eq!(parse_handshake("READY\n"), Ok(()));
        assert!(matches!(parse_handshake("ERROR camera: permission denied"),
                         Err(SourceError::CameraUnavailable(m)) if m == "permission denied"));
        assert!(matches!(parse_handshake("ERROR model: missing weights"),
                         Err(SourceError::ModelLoad(m)) if m == "missing weights"));
        assert!(matches!(parse_handshake(""), Err(SourceError::ModelLoad(_))));
        assert!(matches!(parse_handshake("hello"), Err(SourceError::Protocol(_))));
    }

    #[test]
    fn detector_exit_clears_the_last_frame() {
        let mut s = SubprocessSource::new(DetectorConfig {
            command:   "hand-detector".into(),
            args:      vec![],
            min_score: 0.5,
        });
        let (tx, rx) = mpsc::channel();
        s.rx = Some(rx);
        let hand = pose::frame(Pose::ClosedFist, 0.5, 0.5, 0.1);
        tx.send(Detection { frame: FrameStamp(4), hand: Some(hand) }).unwrap();
        assert_eq!(s.current_frame(0), Some(FrameStamp(4)));
        assert!(s.detect(0).is_some());

        drop(tx);
        assert_eq!(s.current_frame(33), None);
        assert!(s.detect(33).is_none());
        assert!(s.rx.is_none());
    }

    #[test]
    fn missing_binary_is_retryable() {
        let mut s = SubprocessSource::new(DetectorConfig {
            command:   "/nonexistent/hand-detector".into(),
            args:      vec![],
            min_score: 0.5,
        });
        let err = s.initialize().unwrap_err();
        assert!(err.is_retryable());
        assert!(s.current_frame(0).is_none());
    }
}
