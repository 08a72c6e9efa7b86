//! Geometric gesture classifier.
//!
//! Maps one [`HandFrame`] to one [`Gesture`].  No learned weights: every test
//! is a distance ratio against `hand_size`, the wrist → middle-MCP distance,
//! so the thresholds hold at any distance from the camera.
//!
//! ## Priority
//!
//! Predicates are checked in a fixed order and the first match wins:
//!
//! | Order | Gesture | Shape |
//! |---|---|---|
//! | 1 | `Heart`      | thumb, index, pinky out; middle, ring folded |
//! | 2 | `Victory`    | index, middle out; ring, pinky folded |
//! | 3 | `ClosedFist` | every fingertip close to the wrist |
//! | 4 | `Pinch`      | thumb tip touching index tip |
//! | 5 | `OpenHand`   | every fingertip far from the wrist |
//!
//! A fist usually also satisfies the pinch test, and a heart or victory
//! made with a lazy thumb can too; the order settles those overlaps.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::landmark::{HandFrame, FINGER_TIPS, INDEX_TIP, MIDDLE_MCP, THUMB_TIP, WRIST};

// Threshold ratios, in units of hand_size.
const HEART_THUMB_OUT:   f32 = 0.8;
const EXTENDED:          f32 = 1.4;
const FOLDED:            f32 = 1.2;
const FIST_FOLDED:       f32 = 1.3;
const PINCH_TOUCH:       f32 = 0.5;
const OPEN_EXTENDED:     f32 = 1.6;

// ════════════════════════════════════════════════════════════════════════════
// Gesture
// ════════════════════════════════════════════════════════════════════════════

/// A discrete classified hand pose.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gesture {
    #[default]
    None,
    OpenHand,
    ClosedFist,
    Pinch,
    Victory,
    Heart,
}

impl Gesture {
    pub const COUNT: usize = 6;

    pub const ALL: [Gesture; Gesture::COUNT] = [
        Gesture::None,
        Gesture::OpenHand,
        Gesture::ClosedFist,
        Gesture::Pinch,
        Gesture::Victory,
        Gesture::Heart,
    ];

    /// Dense index, used for counting votes without a map.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Gesture::None       => "NONE",
            Gesture::OpenHand   => "OPEN_HAND",
            Gesture::ClosedFist => "CLOSED_FIST",
            Gesture::Pinch      => "PINCH",
            Gesture::Victory    => "VICTORY",
            Gesture::Heart      => "HEART",
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandMetrics: the distances every predicate reads
// ════════════════════════════════════════════════════════════════════════════

/// Distances extracted from one frame.
///
/// `tips[i]` is fingertip → wrist for index, middle, ring, pinky.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandMetrics {
    pub hand_size:  f32,
    pub tips:       [f32; 4],
    pub pinch_dist: f32,
    pub thumb_dist: f32,
}

impl HandMetrics {
    pub fn measure(frame: &HandFrame) -> Self {
        HandMetrics {
            hand_size:  frame.span(WRIST, MIDDLE_MCP),
            tips:       FINGER_TIPS.map(|tip| frame.span(tip, WRIST)),
            pinch_dist: frame.span(THUMB_TIP, INDEX_TIP),
            thumb_dist: frame.span(THUMB_TIP, WRIST),
        }
    }

    fn out(&self, finger: usize) -> bool {
        self.tips[finger] > EXTENDED * self.hand_size
    }

    fn folded(&self, finger: usize) -> bool {
        self.tips[finger] < FOLDED * self.hand_size
    }

    pub fn is_heart(&self) -> bool {
        self.thumb_dist > HEART_THUMB_OUT * self.hand_size
            && self.out(0)
            && self.folded(1)
            && self.folded(2)
            && self.out(3)
    }

    pub fn is_victory(&self) -> bool {
        self.out(0) && self.out(1) && self.folded(2) && self.folded(3)
    }

    pub fn is_closed_fist(&self) -> bool {
        self.tips.iter().all(|&d| d < FIST_FOLDED * self.hand_size)
    }

    pub fn is_pinch(&self) -> bool {
        self.pinch_dist < PINCH_TOUCH * self.hand_size
    }

    pub fn is_open_hand(&self) -> bool {
        self.tips.iter().all(|&d| d > OPEN_EXTENDED * self.hand_size)
    }

    /// Apply the predicates in priority order.
    pub fn gesture(&self) -> Gesture {
        if !(self.hand_size.is_finite() && self.hand_size > 0.0) {
            Gesture::None
        } else if self.is_heart() {
            Gesture::Heart
        } else if self.is_victory() {
            Gesture::Victory
        } else if self.is_closed_fist() {
            Gesture::ClosedFist
        } else if self.is_pinch() {
            Gesture::Pinch
        } else if self.is_open_hand() {
            Gesture::OpenHand
        } else {
            Gesture::None
        }
    }
}

/// Classify one frame.  Absent input is `Gesture::None`.
///
/// Total over all inputs: a degenerate frame (zero `hand_size`, NaN
/// coordinates) is `None`.
pub fn classify(frame: Option<&HandFrame>) -> Gesture {
    match frame {
        Some(f) => HandMetrics::measure(f).gesture(),
        None    => Gesture::None,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{Landmark, LANDMARK_COUNT};
    use crate::pose::{self, Pose};

    fn at_centre(p: Pose) -> HandFrame {
        pose::frame(p, 0.5, 0.7, 0.1)
    }

    #[test]
    fn absent_frame_is_none() {
        assert_eq!(classify(None), Gesture::None);
    }

    #[test]
    fn canonical_poses_classify() {
        assert_eq!(classify(Some(&at_centre(Pose::OpenHand))),   Gesture::OpenHand);
        assert_eq!(classify(Some(&at_centre(Pose::ClosedFist))), Gesture::ClosedFist);
        assert_eq!(classify(Some(&at_centre(Pose::Pinch))),      Gesture::Pinch);
        assert_eq!(classify(Some(&at_centre(Pose::Victory))),    Gesture::Victory);
        assert_eq!(classify(Some(&at_centre(Pose::Heart))),      Gesture::Heart);
        assert_eq!(classify(Some(&at_centre(Pose::Relaxed))),    Gesture::None);
    }

    #[test]
    fn scale_invariant() {
        for &scale in &[0.04_f32, 0.08, 0.15] {
            let f = pose::frame(Pose::Victory, 0.4, 0.8, scale);
            assert_eq!(classify(Some(&f)), Gesture::Victory, "scale {}", scale);
        }
    }

    #[test]
    fn deterministic() {
        let f = at_centre(Pose::Heart);
        let first = classify(Some(&f));
        for _ in 0..100 {
            assert_eq!(classify(Some(&f)), first);
        }
    }

    #[test]
    fn heart_wins_over_pinch() {
        // Thumb tip pulled onto the index tip while both stay extended.
        let mut pts = *at_centre(Pose::Heart).points();
        pts[THUMB_TIP] = Landmark::new(pts[INDEX_TIP].x + 0.01, pts[INDEX_TIP].y, 0.0);
        let m = HandMetrics::measure(&HandFrame::new(pts));
        assert!(m.is_heart() && m.is_pinch());
        assert_eq!(m.gesture(), Gesture::Heart);
    }

    #[test]
    fn victory_wins_over_pinch() {
        let mut pts = *at_centre(Pose::Victory).points();
        pts[THUMB_TIP] = Landmark::new(pts[INDEX_TIP].x + 0.01, pts[INDEX_TIP].y, 0.0);
        let m = HandMetrics::measure(&HandFrame::new(pts));
        assert!(m.is_victory() && m.is_pinch());
        assert_eq!(m.gesture(), Gesture::Victory);
    }

    #[test]
    fn fist_wins_over_pinch() {
        let m = HandMetrics::measure(&at_centre(Pose::ClosedFist));
        assert!(m.is_closed_fist() && m.is_pinch());
        assert_eq!(m.gesture(), Gesture::ClosedFist);
    }

    #[test]
    fn heart_and_victory_disagree_on_middle_finger() {
        // The middle-finger thresholds (< 1.2 vs > 1.4) keep these two apart.
        for p in [Pose::Heart, Pose::Victory] {
            let m = HandMetrics::measure(&at_centre(p));
            assert!(!(m.is_heart() && m.is_victory()));
        }
    }

    #[test]
    fn degenerate_frame_is_none() {
        let f = HandFrame::new([Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT]);
        assert_eq!(classify(Some(&f)), Gesture::None);
        let f = HandFrame::new([Landmark::new(f32::NAN, 0.5, 0.0); LANDMARK_COUNT]);
        assert_eq!(classify(Some(&f)), Gesture::None);

        // wrist on top of the middle knuckle, fingers still spread
        let mut pts = *at_centre(Pose::OpenHand).points();
        pts[MIDDLE_MCP] = pts[WRIST];
        assert_eq!(classify(Some(&HandFrame::new(pts))), Gesture::None);
    }

    #[test]
    fn names_match_wire_format() {
        assert_eq!(Gesture::ClosedFist.to_string(), "CLOSED_FIST");
        for (i, g) in Gesture::ALL.iter().enumerate() {
            assert_eq!(g.index(), i);
        }
    }
}
