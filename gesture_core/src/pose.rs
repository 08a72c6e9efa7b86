//! Synthetic hand poses.
//!
//! Builds plausible 21-landmark frames for each gesture at any wrist position
//! and scale.  The keyboard simulator uses these to stand in for a camera,
//! and the tests use them as fixtures.
//!
//! Fingers fan out from the wrist along fixed angles (index −15°, middle 0°,
//! ring 15°, pinky 30°, measured from straight up).  Every MCP joint sits one
//! `scale` from the wrist, so `scale` is exactly the classifier's
//! `hand_size`.

use crate::classifier::Gesture;
use crate::landmark::{HandFrame, Landmark, LANDMARK_COUNT, THUMB_TIP, WRIST};

const FINGER_ANGLES: [f32; 4] = [-15.0, 0.0, 15.0, 30.0];
const EXTENDED:      f32 = 2.0;
const HALF:          f32 = 1.5;
const FOLDED:        f32 = 0.95;

/// A hand shape the simulator can hold up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pose {
    /// Fingers half bent, a hand in view that makes no gesture.
    Relaxed,
    OpenHand,
    ClosedFist,
    Pinch,
    Victory,
    Heart,
}

impl Pose {
    pub const ALL: [Pose; 6] = [
        Pose::Relaxed, Pose::OpenHand, Pose::ClosedFist,
        Pose::Pinch,   Pose::Victory,  Pose::Heart,
    ];

    /// The gesture the classifier reports for this pose.
    pub fn expected(self) -> Gesture {
        match self {
            Pose::Relaxed    => Gesture::None,
            Pose::OpenHand   => Gesture::OpenHand,
            Pose::ClosedFist => Gesture::ClosedFist,
            Pose::Pinch      => Gesture::Pinch,
            Pose::Victory    => Gesture::Victory,
            Pose::Heart      => Gesture::Heart,
        }
    }

    /// (thumb angle°, thumb length, [index, middle, ring, pinky] tip lengths)
    fn shape(self) -> (f32, f32, [f32; 4]) {
        match self {
            Pose::Relaxed    => (-60.0, 1.0, [HALF; 4]),
            Pose::OpenHand   => (-60.0, 1.2, [EXTENDED; 4]),
            Pose::ClosedFist => (-30.0, 0.7, [FOLDED; 4]),
            Pose::Pinch      => (-60.0, 1.2, [1.3, EXTENDED, EXTENDED, EXTENDED]),
            Pose::Victory    => (-30.0, 0.7, [EXTENDED, EXTENDED, FOLDED, FOLDED]),
            Pose::Heart      => (-60.0, 1.2, [EXTENDED, FOLDED, FOLDED, EXTENDED]),
        }
    }
}

/// Build a frame for `pose` with the wrist at (`wrist_x`, `wrist_y`) and a
/// wrist → middle-MCP distance of `scale`.
pub fn frame(pose: Pose, wrist_x: f32, wrist_y: f32, scale: f32) -> HandFrame {
    let at = |angle_deg: f32, r: f32| {
        let a = angle_deg.to_radians();
        Landmark::new(wrist_x + r * scale * a.sin(), wrist_y - r * scale * a.cos(), 0.0)
    };

    let (thumb_angle, thumb_len, tips) = pose.shape();
    let mut pts = [Landmark::default(); LANDMARK_COUNT];
    pts[WRIST] = Landmark::new(wrist_x, wrist_y, 0.0);

    for (finger, (&angle, &len)) in FINGER_ANGLES.iter().zip(tips.iter()).enumerate() {
        let base = 5 + finger * 4;
        let joints = if len >= 1.4 {
            [1.0, 1.0 + (len - 1.0) * 0.4, 1.0 + (len - 1.0) * 0.7, len]
        } else {
            // curled back toward the palm
            [1.0, 1.3, 1.15, len]
        };
        for (j, r) in joints.iter().enumerate() {
            pts[base + j] = at(angle, *r);
        }
    }

    let thumb_tip = if pose == Pose::Pinch {
        let index_tip = pts[8];
        Landmark::new(index_tip.x + 0.2 * scale, index_tip.y, 0.0)
    } else {
        at(thumb_angle, thumb_len)
    };
    let wrist = pts[WRIST];
    for (j, k) in [0.3_f32, 0.55, 0.8].iter().enumerate() {
        pts[1 + j] = Landmark::new(
            wrist.x + (thumb_tip.x - wrist.x) * k,
            wrist.y + (thumb_tip.y - wrist.y) * k,
            0.0,
        );
    }
    pts[THUMB_TIP] = thumb_tip;

    HandFrame::new(pts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::landmark::MIDDLE_MCP;

    #[test]
    fn scale_is_hand_size() {
        let f = frame(Pose::OpenHand, 0.3, 0.6, 0.12);
        assert!((f.span(WRIST, MIDDLE_MCP) - 0.12).abs() < 1e-6);
    }

    #[test]
    fn every_pose_classifies_as_expected() {
        for p in Pose::ALL {
            for &(x, y) in &[(0.2_f32, 0.9_f32), (0.5, 0.5), (0.8, 0.7)] {
                let f = frame(p, x, y, 0.09);
                assert_eq!(classify(Some(&f)), p.expected(), "{:?} at ({}, {})", p, x, y);
            }
        }
    }
}
