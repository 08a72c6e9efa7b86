//! Hand landmarks as produced by the external hand-tracking model.
//!
//! A [`HandFrame`] is the fixed 21-point layout used by MediaPipe-style hand
//! models.  Coordinates are normalised to the camera frame: `x`, `y` in
//! `[0, 1]`, `z` a relative depth with no fixed range.

use serde::{Deserialize, Serialize};

/// Number of joints in one hand snapshot.
pub const LANDMARK_COUNT: usize = 21;

// ════════════════════════════════════════════════════════════════════════════
// Joint indices
// ════════════════════════════════════════════════════════════════════════════

pub const WRIST:      usize = 0;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_TIP: usize = 12;
pub const RING_TIP:   usize = 16;
pub const PINKY_TIP:  usize = 20;

/// Tips of the four non-thumb fingers, in index → pinky order.
pub const FINGER_TIPS: [usize; 4] = [INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

/// One tracked joint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Landmark { x, y, z }
    }

    /// Euclidean distance over all three axes.
    pub fn distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx*dx + dy*dy + dz*dz).sqrt()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandFrame
// ════════════════════════════════════════════════════════════════════════════

/// The full 21-landmark snapshot of one detected hand in one tick.
///
/// "No hand this tick" is `Option<HandFrame>::None` everywhere in the crate.
#[derive(Clone, Debug, PartialEq)]
pub struct HandFrame {
    points: [Landmark; LANDMARK_COUNT],
}

impl HandFrame {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        HandFrame { points }
    }

    /// Build a frame from a slice; `None` unless exactly 21 points are given.
    pub fn from_slice(points: &[Landmark]) -> Option<Self> {
        let points: [Landmark; LANDMARK_COUNT] = points.try_into().ok()?;
        Some(HandFrame { points })
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    pub fn wrist(&self) -> Landmark {
        self.points[WRIST]
    }

    /// Distance between two joints of this hand.
    pub fn span(&self, a: usize, b: usize) -> f32 {
        self.points[a].distance(&self.points[b])
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_three_dimensional() {
        let a = Landmark::new(0.0, 0.0, 0.0);
        let b = Landmark::new(0.3, 0.4, 1.2);
        assert!((a.distance(&b) - 1.3).abs() < 1e-6);
    }

    #[test]
    fn from_slice_rejects_wrong_length() {
        let pts = vec![Landmark::default(); 20];
        assert!(HandFrame::from_slice(&pts).is_none());
        let pts = vec![Landmark::default(); 21];
        assert!(HandFrame::from_slice(&pts).is_some());
    }

    #[test]
    fn span_reads_named_joints() {
        let mut pts = [Landmark::default(); LANDMARK_COUNT];
        pts[MIDDLE_MCP] = Landmark::new(0.0, 0.5, 0.0);
        let frame = HandFrame::new(pts);
        assert!((frame.span(WRIST, MIDDLE_MCP) - 0.5).abs() < 1e-6);
    }
}
