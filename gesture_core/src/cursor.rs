//! Cursor smoother: adaptive exponential smoothing of the wrist position.
//!
//! Two tiers instead of a velocity filter: a move larger than
//! `jump_threshold` is tracked with `fast_factor`, anything smaller is
//! treated as jitter and damped with `slow_factor`.

use serde::{Deserialize, Serialize};

use crate::landmark::Landmark;

/// Smoothing parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    /// Distance (normalised units) above which a move counts as intentional.
    pub jump_threshold: f32,
    pub fast_factor:    f32,
    pub slow_factor:    f32,
    /// Mirror x for a front-facing camera (`raw_x = 1 − wrist_x`).
    pub mirror_x:       bool,
}

impl Default for CursorConfig {
    fn default() -> Self {
        CursorConfig {
            jump_threshold: 0.05,
            fast_factor:    0.3,
            slow_factor:    0.1,
            mirror_x:       true,
        }
    }
}

/// A point on screen in normalised `[0, 1]²` coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub x: f32,
    pub y: f32,
}

impl Cursor {
    pub const CENTRE: Cursor = Cursor { x: 0.5, y: 0.5 };

    pub fn distance(&self, other: &Cursor) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx*dx + dy*dy).sqrt()
    }

    fn lerp(&self, to: &Cursor, t: f32) -> Cursor {
        Cursor {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
        }
    }
}

impl Default for Cursor {
    fn default() -> Self { Cursor::CENTRE }
}

// ════════════════════════════════════════════════════════════════════════════
// CursorSmoother
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct CursorSmoother {
    config:   CursorConfig,
    smoothed: Cursor,
}

impl CursorSmoother {
    pub fn new(config: CursorConfig) -> Self {
        CursorSmoother { config, smoothed: Cursor::CENTRE }
    }

    /// Fold one wrist sample into the cursor and return the new position.
    pub fn update(&mut self, wrist: Landmark) -> Cursor {
        let raw = Cursor {
            x: if self.config.mirror_x { 1.0 - wrist.x } else { wrist.x },
            y: wrist.y,
        };
        let moved = raw.distance(&self.smoothed);
        let factor = if moved > self.config.jump_threshold {
            self.config.fast_factor
        } else {
            self.config.slow_factor
        };
        self.smoothed = self.smoothed.lerp(&raw, factor);
        self.smoothed
    }

    /// Current position; unchanged while no hand is in view.
    pub fn position(&self) -> Cursor { self.smoothed }
}

impl Default for CursorSmoother {
    fn default() -> Self { CursorSmoother::new(CursorConfig::default()) }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn wrist(x: f32, y: f32) -> Landmark { Landmark::new(x, y, 0.0) }

    #[test]
    fn starts_at_centre() {
        assert_eq!(CursorSmoother::default().position(), Cursor::CENTRE);
    }

    #[test]
    fn large_move_uses_fast_factor() {
        let mut c = CursorSmoother::default();
        // raw = (1 − 0.1, 0.5) = (0.9, 0.5): 0.4 away
        let p = c.update(wrist(0.1, 0.5));
        assert!((p.x - (0.5 + 0.4 * 0.3)).abs() < 1e-6);
        assert!((p.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn small_move_uses_slow_factor() {
        let mut c = CursorSmoother::default();
        // raw = (0.52, 0.5): 0.02 away
        let p = c.update(wrist(0.48, 0.5));
        assert!((p.x - (0.5 + 0.02 * 0.1)).abs() < 1e-6);
    }

    #[test]
    fn unmirrored_follows_wrist_directly() {
        let mut c = CursorSmoother::new(CursorConfig { mirror_x: false, ..CursorConfig::default() });
        let p = c.update(wrist(0.9, 0.5));
        assert!(p.x > 0.5);
    }

    #[test]
    fn converges_and_settles_under_constant_input() {
        let mut c = CursorSmoother::default();
        let target = Cursor { x: 1.0 - 0.2, y: 0.3 };
        for _ in 0..400 {
            c.update(wrist(0.2, 0.3));
        }
        let settled = c.position();
        assert!(settled.distance(&target) < 1e-4);
        c.update(wrist(0.2, 0.3));
        assert!(c.position().distance(&settled) < 1e-5);
    }
}
