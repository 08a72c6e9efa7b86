//! Particle scene.
//!
//! A fixed set of particles eases toward a layout chosen by the current
//! [`AppMode`]: a cone for TREE, a word for TEXT, a loose cloud for SCATTER
//! and a heart outline for LOVE.  The smoothed cursor tilts the whole scene
//! slightly (parallax).  All positions are window-normalised `[0, 1]²`.

use std::f32::consts::TAU;

use gesture_core::{AppMode, Cursor};

/// Fraction of the remaining distance covered per frame.
const EASE: f32 = 0.08;
/// Parallax offset at the window edge.
const PARALLAX: f32 = 0.06;
const GOLDEN: f32 = 0.618_034;

// ════════════════════════════════════════════════════════════════════════════
// Color palette: mode → RGB
// ════════════════════════════════════════════════════════════════════════════

/// Colour for particle `i` under `mode`.
pub fn particle_color(mode: AppMode, i: usize) -> u32 {
    let h = spread(i, 3);
    match mode {
        AppMode::Tree    => hsv_to_argb(95.0 + 50.0 * h, 0.75, 0.85),
        AppMode::Text    => hsv_to_argb(200.0 + 20.0 * h, 0.15, 0.98),
        AppMode::Scatter => hsv_to_argb(360.0 * h, 0.80, 0.92),
        AppMode::Love    => hsv_to_argb(330.0 + 30.0 * h, 0.70, 0.95),
    }
}

/// Convert HSV → packed ARGB (0xAARRGGBB, A=0xFF).
fn hsv_to_argb(h: f32, s: f32, v: f32) -> u32 {
    let h  = h.rem_euclid(360.0) / 60.0;
    let c  = v * s;
    let x  = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    let byte = |f: f32| (((f + m) * 255.0).round() as u32).min(255);
    0xFF00_0000 | (byte(r) << 16) | (byte(g) << 8) | byte(b)
}

/// Low-discrepancy value in `[0, 1)` for particle `i`; `salt` picks a
/// different sequence.
fn spread(i: usize, salt: u32) -> f32 {
    ((i as f32 + 1.0) * GOLDEN * (salt as f32 + 1.0)).fract()
}

// ════════════════════════════════════════════════════════════════════════════
// Layouts
// ════════════════════════════════════════════════════════════════════════════

/// The word spelled out in TEXT mode, one `#` per lit cell.
const WORD: [&str; 5] = [
    "#.#.###.#...#...###",
    "#.#.#...#...#...#.#",
    "###.##..#...#...#.#",
    "#.#.#...#...#...#.#",
    "#.#.###.###.###.###",
];

fn word_cells() -> Vec<(usize, usize)> {
    WORD.iter()
        .enumerate()
        .flat_map(|(row, line)| {
            line.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'#')
                .map(move |(col, _)| (col, row))
        })
        .collect()
}

/// Target position of particle `i` of `n` in `mode`.
pub fn layout(mode: AppMode, i: usize, n: usize) -> (f32, f32) {
    let t = (i as f32 + 0.5) / n.max(1) as f32;
    match mode {
        AppMode::Tree => {
            // apex at the top, widening downwards
            let y = 0.15 + 0.7 * t;
            let half = 0.3 * t;
            (0.5 + half * (2.0 * spread(i, 1) - 1.0), y)
        }
        AppMode::Text => {
            let cells = word_cells();
            let (col, row) = cells[i % cells.len()];
            let cols = WORD[0].len() as f32;
            let cell = 0.7 / cols;
            let x = 0.15 + (col as f32 + spread(i, 1)) * cell;
            let y = 0.5 - 2.5 * cell + (row as f32 + spread(i, 2)) * cell;
            (x, y)
        }
        AppMode::Scatter => (0.05 + 0.9 * spread(i, 1), 0.05 + 0.9 * spread(i, 4)),
        AppMode::Love => {
            let a = TAU * t;
            let hx = 16.0 * a.sin().powi(3);
            let hy = 13.0 * a.cos() - 5.0 * (2.0 * a).cos() - 2.0 * (3.0 * a).cos() - (4.0 * a).cos();
            let r = 0.75 + 0.25 * spread(i, 2);
            (0.5 + hx * r / 45.0, 0.48 - hy * r / 45.0)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Scene
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Particle {
    pub pos:    (f32, f32),
    pub target: (f32, f32),
    pub color:  u32,
}

#[derive(Debug)]
pub struct Scene {
    pub particles: Vec<Particle>,
    pub mode:      AppMode,
    /// Current parallax offset, eased toward the cursor.
    pub parallax:  (f32, f32),
}

impl Scene {
    /// Particles start settled on `mode`'s layout.
    pub fn new(count: usize, mode: AppMode) -> Self {
        let particles = (0..count)
            .map(|i| {
                let p = layout(mode, i, count);
                Particle { pos: p, target: p, color: particle_color(mode, i) }
            })
            .collect();
        Scene { particles, mode, parallax: (0.0, 0.0) }
    }

    /// Retarget every particle; they drift there over the next frames.
    pub fn set_mode(&mut self, mode: AppMode) {
        if mode == self.mode { return; }
        self.mode = mode;
        let n = self.particles.len();
        for (i, p) in self.particles.iter_mut().enumerate() {
            p.target = layout(mode, i, n);
            p.color  = particle_color(mode, i);
        }
    }

    /// Advance one frame.
    pub fn tick(&mut self, cursor: Cursor) {
        for p in &mut self.particles {
            p.pos.0 += (p.target.0 - p.pos.0) * EASE;
            p.pos.1 += (p.target.1 - p.pos.1) * EASE;
        }
        let want = ((cursor.x - 0.5) * 2.0 * PARALLAX, (cursor.y - 0.5) * 2.0 * PARALLAX);
        self.parallax.0 += (want.0 - self.parallax.0) * EASE;
        self.parallax.1 += (want.1 - self.parallax.1) * EASE;
    }

    /// Where particle `i` is drawn.
    pub fn screen_pos(&self, i: usize) -> Option<(f32, f32)> {
        self.particles.get(i).map(|p| (p.pos.0 + self.parallax.0, p.pos.1 + self.parallax.1))
    }

    /// Largest distance between any particle and its target.
    pub fn unsettled(&self) -> f32 {
        self.particles
            .iter()
            .map(|p| (p.target.0 - p.pos.0).hypot(p.target.1 - p.pos.1))
            .fold(0.0, f32::max)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_are_opaque() {
        for mode in AppMode::ALL {
            for i in 0..50 {
                assert_eq!(particle_color(mode, i) >> 24, 0xFF);
            }
        }
    }

    #[test]
    fn hsv_primaries() {
        assert_eq!(hsv_to_argb(0.0, 1.0, 1.0), 0xFFFF0000);
        assert_eq!(hsv_to_argb(120.0, 1.0, 1.0), 0xFF00FF00);
        assert_eq!(hsv_to_argb(240.0, 1.0, 1.0), 0xFF0000FF);
    }

    #[test]
    fn layouts_stay_on_screen() {
        let n = 400;
        for mode in AppMode::ALL {
            for i in 0..n {
                let (x, y) = layout(mode, i, n);
                assert!((0.0..=1.0).contains(&x), "{:?} #{} x={}", mode, i, x);
                assert!((0.0..=1.0).contains(&y), "{:?} #{} y={}", mode, i, y);
            }
        }
    }

    #[test]
    fn tree_widens_downwards() {
        let n = 400;
        let width = |range: std::ops::Range<usize>| {
            range.map(|i| (layout(AppMode::Tree, i, n).0 - 0.5).abs()).fold(0.0, f32::max)
        };
        assert!(width(0..40) < width(360..400));
    }

    #[test]
    fn particles_converge_after_mode_change() {
        let mut s = Scene::new(200, AppMode::Tree);
        assert_eq!(s.unsettled(), 0.0);
        s.set_mode(AppMode::Love);
        assert!(s.unsettled() > 0.1);
        for _ in 0..200 { s.tick(Cursor::CENTRE); }
        assert!(s.unsettled() < 1e-3);
    }

    #[test]
    fn same_mode_is_noop() {
        let mut s = Scene::new(10, AppMode::Text);
        let before: Vec<_> = s.particles.iter().map(|p| p.target).collect();
        s.set_mode(AppMode::Text);
        let after: Vec<_> = s.particles.iter().map(|p| p.target).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn parallax_follows_cursor() {
        let mut s = Scene::new(10, AppMode::Scatter);
        for _ in 0..200 { s.tick(Cursor { x: 1.0, y: 0.0 }); }
        assert!((s.parallax.0 - PARALLAX).abs() < 1e-3);
        assert!((s.parallax.1 + PARALLAX).abs() < 1e-3);
        let (x, _) = s.screen_pos(0).unwrap();
        assert!(x > s.particles[0].pos.0);
    }
}
