//! Software-rendered preview window using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │ MODE: TREE   GESTURE: OPEN_HAND   RAW: PINCH        [■■■■■■■■]     │
//! │                                                                   │
//! │                 particles (eased toward the mode layout)          │
//! │                          ◯ cursor                                 │
//! │                                                                   │
//! │ status                                                            │
//! │ key legend                                                        │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The boxes in the top-right corner are the stabilizer window, oldest on
//! the left, each coloured by the gesture it holds.

use std::sync::mpsc::Sender;
use std::time::Duration;

use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};

use gesture_core::stabilizer::GestureHistory;
use gesture_core::{AppMode, Gesture, HandState};
use gesture_core::pose::Pose;

use crate::error::AppError;
use crate::scene::Scene;
use crate::source::{SimInput, SimKey};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:    usize = 960;
pub const WIN_H:    usize = 600;
const TOP_BAR_H:    usize = 24;
const STATUS_H:     usize = 34;
const STATUS_Y:     usize = WIN_H - STATUS_H;
const SLOT_W:       usize = 14;
const BG_COLOR:     u32   = 0xFF0B0F1A;
const BAR_BG:       u32   = 0xFF16213E;
const LABEL_COLOR:  u32   = 0xFFE8E8F0;
const DIM_COLOR:    u32   = 0xFF7A7F8C;
const CURSOR_COLOR: u32   = 0xFFFFFFFF;
const SCALE:        usize = 2;

/// Frame rate the window is paced to.
pub const FRAME: Duration = Duration::from_millis(16);

/// Everything one frame draws.
pub struct View<'a> {
    pub scene:     &'a Scene,
    pub hand:      HandState,
    pub hand_seen: bool,
    pub mode:      AppMode,
    pub raw:       Gesture,
    pub history:   &'a GestureHistory,
    pub status:    &'a str,
}

/// Colour used for a gesture in the stabilizer strip and the labels.
pub fn gesture_color(g: Gesture) -> u32 {
    match g {
        Gesture::None       => 0xFF3A3F4B,
        Gesture::OpenHand   => 0xFFF2C14E,
        Gesture::ClosedFist => 0xFF5FAD56,
        Gesture::Pinch      => 0xFF4D9DE0,
        Gesture::Victory    => 0xFFB07BE0,
        Gesture::Heart      => 0xFFE15A7B,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:       Window,
    buf:          Vec<u32>,
    sim_tx:       Sender<SimInput>,
    last_pointer: Option<(f32, f32)>,
}

impl Visualizer {
    pub fn new(sim_tx: Sender<SimInput>) -> Result<Self, AppError> {
        let mut window = Window::new(
            "Hand Stage — gesture-driven particles",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| AppError::Window(e.to_string()))?;

        window.limit_update_rate(Some(FRAME));

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
            last_pointer: None,
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Translate keys and mouse movement into simulator input.
    /// Returns false when the user asked to quit.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() { return false; }

        let pressed = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        if pressed(Key::Q) || pressed(Key::Escape) {
            return false;
        }

        let mut events = Vec::new();
        for (key, pose) in [
            (Key::Key1, Pose::OpenHand),
            (Key::Key2, Pose::ClosedFist),
            (Key::Key3, Pose::Pinch),
            (Key::Key4, Pose::Victory),
            (Key::Key5, Pose::Heart),
            (Key::Key6, Pose::Relaxed),
        ] {
            if pressed(key) {
                events.push(SimInput::KeyDown(SimKey::Pose(pose)));
            }
        }
        if pressed(Key::Key0) {
            events.push(SimInput::KeyDown(SimKey::HideHand));
        }
        if pressed(Key::J) {
            events.push(SimInput::KeyDown(SimKey::ToggleNoise));
        }

        if let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Discard) {
            let p = (mx / WIN_W as f32, my / WIN_H as f32);
            if self.last_pointer != Some(p) {
                self.last_pointer = Some(p);
                events.push(SimInput::Pointer { x: p.0, y: p.1 });
            }
        }

        for e in events {
            // The receiver goes away with a non-sim source; nothing to do then.
            let _ = self.sim_tx.send(e);
        }
        true
    }

    /// Render one frame.
    pub fn render(&mut self, view: &View) {
        self.buf.fill(BG_COLOR);

        self.draw_particles(view.scene);
        self.draw_cursor(view);

        // ── Top bar ──────────────────────────────────────────────────────
        self.fill_rect(0, 0, WIN_W, TOP_BAR_H, BAR_BG);
        let mut x = 10;
        x = self.draw_label("MODE: ", x, 7, DIM_COLOR);
        x = self.draw_label(view.mode.name(), x, 7, LABEL_COLOR);
        x = self.draw_label("   GESTURE: ", x, 7, DIM_COLOR);
        x = self.draw_label(view.hand.gesture.name(), x, 7, gesture_color(view.hand.gesture));
        x = self.draw_label("   RAW: ", x, 7, DIM_COLOR);
        self.draw_label(view.raw.name(), x, 7, gesture_color(view.raw));

        self.draw_history(view.history);

        // ── Status + legend ──────────────────────────────────────────────
        self.fill_rect(0, STATUS_Y, WIN_W, STATUS_H, BAR_BG);
        self.draw_label(view.status, 10, STATUS_Y + 5, LABEL_COLOR);
        self.draw_label(
            "1=OPEN 2=FIST 3=PINCH 4=VICTORY 5=HEART 6=RELAXED 0=HIDE J=JITTER MOUSE=WRIST Q=QUIT",
            10, STATUS_Y + 20, DIM_COLOR,
        );

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Scene ─────────────────────────────────────────────────────────────

    fn draw_particles(&mut self, scene: &Scene) {
        for (i, p) in scene.particles.iter().enumerate() {
            let Some((x, y)) = scene.screen_pos(i) else { continue };
            if let Some((px, py)) = to_pixel(x, y) {
                self.fill_rect(px, py, 2, 2, p.color);
            }
        }
    }

    fn draw_cursor(&mut self, view: &View) {
        let c = view.hand.cursor;
        let Some((cx, cy)) = to_pixel(c.x, c.y) else { return };
        let color = if view.hand_seen { CURSOR_COLOR } else { DIM_COLOR };
        self.draw_ring(cx, cy, 10, color);
        self.fill_rect(cx.saturating_sub(1), cy.saturating_sub(1), 3, 3, gesture_color(view.hand.gesture));
    }

    fn draw_history(&mut self, history: &GestureHistory) {
        let slots = history.capacity();
        let x0 = WIN_W.saturating_sub(10 + slots * (SLOT_W + 2));
        for i in 0..slots {
            self.draw_border(x0 + i * (SLOT_W + 2), 5, SLOT_W, SLOT_W, DIM_COLOR);
        }
        // right-align so the newest sample sits in the last slot
        let offset = slots - history.len().min(slots);
        for (i, g) in history.iter().enumerate() {
            let x = x0 + (offset + i) * (SLOT_W + 2);
            self.fill_rect(x + 1, 6, SLOT_W - 2, SLOT_W - 2, gesture_color(g));
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(WIN_H) {
            let start = row * WIN_W;
            for col in x..(x + w).min(WIN_W) {
                self.buf[start + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..x + w {
            self.set_pixel(col, y, color);
            self.set_pixel(col, y + h - 1, color);
        }
        for row in y..y + h {
            self.set_pixel(x, row, color);
            self.set_pixel(x + w - 1, row, color);
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    fn draw_ring(&mut self, cx: usize, cy: usize, r: usize, color: u32) {
        let steps = 8 * r;
        for s in 0..steps {
            let a = s as f32 / steps as f32 * std::f32::consts::TAU;
            let x = cx as f32 + r as f32 * a.cos();
            let y = cy as f32 + r as f32 * a.sin();
            if x >= 0.0 && y >= 0.0 {
                self.set_pixel(x.round() as usize, y.round() as usize, color);
            }
        }
    }

    /// Draw `text` in the 3×5 font at `SCALE`; returns the x after the last
    /// glyph.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) -> usize {
        let advance = 4 * SCALE;
        let mut cx = x;
        for ch in text.chars() {
            if cx + advance > WIN_W { break; }
            let bits = glyph(ch);
            for row in 0..5 {
                for col in 0..3 {
                    if bits & (1 << (14 - (row * 3 + col))) != 0 {
                        self.fill_rect(cx + col * SCALE, y + row * SCALE, SCALE, SCALE, color);
                    }
                }
            }
            cx += advance;
        }
        cx
    }
}

/// Window-normalised position → pixel, or `None` when off screen or under
/// the bars.
fn to_pixel(x: f32, y: f32) -> Option<(usize, usize)> {
    if !(0.0..1.0).contains(&x) || !(0.0..1.0).contains(&y) {
        return None;
    }
    let px = (x * WIN_W as f32) as usize;
    let py = (y * WIN_H as f32) as usize;
    (py >= TOP_BAR_H && py < STATUS_Y).then_some((px, py))
}

// ────────────────────────────────────────────────────────────────────────────
// 3×5 bitmap font, rows packed top to bottom, 3 bits per row
// ────────────────────────────────────────────────────────────────────────────

const FONT: &[(char, u16)] = &[
    ('0', 0x7B6F), ('1', 0x2C97), ('2', 0x73E7), ('3', 0x72CF),
    ('4', 0x5BC9), ('5', 0x79CF), ('6', 0x79EF), ('7', 0x7292),
    ('8', 0x7BEF), ('9', 0x7BCF), ('A', 0x2BED), ('B', 0x6BAE),
    ('C', 0x3923), ('D', 0x6B6E), ('E', 0x79A7), ('F', 0x79A4),
    ('G', 0x396B), ('H', 0x5BED), ('I', 0x7497), ('J', 0x126A),
    ('K', 0x5D35), ('L', 0x4927), ('M', 0x5FED), ('N', 0x6B6D),
    ('O', 0x2B6A), ('P', 0x6BA4), ('Q', 0x2B73), ('R', 0x6BAD),
    ('S', 0x388E), ('T', 0x7492), ('U', 0x5B6F), ('V', 0x5B6A),
    ('W', 0x5BFD), ('X', 0x5AAD), ('Y', 0x5A92), ('Z', 0x72A7),
    ('_', 0x0007), ('-', 0x01C0), ('.', 0x0002), (':', 0x0410),
    ('/', 0x12A4), ('(', 0x2922), (')', 0x224A), ('=', 0x0E38),
    ('%', 0x52A5), ('>', 0x4454), ('<', 0x1511), ('+', 0x05D0),
    ('!', 0x2482), ('?', 0x6282), (',', 0x0014), ('|', 0x2492),
    ('\'', 0x2400), ('#', 0x5F7D),
];

/// Unknown characters draw as a centre dot.
fn glyph(c: char) -> u16 {
    let c = c.to_ascii_uppercase();
    if c == ' ' { return 0; }
    FONT.iter().find(|&&(k, _)| k == c).map_or(0x0080, |&(_, bits)| bits)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_gesture_name_is_drawable() {
        for g in Gesture::ALL {
            for c in g.name().chars() {
                assert!(FONT.iter().any(|&(k, _)| k == c), "{:?} has no glyph for {:?}", g, c);
            }
        }
    }

    #[test]
    fn glyphs_fit_fifteen_bits() {
        for &(c, bits) in FONT {
            assert!(bits < 1 << 15, "{:?}", c);
        }
        assert_eq!(glyph('a'), glyph('A'));
        assert_eq!(glyph(' '), 0);
    }

    #[test]
    fn gesture_colors_are_distinct() {
        for a in Gesture::ALL {
            for b in Gesture::ALL {
                if a != b { assert_ne!(gesture_color(a), gesture_color(b)); }
            }
        }
    }

    #[test]
    fn pixels_under_bars_are_hidden() {
        assert!(to_pixel(0.5, 0.5).is_some());
        assert!(to_pixel(0.5, 0.0).is_none());
        assert!(to_pixel(0.5, 0.99).is_none());
        assert!(to_pixel(-0.1, 0.5).is_none());
        assert!(to_pixel(1.0, 0.5).is_none());
    }
}
