//! Scene-mode state machine.
//!
//! ## Gesture → Mode mapping
//!
//! | Stable gesture | Mode |
//! |---|---|
//! | `Heart`      | `Love`    |
//! | `Victory`    | `Text`    |
//! | `ClosedFist` | `Tree`    |
//! | `OpenHand`   | `Scatter` |
//! | `Pinch`, `None` | no change |
//!
//! A transition commits only when the target differs from the current mode
//! and more than `cooldown_ms` has passed since the previous commit.  The
//! cooldown is global: it does not matter which gesture caused the last
//! change.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classifier::Gesture;

/// Default debounce window.
pub const DEFAULT_COOLDOWN_MS: u64 = 600;

// ════════════════════════════════════════════════════════════════════════════
// AppMode
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppMode {
    #[default]
    Tree,
    Text,
    Scatter,
    Love,
}

impl AppMode {
    pub const ALL: [AppMode; 4] = [AppMode::Tree, AppMode::Text, AppMode::Scatter, AppMode::Love];

    pub fn name(self) -> &'static str {
        match self {
            AppMode::Tree    => "TREE",
            AppMode::Text    => "TEXT",
            AppMode::Scatter => "SCATTER",
            AppMode::Love    => "LOVE",
        }
    }

    /// Mode a stable gesture asks for, if any.
    pub fn for_gesture(gesture: Gesture) -> Option<AppMode> {
        match gesture {
            Gesture::Heart      => Some(AppMode::Love),
            Gesture::Victory    => Some(AppMode::Text),
            Gesture::ClosedFist => Some(AppMode::Tree),
            Gesture::OpenHand   => Some(AppMode::Scatter),
            Gesture::Pinch | Gesture::None => None,
        }
    }
}

impl fmt::Display for AppMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TransitionGate
// ════════════════════════════════════════════════════════════════════════════

/// Remembers when the last transition committed.
///
/// Starts empty: the very first transition is never held back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransitionGate {
    last_transition_at_ms: Option<u64>,
}

impl TransitionGate {
    pub fn last_transition_at_ms(&self) -> Option<u64> {
        self.last_transition_at_ms
    }

    /// True once strictly more than `cooldown_ms` has passed.  A clock that
    /// steps backwards keeps the gate shut.
    pub fn is_open(&self, now_ms: u64, cooldown_ms: u64) -> bool {
        match self.last_transition_at_ms {
            None       => true,
            Some(last) => now_ms.saturating_sub(last) > cooldown_ms,
        }
    }

    fn commit(&mut self, now_ms: u64) {
        self.last_transition_at_ms = Some(now_ms);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ModeController
// ════════════════════════════════════════════════════════════════════════════

/// A committed mode change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeTransition {
    pub from:    AppMode,
    pub to:      AppMode,
    pub gesture: Gesture,
    pub at_ms:   u64,
}

#[derive(Clone, Debug)]
pub struct ModeController {
    gate:        TransitionGate,
    cooldown_ms: u64,
}

impl ModeController {
    pub fn new(cooldown_ms: u64) -> Self {
        ModeController { gate: TransitionGate::default(), cooldown_ms }
    }

    /// Decide whether `stable` moves the app out of `current`.
    ///
    /// At most one transition per call.  Target equal to `current` is a
    /// no-op and does not touch the gate.
    pub fn evaluate(&mut self, current: AppMode, stable: Gesture, now_ms: u64) -> Option<ModeTransition> {
        let target = AppMode::for_gesture(stable)?;
        if target == current || !self.gate.is_open(now_ms, self.cooldown_ms) {
            return None;
        }
        self.gate.commit(now_ms);
        log::info!("mode {} -> {} ({}) at {} ms", current, target, stable, now_ms);
        Some(ModeTransition { from: current, to: target, gesture: stable, at_ms: now_ms })
    }

    pub fn gate(&self) -> &TransitionGate { &self.gate }
}

impl Default for ModeController {
    fn default() -> Self { ModeController::new(DEFAULT_COOLDOWN_MS) }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    /// Run a sequence of (gesture, time) edges, returning the committed count.
    fn commits(edges: &[(Gesture, u64)]) -> (usize, AppMode) {
        let mut ctl = ModeController::default();
        let mut mode = AppMode::Tree;
        let mut n = 0;
        for &(g, t) in edges {
            if let Some(tr) = ctl.evaluate(mode, g, t) {
                mode = tr.to;
                n += 1;
            }
        }
        (n, mode)
    }

    #[test]
    fn mapping_table() {
        assert_eq!(AppMode::for_gesture(Gesture::Heart),      Some(AppMode::Love));
        assert_eq!(AppMode::for_gesture(Gesture::Victory),    Some(AppMode::Text));
        assert_eq!(AppMode::for_gesture(Gesture::ClosedFist), Some(AppMode::Tree));
        assert_eq!(AppMode::for_gesture(Gesture::OpenHand),   Some(AppMode::Scatter));
        assert_eq!(AppMode::for_gesture(Gesture::Pinch),      None);
        assert_eq!(AppMode::for_gesture(Gesture::None),       None);
    }

    #[test]
    fn edges_100ms_apart_commit_once() {
        let (n, mode) = commits(&[(Gesture::Victory, 1_000), (Gesture::OpenHand, 1_100)]);
        assert_eq!(n, 1);
        assert_eq!(mode, AppMode::Text);
    }

    #[test]
    fn edges_700ms_apart_commit_twice() {
        let (n, mode) = commits(&[(Gesture::Victory, 1_000), (Gesture::OpenHand, 1_700)]);
        assert_eq!(n, 2);
        assert_eq!(mode, AppMode::Scatter);
    }

    #[test]
    fn cooldown_boundary_is_exclusive() {
        let (n, _) = commits(&[(Gesture::Victory, 1_000), (Gesture::OpenHand, 1_600)]);
        assert_eq!(n, 1);
        let (n, _) = commits(&[(Gesture::Victory, 1_000), (Gesture::OpenHand, 1_601)]);
        assert_eq!(n, 2);
    }

    #[test]
    fn same_mode_is_noop_and_keeps_gate() {
        let mut ctl = ModeController::default();
        assert_eq!(ctl.evaluate(AppMode::Tree, Gesture::ClosedFist, 50), None);
        assert_eq!(ctl.gate().last_transition_at_ms(), None);
        // the gate is still open for a real change right after
        assert!(ctl.evaluate(AppMode::Tree, Gesture::Heart, 60).is_some());
    }

    #[test]
    fn pinch_and_none_never_transition() {
        let mut ctl = ModeController::default();
        for (i, mode) in AppMode::ALL.iter().enumerate() {
            let t = 10_000 * (i as u64 + 1);
            assert_eq!(ctl.evaluate(*mode, Gesture::Pinch, t), None);
            assert_eq!(ctl.evaluate(*mode, Gesture::None,  t), None);
        }
    }

    #[test]
    fn flipping_plurality_is_rate_limited() {
        // Stable gesture flips every 16 ms for two seconds.
        let mut edges = Vec::new();
        for i in 0..125u64 {
            let g = if i % 2 == 0 { Gesture::Victory } else { Gesture::OpenHand };
            edges.push((g, 1_000 + i * 16));
        }
        let (n, _) = commits(&edges);
        // 2 s span with > 600 ms between commits
        assert!(n <= 4, "{} commits", n);
        assert!(n >= 3);
    }

    #[test]
    fn clock_stepping_back_keeps_gate_shut() {
        let mut ctl = ModeController::default();
        assert!(ctl.evaluate(AppMode::Tree, Gesture::Heart, 5_000).is_some());
        assert!(ctl.evaluate(AppMode::Love, Gesture::Victory, 100).is_none());
    }
}
