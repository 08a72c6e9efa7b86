//! Temporal stabilizer: majority vote over the last few classifications.
//!
//! Single-frame misclassifications are common while a hand moves between two
//! shapes.  Voting over a short window suppresses that flicker at the cost
//! of a few frames of latency: a newly held gesture takes over once it holds
//! the plurality of the window.
//!
//! ## Tie rule
//!
//! When several gestures share the top count, the winner is the one whose
//! first occurrence comes earliest in a scan from the oldest sample to the
//! newest.  With `[Open, Fist, Open, Fist]` the answer is `Open`.

use std::collections::VecDeque;

use crate::classifier::Gesture;

/// Default window length.
pub const DEFAULT_CAPACITY: usize = 8;

// ════════════════════════════════════════════════════════════════════════════
// GestureHistory
// ════════════════════════════════════════════════════════════════════════════

/// Fixed-capacity FIFO of recent per-frame gestures (oldest at the front).
#[derive(Clone, Debug)]
pub struct GestureHistory {
    samples:  VecDeque<Gesture>,
    capacity: usize,
}

impl GestureHistory {
    /// `capacity` is raised to 1 if given as 0.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        GestureHistory {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest once full.
    pub fn push(&mut self, gesture: Gesture) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(gesture);
    }

    pub fn len(&self) -> usize { self.samples.len() }
    pub fn is_empty(&self) -> bool { self.samples.is_empty() }
    pub fn capacity(&self) -> usize { self.capacity }

    /// Oldest → newest.
    pub fn iter(&self) -> impl Iterator<Item = Gesture> + '_ {
        self.samples.iter().copied()
    }

    /// Most frequent sample; `Gesture::None` for an empty history.
    pub fn plurality(&self) -> Gesture {
        let mut counts = [0usize; Gesture::COUNT];
        for g in self.iter() {
            counts[g.index()] += 1;
        }

        // Scanning samples (not distinct values) with a strict `>` keeps the
        // gesture whose first occurrence is earliest among the tied ones.
        let mut best = Gesture::None;
        let mut best_count = 0;
        for g in self.iter() {
            if counts[g.index()] > best_count {
                best = g;
                best_count = counts[g.index()];
            }
        }
        best
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TemporalStabilizer
// ════════════════════════════════════════════════════════════════════════════

/// Push raw gestures in, get the current stable gesture back.
#[derive(Clone, Debug)]
pub struct TemporalStabilizer {
    history: GestureHistory,
    stable:  Gesture,
}

impl TemporalStabilizer {
    pub fn new(capacity: usize) -> Self {
        TemporalStabilizer {
            history: GestureHistory::new(capacity),
            stable:  Gesture::None,
        }
    }

    pub fn push(&mut self, gesture: Gesture) -> Gesture {
        self.history.push(gesture);
        let stable = self.history.plurality();
        if stable != self.stable {
            log::debug!("stable gesture {} -> {}", self.stable, stable);
            self.stable = stable;
        }
        stable
    }

    /// Last value returned by [`push`](Self::push).
    pub fn stable(&self) -> Gesture { self.stable }

    pub fn history(&self) -> &GestureHistory { &self.history }
}

impl Default for TemporalStabilizer {
    fn default() -> Self {
        TemporalStabilizer::new(DEFAULT_CAPACITY)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Gesture::{ClosedFist, Heart, OpenHand, Pinch, Victory};

    fn feed(s: &mut TemporalStabilizer, gs: &[Gesture]) -> Gesture {
        let mut last = Gesture::None;
        for &g in gs { last = s.push(g); }
        last
    }

    #[test]
    fn empty_history_is_none() {
        assert_eq!(GestureHistory::new(8).plurality(), Gesture::None);
    }

    #[test]
    fn same_gesture_eight_times() {
        let mut s = TemporalStabilizer::default();
        assert_eq!(feed(&mut s, &[Victory; 8]), Victory);
    }

    #[test]
    fn five_against_three() {
        let mut s = TemporalStabilizer::default();
        let out = feed(&mut s, &[Heart, Heart, Heart, Heart, Heart, Pinch, Pinch, Pinch]);
        assert_eq!(out, Heart);
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let mut s = TemporalStabilizer::default();
        for i in 0..50 {
            s.push(Gesture::ALL[i % Gesture::COUNT]);
            assert!(s.history().len() <= DEFAULT_CAPACITY);
        }
        assert_eq!(s.history().len(), DEFAULT_CAPACITY);
    }

    #[test]
    fn oldest_sample_is_evicted() {
        let mut s = TemporalStabilizer::new(3);
        feed(&mut s, &[ClosedFist, OpenHand, OpenHand, Pinch]);
        let window: Vec<_> = s.history().iter().collect();
        assert_eq!(window, vec![OpenHand, OpenHand, Pinch]);
        assert_eq!(s.stable(), OpenHand);
    }

    #[test]
    fn tie_goes_to_first_seen() {
        let mut h = GestureHistory::new(8);
        for g in [OpenHand, ClosedFist, OpenHand, ClosedFist] { h.push(g); }
        assert_eq!(h.plurality(), OpenHand);

        let mut h = GestureHistory::new(8);
        for g in [ClosedFist, OpenHand, OpenHand, ClosedFist] { h.push(g); }
        assert_eq!(h.plurality(), ClosedFist);
    }

    #[test]
    fn tie_rule_follows_window_after_eviction() {
        // [P, V, V, P] then push V: window [V, V, P, V] -> V wins outright;
        // push P: window [V, P, V, P] -> tie, V seen first.
        let mut s = TemporalStabilizer::new(4);
        feed(&mut s, &[Pinch, Victory, Victory, Pinch]);
        assert_eq!(s.stable(), Pinch);
        assert_eq!(s.push(Victory), Victory);
        assert_eq!(s.push(Pinch), Victory);
    }

    #[test]
    fn held_gesture_takes_over_within_window() {
        let mut s = TemporalStabilizer::default();
        feed(&mut s, &[OpenHand; 8]);
        let mut frames = 0;
        while s.push(ClosedFist) != ClosedFist { frames += 1; }
        // a 4/4 split still goes to the older gesture
        assert_eq!(frames, 4);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut s = TemporalStabilizer::new(0);
        assert_eq!(s.push(Pinch), Pinch);
        assert_eq!(s.push(Heart), Heart);
        assert_eq!(s.history().capacity(), 1);
    }
}
