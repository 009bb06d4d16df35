//! Thumb/index pinch detection with a hysteresis dead band.

use crate::types::{HandLabel, PerHand, RawHandObservation, landmarks};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PinchState {
    #[default]
    Open,
    Pinched,
}

impl PinchState {
    pub fn is_pinched(self) -> bool {
        self == PinchState::Pinched
    }
}

/// Per-hand two-state machine.
///
/// Closes when the tip distance drops below `start`, opens when it rises
/// above `end`. Anything in `[start, end]` holds the current state.
#[derive(Clone, Debug)]
pub struct PinchDetector {
    start: f32,
    end: f32,
    state: PerHand<PinchState>,
}

impl PinchDetector {
    /// Requires `start < end`; config validation enforces it.
    pub fn new(start: f32, end: f32) -> Self {
        Self { start, end, state: PerHand::default() }
    }

    pub fn thresholds(&self) -> (f32, f32) {
        (self.start, self.end)
    }

    pub fn state(&self, label: HandLabel) -> PinchState {
        *self.state.get(label)
    }

    /// Advance one label with a fresh distance and return the new state.
    pub fn update(&mut self, label: HandLabel, distance: f32) -> PinchState {
        let slot = self.state.get_mut(label);
        let next = match *slot {
            PinchState::Open if distance < self.start => PinchState::Pinched,
            PinchState::Pinched if distance > self.end => PinchState::Open,
            held => held,
        };
        if next != *slot {
            debug!(hand = %label, distance, state = ?next, "pinch transition");
        }
        *slot = next;
        next
    }
}

/// Index fingertip to thumb tip distance in normalized image space.
pub fn pinch_distance(hand: &RawHandObservation) -> f32 {
    hand.landmark(landmarks::INDEX_FINGER_TIP)
        .distance(hand.landmark(landmarks::THUMB_TIP))
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: f32 = 0.038;
    const END: f32 = 0.058;

    #[test]
    fn starts_open() {
        let d = PinchDetector::new(START, END);
        assert_eq!(d.state(HandLabel::Left), PinchState::Open);
        assert_eq!(d.state(HandLabel::Right), PinchState::Open);
    }

    #[test]
    fn dead_band_never_flips() {
        let mut d = PinchDetector::new(START, END);
        for i in 0..200 {
            let dist = if i % 2 == 0 { 0.0381 } else { 0.0579 };
            assert_eq!(d.update(HandLabel::Left, dist), PinchState::Open);
        }

        d.update(HandLabel::Left, 0.01);
        for i in 0..200 {
            let dist = if i % 2 == 0 { 0.0381 } else { 0.0579 };
            assert_eq!(d.update(HandLabel::Left, dist), PinchState::Pinched);
        }
    }

    #[test]
    fn each_crossing_transitions_once() {
        let mut d = PinchDetector::new(START, END);
        let seq = [0.1, 0.03, 0.02, 0.045, 0.03, 0.07, 0.09, 0.05, 0.01, 0.2];
        let mut transitions = 0;
        let mut prev = PinchState::Open;
        for dist in seq {
            let s = d.update(HandLabel::Right, dist);
            if s != prev {
                transitions += 1;
            }
            prev = s;
        }
        // closed at 0.03, opened at 0.07, closed at 0.01, opened at 0.2
        assert_eq!(transitions, 4);
    }

    #[test]
    fn exact_thresholds_hold_state() {
        let mut d = PinchDetector::new(START, END);
        assert_eq!(d.update(HandLabel::Left, START), PinchState::Open);
        d.update(HandLabel::Left, 0.0);
        assert_eq!(d.update(HandLabel::Left, END), PinchState::Pinched);
    }

    #[test]
    fn labels_do_not_share_state() {
        let mut d = PinchDetector::new(START, END);
        d.update(HandLabel::Left, 0.0);
        assert!(d.state(HandLabel::Left).is_pinched());
        assert!(!d.state(HandLabel::Right).is_pinched());
    }
}
