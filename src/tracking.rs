//! Hand-tracking aggregator.
//!
//! Runs normalize -> smooth -> pinch for every raw hand of a provider frame
//! and publishes the result as one immutable [`FrameSnapshot`]. The snapshot
//! is swapped as a whole (`Arc`), so consumers reading it during a tick never
//! see a half-updated frame.
//!
//! Three inputs are told apart:
//! * `Some(hands)` with hands: a normal frame.
//! * `Some(vec![])`: the provider looked and saw no hands. Emits an empty snapshot.
//! * `None`: nothing new since last tick. The previous snapshot is returned
//!   unchanged and flagged `stale`; cursors and pinch states stay frozen.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::TrackingConfig;
use crate::normalize::CoordinateNormalizer;
use crate::pinch::{PinchDetector, pinch_distance};
use crate::smoothing::CursorSmoother;
use crate::types::{
    FrameSnapshot, HandLabel, HandSnapshot, ObservationSet, RawHandObservation, TrackedFrame,
    landmarks,
};

pub struct HandTracker {
    normalizer: CoordinateNormalizer,
    smoother: CursorSmoother,
    pinch: PinchDetector,
    current: Arc<FrameSnapshot>,
    next_frame_id: u64,
}

impl HandTracker {
    pub fn new(config: &TrackingConfig) -> Self {
        Self {
            normalizer: CoordinateNormalizer::new(config.active_margin),
            smoother: CursorSmoother::new(config.smoothing_alpha),
            pinch: PinchDetector::new(config.pinch_start, config.pinch_end),
            current: Arc::new(FrameSnapshot::default()),
            next_frame_id: 1,
        }
    }

    /// Snapshot produced by the most recent fresh frame.
    pub fn current(&self) -> Arc<FrameSnapshot> {
        Arc::clone(&self.current)
    }

    /// One tick. `fresh` is whatever the provider published since the last
    /// tick, if anything.
    pub fn tick(&mut self, fresh: Option<ObservationSet>) -> TrackedFrame {
        match fresh {
            Some(observations) => {
                let snapshot = self.process(&observations);
                self.current = Arc::new(snapshot);
                TrackedFrame { snapshot: self.current(), stale: false }
            }
            None => TrackedFrame { snapshot: self.current(), stale: true },
        }
    }

    fn process(&mut self, observations: &[RawHandObservation]) -> FrameSnapshot {
        let frame_id = self.next_frame_id;
        self.next_frame_id += 1;

        let mut hands: Vec<HandSnapshot> = Vec::with_capacity(HandLabel::ALL.len());
        for obs in observations {
            if hands.iter().any(|h| h.label == obs.label) {
                debug!(hand = %obs.label, frame_id, "duplicate hand label dropped");
                continue;
            }
            if !obs.is_finite() {
                warn!(hand = %obs.label, frame_id, "non-finite landmarks, hand skipped");
                continue;
            }
            hands.push(self.process_hand(obs));
        }

        FrameSnapshot { frame_id, hands }
    }

    fn process_hand(&mut self, obs: &RawHandObservation) -> HandSnapshot {
        let target = self
            .normalizer
            .map(obs.landmark(landmarks::CURSOR_ANCHOR));
        let cursor = self.smoother.update(obs.label, target);

        let distance = pinch_distance(obs);
        let state = self.pinch.update(obs.label, distance);

        HandSnapshot {
            label: obs.label,
            landmarks: obs.landmarks,
            cursor,
            is_pinching: state.is_pinched(),
            pinch_distance: distance,
        }
    }
}
