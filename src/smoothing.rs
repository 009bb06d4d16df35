//! Exponential moving average of the cursor, one filter per hand.

use crate::types::{HandLabel, PerHand, Point};

/// EMA state for every hand label.
///
/// A label's first sample seeds the filter directly so a hand that just came
/// into view has no ramp-in lag. The state is kept while a hand is out of
/// view; it resumes from the last smoothed position when the hand returns.
#[derive(Clone, Debug)]
pub struct CursorSmoother {
    alpha: f32,
    last: PerHand<Option<Point>>,
}

impl CursorSmoother {
    /// `alpha` in (0, 1]; 1.0 disables smoothing.
    pub fn new(alpha: f32) -> Self {
        Self { alpha, last: PerHand::default() }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Feed a raw target and return the smoothed position.
    pub fn update(&mut self, label: HandLabel, target: Point) -> Point {
        let slot = self.last.get_mut(label);
        let prev = slot.unwrap_or(target);
        let smoothed = Point::new(
            prev.x + (target.x - prev.x) * self.alpha,
            prev.y + (target.y - prev.y) * self.alpha,
        );
        *slot = Some(smoothed);
        smoothed
    }

    /// Last smoothed position, if the label was ever seen.
    pub fn position(&self, label: HandLabel) -> Option<Point> {
        *self.last.get(label)
    }
}
