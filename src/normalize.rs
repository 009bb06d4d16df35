//! Active-area remapping of raw landmark coordinates.
//!
//! The camera sees more than a hand comfortably reaches, so only the inner
//! rectangle `[margin, 1 - margin]^2` drives the cursor. That rectangle is
//! stretched to the full `[0,1]^2` and anything outside clamps to the edge.

use crate::types::Point;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateNormalizer {
    margin: f32,
}

impl CoordinateNormalizer {
    /// `margin` must be in `[0, 0.5)`; config validation enforces it.
    pub fn new(margin: f32) -> Self {
        Self { margin }
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }

    /// Remap a single axis value.
    pub fn map_axis(&self, value: f32) -> f32 {
        let min = self.margin;
        let max = 1.0 - self.margin;
        ((value - min) / (max - min)).clamp(0.0, 1.0)
    }

    pub fn map(&self, raw: Point) -> Point {
        Point::new(self.map_axis(raw.x), self.map_axis(raw.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    #[test]
    fn margin_edges_map_to_unit_bounds() {
        let n = CoordinateNormalizer::new(0.22);
        assert!(n.map_axis(0.22).abs() < EPS);
        assert!((n.map_axis(0.78) - 1.0).abs() < EPS);
        assert!((n.map_axis(0.5) - 0.5).abs() < EPS);
    }

    #[test]
    fn outside_values_clamp_without_extrapolation() {
        let n = CoordinateNormalizer::new(0.22);
        assert_eq!(n.map_axis(0.0), 0.0);
        assert_eq!(n.map_axis(0.1), 0.0);
        assert_eq!(n.map_axis(0.95), 1.0);
        assert_eq!(n.map_axis(1.0), 1.0);
    }

    #[test]
    fn zero_margin_is_identity() {
        let n = CoordinateNormalizer::new(0.0);
        let p = n.map(Point::new(0.3, 0.9));
        assert!((p.x - 0.3).abs() < EPS);
        assert!((p.y - 0.9).abs() < EPS);
    }

    #[test]
    fn axes_are_independent() {
        let n = CoordinateNormalizer::new(0.25);
        let p = n.map(Point::new(0.25, 0.75));
        assert!(p.x.abs() < EPS);
        assert!((p.y - 1.0).abs() < EPS);
    }
}
