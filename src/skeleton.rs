//! Wireframe view of the raw hand landmarks.
//!
//! Drawn in camera space stretched over the whole window (no active margin),
//! so it shows what the provider sees rather than where the cursor is.

use crate::raster::{self, Surface};
use crate::types::{HandLabel, HandSnapshot, Point, Size, landmarks as lm};

/// Landmark chains joined by bones: each finger from the wrist, then the
/// knuckle line across the palm.
pub const BONES: [&[usize]; 6] = [
    &[lm::WRIST, lm::THUMB_CMC, lm::THUMB_MCP, lm::THUMB_IP, lm::THUMB_TIP],
    &[lm::WRIST, lm::INDEX_FINGER_MCP, lm::INDEX_FINGER_PIP, lm::INDEX_FINGER_DIP, lm::INDEX_FINGER_TIP],
    &[lm::WRIST, lm::MIDDLE_FINGER_MCP, lm::MIDDLE_FINGER_PIP, lm::MIDDLE_FINGER_DIP, lm::MIDDLE_FINGER_TIP],
    &[lm::WRIST, lm::RING_FINGER_MCP, lm::RING_FINGER_PIP, lm::RING_FINGER_DIP, lm::RING_FINGER_TIP],
    &[lm::WRIST, lm::PINKY_MCP, lm::PINKY_PIP, lm::PINKY_DIP, lm::PINKY_TIP],
    &[lm::INDEX_FINGER_MCP, lm::MIDDLE_FINGER_MCP, lm::RING_FINGER_MCP, lm::PINKY_MCP],
];

const BONE_WIDTH: f32 = 4.0;
const JOINT_RADIUS: f32 = 4.0;
const TIP_RADIUS: f32 = 6.0;
const PINCH_RING_RADIUS: f32 = 12.0;
const TIP_COLOR: u32 = 0x00ff_ffff;

/// Display color of a hand, 0x00RRGGBB.
pub fn hand_color(label: HandLabel) -> u32 {
    match label {
        HandLabel::Left => 0x00a8_55f7,
        HandLabel::Right => 0x003b_82f6,
    }
}

/// Bones, joints and the two pinch fingertips of one hand.
///
/// Thumb and index tips are drawn larger and white; while the hand pinches
/// each also gets a ring.
pub fn draw_hand<S: Surface + ?Sized>(s: &mut S, hand: &HandSnapshot, viewport: Size) {
    let color = hand_color(hand.label);
    let at = |i: usize| {
        let l = hand.landmarks[i];
        Point::new(l.x * viewport.width, l.y * viewport.height)
    };

    for chain in BONES {
        for pair in chain.windows(2) {
            raster::stroke_segment(s, at(pair[0]), at(pair[1]), BONE_WIDTH, color, None, 0.0);
        }
    }

    for i in 0..lm::COUNT {
        if i != lm::THUMB_TIP && i != lm::INDEX_FINGER_TIP {
            raster::fill_disc(s, at(i), JOINT_RADIUS, color);
        }
    }
    for tip in [lm::THUMB_TIP, lm::INDEX_FINGER_TIP] {
        raster::fill_disc(s, at(tip), TIP_RADIUS, TIP_COLOR);
        if hand.is_pinching {
            raster::draw_ring(s, at(tip), PINCH_RING_RADIUS, 2.0, TIP_COLOR);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::synthetic_hand;
    use crate::types::FrameBuffer;

    const VIEW: Size = Size::new(200.0, 200.0);

    fn snapshot(label: HandLabel, pinching: bool) -> HandSnapshot {
        let raw = synthetic_hand(label, Point::new(0.5, 0.5), pinching);
        HandSnapshot {
            label,
            landmarks: raw.landmarks,
            cursor: Point::new(0.5, 0.5),
            is_pinching: pinching,
            pinch_distance: 0.0,
        }
    }

    fn drawn(hand: &HandSnapshot) -> FrameBuffer {
        let mut fb = FrameBuffer::new(200, 200);
        fb.fill(0);
        draw_hand(&mut fb, hand, VIEW);
        fb
    }

    fn px(fb: &FrameBuffer, x: usize, y: usize) -> u32 {
        fb.pixels[y * fb.width + x]
    }

    #[test]
    fn bones_and_joints_take_the_hand_color() {
        let fb = drawn(&snapshot(HandLabel::Left, false));
        // wrist joint, then halfway along the wrist to middle-knuckle bone
        assert_eq!(px(&fb, 100, 124), 0x00a8_55f7);
        assert_eq!(px(&fb, 100, 112), 0x00a8_55f7);

        let fb = drawn(&snapshot(HandLabel::Right, false));
        assert_eq!(px(&fb, 100, 112), 0x003b_82f6);
        // nothing far from the hand
        assert_eq!(px(&fb, 10, 10), 0);
    }

    #[test]
    fn pinch_fingertips_are_white() {
        let fb = drawn(&snapshot(HandLabel::Right, false));
        // index tip sits at (0.46, 0.40), thumb tip at (0.40, 0.51)
        assert_eq!(px(&fb, 92, 80), TIP_COLOR);
        assert_eq!(px(&fb, 80, 102), TIP_COLOR);
    }

    #[test]
    fn pinching_rings_the_tips() {
        // 12 px left of the index tip: empty while open, on the ring while pinched
        assert_eq!(px(&drawn(&snapshot(HandLabel::Right, false)), 80, 80), 0);
        assert_eq!(px(&drawn(&snapshot(HandLabel::Right, true)), 80, 80), TIP_COLOR);
    }
}
